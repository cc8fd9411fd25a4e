use std::ops::Range;

use crate::{
    data_structures::mesh::RenderMesh,
    resources::attribute::{AccessorRef, AttributeData, Semantic, negotiate},
};

/// Every triangle primitive of a document, as one flat list.
#[derive(Debug, Default)]
pub struct FlatMeshes {
    pub meshes: Vec<RenderMesh>,
    /// Material slot per flattened mesh; slot 0 is the default material.
    pub mesh_material: Vec<usize>,
    /// Flattened range produced by each source mesh, by source mesh index.
    pub ranges: Vec<Range<usize>>,
}

/// Emit one [`RenderMesh`] per triangle primitive, in declaration order.
///
/// Primitives with another topology are skipped without a placeholder, so a
/// source mesh can map to fewer flattened meshes than it has primitives.
pub fn flatten_meshes(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    path: &str,
) -> FlatMeshes {
    let material_count = document.materials().count();
    let mut out = FlatMeshes::default();

    for mesh in document.meshes() {
        let start = out.meshes.len();
        for (p, primitive) in mesh.primitives().enumerate() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::debug!(
                    "MODEL: [{}] Skipping {:?} primitive {} of mesh {}",
                    path,
                    primitive.mode(),
                    p,
                    mesh.index()
                );
                continue;
            }
            let label = match mesh.name() {
                Some(name) => format!("{}#{}", name, p),
                None => format!("mesh{}#{}", mesh.index(), p),
            };
            out.meshes.push(load_primitive(&primitive, label, buffers, path));
            out.mesh_material.push(match primitive.material().index() {
                Some(i) if i < material_count => i + 1,
                _ => 0,
            });
        }
        out.ranges.push(start..out.meshes.len());
    }

    out
}

fn load_primitive(
    primitive: &gltf::Primitive,
    label: String,
    buffers: &[gltf::buffer::Data],
    path: &str,
) -> RenderMesh {
    let mut mesh = RenderMesh {
        label,
        ..Default::default()
    };

    for (semantic, accessor) in primitive.attributes() {
        let semantic = match semantic {
            gltf::Semantic::Positions => Semantic::Position,
            gltf::Semantic::Normals => Semantic::Normal,
            gltf::Semantic::Tangents => Semantic::Tangent,
            gltf::Semantic::TexCoords(0) => Semantic::TexCoord0,
            gltf::Semantic::Colors(0) => Semantic::Color0,
            // extra uv/color sets, skinning
            _ => continue,
        };
        match decode(semantic, &accessor, buffers, path) {
            Some(AttributeData::Positions(positions)) => {
                mesh.vertex_count = positions.len() / 3;
                mesh.positions = positions;
            }
            Some(AttributeData::Normals(normals)) => mesh.normals = Some(normals),
            Some(AttributeData::Tangents(tangents)) => mesh.tangents = Some(tangents),
            Some(AttributeData::TexCoords(uvs)) => mesh.tex_coords = Some(uvs),
            Some(AttributeData::Colors(colors)) => mesh.colors = Some(colors),
            Some(AttributeData::Indices { .. }) | None => {}
        }
    }

    if let Some(accessor) = primitive.indices() {
        if let Some(AttributeData::Indices { indices, wrapped }) =
            decode(Semantic::Indices, &accessor, buffers, path)
        {
            if let Some(wrapped) = wrapped {
                log::warn!(
                    "MODEL: [{}] Indices data converted from u32 to u16, possible loss of data ({} indices wrapped)",
                    path,
                    wrapped
                );
            }
            mesh.indices = Some(indices);
        }
    }

    mesh.triangle_count = match &mesh.indices {
        Some(indices) => indices.len() / 3,
        None => mesh.vertex_count / 3,
    };
    mesh
}

fn decode(
    semantic: Semantic,
    accessor: &gltf::Accessor,
    buffers: &[gltf::buffer::Data],
    path: &str,
) -> Option<AttributeData> {
    let Some(reference) = AccessorRef::from_gltf(accessor) else {
        log::warn!(
            "MODEL: [{}] {} accessor {} has no buffer view, skipping",
            path,
            semantic,
            accessor.index()
        );
        return None;
    };
    let Some(buffer) = buffers.get(reference.buffer) else {
        log::warn!("MODEL: [{}] Buffer {} not loaded", path, reference.buffer);
        return None;
    };
    if reference.end().is_none_or(|end| end > buffer.len()) {
        log::warn!(
            "MODEL: [{}] {} accessor {} reads past the end of buffer {}, skipping",
            path,
            semantic,
            accessor.index(),
            reference.buffer
        );
        return None;
    }
    match negotiate(semantic, &reference, buffer) {
        Ok(data) => Some(data),
        Err(e) => {
            log::warn!("MODEL: [{}] {}", path, e);
            None
        }
    }
}
