//! Interleaved vertex layout used by the wgpu backend.

use cgmath::InnerSpace;

use crate::data_structures::mesh::RenderMesh;

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    /// xyz tangent, w handedness of the bitangent.
    pub tangent: [f32; 4],
    pub color: [f32; 4],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Interleave the channels of `mesh`, filling in whatever it lacks.
///
/// Missing colours default to white, missing normals to +Z. Missing tangents
/// are derived from positions and UVs.
pub fn interleave(mesh: &RenderMesh) -> Vec<ModelVertex> {
    let mut vertices: Vec<ModelVertex> = (0..mesh.vertex_count)
        .map(|i| ModelVertex {
            position: [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ],
            tex_coords: mesh
                .tex_coords
                .as_ref()
                .and_then(|uv| Some([*uv.get(i * 2)?, *uv.get(i * 2 + 1)?]))
                .unwrap_or_default(),
            normal: mesh
                .normals
                .as_ref()
                .and_then(|n| Some([*n.get(i * 3)?, *n.get(i * 3 + 1)?, *n.get(i * 3 + 2)?]))
                .unwrap_or([0.0, 0.0, 1.0]),
            tangent: mesh
                .tangents
                .as_ref()
                .and_then(|t| {
                    Some([*t.get(i * 4)?, *t.get(i * 4 + 1)?, *t.get(i * 4 + 2)?, *t.get(i * 4 + 3)?])
                })
                .unwrap_or_default(),
            color: mesh
                .colors
                .as_ref()
                .and_then(|c| {
                    let c = c.get(i * 4..i * 4 + 4)?;
                    Some([c[0], c[1], c[2], c[3]].map(|v| v as f32 / 255.0))
                })
                .unwrap_or([1.0; 4]),
        })
        .collect();

    if mesh.tangents.is_none() {
        compute_tangents(&mut vertices, mesh.indices.as_deref());
    }
    vertices
}

/// Per-vertex tangents averaged over the triangles sharing the vertex.
fn compute_tangents(vertices: &mut [ModelVertex], indices: Option<&[u16]>) {
    let triangles: Vec<[usize; 3]> = match indices {
        Some(indices) => indices
            .chunks_exact(3)
            .map(|c| [c[0] as usize, c[1] as usize, c[2] as usize])
            .collect(),
        None => (0..vertices.len() / 3).map(|t| [t * 3, t * 3 + 1, t * 3 + 2]).collect(),
    };
    let mut accumulated = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); vertices.len()];

    for [a, b, c] in triangles {
        if a >= vertices.len() || b >= vertices.len() || c >= vertices.len() {
            continue;
        }
        let pos0: cgmath::Vector3<f32> = vertices[a].position.into();
        let pos1: cgmath::Vector3<f32> = vertices[b].position.into();
        let pos2: cgmath::Vector3<f32> = vertices[c].position.into();
        let uv0: cgmath::Vector2<f32> = vertices[a].tex_coords.into();
        let uv1: cgmath::Vector2<f32> = vertices[b].tex_coords.into();
        let uv2: cgmath::Vector2<f32> = vertices[c].tex_coords.into();

        let delta_pos1 = pos1 - pos0;
        let delta_pos2 = pos2 - pos0;
        let delta_uv1 = uv1 - uv0;
        let delta_uv2 = uv2 - uv0;

        // delta_pos1 = delta_uv1.x * T + delta_uv1.y * B
        // delta_pos2 = delta_uv2.x * T + delta_uv2.y * B
        let det = delta_uv1.x * delta_uv2.y - delta_uv1.y * delta_uv2.x;
        if det.abs() < f32::EPSILON {
            continue;
        }
        let tangent = (delta_pos1 * delta_uv2.y - delta_pos2 * delta_uv1.y) / det;
        for i in [a, b, c] {
            accumulated[i] += tangent;
        }
    }

    for (vertex, tangent) in vertices.iter_mut().zip(accumulated) {
        let t = if tangent.magnitude2() > 0.0 {
            tangent.normalize()
        } else {
            cgmath::Vector3::unit_x()
        };
        vertex.tangent = [t.x, t.y, t.z, 1.0];
    }
}
