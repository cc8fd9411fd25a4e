//! Loading glTF assets into [`Model`]s.
//!
//! Loading happens in one blocking call: parse the container, resolve every
//! buffer, build materials, flatten meshes, build the node and scene tables,
//! then upload meshes and textures through the given
//! [`RenderBackend`]. The CPU-side steps live in their own modules:
//!
//! - `attribute` decodes vertex attribute and index accessors
//! - `image` resolves texture images from URIs and buffer views
//! - `material` builds materials from the metallic-roughness model
//! - `mesh` flattens primitives into a single mesh list
//! - `hierarchy` builds node and scene tables
//!
//! None of the entry points fail. Anything that goes wrong is logged and the
//! caller gets an empty model, with the fallbacks of [`LoadOptions`] applied.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{
    data_structures::{material::RenderMaterial, mesh::RenderMesh, model::Model},
    render::RenderBackend,
    resources::{hierarchy::build_hierarchy, material::build_material, mesh::flatten_meshes},
};

pub mod attribute;
pub mod hierarchy;
pub mod image;
pub mod material;
pub mod mesh;

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    /// Generate a 1x1x1 cube when the asset yields no meshes.
    pub placeholder_mesh: bool,
    /// Directory external buffers and textures are resolved against.
    /// Defaults to the asset's directory, or the working directory for
    /// in-memory assets.
    pub base_dir: Option<PathBuf>,
}

pub fn load_model<B: RenderBackend>(path: impl AsRef<Path>, backend: &mut B) -> Model<B> {
    load_model_with(path, &LoadOptions::default(), backend)
}

pub fn load_model_with<B: RenderBackend>(
    path: impl AsRef<Path>,
    options: &LoadOptions,
    backend: &mut B,
) -> Model<B> {
    let path = path.as_ref();
    let label = path.display().to_string();
    let base_dir = options
        .base_dir
        .clone()
        .or_else(|| path.parent().map(Path::to_path_buf))
        .unwrap_or_default();

    let loaded = std::fs::read(path)
        .with_context(|| format!("failed to read {}", label))
        .and_then(|bytes| assemble(&bytes, &base_dir, &label, backend));
    finish(loaded, &label, options, backend)
}

/// Load an asset that is already in memory, typically a `.glb`.
pub fn load_model_from_slice<B: RenderBackend>(
    bytes: &[u8],
    options: &LoadOptions,
    backend: &mut B,
) -> Model<B> {
    let base_dir = options.base_dir.clone().unwrap_or_default();
    let loaded = assemble(bytes, &base_dir, "<memory>", backend);
    finish(loaded, "<memory>", options, backend)
}

fn assemble<B: RenderBackend>(
    bytes: &[u8],
    base_dir: &Path,
    label: &str,
    backend: &mut B,
) -> anyhow::Result<Model<B>> {
    let gltf::Gltf { document, blob } =
        gltf::Gltf::from_slice(bytes).context("failed to parse glTF data")?;
    let buffers = gltf::import_buffers(&document, Some(base_dir), blob)
        .context("failed to load glTF buffers")?;

    let file_type = if bytes.starts_with(b"glTF") { "glb" } else { "gltf" };
    log::info!("MODEL: [{}] Model basic data ({}) loaded successfully", label, file_type);
    log::info!("    > Meshes count: {}", document.meshes().count());
    log::info!("    > Materials count: {} (+1 default)", document.materials().count());
    log::debug!("    > Buffers count: {}", document.buffers().count());
    log::debug!("    > Images count: {}", document.images().count());
    log::debug!("    > Textures count: {}", document.textures().count());
    log::debug!("    > Nodes count: {}", document.nodes().count());
    log::debug!("    > Scenes count: {}", document.scenes().count());

    let cpu_materials: Vec<_> = std::iter::once(RenderMaterial::new_default())
        .chain(
            document
                .materials()
                .map(|material| build_material(&material, &buffers, base_dir)),
        )
        .collect();
    let flat = flatten_meshes(&document, &buffers, label);
    let hierarchy = build_hierarchy(&document, &flat.ranges)?;

    let gpu_meshes = flat
        .meshes
        .iter()
        .map(|mesh| upload(backend, mesh, label))
        .collect();
    let materials = cpu_materials
        .into_iter()
        .enumerate()
        .map(|(i, material)| {
            material.try_map_textures(
                |kind, image| backend.create_texture(&image, kind, &format!("{} material {} {:?}", label, i, kind)),
                |kind, e| log::warn!("MODEL: [{}] Material {} {:?} texture not created: {:#}", label, i, kind, e),
            )
        })
        .collect();

    Ok(Model {
        meshes: flat.meshes,
        gpu_meshes,
        materials,
        mesh_material: flat.mesh_material,
        nodes: hierarchy.nodes,
        scenes: hierarchy.scenes,
        scene: hierarchy.scene,
        ..Default::default()
    })
}

fn upload<B: RenderBackend>(backend: &mut B, mesh: &RenderMesh, label: &str) -> Option<B::Mesh> {
    match backend.upload_mesh(mesh) {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("MODEL: [{}] Mesh {} not uploaded: {:#}", label, mesh.label, e);
            None
        }
    }
}

fn finish<B: RenderBackend>(
    loaded: anyhow::Result<Model<B>>,
    label: &str,
    options: &LoadOptions,
    backend: &mut B,
) -> Model<B> {
    let mut model = loaded.unwrap_or_else(|e| {
        log::warn!("MODEL: [{}] Failed to load glTF data: {:#}", label, e);
        Model::default()
    });

    if model.meshes.is_empty() {
        log::warn!("MODEL: [{}] No meshes loaded", label);
        if options.placeholder_mesh {
            let cube = RenderMesh::cube(1.0, 1.0, 1.0);
            model.gpu_meshes.push(upload(backend, &cube, label));
            model.meshes.push(cube);
            model.mesh_material.push(0);
        }
    }
    if model.materials.is_empty() {
        log::warn!("MODEL: [{}] No materials loaded, using default material", label);
        model.materials.push(RenderMaterial::new_default());
    }
    model
}
