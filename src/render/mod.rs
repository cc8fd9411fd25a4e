//! Rendering capabilities consumed by [`Model`](crate::data_structures::model::Model).
//!
//! The loader and the draw traversal never talk to a graphics API directly.
//! They go through [`RenderBackend`], which covers exactly what a model needs:
//!
//! - upload and release meshes
//! - create textures from decoded images
//! - draw one mesh with a material and a world matrix
//! - toggle wireframe rasterization
//!
//! Two backends ship with the crate: [`gpu::WgpuBackend`] draws through wgpu,
//! [`recorder::DrawRecorder`] only records what it was asked to do.

use image::RgbaImage;

use crate::data_structures::{
    material::{MaterialMapKind, RenderMaterial},
    mesh::RenderMesh,
};

pub mod gpu;
pub mod recorder;

pub trait RenderBackend {
    /// Handle to an uploaded mesh. Owned by the model that uploaded it.
    type Mesh;
    /// Handle to a texture. Cloning must share the underlying resource, since
    /// textures are referenced from several materials and outlive the model.
    type Texture: Clone;

    fn upload_mesh(&mut self, mesh: &RenderMesh) -> anyhow::Result<Self::Mesh>;

    fn release_mesh(&mut self, mesh: Self::Mesh);

    /// `kind` is the material slot the texture is created for; colour slots
    /// are sRGB, the others hold linear data.
    fn create_texture(
        &mut self,
        image: &RgbaImage,
        kind: MaterialMapKind,
        label: &str,
    ) -> anyhow::Result<Self::Texture>;

    fn draw_mesh(
        &mut self,
        mesh: &Self::Mesh,
        material: &RenderMaterial<Self::Texture>,
        transform: cgmath::Matrix4<f32>,
    ) -> anyhow::Result<()>;

    fn set_wireframe(&mut self, enabled: bool);
}

/// Keeps wireframe mode enabled for as long as it lives.
///
/// Derefs to the backend so draws can be issued through the guard.
pub struct WireframeGuard<'a, B: RenderBackend + ?Sized> {
    backend: &'a mut B,
}

impl<'a, B: RenderBackend + ?Sized> WireframeGuard<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        backend.set_wireframe(true);
        Self { backend }
    }
}

impl<B: RenderBackend + ?Sized> std::ops::Deref for WireframeGuard<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.backend
    }
}

impl<B: RenderBackend + ?Sized> std::ops::DerefMut for WireframeGuard<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.backend
    }
}

impl<B: RenderBackend + ?Sized> Drop for WireframeGuard<'_, B> {
    fn drop(&mut self) {
        self.backend.set_wireframe(false);
    }
}
