//! A headless backend that records every call it receives.
//!
//! Useful to validate what a model would draw without a GPU, and used as the
//! backend double throughout the test suite.

use image::RgbaImage;

use crate::{
    data_structures::{
        color::Color,
        material::{MaterialMapKind, RenderMaterial},
        mesh::RenderMesh,
    },
    render::RenderBackend,
};

/// Handle returned by [`DrawRecorder::upload_mesh`], the upload sequence number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

/// Handle returned by [`DrawRecorder::create_texture`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TextureId {
    pub id: usize,
    pub label: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UploadedMesh {
    pub label: String,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub indexed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawCall {
    pub mesh: MeshId,
    pub transform: cgmath::Matrix4<f32>,
    /// Albedo colour after tinting.
    pub color: Color,
    pub albedo: Option<TextureId>,
    pub wireframe: bool,
}

#[derive(Debug, Default)]
pub struct DrawRecorder {
    pub meshes: Vec<UploadedMesh>,
    pub textures: Vec<TextureId>,
    pub draws: Vec<DrawCall>,
    pub released: Vec<MeshId>,
    pub wireframe: bool,
    /// Makes every `draw_mesh` fail, after recording the call.
    pub fail_draws: bool,
}

impl DrawRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget recorded draws, keeping uploads.
    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }
}

impl RenderBackend for DrawRecorder {
    type Mesh = MeshId;
    type Texture = TextureId;

    fn upload_mesh(&mut self, mesh: &RenderMesh) -> anyhow::Result<MeshId> {
        self.meshes.push(UploadedMesh {
            label: mesh.label.clone(),
            vertex_count: mesh.vertex_count,
            triangle_count: mesh.triangle_count,
            indexed: mesh.indices.is_some(),
        });
        Ok(MeshId(self.meshes.len() - 1))
    }

    fn release_mesh(&mut self, mesh: MeshId) {
        self.released.push(mesh);
    }

    fn create_texture(
        &mut self,
        image: &RgbaImage,
        _kind: MaterialMapKind,
        label: &str,
    ) -> anyhow::Result<TextureId> {
        let texture = TextureId {
            id: self.textures.len(),
            label: label.to_string(),
            width: image.width(),
            height: image.height(),
        };
        self.textures.push(texture.clone());
        Ok(texture)
    }

    fn draw_mesh(
        &mut self,
        mesh: &MeshId,
        material: &RenderMaterial<TextureId>,
        transform: cgmath::Matrix4<f32>,
    ) -> anyhow::Result<()> {
        self.draws.push(DrawCall {
            mesh: *mesh,
            transform,
            color: material[MaterialMapKind::Albedo].color,
            albedo: material.texture(MaterialMapKind::Albedo).cloned(),
            wireframe: self.wireframe,
        });
        if self.fail_draws {
            anyhow::bail!("draw of mesh {} rejected", mesh.0);
        }
        Ok(())
    }

    fn set_wireframe(&mut self, enabled: bool) {
        self.wireframe = enabled;
    }
}
