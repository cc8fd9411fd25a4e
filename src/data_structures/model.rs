//! Loaded models and the hierarchical draw traversal.
//!
//! A [`Model`] owns flat arrays: the flattened meshes (CPU copy plus the
//! backend handle), the materials, the mesh-to-material mapping, the nodes and
//! the scenes. Everything that refers to something else does so by index.
//!
//! Drawing never mutates the model. The convenience entry points compute a
//! placement matrix and delegate to the explicit-transform ones, and tints are
//! applied to a per-call copy of the material.

use cgmath::SquareMatrix;

use crate::{
    data_structures::{
        color::Color,
        material::RenderMaterial,
        mesh::RenderMesh,
        scene_graph::{Node, Scene},
        transform::placement_matrix,
    },
    render::{RenderBackend, WireframeGuard},
};

pub struct Model<B: RenderBackend> {
    /// Whole-model transform, identity after loading. Applied before the
    /// placement of [`draw`](Self::draw) and [`draw_ex`](Self::draw_ex).
    pub transform: cgmath::Matrix4<f32>,
    pub meshes: Vec<RenderMesh>,
    /// Backend handle per mesh, `None` where the upload failed.
    pub gpu_meshes: Vec<Option<B::Mesh>>,
    /// Index 0 is always the default material.
    pub materials: Vec<RenderMaterial<B::Texture>>,
    /// `materials[mesh_material[i]]` is the material of `meshes[i]`.
    pub mesh_material: Vec<usize>,
    pub nodes: Vec<Node>,
    pub scenes: Vec<Scene>,
    /// Default scene, if the asset declared one.
    pub scene: Option<usize>,
}

impl<B: RenderBackend> Default for Model<B> {
    fn default() -> Self {
        Self {
            transform: cgmath::Matrix4::identity(),
            meshes: Vec::new(),
            gpu_meshes: Vec::new(),
            materials: Vec::new(),
            mesh_material: Vec::new(),
            nodes: Vec::new(),
            scenes: Vec::new(),
            scene: None,
        }
    }
}

impl<B: RenderBackend> Model<B> {
    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// The scene drawn by [`draw`](Self::draw): the default scene, provided it
    /// exists and has at least one root node.
    pub fn active_scene(&self) -> Option<usize> {
        self.scene
            .filter(|&id| self.scenes.get(id).is_some_and(|scene| !scene.nodes.is_empty()))
    }

    /// Draw at `position` with uniform `scale`.
    pub fn draw(
        &self,
        backend: &mut B,
        position: cgmath::Vector3<f32>,
        scale: f32,
        tint: Color,
    ) -> anyhow::Result<()> {
        self.draw_ex(
            backend,
            position,
            cgmath::Vector3::unit_y(),
            0.0,
            cgmath::Vector3::new(scale, scale, scale),
            tint,
        )
    }

    /// Draw with a rotation of `rotation_angle` degrees about `rotation_axis`
    /// and a non-uniform `scale`.
    pub fn draw_ex(
        &self,
        backend: &mut B,
        position: cgmath::Vector3<f32>,
        rotation_axis: cgmath::Vector3<f32>,
        rotation_angle: f32,
        scale: cgmath::Vector3<f32>,
        tint: Color,
    ) -> anyhow::Result<()> {
        let transform =
            placement_matrix(position, rotation_axis, rotation_angle, scale) * self.transform;
        match self.active_scene() {
            Some(scene) => self.draw_scene(backend, scene, transform, tint),
            None => self.draw_flat(backend, transform, tint),
        }
    }

    pub fn draw_wires(
        &self,
        backend: &mut B,
        position: cgmath::Vector3<f32>,
        scale: f32,
        tint: Color,
    ) -> anyhow::Result<()> {
        let mut backend = WireframeGuard::new(backend);
        self.draw(&mut backend, position, scale, tint)
    }

    pub fn draw_wires_ex(
        &self,
        backend: &mut B,
        position: cgmath::Vector3<f32>,
        rotation_axis: cgmath::Vector3<f32>,
        rotation_angle: f32,
        scale: cgmath::Vector3<f32>,
        tint: Color,
    ) -> anyhow::Result<()> {
        let mut backend = WireframeGuard::new(backend);
        self.draw_ex(&mut backend, position, rotation_axis, rotation_angle, scale, tint)
    }

    /// Draw every root of scene `scene_id` under `transform`.
    ///
    /// Unknown scene ids draw nothing.
    pub fn draw_scene(
        &self,
        backend: &mut B,
        scene_id: usize,
        transform: cgmath::Matrix4<f32>,
        tint: Color,
    ) -> anyhow::Result<()> {
        let Some(scene) = self.scenes.get(scene_id) else {
            log::debug!("Ignoring draw of unknown scene {}", scene_id);
            return Ok(());
        };
        for &root in &scene.nodes {
            self.draw_node(backend, root, transform, tint)?;
        }
        Ok(())
    }

    pub fn draw_scene_wires(
        &self,
        backend: &mut B,
        scene_id: usize,
        transform: cgmath::Matrix4<f32>,
        tint: Color,
    ) -> anyhow::Result<()> {
        let mut backend = WireframeGuard::new(backend);
        self.draw_scene(&mut backend, scene_id, transform, tint)
    }

    /// Draw the subtree rooted at `node_id` with `parent` as the parent's
    /// world matrix.
    ///
    /// Nodes with children only draw their children. Their own meshes, if any,
    /// are never drawn.
    pub fn draw_node(
        &self,
        backend: &mut B,
        node_id: usize,
        parent: cgmath::Matrix4<f32>,
        tint: Color,
    ) -> anyhow::Result<()> {
        let Some(node) = self.nodes.get(node_id) else {
            log::debug!("Ignoring draw of unknown node {}", node_id);
            return Ok(());
        };
        let transform = parent * node.matrix;
        if node.has_children() {
            for &child in &node.children {
                self.draw_node(backend, child, transform, tint)?;
            }
        } else if let Some(meshes) = &node.meshes {
            for mesh in meshes.clone() {
                self.draw_mesh(backend, mesh, transform, tint)?;
            }
        }
        Ok(())
    }

    pub fn draw_node_wires(
        &self,
        backend: &mut B,
        node_id: usize,
        parent: cgmath::Matrix4<f32>,
        tint: Color,
    ) -> anyhow::Result<()> {
        let mut backend = WireframeGuard::new(backend);
        self.draw_node(&mut backend, node_id, parent, tint)
    }

    fn draw_flat(
        &self,
        backend: &mut B,
        transform: cgmath::Matrix4<f32>,
        tint: Color,
    ) -> anyhow::Result<()> {
        for mesh in 0..self.meshes.len() {
            self.draw_mesh(backend, mesh, transform, tint)?;
        }
        Ok(())
    }

    fn draw_mesh(
        &self,
        backend: &mut B,
        mesh: usize,
        transform: cgmath::Matrix4<f32>,
        tint: Color,
    ) -> anyhow::Result<()> {
        let Some(Some(handle)) = self.gpu_meshes.get(mesh) else {
            log::debug!("Skipping mesh {} without GPU data", mesh);
            return Ok(());
        };
        let slot = self.mesh_material.get(mesh).copied().unwrap_or(0);
        let Some(material) = self.materials.get(slot).or_else(|| self.materials.first()) else {
            log::debug!("Skipping mesh {}, model has no materials", mesh);
            return Ok(());
        };
        if tint == Color::WHITE {
            backend.draw_mesh(handle, material, transform)
        } else {
            backend.draw_mesh(handle, &material.tinted(tint), transform)
        }
    }

    /// Release every uploaded mesh and drop the CPU-side data.
    ///
    /// Material textures are left alone: the handles may be shared with
    /// other models and are released when their last clone drops.
    pub fn unload(self, backend: &mut B) {
        for mesh in self.gpu_meshes.into_iter().flatten() {
            backend.release_mesh(mesh);
        }
        log::info!("Unloaded model (and meshes) from RAM and VRAM");
    }
}
