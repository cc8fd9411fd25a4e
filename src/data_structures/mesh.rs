//! CPU-side render meshes.
//!
//! A [`RenderMesh`] is one flattened glTF primitive with tightly packed
//! attribute arrays. Optional channels stay `None` when the asset does not
//! provide them in a supported format.

/// A triangle mesh ready to be uploaded to a [`RenderBackend`](crate::render::RenderBackend).
///
/// All arrays are flat: `positions` and `normals` hold 3 floats per vertex,
/// `tangents` 4, `tex_coords` 2 and `colors` 4 bytes.
///
/// When `indices` is `None` the mesh is drawn unindexed and
/// `triangle_count == vertex_count / 3`. A vertex count that is not a multiple
/// of three is the asset's problem and is not validated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderMesh {
    pub label: String,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub positions: Vec<f32>,
    pub normals: Option<Vec<f32>>,
    pub tangents: Option<Vec<f32>>,
    pub tex_coords: Option<Vec<f32>>,
    pub colors: Option<Vec<u8>>,
    pub indices: Option<Vec<u16>>,
}

impl RenderMesh {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }

    /// Number of indices (or vertices, when unindexed) a draw call consumes.
    pub fn element_count(&self) -> usize {
        match &self.indices {
            Some(indices) => indices.len(),
            None => self.triangle_count * 3,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }

    /// Axis-aligned box centred at the origin, used as placeholder geometry
    /// for assets that produced no meshes.
    pub fn cube(width: f32, height: f32, length: f32) -> Self {
        let (x, y, z) = (width / 2.0, height / 2.0, length / 2.0);
        // (normal, four corners counter-clockwise seen from outside)
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [[-x, -y, z], [x, -y, z], [x, y, z], [-x, y, z]]),
            ([0.0, 0.0, -1.0], [[x, -y, -z], [-x, -y, -z], [-x, y, -z], [x, y, -z]]),
            ([1.0, 0.0, 0.0], [[x, -y, z], [x, -y, -z], [x, y, -z], [x, y, z]]),
            ([-1.0, 0.0, 0.0], [[-x, -y, -z], [-x, -y, z], [-x, y, z], [-x, y, -z]]),
            ([0.0, 1.0, 0.0], [[-x, y, z], [x, y, z], [x, y, -z], [-x, y, -z]]),
            ([0.0, -1.0, 0.0], [[-x, -y, -z], [x, -y, -z], [x, -y, z], [-x, -y, z]]),
        ];
        let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

        let mut positions = Vec::with_capacity(24 * 3);
        let mut normals = Vec::with_capacity(24 * 3);
        let mut tex_coords = Vec::with_capacity(24 * 2);
        let mut indices = Vec::with_capacity(36);
        for (face, (normal, corners)) in faces.iter().enumerate() {
            for (corner, uv) in corners.iter().zip(uvs.iter()) {
                positions.extend_from_slice(corner);
                normals.extend_from_slice(normal);
                tex_coords.extend_from_slice(uv);
            }
            let base = (face * 4) as u16;
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self {
            label: "cube".to_string(),
            vertex_count: 24,
            triangle_count: 12,
            positions,
            normals: Some(normals),
            tangents: None,
            tex_coords: Some(tex_coords),
            colors: None,
            indices: Some(indices),
        }
    }
}
