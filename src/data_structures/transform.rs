//! Node-local transformation data.
//!
//! glTF nodes carry translation, rotation and scale separately. The renderer
//! only ever consumes the composed matrix, which is precomputed once per node
//! at load time.

use cgmath::{One, SquareMatrix};

/// Local transformation: translation, rotation (as quaternion) and scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Transform {
    /// Create a new transform with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            translation: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Build from glTF's decomposed form, rotation given as `[x, y, z, w]`.
    pub fn from_decomposed(translation: [f32; 3], rotation: [f32; 4], scale: [f32; 3]) -> Self {
        Self {
            translation: translation.into(),
            rotation: cgmath::Quaternion::new(rotation[3], rotation[0], rotation[1], rotation[2]),
            scale: scale.into(),
        }
    }

    /// Scale first, then rotate, then translate.
    ///
    /// cgmath uses column vectors, so the product reads right to left.
    pub fn to_matrix(&self) -> cgmath::Matrix4<f32> {
        cgmath::Matrix4::from_translation(self.translation)
            * cgmath::Matrix4::from(self.rotation)
            * cgmath::Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl From<cgmath::Vector3<f32>> for Transform {
    fn from(translation: cgmath::Vector3<f32>) -> Self {
        Transform {
            translation,
            ..Default::default()
        }
    }
}

/// Matrix for the convenience draw entry points: scale, rotate about `axis`
/// by `angle_deg` degrees, then translate to `position`.
///
/// A zero rotation axis is treated as "no rotation".
pub fn placement_matrix(
    position: cgmath::Vector3<f32>,
    axis: cgmath::Vector3<f32>,
    angle_deg: f32,
    scale: cgmath::Vector3<f32>,
) -> cgmath::Matrix4<f32> {
    use cgmath::InnerSpace;

    let rotation = if axis.magnitude2() > 0.0 {
        cgmath::Matrix4::from_axis_angle(axis.normalize(), cgmath::Deg(angle_deg))
    } else {
        cgmath::Matrix4::identity()
    };
    cgmath::Matrix4::from_translation(position)
        * rotation
        * cgmath::Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z)
}
