//! Index-addressed scene hierarchy.
//!
//! Nodes reference their children and their meshes by index into the owning
//! [`Model`](crate::data_structures::model::Model)'s arrays. There are no
//! parent links and no cached world transforms: the absolute transform of a
//! node only exists while a draw traversal walks down to it.

use std::ops::Range;

use crate::data_structures::transform::Transform;

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub name: Option<String>,
    /// Child node indices in declaration order.
    pub children: Vec<usize>,
    /// Range into the model's flattened meshes. `None` when the node carries
    /// no mesh; an empty range when its mesh had no triangle primitives.
    pub meshes: Option<Range<usize>>,
    pub transform: Transform,
    /// `transform.to_matrix()`, computed once at load.
    pub matrix: cgmath::Matrix4<f32>,
}

impl Node {
    pub fn new(transform: Transform) -> Self {
        Self {
            name: None,
            children: Vec::new(),
            meshes: None,
            matrix: transform.to_matrix(),
            transform,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn has_mesh(&self) -> bool {
        self.meshes.is_some()
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(Transform::default())
    }
}

/// A list of root nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scene {
    pub name: Option<String>,
    pub nodes: Vec<usize>,
}
