//! Model data structures: meshes, materials, the scene graph and transforms.
//!
//! - `model` owns all loaded arrays and implements the draw traversal
//! - `mesh` holds CPU-side flattened meshes
//! - `material` holds texture map slots with colours and scalar values
//! - `scene_graph` holds index-addressed nodes and scenes
//! - `transform` holds node-local translation, rotation and scale
//! - `color` is the RGBA8 colour used for tints
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `vertex` is the interleaved GPU vertex layout

pub mod color;
pub mod material;
pub mod mesh;
pub mod model;
pub mod scene_graph;
pub mod texture;
pub mod transform;
pub mod vertex;
