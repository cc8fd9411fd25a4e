//! flow-gltf
//!
//! Imports glTF 2.0 assets (`.gltf` with external or embedded buffers, and
//! `.glb`) into flat, index-addressed render models and draws them
//! hierarchically. Rendering goes through a small capability trait, so the
//! same model can be drawn by the wgpu backend or recorded headlessly.
//!
//! High-level modules
//! - `context`: headless GPU context that owns device/queue
//! - `data_structures`: model data (meshes, materials, nodes, transforms, textures)
//! - `pipelines`: wgpu render pipeline used by the GPU backend
//! - `render`: the `RenderBackend` trait, the wgpu backend and a draw recorder
//! - `resources`: loading glTF files into models
//!

pub mod context;
pub mod data_structures;
pub mod pipelines;
pub mod render;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use data_structures::{color::Color, model::Model};
pub use render::RenderBackend;
pub use resources::{LoadOptions, load_model, load_model_from_slice, load_model_with};
