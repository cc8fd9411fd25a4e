//! Render pipelines for the wgpu backend.

pub mod basic;
