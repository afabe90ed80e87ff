//! # Graphics Module
//!
//! Everything that touches geometry or the GPU.
//!
//! - **Geometry** ([`geometry`]) - triangle soups, per-face centroids, box generator
//! - **Effect** ([`effect`]) - distortion uniforms, materials, fill/wireframe variant sets
//! - **Rendering** ([`rendering`]) - pipelines, bloom and the frame compositor
//! - **Camera** ([`camera`]) - orbit camera with mouse controls
//! - **Resources** ([`resources`]) - render targets and the global uniform bind group
//!
//! The GPU-facing half is reached through [`RenderEngine`], which implements
//! [`rendering::FrameBackend`] for [`rendering::FrameCompositor`].

pub mod camera;
pub mod effect;
pub mod geometry;
pub mod rendering;
pub mod resources;

// Re-export commonly used types
pub use camera::orbit_camera::OrbitCamera;
pub use rendering::render_engine::RenderEngine;
