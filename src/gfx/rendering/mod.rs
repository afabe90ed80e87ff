//! Core rendering functionality
//!
//! Frame composition, render pipelines, bloom and the wgpu backend.

pub mod bloom;
pub mod compositor;
pub mod pipeline_manager;
pub mod render_engine;

// Re-export main types
pub use bloom::BloomPass;
pub use compositor::{BloomParams, FrameBackend, FrameCompositor, RenderPass, RenderTarget};
pub use pipeline_manager::{PipelineConfig, PipelineManager, PipelineStats};
pub use render_engine::RenderEngine;
