// src/lib.rs
//! Fracture
//!
//! A centroid-driven mesh distortion effect built on wgpu and winit. Each
//! triangle of a mesh is pushed along an axis by an amount that depends on
//! how far its centroid sits from an animated distortion position. Every
//! mesh is drawn twice (fill and wireframe), optionally followed by a bloom
//! pass, with a live parameter panel on top.

pub mod animation;
pub mod app;
pub mod assets;
pub mod error;
pub mod events;
pub mod gfx;
pub mod prelude;
pub mod ui;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::{AppConfig, FractureApp};
pub use error::{EffectError, Result};
