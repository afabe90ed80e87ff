//! # Distortion Effect
//!
//! The paired fill + wireframe effect: uniform contract, materials, the CPU
//! mirror of the displacement, variant sets and the scene registry.

pub mod config;
pub mod distortion;
pub mod material;
pub mod scene;
pub mod uniforms;
pub mod variant_set;

pub use config::EffectConfig;
pub use material::{effect_material_layout, EffectMaterial, EffectVariant};
pub use scene::{EffectScene, VariantSetId};
pub use uniforms::{EffectUniform, UniformLayout, UniformName, UniformRange, UniformSet};
pub use variant_set::{DrawVariantSet, MeshVariantSet};
