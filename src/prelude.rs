//! # Fracture Prelude
//!
//! Commonly used types for building an effect application.
//!
//! ```no_run
//! use fracture::prelude::*;
//!
//! fn main() -> fracture::Result<()> {
//!     let mut app = FractureApp::new(AppConfig::default())?;
//!     app.add_mesh(generate_box(1.0, 1.0, 1.0, 10, 10, 10), EffectConfig::two_parameter());
//!     app.run()
//! }
//! ```

// Application
pub use crate::app::{AppConfig, FractureApp};
pub use crate::error::{EffectError, Result};

// Effect and geometry
pub use crate::gfx::effect::{
    EffectConfig, EffectMaterial, EffectScene, EffectVariant, MeshVariantSet, UniformLayout,
    UniformName, VariantSetId,
};
pub use crate::gfx::geometry::{compute_centroids, generate_box, AugmentedGeometry, RawMesh};

// Frame composition
pub use crate::gfx::rendering::{BloomParams, FrameBackend, FrameCompositor, RenderPass};

// Driving and loading
pub use crate::animation::{AnimationDriver, EffectContext, FrameOutcome};
pub use crate::assets::{AssetLoader, LoadHandle};
pub use crate::events::{SurfaceEvents, SurfaceSize};
pub use crate::ui::{ControlValue, ParameterBus};

pub use cgmath::Vector3;
