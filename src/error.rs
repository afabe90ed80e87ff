//! Error types
//!
//! Every fallible operation in the crate returns [`Result<T>`], an alias for
//! `std::result::Result<T, EffectError>`. Errors are either hard construction
//! failures or propagated rejections; nothing is swallowed.

use thiserror::Error;

use crate::gfx::effect::uniforms::{UniformLayout, UniformName};

/// The main error type for the effect pipeline.
#[derive(Error, Debug)]
pub enum EffectError {
    // ========================================================================
    // Invalid input
    // ========================================================================
    /// A vertex buffer that is not a triangle soup.
    #[error("Vertex count {vertex_count} is not a multiple of 3; expected a triangle soup")]
    InvalidTriangleSoup { vertex_count: usize },

    /// An index references a vertex that does not exist.
    #[error("Index {index} is out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },

    // ========================================================================
    // Asset failures
    // ========================================================================
    /// The OBJ loader rejected the file.
    #[error("Failed to load mesh '{path}': {source}")]
    AssetLoad {
        path: String,
        #[source]
        source: tobj::LoadError,
    },

    /// The file loaded but contained no triangles.
    #[error("Mesh '{path}' contains no triangles")]
    EmptyAsset { path: String },

    /// The load was cancelled before it resolved.
    #[error("Mesh load was cancelled")]
    LoadCancelled,

    // ========================================================================
    // Contract errors
    // ========================================================================
    /// A uniform name that the material's layout does not expose.
    #[error("Uniform '{name}' is not part of the {layout:?} uniform set")]
    UnknownUniform { name: String, layout: UniformLayout },

    /// A value outside the configured range of a uniform or control.
    #[error("Value {value} for '{name}' is outside [{min}, {max}]")]
    ValueOutOfRange {
        name: String,
        value: f32,
        min: f32,
        max: f32,
    },

    /// A parameter control key the bus does not know.
    #[error("Unknown parameter control '{0}'")]
    UnknownControl(String),

    /// A pass list that does not describe Base followed by an optional Bloom.
    #[error("Invalid pass configuration: {0}")]
    InvalidPassOrder(String),

    /// Attempt to reorder passes after rendering started.
    #[error("Pass order is fixed once the first frame has been rendered")]
    PassOrderLocked,

    /// Bloom parameters were changed but no Bloom pass is configured.
    #[error("No bloom pass is configured")]
    BloomNotConfigured,

    /// Bloom was recorded before its targets were sized, or after release.
    #[error("Bloom targets are not allocated")]
    BloomTargetsMissing,

    /// The driver was asked to run with nothing registered.
    #[error("No mesh variant set is registered; nothing to render")]
    NothingToRender,

    /// The driver was asked to start while a mesh load is still in flight.
    #[error("A mesh load is still pending")]
    LoadPending,

    /// A variant set id that is not registered in the scene.
    #[error("Mesh variant set {0} is not registered")]
    UnknownVariantSet(usize),

    /// A frame step was requested outside `begin_frame`/`end_frame`.
    #[error("No frame is being recorded")]
    NoActiveFrame,

    /// A pipeline requested by name was never registered.
    #[error("Render pipeline '{0}' is not available")]
    MissingPipeline(String),

    // ========================================================================
    // Resource errors
    // ========================================================================
    /// Failed to acquire the next surface texture.
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),

    /// Failed to create the presentation surface.
    #[error("Failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequest(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// The UI overlay renderer failed.
    #[error("Overlay rendering failed: {0}")]
    Overlay(String),

    /// Window creation failed (winit).
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    /// Event loop error (winit).
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

impl EffectError {
    pub(crate) fn unknown_uniform(name: impl Into<String>, layout: UniformLayout) -> Self {
        EffectError::UnknownUniform {
            name: name.into(),
            layout,
        }
    }

    pub(crate) fn out_of_range(name: UniformName, value: f32, min: f32, max: f32) -> Self {
        EffectError::ValueOutOfRange {
            name: name.as_str().to_string(),
            value,
            min,
            max,
        }
    }

    /// Frame errors the host logs and renders past. A failed mesh load leaves
    /// the driver idle with the panel still usable; a lost surface has
    /// already been reconfigured.
    pub fn is_recoverable(&self) -> bool {
        match self {
            EffectError::AssetLoad { .. } | EffectError::EmptyAsset { .. } | EffectError::LoadCancelled => true,
            EffectError::Surface(e) => !matches!(e, wgpu::SurfaceError::OutOfMemory),
            _ => false,
        }
    }
}

/// Alias for `Result<T, EffectError>`.
pub type Result<T> = std::result::Result<T, EffectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_and_surface_errors_are_recoverable() {
        assert!(EffectError::EmptyAsset {
            path: "empty.obj".to_string()
        }
        .is_recoverable());
        assert!(EffectError::AssetLoad {
            path: "missing.obj".to_string(),
            source: tobj::LoadError::OpenFileFailed,
        }
        .is_recoverable());
        assert!(EffectError::LoadCancelled.is_recoverable());
        assert!(EffectError::Surface(wgpu::SurfaceError::Lost).is_recoverable());
        assert!(EffectError::Surface(wgpu::SurfaceError::Outdated).is_recoverable());
    }

    #[test]
    fn test_contract_and_resource_errors_are_fatal() {
        assert!(!EffectError::Surface(wgpu::SurfaceError::OutOfMemory).is_recoverable());
        assert!(!EffectError::NoActiveFrame.is_recoverable());
        assert!(!EffectError::BloomNotConfigured.is_recoverable());
        assert!(!EffectError::Overlay("lost".to_string()).is_recoverable());
    }
}
