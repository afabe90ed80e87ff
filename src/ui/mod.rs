//! # User Interface Module
//!
//! Dear ImGui parameter panel on top of the effect.
//!
//! - [`ParameterBus`] - named, range-constrained controls and their routing
//! - [`parameter_panel`] - ImGui rendering of the bus, folders Scene,
//!   Distortion and Bloom
//! - [`UiManager`] - ImGui integration with winit and wgpu
//!
//! While the panel has the pointer or keyboard, camera input is ignored.

pub mod manager;
pub mod panel;
pub mod parameter_bus;

// Re-export main types
pub use manager::UiManager;
pub use panel::{parameter_panel, PanelEdit};
pub use parameter_bus::{
    BloomField, ControlTarget, ControlValue, PanelFolder, ParameterBus, ParameterChange,
    ParameterControl,
};
