//! Uniform contract of the distortion effect
//!
//! Every material carries the same fixed-shape [`UniformSet`]. The
//! [`UniformLayout`] of its configuration decides which names are settable:
//! the two-parameter layout hides `distortionThickness`, which then keeps its
//! neutral value.

use std::fmt;

/// Neutral band width used when thickness is not exposed.
pub const NEUTRAL_THICKNESS: f32 = 0.5;

/// Which uniforms a material exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformLayout {
    /// `time`, `distortionPosition`, `distortionAmount`
    TwoParameter,
    /// Adds `distortionThickness`
    ThreeParameter,
}

impl UniformLayout {
    /// Whether `name` is part of this layout.
    pub fn exposes(self, name: UniformName) -> bool {
        match name {
            UniformName::DistortionThickness => self == UniformLayout::ThreeParameter,
            _ => true,
        }
    }

    /// User-tunable uniforms of this layout, in panel order.
    pub fn tunable(self) -> &'static [UniformName] {
        match self {
            UniformLayout::TwoParameter => {
                &[UniformName::DistortionPosition, UniformName::DistortionAmount]
            }
            UniformLayout::ThreeParameter => &[
                UniformName::DistortionPosition,
                UniformName::DistortionAmount,
                UniformName::DistortionThickness,
            ],
        }
    }
}

/// Names of the effect uniforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformName {
    Time,
    DistortionPosition,
    DistortionAmount,
    DistortionThickness,
}

impl UniformName {
    pub const ALL: [UniformName; 4] = [
        UniformName::Time,
        UniformName::DistortionPosition,
        UniformName::DistortionAmount,
        UniformName::DistortionThickness,
    ];

    /// The external (parameter key) spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            UniformName::Time => "time",
            UniformName::DistortionPosition => "distortionPosition",
            UniformName::DistortionAmount => "distortionAmount",
            UniformName::DistortionThickness => "distortionThickness",
        }
    }

    pub fn parse(name: &str) -> Option<UniformName> {
        Self::ALL.into_iter().find(|n| n.as_str() == name)
    }
}

impl fmt::Display for UniformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive value range of a tunable uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformRange {
    pub min: f32,
    pub max: f32,
}

impl UniformRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f32) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// Current uniform values of one material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformSet {
    pub time: f32,
    pub distortion_position: f32,
    pub distortion_amount: f32,
    pub distortion_thickness: f32,
}

impl Default for UniformSet {
    fn default() -> Self {
        Self {
            time: 0.0,
            distortion_position: 0.0,
            distortion_amount: 0.0,
            distortion_thickness: NEUTRAL_THICKNESS,
        }
    }
}

impl UniformSet {
    pub fn get(&self, name: UniformName) -> f32 {
        match name {
            UniformName::Time => self.time,
            UniformName::DistortionPosition => self.distortion_position,
            UniformName::DistortionAmount => self.distortion_amount,
            UniformName::DistortionThickness => self.distortion_thickness,
        }
    }

    pub(crate) fn slot_mut(&mut self, name: UniformName) -> &mut f32 {
        match name {
            UniformName::Time => &mut self.time,
            UniformName::DistortionPosition => &mut self.distortion_position,
            UniformName::DistortionAmount => &mut self.distortion_amount,
            UniformName::DistortionThickness => &mut self.distortion_thickness,
        }
    }
}

/// Shader-visible uniform block of one material.
///
/// MUST match `EffectUniforms` in `effect.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct EffectUniform {
    pub time: f32,
    pub distortion_position: f32,
    pub distortion_amount: f32,
    pub distortion_thickness: f32,
    /// Normalized distortion axis, w unused
    pub axis: [f32; 4],
    pub color: [f32; 4],
}
// 16 + 16 + 16 = 48 bytes
