//! Effect configuration
//!
//! Ranges, defaults and colors of one effect instance. The valid range of
//! `distortionAmount` is configuration data: the box effect uses `0..1`, the
//! loaded-mesh effect uses `-0.5..0.5`.

use crate::error::{EffectError, Result};

use super::uniforms::{UniformLayout, UniformName, UniformRange, UniformSet, NEUTRAL_THICKNESS};

/// Configuration shared by the fill and wireframe materials of one effect.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectConfig {
    pub layout: UniformLayout,
    pub defaults: UniformSet,
    pub position_range: UniformRange,
    pub amount_range: UniformRange,
    pub thickness_range: UniformRange,
    /// Axis the distortion band travels along
    pub axis: [f32; 3],
    pub fill_color: [f32; 4],
    pub wireframe_color: [f32; 4],
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self::two_parameter()
    }
}

impl EffectConfig {
    /// Position and amount only, amount in `0..1`.
    pub fn two_parameter() -> Self {
        Self {
            layout: UniformLayout::TwoParameter,
            defaults: UniformSet::default(),
            position_range: UniformRange::new(-1.0, 1.0),
            amount_range: UniformRange::new(0.0, 1.0),
            thickness_range: UniformRange::new(0.0, 1.0),
            axis: [0.0, 1.0, 0.0],
            fill_color: [0.08, 0.08, 0.1, 0.85],
            wireframe_color: [0.95, 0.95, 1.0, 1.0],
        }
    }

    /// Adds thickness, amount in `-0.5..0.5`.
    pub fn three_parameter() -> Self {
        Self {
            layout: UniformLayout::ThreeParameter,
            amount_range: UniformRange::new(-0.5, 0.5),
            ..Self::two_parameter()
        }
    }

    pub fn with_amount_range(mut self, min: f32, max: f32) -> Self {
        self.amount_range = UniformRange::new(min, max);
        self
    }

    pub fn with_axis(mut self, axis: [f32; 3]) -> Self {
        self.axis = axis;
        self
    }

    pub fn with_colors(mut self, fill: [f32; 4], wireframe: [f32; 4]) -> Self {
        self.fill_color = fill;
        self.wireframe_color = wireframe;
        self
    }

    pub fn with_default(mut self, name: UniformName, value: f32) -> Self {
        *self.defaults.slot_mut(name) = value;
        self
    }

    /// Range of a tunable uniform. `time` has none beyond being finite and
    /// non-negative.
    pub fn range(&self, name: UniformName) -> Option<UniformRange> {
        match name {
            UniformName::Time => None,
            UniformName::DistortionPosition => Some(self.position_range),
            UniformName::DistortionAmount => Some(self.amount_range),
            UniformName::DistortionThickness => Some(self.thickness_range),
        }
    }

    /// Axis scaled to unit length, Y when degenerate.
    pub fn normalized_axis(&self) -> [f32; 3] {
        let [x, y, z] = self.axis;
        let length = (x * x + y * y + z * z).sqrt();
        if length <= 1e-6 || !length.is_finite() {
            [0.0, 1.0, 0.0]
        } else {
            [x / length, y / length, z / length]
        }
    }

    /// Defaults as a material starts with. Uniforms the layout hides keep
    /// their neutral value whatever the config says.
    pub fn effective_defaults(&self) -> UniformSet {
        let mut defaults = self.defaults;
        if !self.layout.exposes(UniformName::DistortionThickness) {
            defaults.distortion_thickness = NEUTRAL_THICKNESS;
        }
        defaults
    }

    /// Check every exposed default against its range.
    pub fn validate(&self) -> Result<()> {
        for &name in self.layout.tunable() {
            let value = self.defaults.get(name);
            if let Some(range) = self.range(name) {
                if !range.contains(value) {
                    return Err(EffectError::out_of_range(name, value, range.min, range.max));
                }
            }
        }
        let time = self.defaults.time;
        if !time.is_finite() || time < 0.0 {
            return Err(EffectError::out_of_range(
                UniformName::Time,
                time,
                0.0,
                f32::INFINITY,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(EffectConfig::two_parameter().validate().is_ok());
        assert!(EffectConfig::three_parameter().validate().is_ok());
        assert_eq!(
            EffectConfig::three_parameter().amount_range,
            UniformRange::new(-0.5, 0.5)
        );
    }

    #[test]
    fn test_default_outside_range_is_rejected() {
        let config = EffectConfig::two_parameter().with_default(UniformName::DistortionAmount, -0.2);
        assert!(matches!(
            config.validate(),
            Err(EffectError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_hidden_thickness_falls_back_to_neutral() {
        let config =
            EffectConfig::two_parameter().with_default(UniformName::DistortionThickness, 4.0);
        assert!(config.validate().is_ok());
        assert_eq!(config.effective_defaults().distortion_thickness, NEUTRAL_THICKNESS);

        let config =
            EffectConfig::three_parameter().with_default(UniformName::DistortionThickness, 0.2);
        assert_eq!(config.effective_defaults().distortion_thickness, 0.2);
    }

    #[test]
    fn test_degenerate_axis_falls_back_to_y() {
        let config = EffectConfig::default().with_axis([0.0, 0.0, 0.0]);
        assert_eq!(config.normalized_axis(), [0.0, 1.0, 0.0]);
        let config = EffectConfig::default().with_axis([3.0, 0.0, 4.0]);
        let axis = config.normalized_axis();
        assert!((axis[0] - 0.6).abs() < 1e-6 && (axis[2] - 0.8).abs() < 1e-6);
    }
}
