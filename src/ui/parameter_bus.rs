//! Named, range-constrained parameter controls
//!
//! The bus mirrors what the panel shows. A write is validated against the
//! control's range and turned into a [`ParameterChange`], which
//! [`ParameterBus::route`] applies to every registered variant set, the
//! compositor's bloom pass or the scene background.

use crate::animation::{AnimationDriver, EffectContext, FrameClock};
use crate::error::{EffectError, Result};
use crate::gfx::effect::{EffectConfig, UniformName};
use crate::gfx::rendering::{BloomParams, FrameBackend};

/// Panel section a control is shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelFolder {
    Scene,
    Distortion,
    Bloom,
}

impl PanelFolder {
    pub const ALL: [PanelFolder; 3] = [PanelFolder::Scene, PanelFolder::Distortion, PanelFolder::Bloom];

    pub fn title(self) -> &'static str {
        match self {
            PanelFolder::Scene => "Scene",
            PanelFolder::Distortion => "Distortion",
            PanelFolder::Bloom => "Bloom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BloomField {
    Strength,
    Threshold,
    Radius,
}

/// What a control drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlTarget {
    Background,
    Uniform(UniformName),
    Bloom(BloomField),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlValue {
    Scalar(f32),
    Color([f32; 3]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterControl {
    pub key: &'static str,
    pub label: &'static str,
    pub folder: PanelFolder,
    pub target: ControlTarget,
    pub min: f32,
    pub max: f32,
    pub value: ControlValue,
}

impl ParameterControl {
    fn scalar(
        key: &'static str,
        label: &'static str,
        folder: PanelFolder,
        target: ControlTarget,
        (min, max): (f32, f32),
        initial: f32,
    ) -> Self {
        Self {
            key,
            label,
            folder,
            target,
            min,
            max,
            value: ControlValue::Scalar(initial),
        }
    }

    fn check(&self, value: f32) -> Result<()> {
        if value.is_finite() && value >= self.min && value <= self.max {
            Ok(())
        } else {
            Err(EffectError::ValueOutOfRange {
                name: self.key.to_string(),
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}

/// A validated write, ready to be routed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterChange {
    pub target: ControlTarget,
    pub value: ControlValue,
}

#[derive(Debug, Clone, Default)]
pub struct ParameterBus {
    controls: Vec<ParameterControl>,
}

impl ParameterBus {
    /// Controls for an effect configured with `config`. Bloom controls are
    /// only present when `bloom` is given.
    pub fn new(config: &EffectConfig, bloom: Option<&BloomParams>, background: [f32; 3]) -> Self {
        let mut controls = vec![ParameterControl {
            key: "background",
            label: "Background Color",
            folder: PanelFolder::Scene,
            target: ControlTarget::Background,
            min: 0.0,
            max: 1.0,
            value: ControlValue::Color(background),
        }];

        let labels = [
            (UniformName::DistortionPosition, "Position"),
            (UniformName::DistortionAmount, "Amount"),
            (UniformName::DistortionThickness, "Thickness"),
        ];
        for (name, label) in labels {
            if !config.layout.exposes(name) {
                continue;
            }
            if let Some(range) = config.range(name) {
                controls.push(ParameterControl::scalar(
                    name.as_str(),
                    label,
                    PanelFolder::Distortion,
                    ControlTarget::Uniform(name),
                    (range.min, range.max),
                    config.defaults.get(name),
                ));
            }
        }

        if let Some(bloom) = bloom {
            controls.extend([
                ParameterControl::scalar(
                    "bloomStrength",
                    "Strength",
                    PanelFolder::Bloom,
                    ControlTarget::Bloom(BloomField::Strength),
                    BloomParams::STRENGTH_RANGE,
                    bloom.strength,
                ),
                ParameterControl::scalar(
                    "bloomThreshold",
                    "Threshold",
                    PanelFolder::Bloom,
                    ControlTarget::Bloom(BloomField::Threshold),
                    BloomParams::THRESHOLD_RANGE,
                    bloom.threshold,
                ),
                ParameterControl::scalar(
                    "bloomRadius",
                    "Radius",
                    PanelFolder::Bloom,
                    ControlTarget::Bloom(BloomField::Radius),
                    BloomParams::RADIUS_RANGE,
                    bloom.radius,
                ),
            ]);
        }

        Self { controls }
    }

    /// Controls matching the current state of `context`.
    pub fn for_context<B: FrameBackend>(context: &EffectContext<B>, config: &EffectConfig) -> Self {
        let [r, g, b, _] = context.scene.background();
        Self::new(config, context.compositor.bloom(), [r, g, b])
    }

    pub fn controls(&self) -> &[ParameterControl] {
        &self.controls
    }

    pub fn controls_in(&self, folder: PanelFolder) -> impl Iterator<Item = &ParameterControl> {
        self.controls.iter().filter(move |c| c.folder == folder)
    }

    pub fn control(&self, key: &str) -> Result<&ParameterControl> {
        self.controls
            .iter()
            .find(|c| c.key == key)
            .ok_or_else(|| EffectError::UnknownControl(key.to_string()))
    }

    fn control_mut(&mut self, key: &str) -> Result<&mut ParameterControl> {
        self.controls
            .iter_mut()
            .find(|c| c.key == key)
            .ok_or_else(|| EffectError::UnknownControl(key.to_string()))
    }

    pub fn get(&self, key: &str) -> Result<ControlValue> {
        Ok(self.control(key)?.value)
    }

    /// Validates and stores a scalar value.
    pub fn set(&mut self, key: &str, value: f32) -> Result<ParameterChange> {
        let change = self.check(key, ControlValue::Scalar(value))?;
        self.commit(key, change.value)?;
        Ok(change)
    }

    /// Validates and stores an RGB value, each channel in `0..1`.
    pub fn set_color(&mut self, key: &str, rgb: [f32; 3]) -> Result<ParameterChange> {
        let change = self.check(key, ControlValue::Color(rgb))?;
        self.commit(key, change.value)?;
        Ok(change)
    }

    /// Validates `value` for `key` without storing it.
    pub fn check(&self, key: &str, value: ControlValue) -> Result<ParameterChange> {
        let control = self.control(key)?;
        match (control.value, value) {
            (ControlValue::Scalar(_), ControlValue::Scalar(v)) => control.check(v)?,
            (ControlValue::Color(_), ControlValue::Color(rgb)) => {
                for channel in rgb {
                    control.check(channel)?;
                }
            }
            (ControlValue::Scalar(_), ControlValue::Color(_)) => {
                return Err(EffectError::UnknownControl(format!("{} is not a color control", key)))
            }
            (ControlValue::Color(_), ControlValue::Scalar(_)) => {
                return Err(EffectError::UnknownControl(format!("{} is not a scalar control", key)))
            }
        }
        Ok(ParameterChange {
            target: control.target,
            value,
        })
    }

    fn commit(&mut self, key: &str, value: ControlValue) -> Result<()> {
        self.control_mut(key)?.value = value;
        Ok(())
    }

    /// Applies a change to the effect.
    ///
    /// A target paired with the wrong kind of value is rejected with
    /// `UnknownControl`.
    pub fn route<B: FrameBackend>(change: ParameterChange, context: &mut EffectContext<B>) -> Result<()> {
        match (change.target, change.value) {
            (ControlTarget::Background, ControlValue::Color(rgb)) => {
                context.scene.set_background(rgb);
            }
            (ControlTarget::Uniform(name), ControlValue::Scalar(value)) => {
                context.scene.set_uniform_all(name, value)?;
            }
            (ControlTarget::Bloom(field), ControlValue::Scalar(value)) => {
                let compositor = &mut context.compositor;
                match field {
                    BloomField::Strength => compositor.set_bloom_strength(value)?,
                    BloomField::Threshold => compositor.set_bloom_threshold(value)?,
                    BloomField::Radius => compositor.set_bloom_radius(value)?,
                }
            }
            (target, value) => {
                return Err(EffectError::UnknownControl(format!(
                    "{:?} cannot take {:?}",
                    target, value
                )));
            }
        }
        log::debug!("Routed {:?} = {:?}", change.target, change.value);
        Ok(())
    }

    /// Validates, routes and only then stores.
    pub fn apply<B: FrameBackend>(
        &mut self,
        key: &str,
        value: ControlValue,
        context: &mut EffectContext<B>,
    ) -> Result<()> {
        let change = self.check(key, value)?;
        Self::route(change, context)?;
        self.commit(key, change.value)
    }

    /// [`apply`](Self::apply) on the driver's context. While a mesh load is
    /// awaited, the pending configuration is reseeded so the loaded set
    /// starts from what the panel shows.
    pub fn apply_to_driver<B: FrameBackend, C: FrameClock>(
        &mut self,
        key: &str,
        value: ControlValue,
        driver: &mut AnimationDriver<B, C>,
    ) -> Result<()> {
        self.apply(key, value, driver.context_mut())?;
        if let Some(config) = driver.pending_config_mut() {
            *config = self.seeded_config(config);
        }
        Ok(())
    }

    /// `config` with its defaults replaced by the current uniform control
    /// values. Values outside `config`'s own ranges keep the config default.
    pub fn seeded_config(&self, config: &EffectConfig) -> EffectConfig {
        let mut seeded = config.clone();
        for control in &self.controls {
            let (ControlTarget::Uniform(name), ControlValue::Scalar(value)) =
                (control.target, control.value)
            else {
                continue;
            };
            let fits = config.layout.exposes(name)
                && config.range(name).is_some_and(|range| range.contains(value));
            if fits {
                seeded = seeded.with_default(name, value);
            }
        }
        seeded
    }
}
