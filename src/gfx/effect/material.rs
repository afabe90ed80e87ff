//! Effect materials
//!
//! A material is one variant of the effect shader: both variants share the
//! distortion vertex stage and differ in fragment entry point and topology.
//! Uniform values live on the CPU side; the GPU copy is refreshed from
//! [`EffectMaterial::sync_gpu`] whenever the material is dirty.

use wgpu::Device;

use crate::error::{EffectError, Result};
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

use super::config::EffectConfig;
use super::uniforms::{EffectUniform, UniformLayout, UniformName, UniformRange, UniformSet};

type EffectUBO = UniformBuffer<EffectUniform>;

/// Which half of the paired effect a material renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectVariant {
    /// Shaded, alpha-blended triangles
    Fill,
    /// Triangle edges only
    Wireframe,
}

impl EffectVariant {
    pub const ALL: [EffectVariant; 2] = [EffectVariant::Fill, EffectVariant::Wireframe];

    pub fn fragment_entry(self) -> &'static str {
        match self {
            EffectVariant::Fill => "fs_fill",
            EffectVariant::Wireframe => "fs_wireframe",
        }
    }

    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            EffectVariant::Fill => wgpu::PrimitiveTopology::TriangleList,
            EffectVariant::Wireframe => wgpu::PrimitiveTopology::LineList,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EffectVariant::Fill => "Fill",
            EffectVariant::Wireframe => "Wireframe",
        }
    }
}

/// Creates the bind group layout every effect material binds at group 1.
pub fn effect_material_layout(device: &Device) -> BindGroupLayoutWithDesc {
    BindGroupLayoutBuilder::new()
        .next_binding_rendering(binding_types::uniform())
        .create(device, "Effect Material Bind Group")
}

/// One shader variant of the effect with its own uniform set.
pub struct EffectMaterial {
    variant: EffectVariant,
    layout: UniformLayout,
    uniforms: UniformSet,
    position_range: UniformRange,
    amount_range: UniformRange,
    thickness_range: UniformRange,
    axis: [f32; 3],
    color: [f32; 4],
    dirty: bool,

    // GPU resources, created on first sync
    uniform_ubo: Option<EffectUBO>,
    bind_group: Option<wgpu::BindGroup>,
}

impl EffectMaterial {
    /// Build a material of `variant` from a validated configuration.
    ///
    /// The new material starts dirty so its first draw uploads the defaults.
    pub fn build(variant: EffectVariant, config: &EffectConfig) -> Result<Self> {
        config.validate()?;

        let color = match variant {
            EffectVariant::Fill => config.fill_color,
            EffectVariant::Wireframe => config.wireframe_color,
        };

        Ok(Self {
            variant,
            layout: config.layout,
            uniforms: config.effective_defaults(),
            position_range: config.position_range,
            amount_range: config.amount_range,
            thickness_range: config.thickness_range,
            axis: config.normalized_axis(),
            color,
            dirty: true,
            uniform_ubo: None,
            bind_group: None,
        })
    }

    pub fn variant(&self) -> EffectVariant {
        self.variant
    }

    pub fn layout(&self) -> UniformLayout {
        self.layout
    }

    pub fn uniforms(&self) -> &UniformSet {
        &self.uniforms
    }

    /// Current value of an exposed uniform.
    pub fn get(&self, name: UniformName) -> Result<f32> {
        if !self.layout.exposes(name) {
            return Err(EffectError::unknown_uniform(name.as_str(), self.layout));
        }
        Ok(self.uniforms.get(name))
    }

    pub fn range(&self, name: UniformName) -> Option<UniformRange> {
        match name {
            UniformName::Time => None,
            UniformName::DistortionPosition => Some(self.position_range),
            UniformName::DistortionAmount => Some(self.amount_range),
            UniformName::DistortionThickness => Some(self.thickness_range),
        }
    }

    /// Check that `value` could be written to `name` without mutating.
    pub fn validate(&self, name: UniformName, value: f32) -> Result<()> {
        if !self.layout.exposes(name) {
            return Err(EffectError::unknown_uniform(name.as_str(), self.layout));
        }
        match self.range(name) {
            Some(range) if !range.contains(value) => {
                Err(EffectError::out_of_range(name, value, range.min, range.max))
            }
            None if !value.is_finite() || value < 0.0 => Err(EffectError::out_of_range(
                name,
                value,
                0.0,
                f32::INFINITY,
            )),
            _ => Ok(()),
        }
    }

    /// Write an exposed uniform and mark the material dirty.
    pub fn set(&mut self, name: UniformName, value: f32) -> Result<()> {
        self.validate(name, value)?;
        *self.uniforms.slot_mut(name) = value;
        self.dirty = true;
        Ok(())
    }

    /// Like [`set`](Self::set), resolving the external uniform name first.
    pub fn set_by_name(&mut self, name: &str, value: f32) -> Result<()> {
        let parsed = UniformName::parse(name)
            .ok_or_else(|| EffectError::unknown_uniform(name, self.layout))?;
        self.set(parsed, value)
    }

    pub fn set_time(&mut self, seconds: f32) -> Result<()> {
        self.set(UniformName::Time, seconds)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Shader-visible uniform data for the current values.
    pub fn gpu_uniform(&self) -> EffectUniform {
        EffectUniform {
            time: self.uniforms.time,
            distortion_position: self.uniforms.distortion_position,
            distortion_amount: self.uniforms.distortion_amount,
            distortion_thickness: self.uniforms.distortion_thickness,
            axis: [self.axis[0], self.axis[1], self.axis[2], 0.0],
            color: self.color,
        }
    }

    /// Returns the data to upload if the material changed, clearing the flag.
    ///
    /// Callers must upload what they take.
    pub(crate) fn take_dirty(&mut self) -> Option<EffectUniform> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.gpu_uniform())
    }

    /// Creates GPU resources on first use and uploads pending changes.
    pub fn sync_gpu(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        layout: &BindGroupLayoutWithDesc,
    ) {
        if self.uniform_ubo.is_none() {
            let ubo = EffectUBO::new_with_data(device, &self.gpu_uniform());
            self.bind_group = Some(
                BindGroupBuilder::new(layout)
                    .resource(ubo.binding_resource())
                    .create(device, &format!("{} Material Bind Group", self.variant.label())),
            );
            self.uniform_ubo = Some(ubo);
        }

        if let Some(content) = self.take_dirty() {
            if let Some(ubo) = &mut self.uniform_ubo {
                ubo.force_update_content(queue, content);
                log::trace!(
                    "Uploaded {} uniforms (time {:.3})",
                    self.variant.label(),
                    content.time
                );
            }
        }
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.bind_group.as_ref()
    }

    /// Drops GPU resources; the next sync recreates and re-uploads them.
    pub fn release_gpu(&mut self) {
        self.uniform_ubo = None;
        self.bind_group = None;
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_share_vertex_stage_but_differ_in_fragment() {
        assert_ne!(
            EffectVariant::Fill.fragment_entry(),
            EffectVariant::Wireframe.fragment_entry()
        );
        assert_eq!(
            EffectVariant::Wireframe.topology(),
            wgpu::PrimitiveTopology::LineList
        );
    }

    #[test]
    fn test_new_material_is_dirty() {
        let mut material =
            EffectMaterial::build(EffectVariant::Fill, &EffectConfig::two_parameter()).unwrap();
        assert!(material.is_dirty());
        assert!(material.take_dirty().is_some());
        assert!(!material.is_dirty());
        assert!(material.take_dirty().is_none());
    }

    #[test]
    fn test_every_mutation_marks_dirty() {
        let mut material =
            EffectMaterial::build(EffectVariant::Fill, &EffectConfig::two_parameter()).unwrap();
        material.take_dirty();

        material.set(UniformName::DistortionAmount, 0.3).unwrap();
        assert!(material.is_dirty());
        material.take_dirty();

        material.set_time(1.5).unwrap();
        let uploaded = material.take_dirty().unwrap();
        assert_eq!(uploaded.time, 1.5);
        assert_eq!(uploaded.distortion_amount, 0.3);
    }

    #[test]
    fn test_thickness_hidden_in_two_parameter_layout() {
        let mut material =
            EffectMaterial::build(EffectVariant::Wireframe, &EffectConfig::two_parameter())
                .unwrap();
        let result = material.set(UniformName::DistortionThickness, 0.2);
        assert!(matches!(result, Err(EffectError::UnknownUniform { .. })));
        assert_eq!(material.uniforms().distortion_thickness, 0.5);
        assert_eq!(material.gpu_uniform().distortion_thickness, 0.5);
    }

    #[test]
    fn test_hidden_thickness_default_is_not_uploaded() {
        let config =
            EffectConfig::two_parameter().with_default(UniformName::DistortionThickness, 4.0);
        let material = EffectMaterial::build(EffectVariant::Fill, &config).unwrap();
        assert_eq!(material.gpu_uniform().distortion_thickness, 0.5);
    }

    #[test]
    fn test_unknown_name_is_contract_error() {
        let mut material =
            EffectMaterial::build(EffectVariant::Fill, &EffectConfig::three_parameter()).unwrap();
        assert!(matches!(
            material.set_by_name("uGlow", 1.0),
            Err(EffectError::UnknownUniform { .. })
        ));
        assert!(material.set_by_name("distortionThickness", 0.8).is_ok());
    }

    #[test]
    fn test_out_of_range_leaves_value_untouched() {
        let mut material =
            EffectMaterial::build(EffectVariant::Fill, &EffectConfig::three_parameter()).unwrap();
        material.take_dirty();
        let result = material.set(UniformName::DistortionAmount, 0.9);
        assert!(matches!(result, Err(EffectError::ValueOutOfRange { .. })));
        assert_eq!(material.uniforms().distortion_amount, 0.0);
        assert!(!material.is_dirty());

        assert!(material.set_time(f32::NAN).is_err());
        assert!(material.set_time(-1.0).is_err());
    }

    #[test]
    fn test_gpu_uniform_carries_variant_color_and_axis() {
        let config = EffectConfig::two_parameter().with_axis([2.0, 0.0, 0.0]);
        let fill = EffectMaterial::build(EffectVariant::Fill, &config).unwrap();
        let wire = EffectMaterial::build(EffectVariant::Wireframe, &config).unwrap();
        assert_eq!(fill.gpu_uniform().color, config.fill_color);
        assert_eq!(wire.gpu_uniform().color, config.wireframe_color);
        assert_eq!(fill.gpu_uniform().axis, [1.0, 0.0, 0.0, 0.0]);
    }
}
