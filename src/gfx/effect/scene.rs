//! The set of variant sets the compositor draws, plus the surface background.

use crate::error::{EffectError, Result};
use crate::gfx::geometry::RawMesh;

use super::config::EffectConfig;
use super::uniforms::UniformName;
use super::variant_set::MeshVariantSet;

/// Handle of a registered variant set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantSetId(pub usize);

/// Default clear color, `#121212`.
pub const DEFAULT_BACKGROUND: [f32; 4] = [18.0 / 255.0, 18.0 / 255.0, 18.0 / 255.0, 1.0];

/// Registry of the variant sets to render.
pub struct EffectScene {
    sets: Vec<MeshVariantSet>,
    background: [f32; 4],
}

impl Default for EffectScene {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectScene {
    pub fn new() -> Self {
        Self {
            sets: Vec::new(),
            background: DEFAULT_BACKGROUND,
        }
    }

    /// Create a variant set from `mesh` and register it in one step.
    pub fn create_variant_set(
        &mut self,
        mesh: RawMesh,
        config: &EffectConfig,
    ) -> Result<VariantSetId> {
        let set = MeshVariantSet::create(mesh, config)?;
        Ok(self.register(set))
    }

    pub fn register(&mut self, set: MeshVariantSet) -> VariantSetId {
        self.sets.push(set);
        let id = VariantSetId(self.sets.len() - 1);
        log::info!("Registered mesh variant set {}", id.0);
        id
    }

    pub fn get(&self, id: VariantSetId) -> Result<&MeshVariantSet> {
        self.sets
            .get(id.0)
            .ok_or(EffectError::UnknownVariantSet(id.0))
    }

    pub fn get_mut(&mut self, id: VariantSetId) -> Result<&mut MeshVariantSet> {
        self.sets
            .get_mut(id.0)
            .ok_or(EffectError::UnknownVariantSet(id.0))
    }

    pub fn sets(&self) -> &[MeshVariantSet] {
        &self.sets
    }

    pub fn sets_mut(&mut self) -> impl Iterator<Item = &mut MeshVariantSet> {
        self.sets.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Set a uniform on every registered set.
    ///
    /// All sets validate first, so either every set takes the value or none.
    pub fn set_uniform_all(&mut self, name: UniformName, value: f32) -> Result<()> {
        for set in &self.sets {
            set.validate_uniform(name, value)?;
        }
        for set in &mut self.sets {
            set.set_uniform(name, value)?;
        }
        Ok(())
    }

    /// Tick every registered set exactly once.
    pub fn tick_all(&mut self, elapsed_seconds: f32) -> Result<()> {
        for set in &mut self.sets {
            set.tick(elapsed_seconds)?;
        }
        Ok(())
    }

    pub fn background(&self) -> [f32; 4] {
        self.background
    }

    pub fn set_background(&mut self, rgb: [f32; 3]) {
        self.background = [rgb[0], rgb[1], rgb[2], 1.0];
    }

    pub fn background_color(&self) -> wgpu::Color {
        wgpu::Color {
            r: self.background[0] as f64,
            g: self.background[1] as f64,
            b: self.background[2] as f64,
            a: self.background[3] as f64,
        }
    }

    /// Drops GPU resources of every set.
    pub fn release_gpu(&mut self) {
        for set in &mut self.sets {
            set.release_gpu();
        }
    }
}
