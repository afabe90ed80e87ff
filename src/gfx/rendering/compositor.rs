//! Frame composition
//!
//! The [`FrameCompositor`] owns the pass order of a frame and drives a
//! [`FrameBackend`] through it:
//!
//! 1. begin frame
//! 2. Base: draw every registered variant set, fill then wireframe, into the
//!    intermediate target when Bloom follows, otherwise into the surface
//! 3. Bloom: read the intermediate target, write the surface
//! 4. overlay hook (UI)
//! 5. submit and present
//!
//! A failing step abandons the frame; nothing is submitted or presented.

use crate::error::{EffectError, Result};
use crate::gfx::camera::CameraUniform;
use crate::gfx::effect::EffectScene;

/// Bloom tuning values. Changing them never reallocates targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BloomParams {
    pub strength: f32,
    pub threshold: f32,
    pub radius: f32,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self {
            strength: 0.5,
            threshold: 0.3,
            radius: 0.4,
        }
    }
}

impl BloomParams {
    pub const STRENGTH_RANGE: (f32, f32) = (0.0, 1.0);
    pub const THRESHOLD_RANGE: (f32, f32) = (0.1, 0.7);
    pub const RADIUS_RANGE: (f32, f32) = (0.0, 1.0);

    pub fn new(strength: f32, threshold: f32, radius: f32) -> Self {
        Self {
            strength,
            threshold,
            radius,
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_range("bloomStrength", self.strength, Self::STRENGTH_RANGE)?;
        check_range("bloomThreshold", self.threshold, Self::THRESHOLD_RANGE)?;
        check_range("bloomRadius", self.radius, Self::RADIUS_RANGE)
    }
}

fn check_range(name: &str, value: f32, (min, max): (f32, f32)) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(EffectError::ValueOutOfRange {
            name: name.to_string(),
            value,
            min,
            max,
        })
    }
}

/// One step of the frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderPass {
    Base,
    Bloom(BloomParams),
}

/// Where the Base pass draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// The presentable surface texture of this frame
    Surface,
    /// Offscreen HDR image read by Bloom
    Intermediate,
}

/// GPU side of frame composition.
///
/// The compositor decides the order; a backend only executes single steps.
pub trait FrameBackend {
    /// Acquire the surface texture and start recording.
    fn begin_frame(&mut self) -> Result<()>;

    /// Upload dirty uniforms, clear `target` to the scene background and draw
    /// every variant set (fill, then wireframe).
    fn draw_scene(
        &mut self,
        target: RenderTarget,
        scene: &mut EffectScene,
        camera: &CameraUniform,
    ) -> Result<()>;

    /// Bloom from the intermediate target onto the surface.
    fn apply_bloom(&mut self, params: &BloomParams) -> Result<()>;

    /// Submit recorded work and present.
    fn end_frame(&mut self) -> Result<()>;

    /// Drop recorded work without submitting.
    fn abandon_frame(&mut self);

    /// Reallocate size-dependent targets.
    fn resize(&mut self, width: u32, height: u32);

    /// Free offscreen targets; they are recreated on the next frame.
    fn release(&mut self);
}

/// Executes the configured pass order against a backend.
pub struct FrameCompositor<B: FrameBackend> {
    backend: B,
    passes: Vec<RenderPass>,
    frames_rendered: u64,
}

impl<B: FrameBackend> FrameCompositor<B> {
    /// A compositor with a single Base pass.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            passes: vec![RenderPass::Base],
            frames_rendered: 0,
        }
    }

    /// Replace the pass list.
    ///
    /// The list must start with exactly one `Base` and may add one `Bloom`.
    /// Once a frame has been rendered the order is fixed.
    pub fn configure(&mut self, passes: Vec<RenderPass>) -> Result<()> {
        if self.frames_rendered > 0 {
            return Err(EffectError::PassOrderLocked);
        }
        validate_passes(&passes)?;
        self.passes = passes;
        log::info!("Configured passes: {:?}", self.passes);
        Ok(())
    }

    pub fn passes(&self) -> &[RenderPass] {
        &self.passes
    }

    pub fn bloom(&self) -> Option<&BloomParams> {
        self.passes.iter().find_map(|pass| match pass {
            RenderPass::Bloom(params) => Some(params),
            RenderPass::Base => None,
        })
    }

    pub fn has_bloom(&self) -> bool {
        self.bloom().is_some()
    }

    fn bloom_mut(&mut self) -> Result<&mut BloomParams> {
        self.passes
            .iter_mut()
            .find_map(|pass| match pass {
                RenderPass::Bloom(params) => Some(params),
                RenderPass::Base => None,
            })
            .ok_or(EffectError::BloomNotConfigured)
    }

    /// Swap all bloom values between frames.
    pub fn set_bloom(&mut self, params: BloomParams) -> Result<()> {
        params.validate()?;
        *self.bloom_mut()? = params;
        Ok(())
    }

    pub fn set_bloom_strength(&mut self, strength: f32) -> Result<()> {
        let params = BloomParams {
            strength,
            ..self.current_bloom()?
        };
        self.set_bloom(params)
    }

    pub fn set_bloom_threshold(&mut self, threshold: f32) -> Result<()> {
        let params = BloomParams {
            threshold,
            ..self.current_bloom()?
        };
        self.set_bloom(params)
    }

    pub fn set_bloom_radius(&mut self, radius: f32) -> Result<()> {
        let params = BloomParams {
            radius,
            ..self.current_bloom()?
        };
        self.set_bloom(params)
    }

    fn current_bloom(&self) -> Result<BloomParams> {
        self.bloom().copied().ok_or(EffectError::BloomNotConfigured)
    }

    /// Render one frame without overlay.
    pub fn render(&mut self, scene: &mut EffectScene, camera: &CameraUniform) -> Result<()> {
        self.render_with_overlay(scene, camera, None::<fn(&mut B) -> Result<()>>)
    }

    /// Render one frame; `overlay` runs after the last pass, before present.
    pub fn render_with_overlay<F>(
        &mut self,
        scene: &mut EffectScene,
        camera: &CameraUniform,
        overlay: Option<F>,
    ) -> Result<()>
    where
        F: FnOnce(&mut B) -> Result<()>,
    {
        self.backend.begin_frame()?;

        if let Err(e) = self.record_passes(scene, camera, overlay) {
            self.backend.abandon_frame();
            return Err(e);
        }

        self.backend.end_frame()?;
        self.frames_rendered += 1;
        Ok(())
    }

    fn record_passes<F>(
        &mut self,
        scene: &mut EffectScene,
        camera: &CameraUniform,
        overlay: Option<F>,
    ) -> Result<()>
    where
        F: FnOnce(&mut B) -> Result<()>,
    {
        let bloom = self.bloom().copied();
        let base_target = if bloom.is_some() {
            RenderTarget::Intermediate
        } else {
            RenderTarget::Surface
        };

        self.backend.draw_scene(base_target, scene, camera)?;

        if let Some(params) = bloom {
            self.backend.apply_bloom(&params)?;
        }

        if let Some(overlay) = overlay {
            overlay(&mut self.backend)?;
        }
        Ok(())
    }

    /// Reallocate targets for a new surface size. Zero sizes are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::warn!("Ignoring resize to {}x{}", width, height);
            return;
        }
        self.backend.resize(width, height);
    }

    /// Free the backend's offscreen targets.
    pub fn release(&mut self) {
        self.backend.release();
        log::debug!("Released compositor targets");
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

fn validate_passes(passes: &[RenderPass]) -> Result<()> {
    match passes.first() {
        Some(RenderPass::Base) => {}
        Some(RenderPass::Bloom(_)) => {
            return Err(EffectError::InvalidPassOrder(
                "Base must be the first pass".to_string(),
            ))
        }
        None => {
            return Err(EffectError::InvalidPassOrder(
                "at least a Base pass is required".to_string(),
            ))
        }
    }

    let mut bloom_count = 0;
    for pass in &passes[1..] {
        match pass {
            RenderPass::Base => {
                return Err(EffectError::InvalidPassOrder(
                    "only one Base pass is allowed".to_string(),
                ))
            }
            RenderPass::Bloom(params) => {
                params.validate()?;
                bloom_count += 1;
            }
        }
    }
    if bloom_count > 1 {
        return Err(EffectError::InvalidPassOrder(
            "at most one Bloom pass is allowed".to_string(),
        ));
    }
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::testing::{BackendEvent, RecordingBackend};
    use super::*;
    use crate::gfx::effect::{EffectConfig, UniformName};
    use crate::gfx::geometry::generate_box;

    fn scene() -> EffectScene {
        let mut scene = EffectScene::new();
        scene
            .create_variant_set(generate_box(1.0, 1.0, 1.0, 2, 2, 2), &EffectConfig::two_parameter())
            .unwrap();
        scene
    }

    #[test]
    fn test_pass_validation() {
        let mut compositor = FrameCompositor::new(RecordingBackend::default());
        let bloom = RenderPass::Bloom(BloomParams::default());

        assert!(compositor.configure(vec![RenderPass::Base, bloom]).is_ok());
        assert!(matches!(
            compositor.configure(vec![bloom, RenderPass::Base]),
            Err(EffectError::InvalidPassOrder(_))
        ));
        assert!(matches!(
            compositor.configure(vec![]),
            Err(EffectError::InvalidPassOrder(_))
        ));
        assert!(matches!(
            compositor.configure(vec![RenderPass::Base, RenderPass::Base]),
            Err(EffectError::InvalidPassOrder(_))
        ));
        assert!(matches!(
            compositor.configure(vec![RenderPass::Base, bloom, bloom]),
            Err(EffectError::InvalidPassOrder(_))
        ));
        assert!(matches!(
            compositor.configure(vec![
                RenderPass::Base,
                RenderPass::Bloom(BloomParams::new(0.5, 0.9, 0.4))
            ]),
            Err(EffectError::ValueOutOfRange { .. })
        ));
    }

    #[test]
    fn test_base_only_draws_to_surface() {
        let mut compositor = FrameCompositor::new(RecordingBackend::default());
        let mut scene = scene();
        compositor
            .render(&mut scene, &CameraUniform::default())
            .unwrap();

        assert_eq!(
            compositor.backend().events,
            vec![
                BackendEvent::BeginFrame,
                BackendEvent::Draw(RenderTarget::Surface),
                BackendEvent::EndFrame,
            ]
        );
    }

    #[test]
    fn test_bloom_follows_base_and_precedes_overlay() {
        let mut compositor = FrameCompositor::new(RecordingBackend::default());
        compositor
            .configure(vec![RenderPass::Base, RenderPass::Bloom(BloomParams::default())])
            .unwrap();
        let mut scene = scene();

        compositor
            .render_with_overlay(
                &mut scene,
                &CameraUniform::default(),
                Some(|backend: &mut RecordingBackend| {
                    backend.events.push(BackendEvent::Overlay);
                    Ok(())
                }),
            )
            .unwrap();

        assert_eq!(
            compositor.backend().events,
            vec![
                BackendEvent::BeginFrame,
                BackendEvent::Draw(RenderTarget::Intermediate),
                BackendEvent::Bloom(BloomParams::default()),
                BackendEvent::Overlay,
                BackendEvent::EndFrame,
            ]
        );
    }

    #[test]
    fn test_base_only_reproduces_base_image() {
        let camera = CameraUniform::default();

        let mut plain = FrameCompositor::new(RecordingBackend::default());
        let mut plain_scene = scene();
        plain.render(&mut plain_scene, &camera).unwrap();

        let mut bloomed = FrameCompositor::new(RecordingBackend::default());
        bloomed
            .configure(vec![RenderPass::Base, RenderPass::Bloom(BloomParams::default())])
            .unwrap();
        let mut bloom_scene = scene();
        bloomed.render(&mut bloom_scene, &camera).unwrap();

        // The bloom input is exactly the Base-only output
        assert_eq!(bloomed.backend().intermediate, plain.backend().surface);
        assert_ne!(bloomed.backend().surface, plain.backend().surface);
    }

    #[test]
    fn test_pass_order_locks_after_first_frame() {
        let mut compositor = FrameCompositor::new(RecordingBackend::default());
        let mut scene = scene();
        compositor
            .render(&mut scene, &CameraUniform::default())
            .unwrap();
        assert!(matches!(
            compositor.configure(vec![RenderPass::Base]),
            Err(EffectError::PassOrderLocked)
        ));
    }

    #[test]
    fn test_bloom_values_are_hot_swappable() {
        let mut compositor = FrameCompositor::new(RecordingBackend::default());
        assert!(matches!(
            compositor.set_bloom_strength(0.2),
            Err(EffectError::BloomNotConfigured)
        ));

        compositor
            .configure(vec![RenderPass::Base, RenderPass::Bloom(BloomParams::default())])
            .unwrap();
        let mut scene = scene();
        compositor
            .render(&mut scene, &CameraUniform::default())
            .unwrap();

        compositor.set_bloom_strength(0.9).unwrap();
        compositor.set_bloom_threshold(0.6).unwrap();
        compositor.set_bloom_radius(0.1).unwrap();
        assert!(compositor.set_bloom_threshold(0.05).is_err());
        compositor
            .render(&mut scene, &CameraUniform::default())
            .unwrap();

        let expected = BloomParams::new(0.9, 0.6, 0.1);
        assert_eq!(compositor.bloom(), Some(&expected));
        assert_eq!(
            compositor.backend().count(&BackendEvent::Bloom(expected)),
            1
        );
        // Value changes never touch targets
        assert!(!compositor
            .backend()
            .events
            .iter()
            .any(|e| matches!(e, BackendEvent::Resize(..) | BackendEvent::Release)));
    }

    #[test]
    fn test_failed_draw_abandons_frame() {
        let mut compositor = FrameCompositor::new(RecordingBackend::default());
        let mut scene = scene();
        compositor
            .render(&mut scene, &CameraUniform::default())
            .unwrap();

        compositor.backend_mut().fail_draw = true;
        let result = compositor.render(&mut scene, &CameraUniform::default());
        assert!(matches!(result, Err(EffectError::Surface(_))));
        assert_eq!(compositor.backend().presented, 1);
        assert_eq!(compositor.backend().count(&BackendEvent::Abandon), 1);
        assert_eq!(compositor.frames_rendered(), 1);
    }

    #[test]
    fn test_render_uses_latest_uniform_values() {
        let mut compositor = FrameCompositor::new(RecordingBackend::default());
        let mut scene = scene();
        compositor
            .render(&mut scene, &CameraUniform::default())
            .unwrap();

        scene
            .set_uniform_all(UniformName::DistortionPosition, 0.5)
            .unwrap();
        compositor
            .render(&mut scene, &CameraUniform::default())
            .unwrap();

        let backend = compositor.backend();
        let uploads = &backend.uploads[1];
        assert_eq!(uploads.len(), 2);
        for upload in uploads {
            assert_eq!(upload.distortion_position, 0.5);
            assert_eq!(upload.distortion_amount, 0.0);
            assert_eq!(upload.time, 0.0);
        }
        assert!(backend.bound[1].iter().all(|u| u.distortion_position == 0.5));
    }

    #[test]
    fn test_zero_resize_is_ignored() {
        let mut compositor = FrameCompositor::new(RecordingBackend::default());
        compositor.resize(0, 600);
        compositor.resize(800, 600);
        assert_eq!(
            compositor.backend().events,
            vec![BackendEvent::Resize(800, 600)]
        );
    }
}
