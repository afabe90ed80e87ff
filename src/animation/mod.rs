//! # Animation
//!
//! The [`AnimationDriver`] is a two-state machine (`Idle`, `Running`). While
//! running, every [`frame`](AnimationDriver::frame) applies pending resizes,
//! reads the clock, ticks each registered variant set once and renders.
//!
//! A driver can also wait for a mesh load: [`start_after`](AnimationDriver::start_after)
//! records the handle and the transition to `Running` happens inside the
//! first `frame` that observes the resolved load.

pub mod clock;

pub use clock::{FrameClock, ManualClock, MonotonicClock};

use crate::assets::LoadHandle;
use crate::error::{EffectError, Result};
use crate::events::{ResizeSubscription, SurfaceEvents};
use crate::gfx::camera::CameraManager;
use crate::gfx::effect::{EffectConfig, EffectScene, VariantSetId};
use crate::gfx::rendering::{FrameBackend, FrameCompositor};

/// Everything one frame touches.
pub struct EffectContext<B: FrameBackend> {
    pub scene: EffectScene,
    pub compositor: FrameCompositor<B>,
    pub camera: CameraManager,
}

impl<B: FrameBackend> EffectContext<B> {
    pub fn new(backend: B, camera: CameraManager) -> Self {
        Self {
            scene: EffectScene::new(),
            compositor: FrameCompositor::new(backend),
            camera,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
}

/// What a call to `frame` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Idle with nothing to wait for
    Idle,
    /// Idle, the awaited load has not resolved yet
    Waiting,
    /// A frame was ticked and rendered
    Rendered,
}

struct PendingLoad {
    handle: LoadHandle,
    config: EffectConfig,
}

pub struct AnimationDriver<B: FrameBackend, C: FrameClock = MonotonicClock> {
    context: EffectContext<B>,
    clock: C,
    state: DriverState,
    resize: Option<ResizeSubscription>,
    pending_load: Option<PendingLoad>,
    loaded_set: Option<VariantSetId>,
}

impl<B: FrameBackend, C: FrameClock> AnimationDriver<B, C> {
    pub fn new(context: EffectContext<B>, clock: C) -> Self {
        Self {
            context,
            clock,
            state: DriverState::Idle,
            resize: None,
            pending_load: None,
            loaded_set: None,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    pub fn is_loading(&self) -> bool {
        self.pending_load.is_some()
    }

    /// Set registered by the last resolved load, if any.
    pub fn loaded_set(&self) -> Option<VariantSetId> {
        self.loaded_set
    }

    /// Configuration the awaited load will be registered with.
    pub fn pending_config_mut(&mut self) -> Option<&mut EffectConfig> {
        self.pending_load.as_mut().map(|pending| &mut pending.config)
    }

    pub fn context(&self) -> &EffectContext<B> {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut EffectContext<B> {
        &mut self.context
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Idle -> Running.
    ///
    /// Fails while a load is awaited or when nothing is registered.
    pub fn start(&mut self, events: &mut SurfaceEvents) -> Result<()> {
        if self.pending_load.is_some() {
            return Err(EffectError::LoadPending);
        }
        if self.state == DriverState::Running {
            log::warn!("Animation driver already running");
            return Ok(());
        }
        if self.context.scene.is_empty() {
            return Err(EffectError::NothingToRender);
        }
        self.resize = Some(events.subscribe());
        self.enter_running();
        Ok(())
    }

    /// Waits for `handle`; once it resolves, its mesh is registered with
    /// `config` and the driver starts.
    pub fn start_after(
        &mut self,
        handle: LoadHandle,
        config: EffectConfig,
        events: &mut SurfaceEvents,
    ) -> Result<()> {
        if self.pending_load.is_some() {
            return Err(EffectError::LoadPending);
        }
        config.validate()?;
        log::info!("Waiting for '{}'", handle.path().display());
        self.resize = Some(events.subscribe());
        self.pending_load = Some(PendingLoad { handle, config });
        Ok(())
    }

    /// Cancels any awaited load, releases render targets and returns to Idle.
    pub fn stop(&mut self) {
        if let Some(mut pending) = self.pending_load.take() {
            pending.handle.cancel();
        }
        self.resize = None;
        self.context.compositor.release();
        if self.state == DriverState::Running {
            log::info!("Animation driver stopped");
        }
        self.state = DriverState::Idle;
    }

    pub fn frame(&mut self) -> Result<FrameOutcome> {
        self.frame_with_overlay(None::<fn(&mut B) -> Result<()>>)
    }

    /// Runs one frame; `overlay` is drawn after the last pass.
    pub fn frame_with_overlay<F>(&mut self, overlay: Option<F>) -> Result<FrameOutcome>
    where
        F: FnOnce(&mut B) -> Result<()>,
    {
        if self.state == DriverState::Idle {
            match self.poll_pending_load()? {
                DriverState::Idle if self.pending_load.is_some() => {
                    return Ok(FrameOutcome::Waiting)
                }
                DriverState::Idle => return Ok(FrameOutcome::Idle),
                DriverState::Running => {}
            }
        }

        self.apply_resizes();

        let elapsed = self.clock.elapsed_seconds();
        self.context.scene.tick_all(elapsed)?;

        let camera = self.context.camera.uniform();
        let EffectContext {
            scene, compositor, ..
        } = &mut self.context;
        compositor.render_with_overlay(scene, &camera, overlay)?;

        Ok(FrameOutcome::Rendered)
    }

    /// Resolves an awaited load if it is ready. Returns the resulting state.
    fn poll_pending_load(&mut self) -> Result<DriverState> {
        let Some(pending) = self.pending_load.as_mut() else {
            return Ok(self.state);
        };
        let Some(result) = pending.handle.try_resolve() else {
            return Ok(DriverState::Idle);
        };

        let Some(pending) = self.pending_load.take() else {
            return Ok(self.state);
        };
        let mesh = match result {
            Ok(mesh) => mesh,
            Err(e) => {
                log::error!("Load of '{}' failed: {}", pending.handle.path().display(), e);
                self.resize = None;
                return Err(e);
            }
        };

        let id = match self.context.scene.create_variant_set(mesh, &pending.config) {
            Ok(id) => id,
            Err(e) => {
                self.resize = None;
                return Err(e);
            }
        };
        self.loaded_set = Some(id);
        self.enter_running();
        Ok(self.state)
    }

    fn enter_running(&mut self) {
        self.clock.reset();
        self.state = DriverState::Running;
        log::info!(
            "Animation driver running with {} variant set(s)",
            self.context.scene.len()
        );
    }

    fn apply_resizes(&mut self) {
        let Some(size) = self.resize.as_mut().and_then(|sub| sub.latest()) else {
            return;
        };
        self.context.camera.resize(size.width, size.height);
        self.context.compositor.resize(size.width, size.height);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::load_channel;
    use crate::events::SurfaceSize;
    use crate::gfx::camera::{CameraController, OrbitCamera};
    use crate::gfx::geometry::{generate_box, RawMesh};
    use crate::gfx::rendering::compositor::testing::{BackendEvent, RecordingBackend};
    use crate::gfx::rendering::RenderTarget;
    use cgmath::Vector3;

    fn camera() -> CameraManager {
        CameraManager::new(
            OrbitCamera::new(2.0, 0.0, 0.0, Vector3::new(0.0, 0.0, 0.0), 1.0),
            CameraController::new(0.005, 0.1),
        )
    }

    fn driver() -> AnimationDriver<RecordingBackend, ManualClock> {
        AnimationDriver::new(
            EffectContext::new(RecordingBackend::default(), camera()),
            ManualClock::new(),
        )
    }

    fn small_box() -> RawMesh {
        generate_box(1.0, 1.0, 1.0, 1, 1, 1)
    }

    #[test]
    fn test_start_requires_a_registered_set() {
        let mut events = SurfaceEvents::new();
        let mut driver = driver();
        assert!(matches!(
            driver.start(&mut events),
            Err(EffectError::NothingToRender)
        ));
        assert_eq!(driver.state(), DriverState::Idle);
        assert_eq!(driver.frame().unwrap(), FrameOutcome::Idle);
        assert!(driver.context().compositor.backend().events.is_empty());
    }

    #[test]
    fn test_time_is_ticked_once_per_frame_in_order() {
        let mut events = SurfaceEvents::new();
        let mut driver = driver();
        let config = EffectConfig::two_parameter();
        driver
            .context_mut()
            .scene
            .create_variant_set(small_box(), &config)
            .unwrap();
        driver
            .context_mut()
            .scene
            .create_variant_set(small_box(), &config)
            .unwrap();
        driver.start(&mut events).unwrap();

        let steps = [0.0, 0.016, 0.5, 0.0, 1.25];
        let mut expected = Vec::new();
        for step in steps {
            driver.clock_mut().advance(step);
            expected.push(driver.clock().elapsed_seconds());
            assert_eq!(driver.frame().unwrap(), FrameOutcome::Rendered);
        }

        let backend = driver.context().compositor.backend();
        assert_eq!(backend.bound.len(), steps.len());
        let mut previous = 0.0;
        for (bound, time) in backend.bound.iter().zip(&expected) {
            // Fill and wireframe of both sets
            assert_eq!(bound.len(), 4);
            assert!(bound.iter().all(|u| u.time == *time));
            assert!(*time >= previous);
            previous = *time;
        }
        // Every tick dirties both materials of every set
        assert!(backend.uploads.iter().all(|frame| frame.len() == 4));
    }

    #[test]
    fn test_start_after_registers_loaded_mesh() {
        let mut events = SurfaceEvents::new();
        let mut driver = driver();
        let (completer, handle) = load_channel("model.obj");

        driver
            .start_after(handle, EffectConfig::three_parameter(), &mut events)
            .unwrap();
        assert!(matches!(
            driver.start(&mut events),
            Err(EffectError::LoadPending)
        ));
        assert_eq!(driver.frame().unwrap(), FrameOutcome::Waiting);
        assert!(driver.context().compositor.backend().events.is_empty());

        assert!(completer.complete(Ok(small_box())));
        assert_eq!(driver.frame().unwrap(), FrameOutcome::Rendered);
        assert!(driver.is_running());
        assert!(!driver.is_loading());
        assert_eq!(driver.context().scene.len(), 1);
        assert_eq!(driver.loaded_set(), Some(VariantSetId(0)));
    }

    #[test]
    fn test_rejected_load_keeps_driver_idle() {
        let mut events = SurfaceEvents::new();
        let mut driver = driver();
        let (completer, handle) = load_channel("broken.obj");
        driver
            .start_after(handle, EffectConfig::three_parameter(), &mut events)
            .unwrap();

        completer.complete(Err(EffectError::EmptyAsset {
            path: "broken.obj".to_string(),
        }));
        let error = driver.frame().unwrap_err();
        assert!(matches!(error, EffectError::EmptyAsset { .. }));
        assert!(error.is_recoverable());
        assert_eq!(driver.state(), DriverState::Idle);
        for _ in 0..3 {
            assert_eq!(driver.frame().unwrap(), FrameOutcome::Idle);
        }
        assert_eq!(events.subscriber_count(), 0);
        assert!(driver.context().scene.is_empty());
    }

    #[test]
    fn test_stop_discards_late_load() {
        let mut events = SurfaceEvents::new();
        let mut driver = driver();
        let (completer, handle) = load_channel("model.obj");
        driver
            .start_after(handle, EffectConfig::three_parameter(), &mut events)
            .unwrap();

        driver.stop();
        assert!(!completer.complete(Ok(small_box())));

        driver.clock_mut().advance(1.0);
        assert_eq!(driver.frame().unwrap(), FrameOutcome::Idle);
        assert!(driver.context().scene.is_empty());
        let backend = driver.context().compositor.backend();
        assert!(backend.bound.is_empty());
        assert_eq!(backend.events, vec![BackendEvent::Release]);
    }

    #[test]
    fn test_no_tick_after_stop() {
        let mut events = SurfaceEvents::new();
        let mut driver = driver();
        driver
            .context_mut()
            .scene
            .create_variant_set(small_box(), &EffectConfig::two_parameter())
            .unwrap();
        driver.start(&mut events).unwrap();
        driver.clock_mut().advance(0.25);
        driver.frame().unwrap();
        driver.stop();

        driver.clock_mut().advance(5.0);
        assert_eq!(driver.frame().unwrap(), FrameOutcome::Idle);
        let set = &driver.context().scene.sets()[0];
        assert_eq!(set.fill().uniforms().time, 0.25);
        assert_eq!(set.wireframe().uniforms().time, 0.25);
        assert_eq!(events.subscriber_count(), 0);
    }

    #[test]
    fn test_resize_applies_before_next_frame() {
        let mut events = SurfaceEvents::new();
        let mut driver = driver();
        driver
            .context_mut()
            .scene
            .create_variant_set(small_box(), &EffectConfig::two_parameter())
            .unwrap();
        driver.start(&mut events).unwrap();

        events.publish_resize(SurfaceSize::new(1024, 512));
        events.publish_resize(SurfaceSize::new(800, 400));
        driver.frame().unwrap();

        assert_eq!(driver.context().camera.camera.aspect, 2.0);
        assert_eq!(
            driver.context().compositor.backend().events,
            vec![
                BackendEvent::Resize(800, 400),
                BackendEvent::BeginFrame,
                BackendEvent::Draw(RenderTarget::Surface),
                BackendEvent::EndFrame,
            ]
        );
    }
}
