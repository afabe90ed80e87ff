//! winit host
//!
//! [`FractureApp`] opens the window, creates the [`RenderEngine`], registers
//! the configured effects and drives frames from the event loop
//! (`about_to_wait` requests a redraw, `RedrawRequested` runs one frame).

use cgmath::Vector3;
use std::path::PathBuf;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{DeviceEvent, DeviceId, ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::animation::{AnimationDriver, EffectContext, MonotonicClock};
use crate::assets::AssetLoader;
use crate::error::{EffectError, Result};
use crate::events::{SurfaceEvents, SurfaceSize};
use crate::gfx::{
    camera::{CameraController, CameraManager, OrbitCamera},
    effect::{scene::DEFAULT_BACKGROUND, EffectConfig},
    geometry::RawMesh,
    rendering::{BloomParams, RenderEngine, RenderPass},
};
use crate::ui::{parameter_panel, ParameterBus, UiManager};

/// Window, camera and frame settings
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub background: [f32; 3],
    pub camera_distance: f32,
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    pub vsync: bool,
    pub passes: Vec<RenderPass>,
    pub show_panel: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Fracture".to_string(),
            width: 1200,
            height: 800,
            background: [
                DEFAULT_BACKGROUND[0],
                DEFAULT_BACKGROUND[1],
                DEFAULT_BACKGROUND[2],
            ],
            camera_distance: 2.0,
            fovy_degrees: 75.0,
            znear: 0.1,
            zfar: 100.0,
            vsync: true,
            passes: vec![RenderPass::Base],
            show_panel: true,
        }
    }
}

impl AppConfig {
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_background(mut self, rgb: [f32; 3]) -> Self {
        self.background = rgb;
        self
    }

    pub fn with_camera_distance(mut self, distance: f32) -> Self {
        self.camera_distance = distance;
        self
    }

    pub fn with_vsync(mut self, enable: bool) -> Self {
        self.vsync = enable;
        self
    }

    /// Base followed by a Bloom pass with `params`
    pub fn with_bloom(mut self, params: BloomParams) -> Self {
        self.passes = vec![RenderPass::Base, RenderPass::Bloom(params)];
        self
    }

    pub fn with_panel(mut self, show: bool) -> Self {
        self.show_panel = show;
        self
    }
}

enum EffectSource {
    Mesh(RawMesh, EffectConfig),
    Load(PathBuf, EffectConfig),
}

impl EffectSource {
    fn config(&self) -> &EffectConfig {
        match self {
            EffectSource::Mesh(_, config) | EffectSource::Load(_, config) => config,
        }
    }
}

type Driver = AnimationDriver<RenderEngine, MonotonicClock>;

pub struct FractureApp {
    event_loop: EventLoop<()>,
    state: AppState,
}

struct AppState {
    config: AppConfig,
    sources: Vec<EffectSource>,
    window: Option<Arc<Window>>,
    driver: Option<Driver>,
    ui_manager: Option<UiManager>,
    bus: ParameterBus,
    events: SurfaceEvents,
    error: Option<EffectError>,
}

impl FractureApp {
    pub fn new(config: AppConfig) -> Result<Self> {
        let event_loop = EventLoop::new()?;
        Ok(Self {
            event_loop,
            state: AppState {
                config,
                sources: Vec::new(),
                window: None,
                driver: None,
                ui_manager: None,
                bus: ParameterBus::default(),
                events: SurfaceEvents::new(),
                error: None,
            },
        })
    }

    /// Registers `mesh` as a variant set once the GPU is up
    pub fn add_mesh(&mut self, mesh: RawMesh, config: EffectConfig) {
        self.state.sources.push(EffectSource::Mesh(mesh, config));
    }

    /// Loads an OBJ file asynchronously; rendering starts when it resolves
    pub fn load_mesh(&mut self, path: impl Into<PathBuf>, config: EffectConfig) {
        self.state
            .sources
            .push(EffectSource::Load(path.into(), config));
    }

    /// Runs the event loop until the window closes or a frame fails
    pub fn run(self) -> Result<()> {
        let FractureApp {
            event_loop,
            mut state,
        } = self;
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut state)?;

        match state.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl AppState {
    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window = Arc::new(
            event_loop.create_window(
                WindowAttributes::default()
                    .with_title(self.config.title.clone())
                    .with_inner_size(winit::dpi::LogicalSize::new(
                        self.config.width,
                        self.config.height,
                    )),
            )?,
        );
        self.window = Some(window.clone());

        let (width, height): (u32, u32) = window.inner_size().into();
        let mut engine = pollster::block_on(RenderEngine::new(window.clone(), width, height))?;
        engine.set_vsync(self.config.vsync);

        let size = SurfaceSize::new(width, height);
        let camera = OrbitCamera::new(
            self.config.camera_distance,
            0.0,
            0.0,
            Vector3::new(0.0, 0.0, 0.0),
            size.aspect(),
        )
        .with_projection(self.config.fovy_degrees, self.config.znear, self.config.zfar);
        let camera_manager = CameraManager::new(camera, CameraController::new(0.005, 0.1));

        if self.config.show_panel {
            let mut ui_manager =
                UiManager::new(engine.device(), engine.queue(), engine.surface_format(), &window);
            ui_manager.update_display_size(width, height);
            self.ui_manager = Some(ui_manager);
        }

        let mut context = EffectContext::new(engine, camera_manager);
        context.compositor.configure(self.config.passes.clone())?;
        context.scene.set_background(self.config.background);

        let panel_config = self
            .sources
            .first()
            .map(|source| source.config().clone())
            .unwrap_or_default();

        let mut pending = None;
        for source in self.sources.drain(..) {
            match source {
                EffectSource::Mesh(mesh, config) => {
                    context.scene.create_variant_set(mesh, &config)?;
                }
                EffectSource::Load(path, config) => {
                    if pending.is_some() {
                        log::warn!("Only one load is awaited; ignoring '{}'", path.display());
                        continue;
                    }
                    pending = Some((AssetLoader::load(path), config));
                }
            }
        }

        self.bus = ParameterBus::for_context(&context, &panel_config);

        let mut driver = AnimationDriver::new(context, MonotonicClock::new());
        match pending {
            Some((handle, config)) => driver.start_after(handle, config, &mut self.events)?,
            None => driver.start(&mut self.events)?,
        }
        self.driver = Some(driver);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: EffectError) {
        log::error!("{}", error);
        self.error = Some(error);
        event_loop.exit();
    }

    fn redraw(&mut self) -> Result<()> {
        let (Some(driver), Some(window)) = (self.driver.as_mut(), self.window.as_ref()) else {
            return Ok(());
        };

        let Some(ui_manager) = self.ui_manager.as_mut() else {
            driver.frame()?;
            return Ok(());
        };

        let bus = &self.bus;
        let mut edits = Vec::new();
        ui_manager.update_logic(window, |ui| {
            edits = parameter_panel(ui, bus);
        })?;
        for edit in edits {
            if let Err(e) = self.bus.apply_to_driver(edit.key, edit.value, driver) {
                log::warn!("Rejected panel edit: {}", e);
            }
        }

        driver.frame_with_overlay(Some(|engine: &mut RenderEngine| {
            engine.draw_overlay(|device, queue, encoder, view| {
                ui_manager.render(device, queue, encoder, view)
            })
        }))?;
        Ok(())
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(window) = self.window.clone() else {
            return;
        };

        // UI gets input first
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            if ui_manager.handle_input(&window, window_id, &event) {
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput {
                event: ref key_event,
                ..
            } => {
                let escape = key_event.state == ElementState::Pressed
                    && key_event.physical_key == PhysicalKey::Code(KeyCode::Escape);
                if escape {
                    event_loop.exit();
                } else if let Some(driver) = self.driver.as_mut() {
                    driver.context_mut().camera.process_keyboard_event(key_event);
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.events.publish_resize(SurfaceSize::new(width, height));
                if let Some(ui_manager) = self.ui_manager.as_mut() {
                    ui_manager.update_display_size(width, height);
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => match self.redraw() {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    log::error!("Frame failed: {}", e);
                }
                Err(e) => self.fail(event_loop, e),
            },
            _ => (),
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(driver) = self.driver.as_mut() else {
            return;
        };
        let camera = &mut driver.context_mut().camera;
        if self
            .ui_manager
            .as_ref()
            .is_some_and(|ui_manager| ui_manager.wants_input())
        {
            camera.release_input();
            return;
        }
        camera.process_event(&event);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(driver) = self.driver.as_mut() {
            driver.stop();
        }
    }
}
