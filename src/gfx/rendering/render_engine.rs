//! WGPU-based rendering engine
//!
//! Owns the surface, device and every size-dependent target, and executes
//! the frame steps requested by the [`FrameCompositor`](super::compositor::FrameCompositor).

use std::sync::Arc;
use wgpu::TextureFormat;

use crate::error::{EffectError, Result};
use crate::gfx::{
    camera::camera_utils::CameraUniform,
    effect::{effect_material_layout, DrawVariantSet, EffectScene, EffectVariant},
    geometry::vertex::EffectVertex,
    resources::{
        global_bindings::{update_global_ubo, GlobalBindings, GlobalUBO},
        texture_resource::TextureResource,
    },
};
use crate::wgpu_utils::binding_builder::BindGroupLayoutWithDesc;

use super::bloom::BloomPass;
use super::compositor::{BloomParams, FrameBackend, RenderTarget};
use super::pipeline_manager::{PipelineConfig, PipelineManager};

const EFFECT_SHADER: &str = "effect";

/// Preferred sample count for the effect passes
pub const MSAA_SAMPLES: u32 = 4;

/// [`MSAA_SAMPLES`] when every attachment format supports it, else 1.
fn pick_sample_count(supported: impl Fn(u32) -> bool) -> u32 {
    if supported(MSAA_SAMPLES) {
        MSAA_SAMPLES
    } else {
        1
    }
}

fn effect_pipeline_name(variant: EffectVariant, target: RenderTarget) -> &'static str {
    match (variant, target) {
        (EffectVariant::Fill, RenderTarget::Surface) => "EffectFill",
        (EffectVariant::Wireframe, RenderTarget::Surface) => "EffectWireframe",
        (EffectVariant::Fill, RenderTarget::Intermediate) => "EffectFillHdr",
        (EffectVariant::Wireframe, RenderTarget::Intermediate) => "EffectWireframeHdr",
    }
}

/// Multisampled color attachments the effect passes resolve from
struct MsaaTargets {
    surface: TextureResource,
    intermediate: TextureResource,
}

impl MsaaTargets {
    fn new(device: &wgpu::Device, width: u32, height: u32, surface_format: TextureFormat, samples: u32) -> Self {
        Self {
            surface: TextureResource::create_multisampled_target(
                device,
                width,
                height,
                surface_format,
                samples,
                "MSAA Surface Target",
            ),
            intermediate: TextureResource::create_multisampled_target(
                device,
                width,
                height,
                TextureResource::TARGET_FORMAT,
                samples,
                "MSAA Intermediate Target",
            ),
        }
    }

    fn view(&self, target: RenderTarget) -> &wgpu::TextureView {
        match target {
            RenderTarget::Surface => &self.surface.view,
            RenderTarget::Intermediate => &self.intermediate.view,
        }
    }
}

/// Work recorded between `begin_frame` and `end_frame`
struct FrameState {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

/// GPU side of the frame compositor.
///
/// Base draws go straight to the surface, or into the HDR intermediate
/// target when a bloom pass follows; bloom then composites onto the surface.
/// Effect draws are multisampled when the adapter allows it and resolved
/// into whichever target the pass names.
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,
    depth_texture: TextureResource,
    intermediate: Option<TextureResource>,
    sample_count: u32,
    msaa: Option<MsaaTargets>,
    pub pipeline_manager: PipelineManager,
    global_ubo: GlobalUBO,
    global_bindings: GlobalBindings,
    material_layout: BindGroupLayoutWithDesc,
    bloom: BloomPass,
    frame: Option<FrameState>,
}

impl RenderEngine {
    /// Creates a new render engine for `window`
    ///
    /// # Arguments
    /// * `window` - Surface target (the winit window)
    /// * `width`, `height` - Initial surface size in pixels
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| EffectError::AdapterRequest(e.to_string()))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_capabilities.formats.first().copied())
            .ok_or_else(|| EffectError::AdapterRequest("surface reports no formats".into()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let device = Arc::new(device);
        let queue = Arc::new(queue);

        let sample_count = pick_sample_count(|count| {
            [format, TextureResource::TARGET_FORMAT, TextureResource::DEPTH_FORMAT]
                .iter()
                .all(|f| adapter.get_texture_format_features(*f).flags.sample_count_supported(count))
        });
        log::info!("Effect passes use {}x MSAA", sample_count);

        let depth_texture = TextureResource::create_depth_texture(
            &device,
            config.width,
            config.height,
            sample_count,
            "Depth Texture",
        );
        let msaa = (sample_count > 1)
            .then(|| MsaaTargets::new(&device, config.width, config.height, format, sample_count));
        let intermediate = TextureResource::create_render_target(
            &device,
            config.width,
            config.height,
            TextureResource::TARGET_FORMAT,
            "Intermediate Target",
        );

        let global_ubo = GlobalUBO::new(&device);
        let global_bindings = GlobalBindings::new(&device, &global_ubo);
        let material_layout = effect_material_layout(&device);

        let mut bloom = BloomPass::new(&device);
        bloom.resize(&device, &intermediate);

        let mut pipeline_manager = PipelineManager::new(device.clone());
        pipeline_manager.load_shader(EFFECT_SHADER, include_str!("effect.wgsl"));

        for target in [RenderTarget::Surface, RenderTarget::Intermediate] {
            let color_format = match target {
                RenderTarget::Surface => format,
                RenderTarget::Intermediate => TextureResource::TARGET_FORMAT,
            };
            for variant in EffectVariant::ALL {
                let name = effect_pipeline_name(variant, target);
                pipeline_manager.register_pipeline(
                    name,
                    PipelineConfig::new(EFFECT_SHADER, name, color_format)
                        .with_fragment_entry(variant.fragment_entry())
                        .with_bind_group_layouts(vec![
                            global_bindings.bind_group_layout().clone(),
                            material_layout.layout.clone(),
                        ])
                        .with_vertex_layouts(vec![EffectVertex::desc()])
                        .with_topology(variant.topology())
                        .with_depth(TextureResource::DEPTH_FORMAT, true)
                        .with_multisample(sample_count)
                        .with_blend(wgpu::BlendState::ALPHA_BLENDING),
                );
            }
        }
        bloom.register_pipelines(&mut pipeline_manager, format);

        if let Err(errors) = pipeline_manager.create_all_pipelines() {
            return Err(EffectError::MissingPipeline(errors.join("; ")));
        }
        log::debug!("Pipelines: {:?}", pipeline_manager.stats());

        Ok(RenderEngine {
            surface,
            device,
            queue,
            config,
            format,
            depth_texture,
            intermediate: Some(intermediate),
            sample_count,
            msaa,
            pipeline_manager,
            global_ubo,
            global_bindings,
            material_layout,
            bloom,
            frame: None,
        })
    }

    /// Recreates targets dropped by `release`.
    fn ensure_targets(&mut self) {
        if self.intermediate.is_none() {
            let intermediate = TextureResource::create_render_target(
                &self.device,
                self.config.width,
                self.config.height,
                TextureResource::TARGET_FORMAT,
                "Intermediate Target",
            );
            self.bloom.resize(&self.device, &intermediate);
            self.intermediate = Some(intermediate);
            self.msaa = self.create_msaa_targets();
            log::debug!("Recreated offscreen targets");
        }
    }

    fn create_msaa_targets(&self) -> Option<MsaaTargets> {
        (self.sample_count > 1).then(|| {
            MsaaTargets::new(
                &self.device,
                self.config.width,
                self.config.height,
                self.format,
                self.sample_count,
            )
        })
    }

    /// Samples per pixel of the effect passes
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Hands the current frame's encoder and surface view to `draw`, which
    /// records on top of what the frame's passes already drew. Used for the
    /// UI overlay.
    pub fn draw_overlay<F>(&mut self, draw: F) -> Result<()>
    where
        F: FnOnce(
            &wgpu::Device,
            &wgpu::Queue,
            &mut wgpu::CommandEncoder,
            &wgpu::TextureView,
        ) -> Result<()>,
    {
        let FrameState { view, encoder, .. } =
            self.frame.as_mut().ok_or(EffectError::NoActiveFrame)?;
        draw(&self.device, &self.queue, encoder, view)
    }

    pub fn get_surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Format the overlay pass must target
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Switches between vsync and uncapped presentation
    pub fn set_vsync(&mut self, enable: bool) {
        self.config.present_mode = if enable {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        self.surface.configure(&self.device, &self.config);
        log::info!("VSync {}", if enable { "enabled" } else { "disabled" });
    }
}

impl FrameBackend for RenderEngine {
    fn begin_frame(&mut self) -> Result<()> {
        if self.frame.is_some() {
            log::warn!("Previous frame was never finished; dropping it");
            self.frame = None;
        }
        self.ensure_targets();

        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                // Reconfigure so the next frame can acquire again
                self.surface.configure(&self.device, &self.config);
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.frame = Some(FrameState {
            surface_texture,
            view,
            encoder,
        });
        Ok(())
    }

    fn draw_scene(
        &mut self,
        target: RenderTarget,
        scene: &mut EffectScene,
        camera: &CameraUniform,
    ) -> Result<()> {
        for set in scene.sets_mut() {
            set.sync_gpu(&self.device, &self.queue, &self.material_layout);
        }
        update_global_ubo(&mut self.global_ubo, &self.queue, *camera);

        let FrameState {
            view: surface_view,
            encoder,
            ..
        } = self.frame.as_mut().ok_or(EffectError::NoActiveFrame)?;

        let color_view = match target {
            RenderTarget::Surface => &*surface_view,
            RenderTarget::Intermediate => {
                &self
                    .intermediate
                    .as_ref()
                    .ok_or(EffectError::NoActiveFrame)?
                    .view
            }
        };

        let fill = self
            .pipeline_manager
            .pipeline(effect_pipeline_name(EffectVariant::Fill, target))?;
        let wireframe = self
            .pipeline_manager
            .pipeline(effect_pipeline_name(EffectVariant::Wireframe, target))?;

        // Multisampled contents are only needed until they are resolved
        let (attachment, resolve_target, store) = match &self.msaa {
            Some(msaa) => (msaa.view(target), Some(color_view), wgpu::StoreOp::Discard),
            None => (color_view, None, wgpu::StoreOp::Store),
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Effect Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: attachment,
                resolve_target,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(scene.background_color()),
                    store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);
        for set in scene.sets() {
            render_pass.set_pipeline(fill);
            render_pass.draw_variant(set, EffectVariant::Fill);
            render_pass.set_pipeline(wireframe);
            render_pass.draw_variant(set, EffectVariant::Wireframe);
        }
        Ok(())
    }

    fn apply_bloom(&mut self, params: &BloomParams) -> Result<()> {
        self.bloom.update_settings(&self.queue, params);
        let FrameState { view, encoder, .. } =
            self.frame.as_mut().ok_or(EffectError::NoActiveFrame)?;
        self.bloom.record(encoder, &self.pipeline_manager, view)
    }

    fn end_frame(&mut self) -> Result<()> {
        let frame = self.frame.take().ok_or(EffectError::NoActiveFrame)?;
        self.queue.submit(std::iter::once(frame.encoder.finish()));
        frame.surface_texture.present();
        Ok(())
    }

    fn abandon_frame(&mut self) {
        if self.frame.take().is_some() {
            log::warn!("Abandoned frame without presenting");
        }
    }

    /// Reconfigures the surface and recreates every size-dependent target
    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture = TextureResource::create_depth_texture(
            &self.device,
            width,
            height,
            self.sample_count,
            "Depth Texture",
        );
        self.msaa = self.create_msaa_targets();
        let intermediate = TextureResource::create_render_target(
            &self.device,
            width,
            height,
            TextureResource::TARGET_FORMAT,
            "Intermediate Target",
        );
        self.bloom.resize(&self.device, &intermediate);
        self.intermediate = Some(intermediate);
        log::debug!("Render targets resized to {}x{}", width, height);
    }

    fn release(&mut self) {
        self.frame = None;
        self.intermediate = None;
        self.msaa = None;
        self.bloom.release();
    }
}
