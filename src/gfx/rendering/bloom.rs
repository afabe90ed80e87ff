//! Bloom post-process
//!
//! Four fullscreen passes, all sharing `bloom.wgsl`:
//!
//! 1. extract: intermediate -> bright (half resolution, luminance threshold)
//! 2. horizontal blur: bright -> ping
//! 3. vertical blur: ping -> pong
//! 4. composite: intermediate + pong -> surface

use wgpu::{CommandEncoder, Device, Queue, TextureFormat, TextureView};

use crate::error::{EffectError, Result};
use crate::gfx::resources::texture_resource::TextureResource;
use crate::wgpu_utils::{
    binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
    binding_types,
    uniform_buffer::UniformBuffer,
};

use super::compositor::BloomParams;
use super::pipeline_manager::{PipelineConfig, PipelineManager};

pub const BLOOM_SHADER: &str = "bloom";
pub const EXTRACT_PIPELINE: &str = "BloomExtract";
pub const BLUR_PIPELINE: &str = "BloomBlur";
pub const COMPOSITE_PIPELINE: &str = "BloomComposite";

/// MUST match `BloomSettings` in `bloom.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BloomUniform {
    pub strength: f32,
    pub threshold: f32,
    pub radius: f32,
    _pad: f32,
    pub texel_size: [f32; 2],
    _pad2: [f32; 2],
}

impl BloomUniform {
    pub fn new(params: &BloomParams, width: u32, height: u32) -> Self {
        Self {
            strength: params.strength,
            threshold: params.threshold,
            radius: params.radius,
            _pad: 0.0,
            texel_size: [1.0 / width.max(1) as f32, 1.0 / height.max(1) as f32],
            _pad2: [0.0; 2],
        }
    }
}

/// MUST match `BlurDirection` in `bloom.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct BlurDirectionUniform {
    direction: [f32; 2],
    _pad: [f32; 2],
}

/// Size-dependent textures and the bind groups that sample them.
struct BloomTargets {
    bright: TextureResource,
    ping: TextureResource,
    pong: TextureResource,
    source_group: wgpu::BindGroup,
    bright_group: wgpu::BindGroup,
    ping_group: wgpu::BindGroup,
    pong_group: wgpu::BindGroup,
}

pub struct BloomPass {
    settings_ubo: UniformBuffer<BloomUniform>,
    settings_layout: BindGroupLayoutWithDesc,
    texture_layout: BindGroupLayoutWithDesc,
    horizontal_group: wgpu::BindGroup,
    vertical_group: wgpu::BindGroup,
    // Kept alive for the bind groups above
    _horizontal_ubo: UniformBuffer<BlurDirectionUniform>,
    _vertical_ubo: UniformBuffer<BlurDirectionUniform>,
    targets: Option<BloomTargets>,
}

impl BloomPass {
    pub fn new(device: &Device) -> Self {
        let settings_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::uniform())
            .next_binding_fragment(binding_types::uniform())
            .create(device, "Bloom Settings Layout");
        let texture_layout = BindGroupLayoutBuilder::new()
            .next_binding_fragment(binding_types::filterable_texture_2d())
            .next_binding_fragment(binding_types::filtering_sampler())
            .create(device, "Bloom Texture Layout");

        let settings_ubo =
            UniformBuffer::new_with_data(device, &BloomUniform::new(&BloomParams::default(), 1, 1));
        let horizontal_ubo = UniformBuffer::new_with_data(
            device,
            &BlurDirectionUniform {
                direction: [1.0, 0.0],
                _pad: [0.0; 2],
            },
        );
        let vertical_ubo = UniformBuffer::new_with_data(
            device,
            &BlurDirectionUniform {
                direction: [0.0, 1.0],
                _pad: [0.0; 2],
            },
        );

        let horizontal_group = BindGroupBuilder::new(&settings_layout)
            .resource(settings_ubo.binding_resource())
            .resource(horizontal_ubo.binding_resource())
            .create(device, "Bloom Horizontal Bind Group");
        let vertical_group = BindGroupBuilder::new(&settings_layout)
            .resource(settings_ubo.binding_resource())
            .resource(vertical_ubo.binding_resource())
            .create(device, "Bloom Vertical Bind Group");

        Self {
            settings_ubo,
            settings_layout,
            texture_layout,
            horizontal_group,
            vertical_group,
            _horizontal_ubo: horizontal_ubo,
            _vertical_ubo: vertical_ubo,
            targets: None,
        }
    }

    /// Registers the extract, blur and composite pipelines.
    pub fn register_pipelines(&self, pipelines: &mut PipelineManager, surface_format: TextureFormat) {
        pipelines.load_shader(BLOOM_SHADER, include_str!("bloom.wgsl"));

        let two_groups = vec![
            self.settings_layout.layout.clone(),
            self.texture_layout.layout.clone(),
        ];
        let fullscreen = |name: &str, fragment: &str, format: wgpu::TextureFormat| {
            PipelineConfig::new(BLOOM_SHADER, name, format).with_fragment_entry(fragment)
        };

        pipelines.register_pipeline(
            EXTRACT_PIPELINE,
            fullscreen(EXTRACT_PIPELINE, "fs_extract", TextureResource::TARGET_FORMAT)
                .with_bind_group_layouts(two_groups.clone()),
        );
        pipelines.register_pipeline(
            BLUR_PIPELINE,
            fullscreen(BLUR_PIPELINE, "fs_blur", TextureResource::TARGET_FORMAT)
                .with_bind_group_layouts(two_groups),
        );
        pipelines.register_pipeline(
            COMPOSITE_PIPELINE,
            fullscreen(COMPOSITE_PIPELINE, "fs_composite", surface_format).with_bind_group_layouts(
                vec![
                    self.settings_layout.layout.clone(),
                    self.texture_layout.layout.clone(),
                    self.texture_layout.layout.clone(),
                ],
            ),
        );
    }

    pub fn has_targets(&self) -> bool {
        self.targets.is_some()
    }

    /// Recreates the half-resolution textures and every bind group that
    /// references them or the intermediate target.
    pub fn resize(&mut self, device: &Device, source: &TextureResource) {
        let width = (source.width / 2).max(1);
        let height = (source.height / 2).max(1);
        let target = |label: &str| {
            TextureResource::create_render_target(
                device,
                width,
                height,
                TextureResource::TARGET_FORMAT,
                label,
            )
        };
        let bright = target("Bloom Bright Texture");
        let ping = target("Bloom Ping Texture");
        let pong = target("Bloom Pong Texture");

        let sampled = |resource: &TextureResource, label: &str| {
            BindGroupBuilder::new(&self.texture_layout)
                .texture(&resource.view)
                .sampler(&resource.sampler)
                .create(device, label)
        };
        let source_group = sampled(source, "Bloom Source Bind Group");
        let bright_group = sampled(&bright, "Bloom Bright Bind Group");
        let ping_group = sampled(&ping, "Bloom Ping Bind Group");
        let pong_group = sampled(&pong, "Bloom Pong Bind Group");

        log::debug!("Bloom targets resized to {}x{}", width, height);
        self.targets = Some(BloomTargets {
            bright,
            ping,
            pong,
            source_group,
            bright_group,
            ping_group,
            pong_group,
        });
    }

    /// Drops the size-dependent targets.
    pub fn release(&mut self) {
        self.targets = None;
    }

    /// Writes the settings block; unchanged values skip the upload.
    pub fn update_settings(&mut self, queue: &Queue, params: &BloomParams) {
        let (width, height) = self
            .targets
            .as_ref()
            .map(|t| (t.bright.width, t.bright.height))
            .unwrap_or((1, 1));
        self.settings_ubo
            .update_content(queue, BloomUniform::new(params, width, height));
    }

    /// Records the four bloom passes. The result lands in `output`.
    pub fn record(
        &self,
        encoder: &mut CommandEncoder,
        pipelines: &PipelineManager,
        output: &TextureView,
    ) -> Result<()> {
        let targets = self.targets.as_ref().ok_or(EffectError::BloomTargetsMissing)?;

        let extract = pipelines.pipeline(EXTRACT_PIPELINE)?;
        let blur = pipelines.pipeline(BLUR_PIPELINE)?;
        let composite = pipelines.pipeline(COMPOSITE_PIPELINE)?;

        let steps: [(&str, &wgpu::RenderPipeline, &wgpu::BindGroup, &wgpu::BindGroup, &TextureView); 3] = [
            ("Bloom Extract Pass", extract, &self.horizontal_group, &targets.source_group, &targets.bright.view),
            ("Bloom Horizontal Pass", blur, &self.horizontal_group, &targets.bright_group, &targets.ping.view),
            ("Bloom Vertical Pass", blur, &self.vertical_group, &targets.ping_group, &targets.pong.view),
        ];

        for (label, pipeline, settings_group, source_group, view) in steps {
            let mut pass = begin_fullscreen_pass(encoder, label, view);
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, settings_group, &[]);
            pass.set_bind_group(1, source_group, &[]);
            pass.draw(0..3, 0..1);
        }

        let mut pass = begin_fullscreen_pass(encoder, "Bloom Composite Pass", output);
        pass.set_pipeline(composite);
        pass.set_bind_group(0, &self.horizontal_group, &[]);
        pass.set_bind_group(1, &targets.source_group, &[]);
        pass.set_bind_group(2, &targets.pong_group, &[]);
        pass.draw(0..3, 0..1);

        Ok(())
    }
}

fn begin_fullscreen_pass<'e>(
    encoder: &'e mut CommandEncoder,
    label: &str,
    view: &TextureView,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Any adapter will do; machines without one skip the GPU tests.
    fn device() -> Option<(Arc<Device>, wgpu::Queue)> {
        let instance = wgpu::Instance::default();
        let adapter =
            pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions::default()))
                .ok()?;
        // The queue is returned so it outlives the device's use in the test;
        // wgpu cannot create command encoders once the queue is dropped.
        let (device, queue) =
            pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor::default())).ok()?;
        Some((Arc::new(device), queue))
    }

    #[test]
    fn test_record_without_targets_is_an_error() {
        let Some((device, _queue)) = device() else {
            return;
        };
        let source = TextureResource::create_render_target(
            &device,
            64,
            64,
            TextureResource::TARGET_FORMAT,
            "Test Source",
        );
        let pipelines = PipelineManager::new(device.clone());
        let mut encoder =
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });

        let mut bloom = BloomPass::new(&device);
        assert!(matches!(
            bloom.record(&mut encoder, &pipelines, &source.view),
            Err(EffectError::BloomTargetsMissing)
        ));

        bloom.resize(&device, &source);
        bloom.release();
        assert!(matches!(
            bloom.record(&mut encoder, &pipelines, &source.view),
            Err(EffectError::BloomTargetsMissing)
        ));
    }

    #[test]
    fn test_uniform_layout_matches_shader() {
        assert_eq!(std::mem::size_of::<BloomUniform>(), 32);
        assert_eq!(std::mem::size_of::<BlurDirectionUniform>(), 16);
    }

    #[test]
    fn test_uniform_texel_size() {
        let uniform = BloomUniform::new(&BloomParams::default(), 400, 200);
        assert_eq!(uniform.texel_size, [1.0 / 400.0, 1.0 / 200.0]);
        assert_eq!(uniform.strength, 0.5);
        assert_eq!(uniform.threshold, 0.3);
        assert_eq!(uniform.radius, 0.4);

        let degenerate = BloomUniform::new(&BloomParams::default(), 0, 0);
        assert_eq!(degenerate.texel_size, [1.0, 1.0]);
    }
}
