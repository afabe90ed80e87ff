//! Render targets
//!
//! Depth buffers, multisampled attachments and offscreen HDR color targets. Color targets are sampled
//! by the bloom passes, so they carry a linear sampler; the depth buffer is
//! only ever an attachment.

/// A 2D texture with its default view and a sampler
#[derive(Clone)]
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
}

impl TextureResource {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// HDR so bright regions survive until the bloom threshold
    pub const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

    /// Sizes are clamped to at least 1x1. `samples` must match the color
    /// attachment it is paired with.
    pub fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        samples: u32,
        label: &str,
    ) -> Self {
        Self::allocate(
            device,
            (width, height),
            Self::DEPTH_FORMAT,
            samples,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
            wgpu::FilterMode::Nearest,
            label,
        )
    }

    /// Multisampled color attachment, resolved into a single-sample view.
    pub fn create_multisampled_target(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        samples: u32,
        label: &str,
    ) -> Self {
        Self::allocate(
            device,
            (width, height),
            format,
            samples,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
            wgpu::FilterMode::Nearest,
            label,
        )
    }

    /// A color target that can be drawn into and then sampled.
    pub fn create_render_target(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> Self {
        Self::allocate(
            device,
            (width, height),
            format,
            1,
            wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            wgpu::FilterMode::Linear,
            label,
        )
    }

    fn allocate(
        device: &wgpu::Device,
        (width, height): (u32, u32),
        format: wgpu::TextureFormat,
        sample_count: u32,
        usage: wgpu::TextureUsages,
        filter: wgpu::FilterMode,
        label: &str,
    ) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: sample_count.max(1),
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            mag_filter: filter,
            min_filter: filter,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            width,
            height,
        }
    }
}
