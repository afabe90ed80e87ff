//! Camera bind group
//!
//! One camera block shared by every effect draw, bound at group 0 in all
//! effect pipelines.

use crate::{
    gfx::camera::CameraUniform,
    wgpu_utils::{
        binding_builder::{BindGroupBuilder, BindGroupLayoutBuilder, BindGroupLayoutWithDesc},
        binding_types,
        uniform_buffer::UniformBuffer,
    },
};

/// Layout must match `CameraUniforms` in `effect.wgsl`.
pub type GlobalUBO = UniformBuffer<CameraUniform>;

/// Uploads `camera`; skipped when it has not moved since the last frame.
pub fn update_global_ubo(ubo: &mut GlobalUBO, queue: &wgpu::Queue, camera: CameraUniform) {
    ubo.update_content(queue, camera);
}

pub struct GlobalBindings {
    layout: BindGroupLayoutWithDesc,
    group: wgpu::BindGroup,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device, ubo: &GlobalUBO) -> Self {
        let layout = BindGroupLayoutBuilder::new()
            .next_binding_rendering(binding_types::uniform())
            .create(device, "Camera Layout");
        let group = BindGroupBuilder::new(&layout)
            .resource(ubo.binding_resource())
            .create(device, "Camera Bind Group");
        Self { layout, group }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.group
    }
}
