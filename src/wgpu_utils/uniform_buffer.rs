// src/wgpu_utils/uniform_buffer.rs
use std::marker::PhantomData;
use wgpu::util::DeviceExt;

const USAGE: wgpu::BufferUsages = wgpu::BufferUsages::UNIFORM.union(wgpu::BufferUsages::COPY_DST);

/// A uniform buffer holding exactly one `T`.
///
/// Remembers the bytes last written so redundant uploads can be skipped.
pub struct UniformBuffer<T> {
    buffer: wgpu::Buffer,
    last_written: Option<Vec<u8>>,
    _content: PhantomData<T>,
}

impl<T: bytemuck::Pod> UniformBuffer<T> {
    fn label() -> String {
        let full = std::any::type_name::<T>();
        let short = full.rsplit("::").next().unwrap_or(full);
        format!("{} uniform", short)
    }

    /// Zero-initialized buffer
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&Self::label()),
            size: std::mem::size_of::<T>() as u64,
            usage: USAGE,
            mapped_at_creation: false,
        });
        Self {
            buffer,
            last_written: None,
            _content: PhantomData,
        }
    }

    pub fn new_with_data(device: &wgpu::Device, content: &T) -> Self {
        let bytes = bytemuck::bytes_of(content);
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&Self::label()),
            contents: bytes,
            usage: USAGE,
        });
        Self {
            buffer,
            last_written: Some(bytes.to_vec()),
            _content: PhantomData,
        }
    }

    /// Writes `content` unless it matches the last write.
    pub fn update_content(&mut self, queue: &wgpu::Queue, content: T) {
        if self.last_written.as_deref() == Some(bytemuck::bytes_of(&content)) {
            return;
        }
        self.force_update_content(queue, content);
    }

    pub fn force_update_content(&mut self, queue: &wgpu::Queue, content: T) {
        let bytes = bytemuck::bytes_of(&content);
        queue.write_buffer(&self.buffer, 0, bytes);
        self.last_written = Some(bytes.to_vec());
    }

    pub fn binding_resource(&self) -> wgpu::BindingResource {
        self.buffer.as_entire_binding()
    }
}
