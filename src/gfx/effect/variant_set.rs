//! Mesh variant sets
//!
//! A [`MeshVariantSet`] couples one [`AugmentedGeometry`] with a Fill and a
//! Wireframe [`EffectMaterial`]. Both materials draw the same vertex buffer;
//! the wireframe adds a line-list index buffer over the triangle edges.

use wgpu::util::DeviceExt;
use wgpu::Device;

use crate::error::Result;
use crate::gfx::geometry::{AugmentedGeometry, RawMesh};
use crate::wgpu_utils::BindGroupLayoutWithDesc;

use super::config::EffectConfig;
use super::material::{EffectMaterial, EffectVariant};
use super::uniforms::UniformName;

/// GPU buffers of one variant set's geometry.
pub struct VariantSetBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub vertex_count: u32,
    pub edge_buffer: wgpu::Buffer,
    pub edge_count: u32,
}

/// One geometry with its paired fill and wireframe materials.
pub struct MeshVariantSet {
    geometry: AugmentedGeometry,
    fill: EffectMaterial,
    wireframe: EffectMaterial,
    buffers: Option<VariantSetBuffers>,
}

impl MeshVariantSet {
    /// Preprocess `mesh` once and build both materials from `config`.
    ///
    /// Nothing is returned unless every step succeeds.
    pub fn create(mesh: RawMesh, config: &EffectConfig) -> Result<Self> {
        let geometry = AugmentedGeometry::new(mesh)?;
        let fill = EffectMaterial::build(EffectVariant::Fill, config)?;
        let wireframe = EffectMaterial::build(EffectVariant::Wireframe, config)?;

        log::debug!(
            "Created variant set: {} triangles, {:?} layout",
            geometry.mesh().triangle_count(),
            config.layout
        );

        Ok(Self {
            geometry,
            fill,
            wireframe,
            buffers: None,
        })
    }

    pub fn geometry(&self) -> &AugmentedGeometry {
        &self.geometry
    }

    pub fn fill(&self) -> &EffectMaterial {
        &self.fill
    }

    pub fn wireframe(&self) -> &EffectMaterial {
        &self.wireframe
    }

    pub fn material(&self, variant: EffectVariant) -> &EffectMaterial {
        match variant {
            EffectVariant::Fill => &self.fill,
            EffectVariant::Wireframe => &self.wireframe,
        }
    }

    pub fn material_mut(&mut self, variant: EffectVariant) -> &mut EffectMaterial {
        match variant {
            EffectVariant::Fill => &mut self.fill,
            EffectVariant::Wireframe => &mut self.wireframe,
        }
    }

    /// Broadcast a value to both materials.
    ///
    /// Both materials validate before either is written, so a rejected value
    /// leaves the pair untouched.
    pub fn set_uniform(&mut self, name: UniformName, value: f32) -> Result<()> {
        self.validate_uniform(name, value)?;
        self.fill.set(name, value)?;
        self.wireframe.set(name, value)
    }

    pub(crate) fn validate_uniform(&self, name: UniformName, value: f32) -> Result<()> {
        self.fill.validate(name, value)?;
        self.wireframe.validate(name, value)
    }

    /// [`set_uniform`](Self::set_uniform) by external name.
    pub fn set_uniform_by_name(&mut self, name: &str, value: f32) -> Result<()> {
        let parsed = UniformName::parse(name).ok_or_else(|| {
            crate::error::EffectError::unknown_uniform(name, self.fill.layout())
        })?;
        self.set_uniform(parsed, value)
    }

    /// Push the elapsed time into both materials.
    pub fn tick(&mut self, elapsed_seconds: f32) -> Result<()> {
        self.set_uniform(UniformName::Time, elapsed_seconds)
    }

    /// Uploads geometry once and any dirty material uniforms.
    pub fn sync_gpu(
        &mut self,
        device: &Device,
        queue: &wgpu::Queue,
        material_layout: &BindGroupLayoutWithDesc,
    ) {
        if self.buffers.is_none() {
            self.buffers = Some(self.create_buffers(device));
        }
        self.fill.sync_gpu(device, queue, material_layout);
        self.wireframe.sync_gpu(device, queue, material_layout);
    }

    fn create_buffers(&self, device: &Device) -> VariantSetBuffers {
        let vertices = self.geometry.vertices();
        let edges = self.geometry.edge_indices();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Effect Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let edge_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Effect Edge Index Buffer"),
            contents: bytemuck::cast_slice(&edges),
            usage: wgpu::BufferUsages::INDEX,
        });

        log::debug!(
            "Uploaded variant set geometry: {} vertices, {} edge indices",
            vertices.len(),
            edges.len()
        );

        VariantSetBuffers {
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            edge_buffer,
            edge_count: edges.len() as u32,
        }
    }

    pub fn buffers(&self) -> Option<&VariantSetBuffers> {
        self.buffers.as_ref()
    }

    /// Drops every GPU resource of the set.
    pub fn release_gpu(&mut self) {
        self.buffers = None;
        self.fill.release_gpu();
        self.wireframe.release_gpu();
    }
}

/// Draw calls for variant sets on a render pass.
///
/// Materials bind at group 1; the caller binds the camera at group 0 and the
/// matching pipeline first.
pub trait DrawVariantSet<'a> {
    fn draw_variant(&mut self, set: &'a MeshVariantSet, variant: EffectVariant);
}

impl<'a, 'b> DrawVariantSet<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_variant(&mut self, set: &'b MeshVariantSet, variant: EffectVariant) {
        let buffers = match set.buffers() {
            Some(buffers) => buffers,
            None => return, // Skip drawing if not uploaded
        };
        let bind_group = match set.material(variant).bind_group() {
            Some(bind_group) => bind_group,
            None => return,
        };

        self.set_bind_group(1, bind_group, &[]);
        self.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
        match variant {
            EffectVariant::Fill => self.draw(0..buffers.vertex_count, 0..1),
            EffectVariant::Wireframe => {
                self.set_index_buffer(buffers.edge_buffer.slice(..), wgpu::IndexFormat::Uint32);
                self.draw_indexed(0..buffers.edge_count, 0, 0..1);
            }
        }
    }
}
