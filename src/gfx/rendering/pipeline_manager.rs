//! Named render pipelines
//!
//! Pipelines are registered by name from a [`PipelineConfig`], compiled in one
//! batch when the engine starts and then looked up by name while recording.

use std::{collections::HashMap, sync::Arc};
use wgpu::*;

use crate::error::{EffectError, Result};

/// Everything needed to build one render pipeline.
///
/// Defaults: `vs_main`/`fs_main` entry points, triangle list, no culling, no
/// vertex buffers (fullscreen passes), no depth and a single sample.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub label: String,
    pub shader: String,
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub bind_group_layouts: Vec<BindGroupLayout>,
    pub vertex_layouts: Vec<VertexBufferLayout<'static>>,
    pub topology: PrimitiveTopology,
    pub cull_mode: Option<Face>,
    pub depth: Option<(TextureFormat, bool)>,
    pub sample_count: u32,
    pub color_target: ColorTargetState,
}

impl PipelineConfig {
    pub fn new(shader: &str, label: &str, color_format: TextureFormat) -> Self {
        Self {
            label: label.to_string(),
            shader: shader.to_string(),
            vertex_entry: "vs_main".to_string(),
            fragment_entry: "fs_main".to_string(),
            bind_group_layouts: Vec::new(),
            vertex_layouts: Vec::new(),
            topology: PrimitiveTopology::TriangleList,
            cull_mode: None,
            depth: None,
            sample_count: 1,
            color_target: ColorTargetState {
                format: color_format,
                blend: None,
                write_mask: ColorWrites::ALL,
            },
        }
    }

    pub fn with_fragment_entry(mut self, entry: &str) -> Self {
        self.fragment_entry = entry.to_string();
        self
    }

    /// Layouts in group order
    pub fn with_bind_group_layouts(mut self, layouts: Vec<BindGroupLayout>) -> Self {
        self.bind_group_layouts = layouts;
        self
    }

    pub fn with_vertex_layouts(mut self, layouts: Vec<VertexBufferLayout<'static>>) -> Self {
        self.vertex_layouts = layouts;
        self
    }

    pub fn with_topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Depth test (LessEqual) against a `format` attachment; `write` updates it.
    pub fn with_depth(mut self, format: TextureFormat, write: bool) -> Self {
        self.depth = Some((format, write));
        self
    }

    /// Attachments drawn with this pipeline must have `count` samples.
    pub fn with_multisample(mut self, count: u32) -> Self {
        self.sample_count = count.max(1);
        self
    }

    pub fn with_blend(mut self, blend: BlendState) -> Self {
        self.color_target.blend = Some(blend);
        self
    }
}

pub struct PipelineManager {
    device: Arc<Device>,
    shaders: HashMap<String, ShaderModule>,
    configs: HashMap<String, PipelineConfig>,
    pipelines: HashMap<String, RenderPipeline>,
    pending: Vec<String>,
}

impl PipelineManager {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            device,
            shaders: HashMap::new(),
            configs: HashMap::new(),
            pipelines: HashMap::new(),
            pending: Vec::new(),
        }
    }

    pub fn load_shader(&mut self, name: &str, source: &str) {
        let module = self.device.create_shader_module(ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSource::Wgsl(source.into()),
        });
        self.shaders.insert(name.to_string(), module);
        log::debug!("Loaded shader '{}'", name);
    }

    /// Queues `config` under `name`; an existing pipeline of that name is
    /// dropped and rebuilt on the next [`create_all_pipelines`](Self::create_all_pipelines).
    pub fn register_pipeline(&mut self, name: &str, config: PipelineConfig) {
        self.pipelines.remove(name);
        self.configs.insert(name.to_string(), config);
        if !self.pending.iter().any(|pending| pending == name) {
            self.pending.push(name.to_string());
        }
    }

    /// Builds every queued pipeline. Failures stay queued and are reported
    /// together.
    pub fn create_all_pipelines(&mut self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();
        for name in std::mem::take(&mut self.pending) {
            let Some(config) = self.configs.get(&name) else {
                continue;
            };
            match self.build(config) {
                Ok(pipeline) => {
                    self.pipelines.insert(name, pipeline);
                }
                Err(e) => {
                    log::error!("Failed to create pipeline '{}': {}", name, e);
                    errors.push(format!("{}: {}", name, e));
                    self.pending.push(name);
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn pipeline(&self, name: &str) -> Result<&RenderPipeline> {
        self.pipelines
            .get(name)
            .ok_or_else(|| EffectError::MissingPipeline(name.to_string()))
    }

    pub fn stats(&self) -> PipelineStats {
        PipelineStats {
            created: self.pipelines.len(),
            pending: self.pending.len(),
            shaders: self.shaders.len(),
        }
    }

    fn build(&self, config: &PipelineConfig) -> std::result::Result<RenderPipeline, String> {
        let module = self
            .shaders
            .get(&config.shader)
            .ok_or_else(|| format!("shader '{}' is not loaded", config.shader))?;

        let layouts: Vec<&BindGroupLayout> = config.bind_group_layouts.iter().collect();
        let layout = self
            .device
            .create_pipeline_layout(&PipelineLayoutDescriptor {
                label: Some(&config.label),
                bind_group_layouts: &layouts,
                push_constant_ranges: &[],
            });

        Ok(self
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(&config.label),
                layout: Some(&layout),
                vertex: VertexState {
                    module,
                    entry_point: Some(&config.vertex_entry),
                    buffers: &config.vertex_layouts,
                    compilation_options: PipelineCompilationOptions::default(),
                },
                fragment: Some(FragmentState {
                    module,
                    entry_point: Some(&config.fragment_entry),
                    targets: &[Some(config.color_target.clone())],
                    compilation_options: PipelineCompilationOptions::default(),
                }),
                primitive: PrimitiveState {
                    topology: config.topology,
                    cull_mode: config.cull_mode,
                    ..Default::default()
                },
                depth_stencil: config.depth.map(|(format, write)| DepthStencilState {
                    format,
                    depth_write_enabled: write,
                    depth_compare: CompareFunction::LessEqual,
                    stencil: StencilState::default(),
                    bias: DepthBiasState::default(),
                }),
                multisample: MultisampleState {
                    count: config.sample_count,
                    ..Default::default()
                },
                multiview: None,
                cache: None,
            }))
    }
}

#[derive(Debug)]
pub struct PipelineStats {
    pub created: usize,
    pub pending: usize,
    pub shaders: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_to_fullscreen_single_sample() {
        let config = PipelineConfig::new("bloom", "Fullscreen", TextureFormat::Rgba16Float);
        assert_eq!(config.vertex_entry, "vs_main");
        assert_eq!(config.fragment_entry, "fs_main");
        assert!(config.vertex_layouts.is_empty());
        assert!(config.depth.is_none());
        assert_eq!(config.sample_count, 1);
    }

    #[test]
    fn test_multisample_and_depth_builders() {
        let config = PipelineConfig::new("effect", "EffectFill", TextureFormat::Bgra8Unorm)
            .with_fragment_entry("fs_fill")
            .with_topology(PrimitiveTopology::LineList)
            .with_depth(TextureFormat::Depth32Float, true)
            .with_multisample(4);
        assert_eq!(config.sample_count, 4);
        assert_eq!(config.depth, Some((TextureFormat::Depth32Float, true)));
        assert_eq!(config.topology, PrimitiveTopology::LineList);

        assert_eq!(config.with_multisample(0).sample_count, 1);
    }
}
