//! Bind group layout and pipeline cache shared by every draw.

use std::collections::HashMap;

use crate::assets::Vertex;
use crate::renderer::{Feature, MAX_TEXTURE_SLOTS};
use crate::shader::{Shader, ShaderId, ShaderKind};

use super::target::DEPTH_FORMAT;

/// Per-draw values at `@group(0) @binding(0)`.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Globals {
    pub transform: [[f32; 4]; 4],
    pub resolution: [f32; 2],
    pub time: f32,
    pub _padding: f32,
}

const GEOMETRY_BUFFERS: &[wgpu::VertexBufferLayout<'static>] = &[Vertex::LAYOUT];

/// First binding used by texture slots.
pub const TEXTURE_BINDING_BASE: u32 = 3;

/// Fixed-function state toggled through [`Feature`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FeatureSet {
    pub depth_test: bool,
    pub blend: bool,
    pub cull_face: bool,
}

impl FeatureSet {
    pub fn set(&mut self, feature: Feature, enabled: bool) {
        match feature {
            Feature::DepthTest => self.depth_test = enabled,
            Feature::Blend => self.blend = enabled,
            Feature::CullFace => self.cull_face = enabled,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub shader: ShaderId,
    pub color_targets: usize,
    pub has_depth: bool,
    pub features: FeatureSet,
}

pub struct Pipelines {
    pub layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    modules: HashMap<ShaderId, wgpu::ShaderModule>,
    cache: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl Pipelines {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniform = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        };

        let mut entries = vec![
            // Globals
            uniform(0),
            // Shader uniforms
            uniform(1),
            // Sampler
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ];
        for slot in 0..MAX_TEXTURE_SLOTS as u32 {
            entries.push(wgpu::BindGroupLayoutEntry {
                binding: TEXTURE_BINDING_BASE + slot,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lamina Bind Group Layout"),
            entries: &entries,
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lamina Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        Self {
            layout,
            pipeline_layout,
            modules: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    /// Returns the pipeline for `key`, compiling it on first use.
    pub fn get(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        shader: &Shader,
        key: PipelineKey,
    ) -> wgpu::RenderPipeline {
        if let Some(pipeline) = self.cache.get(&key) {
            return pipeline.clone();
        }

        let module = self
            .modules
            .entry(shader.id())
            .or_insert_with(|| {
                log::debug!("Compiling shader '{}'", shader.label());
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(shader.label()),
                    source: wgpu::ShaderSource::Wgsl(shader.source().into()),
                })
            })
            .clone();

        let blend = if key.features.blend {
            wgpu::BlendState::ALPHA_BLENDING
        } else {
            wgpu::BlendState::REPLACE
        };
        let targets: Vec<_> = (0..key.color_targets)
            .map(|_| {
                Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(blend),
                    write_mask: wgpu::ColorWrites::ALL,
                })
            })
            .collect();

        let vertex_buffers: &[wgpu::VertexBufferLayout] = match shader.kind() {
            ShaderKind::Screen => &[],
            ShaderKind::Geometry => GEOMETRY_BUFFERS,
        };

        let depth_stencil = key.has_depth.then(|| wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: key.features.depth_test,
            depth_compare: if key.features.depth_test {
                wgpu::CompareFunction::Less
            } else {
                wgpu::CompareFunction::Always
            },
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(shader.label()),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs"),
                buffers: vertex_buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs"),
                targets: &targets,
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: key.features.cull_face.then_some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        self.cache.insert(key, pipeline.clone());
        pipeline
    }
}
