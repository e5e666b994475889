//! GPU storage behind frame buffers.

use crate::renderer::BufferKind;

use super::gpu::GpuContext;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A texture that can be rendered to and, for color buffers, sampled from.
///
/// Color buffers use the surface format so every pipeline compiled for the
/// window can also draw into them.
pub struct RenderTarget {
    #[allow(dead_code)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub kind: BufferKind,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub fn new(gpu: &GpuContext, kind: BufferKind, width: u32, height: u32, label: &str) -> Self {
        let (format, usage) = match kind {
            BufferKind::Color { .. } => (
                gpu.format(),
                wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            ),
            BufferKind::Depth => (DEPTH_FORMAT, wgpu::TextureUsages::RENDER_ATTACHMENT),
        };
        let texture = gpu.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            kind,
            width,
            height,
        }
    }

    /// Recreates the target if the size changed.
    pub fn ensure_size(&mut self, gpu: &GpuContext, width: u32, height: u32, label: &str) {
        if self.width != width || self.height != height {
            *self = Self::new(gpu, self.kind, width, height, label);
        }
    }
}
