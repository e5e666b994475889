//! Opaque mesh and texture handles.
//!
//! Backends own the GPU storage behind these handles; the composition core
//! only passes them back to the renderer to bind or draw. Handles are cheap
//! to copy and carry just enough metadata (sizes, index counts) for layout
//! decisions.

/// Vertex format shared by quads and meshes.
///
/// 32 bytes per vertex:
///
/// | Attribute | Format    | Offset | Shader Location |
/// |-----------|-----------|--------|-----------------|
/// | position  | Float32x3 | 0      | 0               |
/// | normal    | Float32x3 | 12     | 1               |
/// | uv        | Float32x2 | 24     | 2               |
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// The unit quad every `render_quad` call draws: `0..1` on X and Y,
    /// facing +Z, uv origin at the top-left.
    pub fn unit_quad() -> ([Vertex; 4], [u32; 6]) {
        let n = [0.0, 0.0, 1.0];
        (
            [
                Vertex::new([0.0, 0.0, 0.0], n, [0.0, 1.0]),
                Vertex::new([1.0, 0.0, 0.0], n, [1.0, 1.0]),
                Vertex::new([1.0, 1.0, 0.0], n, [1.0, 0.0]),
                Vertex::new([0.0, 1.0, 0.0], n, [0.0, 0.0]),
            ],
            [0, 1, 2, 0, 2, 3],
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub(crate) u64);

/// Handle to GPU-resident geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Mesh {
    pub(crate) id: MeshId,
    pub(crate) index_count: u32,
}

impl Mesh {
    pub fn id(&self) -> MeshId {
        self.id
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub(crate) u64);

/// Handle to a sampled texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Texture {
    pub(crate) id: TextureId,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub fn id(&self) -> TextureId {
        self.id
    }
}
