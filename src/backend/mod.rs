//! The wgpu renderer.
//!
//! [`WgpuRenderer`] implements [`Renderer`] on top of wgpu. Every draw is
//! recorded as its own render pass into the frame's command encoder, loading
//! whatever the target already holds, so draw order is paint order exactly as
//! the scene issues it. The frame is submitted and presented in
//! [`post_render`](Renderer::post_render).
//!
//! Meshes and textures are created through the inherent asset methods
//! ([`create_mesh`](WgpuRenderer::create_mesh),
//! [`load_texture`](WgpuRenderer::load_texture), ...) once the renderer is
//! bound to a window.

mod gpu;
mod pipeline;
mod target;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::assets::{Mesh, MeshId, Texture, TextureId, Vertex};
use crate::error::RenderError;
use crate::renderer::{
    Binding, BufferKind, Color, Feature, FrameBuffer, FrameBufferId, FrameBufferSet,
    MAX_TEXTURE_SLOTS, Renderer,
};
use crate::shader::{Shader, ShaderKind};
use crate::transform::Transform;
use crate::window::Window;

use gpu::GpuContext;
use pipeline::{FeatureSet, Globals, PipelineKey, Pipelines, TEXTURE_BINDING_BASE};
use target::RenderTarget;

/// Maps GL clip-space depth (-1..1) onto wgpu's 0..1.
const GL_TO_WGPU: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.5, 0.0, //
    0.0, 0.0, 0.5, 1.0,
]);

/// What occupies a texture slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Texture(TextureId),
    Buffer(FrameBufferId),
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

struct GpuTexture {
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// The frame being recorded between `pre_render` and `post_render`.
struct Frame {
    encoder: wgpu::CommandEncoder,
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// An entry of the frame buffer stack pushed by `use_frame_buffer`.
struct TargetRef {
    colors: Vec<FrameBufferId>,
    depth: Option<FrameBufferId>,
}

/// Attachments resolved for one pass.
struct Attachments {
    colors: Vec<wgpu::TextureView>,
    depth: Option<wgpu::TextureView>,
    size: (u32, u32),
}

enum Geometry {
    Screen,
    Quad,
    Mesh(MeshId),
}

struct GpuState {
    gpu: GpuContext,
    pipelines: Pipelines,
    sampler: wgpu::Sampler,
    white: GpuTexture,
    quad: GpuMesh,
    depth: RenderTarget,
    frame: Option<Frame>,
    targets: Vec<TargetRef>,
    buffers: HashMap<FrameBufferId, RenderTarget>,
    textures: HashMap<TextureId, GpuTexture>,
    meshes: HashMap<MeshId, GpuMesh>,
    bound: [Option<Slot>; MAX_TEXTURE_SLOTS],
    start: Instant,
    suspended: bool,
    next_id: u64,
}

/// A [`Renderer`] backed by wgpu.
///
/// Construct it before the window, share it as `Rc<dyn Renderer>` and hand
/// the same `Rc` to [`Window::new`].
pub struct WgpuRenderer {
    instance: RefCell<Option<wgpu::Instance>>,
    state: RefCell<Option<GpuState>>,
    clear_color: Cell<Color>,
    features: Cell<FeatureSet>,
    destroyed: Cell<bool>,
}

impl Default for WgpuRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl WgpuRenderer {
    pub fn new() -> Self {
        Self {
            instance: RefCell::new(None),
            state: RefCell::new(None),
            clear_color: Cell::new(Color::BLACK),
            features: Cell::new(FeatureSet {
                blend: true,
                ..FeatureSet::default()
            }),
            destroyed: Cell::new(false),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// Uploads indexed geometry in the [`Vertex`] format.
    pub fn create_mesh(&self, vertices: &[Vertex], indices: &[u32]) -> Result<Mesh, RenderError> {
        let mut guard = self.state.borrow_mut();
        let state = guard.as_mut().ok_or(RenderError::NotInitialized)?;
        let mesh = upload_mesh(&state.gpu.device, vertices, indices, "Lamina Mesh");
        let id = MeshId(state.allocate_id());
        let index_count = mesh.index_count;
        state.meshes.insert(id, mesh);
        log::debug!(
            "Created mesh {:?} ({} vertices, {} indices)",
            id,
            vertices.len(),
            index_count
        );
        Ok(Mesh { id, index_count })
    }

    /// Uploads tightly packed RGBA8 pixels.
    pub fn create_texture_rgba(
        &self,
        data: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Texture, RenderError> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || data.len() != expected {
            return Err(RenderError::TextureData {
                expected,
                actual: data.len(),
            });
        }
        let mut guard = self.state.borrow_mut();
        let state = guard.as_mut().ok_or(RenderError::NotInitialized)?;
        check_extent(&state.gpu.device, width, height)?;
        let texture = upload_texture(&state.gpu, data, width, height, "Lamina Texture");
        let id = TextureId(state.allocate_id());
        state.textures.insert(id, texture);
        Ok(Texture { id, width, height })
    }

    /// Decodes an image file (any format the `image` crate reads) into a texture.
    pub fn load_texture(&self, path: impl AsRef<Path>) -> Result<Texture, RenderError> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| RenderError::TextureLoad {
                path: path.display().to_string(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        let texture = self.create_texture_rgba(image.as_raw(), width, height)?;
        log::debug!("Loaded texture '{}' ({}x{})", path.display(), width, height);
        Ok(texture)
    }

    pub fn release_mesh(&self, mesh: &Mesh) {
        if let Some(state) = self.state.borrow_mut().as_mut() {
            state.meshes.remove(&mesh.id);
        }
    }

    pub fn release_texture(&self, texture: &Texture) {
        if let Some(state) = self.state.borrow_mut().as_mut() {
            state.textures.remove(&texture.id);
            let slot = Some(Slot::Texture(texture.id));
            for bound in state.bound.iter_mut().filter(|b| **b == slot) {
                *bound = None;
            }
        }
    }

    fn draw(&self, shader: &Shader, transform: Mat4, geometry: Geometry) {
        let expected = match geometry {
            Geometry::Screen => ShaderKind::Screen,
            Geometry::Quad | Geometry::Mesh(_) => ShaderKind::Geometry,
        };
        if shader.kind() != expected {
            log::warn!(
                "Shader '{}' is a {:?} shader, skipping {:?} draw",
                shader.label(),
                shader.kind(),
                expected
            );
            return;
        }
        if let Some(state) = self.state.borrow_mut().as_mut() {
            state.draw(shader, transform, geometry, self.features.get());
        }
    }

    fn create_buffer(&self, kind: BufferKind, width: u32, height: u32) -> Result<FrameBuffer, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::BufferAllocation { width, height });
        }
        let mut guard = self.state.borrow_mut();
        let state = guard.as_mut().ok_or(RenderError::NotInitialized)?;
        check_extent(&state.gpu.device, width, height)?;

        let label = match kind {
            BufferKind::Color { .. } => "Lamina Color Buffer",
            BufferKind::Depth => "Lamina Depth Buffer",
        };
        let id = FrameBufferId(state.allocate_id());
        state
            .buffers
            .insert(id, RenderTarget::new(&state.gpu, kind, width, height, label));
        log::trace!("Allocated {:?} {:?} ({}x{})", kind, id, width, height);
        Ok(FrameBuffer::new(id, kind, width, height))
    }
}

impl Renderer for WgpuRenderer {
    fn pre_window_init(&self) -> Result<(), RenderError> {
        let mut instance = self.instance.borrow_mut();
        if instance.is_none() {
            *instance = Some(wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::PRIMARY,
                ..Default::default()
            }));
        }
        Ok(())
    }

    fn init(&self, window: &Window) -> Result<(), RenderError> {
        if self.state.borrow().is_some() {
            return Err(RenderError::AlreadyInitialized);
        }
        let handle = window
            .native_handle()
            .ok_or(RenderError::MissingWindowHandle)?;

        self.pre_window_init()?;
        let instance = self.instance.borrow();
        let instance = instance.as_ref().ok_or(RenderError::NotInitialized)?;
        let gpu = GpuContext::new(instance, handle)?;

        let pipelines = Pipelines::new(&gpu.device);
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Lamina Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let white = upload_texture(&gpu, &[255; 4], 1, 1, "Lamina Default Texture");
        let (quad_vertices, quad_indices) = Vertex::unit_quad();
        let quad = upload_mesh(&gpu.device, &quad_vertices, &quad_indices, "Lamina Quad");
        let depth = RenderTarget::new(
            &gpu,
            BufferKind::Depth,
            gpu.width(),
            gpu.height(),
            "Lamina Window Depth",
        );

        let (width, height) = window.size();
        *self.state.borrow_mut() = Some(GpuState {
            gpu,
            pipelines,
            sampler,
            white,
            quad,
            depth,
            frame: None,
            targets: Vec::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            meshes: HashMap::new(),
            bound: [None; MAX_TEXTURE_SLOTS],
            start: Instant::now(),
            suspended: width == 0 || height == 0,
            next_id: 1,
        });
        log::info!("Renderer bound to {window}");
        Ok(())
    }

    fn on_window_resize(&self, width: u32, height: u32) {
        let mut guard = self.state.borrow_mut();
        let Some(state) = guard.as_mut() else {
            return;
        };
        if width == 0 || height == 0 {
            if !state.suspended {
                log::debug!("Window has no area, suspending drawing");
            }
            state.suspended = true;
            return;
        }
        state.suspended = false;
        state.gpu.resize(width, height);
        state
            .depth
            .ensure_size(&state.gpu, width, height, "Lamina Window Depth");
    }

    fn set_clear_color(&self, color: Color) {
        self.clear_color.set(color);
    }

    fn clear(&self) {
        if let Some(state) = self.state.borrow_mut().as_mut() {
            state.clear(self.clear_color.get().into());
        }
    }

    fn pre_render(&self) {
        let mut guard = self.state.borrow_mut();
        let Some(state) = guard.as_mut() else {
            return;
        };
        if state.suspended {
            return;
        }
        if state.frame.is_some() {
            log::warn!("pre_render called twice without post_render, dropping the open frame");
            state.frame = None;
        }

        let output = match state.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                state.gpu.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring the next frame");
                return;
            }
            Err(e) => {
                log::error!("Failed to acquire the next frame: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = state
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Lamina Frame Encoder"),
            });
        state.frame = Some(Frame {
            encoder,
            output,
            view,
        });
    }

    fn post_render(&self) {
        let mut guard = self.state.borrow_mut();
        let Some(state) = guard.as_mut() else {
            return;
        };
        if !state.targets.is_empty() {
            log::warn!(
                "Frame ended with {} frame buffer(s) still bound",
                state.targets.len()
            );
            state.targets.clear();
        }
        if let Some(frame) = state.frame.take() {
            state.gpu.queue.submit(Some(frame.encoder.finish()));
            frame.output.present();
        }
    }

    fn render_quad(&self, window: &Window, shader: &Shader, transform: &Transform) {
        self.render_quad_matrix(window, shader, transform.matrix());
    }

    fn render_quad_matrix(&self, _window: &Window, shader: &Shader, transform: Mat4) {
        self.draw(shader, transform, Geometry::Quad);
    }

    fn render_mesh(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: &Transform) {
        self.render_mesh_matrix(mesh, window, shader, transform.matrix());
    }

    fn render_mesh_matrix(&self, mesh: &Mesh, _window: &Window, shader: &Shader, transform: Mat4) {
        self.draw(shader, transform, Geometry::Mesh(mesh.id));
    }

    fn render_screen(&self, _window: &Window, shader: &Shader) {
        self.draw(shader, Mat4::IDENTITY, Geometry::Screen);
    }

    fn bind(&self, slots: &[Option<Binding<'_>>]) {
        if slots.len() > MAX_TEXTURE_SLOTS {
            log::warn!(
                "bind() got {} slots, only the first {} are used",
                slots.len(),
                MAX_TEXTURE_SLOTS
            );
        }
        let mut guard = self.state.borrow_mut();
        let Some(state) = guard.as_mut() else {
            return;
        };
        for (i, bound) in state.bound.iter_mut().enumerate() {
            *bound = slots.get(i).copied().flatten().map(|binding| match binding {
                Binding::Texture(texture) => Slot::Texture(texture.id),
                Binding::Buffer(buffer) => Slot::Buffer(buffer.id),
            });
        }
    }

    fn use_frame_buffer(&self, target: &FrameBufferSet, draw: &mut dyn FnMut()) {
        let pushed = match self.state.borrow_mut().as_mut() {
            Some(state) => {
                let mut colors: Vec<&FrameBuffer> = target.colors.iter().collect();
                colors.sort_by_key(|b| match b.kind {
                    BufferKind::Color { attachment } => attachment,
                    BufferKind::Depth => u32::MAX,
                });
                state.targets.push(TargetRef {
                    colors: colors.iter().map(|b| b.id).collect(),
                    depth: target.depth.map(|b| b.id),
                });
                true
            }
            None => false,
        };

        draw();

        if pushed && let Some(state) = self.state.borrow_mut().as_mut() {
            state.targets.pop();
        }
    }

    fn enable(&self, feature: Feature) {
        let mut features = self.features.get();
        features.set(feature, true);
        self.features.set(features);
    }

    fn disable(&self, feature: Feature) {
        let mut features = self.features.get();
        features.set(feature, false);
        self.features.set(features);
    }

    fn create_color_buffer(
        &self,
        attachment: u32,
        width: u32,
        height: u32,
    ) -> Result<FrameBuffer, RenderError> {
        self.create_buffer(BufferKind::Color { attachment }, width, height)
    }

    fn create_depth_buffer(&self, width: u32, height: u32) -> Result<FrameBuffer, RenderError> {
        self.create_buffer(BufferKind::Depth, width, height)
    }

    fn release_buffer(&self, buffer: &FrameBuffer) {
        let mut guard = self.state.borrow_mut();
        let Some(state) = guard.as_mut() else {
            return;
        };
        if state.buffers.remove(&buffer.id).is_none() {
            log::debug!("Released unknown frame buffer {:?}", buffer.id);
        }
        let slot = Some(Slot::Buffer(buffer.id));
        for bound in state.bound.iter_mut().filter(|b| **b == slot) {
            *bound = None;
        }
    }

    fn destroy(&self) {
        if self.destroyed.replace(true) {
            panic!("WgpuRenderer::destroy called twice");
        }
        if let Some(state) = self.state.borrow_mut().take() {
            log::info!(
                "Destroying renderer ({} buffers, {} textures, {} meshes still alive)",
                state.buffers.len(),
                state.textures.len(),
                state.meshes.len()
            );
        }
        self.instance.borrow_mut().take();
    }
}

impl GpuState {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Views for the target on top of the stack, or the window.
    fn attachments(&self, frame: &Frame) -> Attachments {
        let Some(target) = self.targets.last() else {
            return Attachments {
                colors: vec![frame.view.clone()],
                depth: Some(self.depth.view.clone()),
                size: (self.gpu.width(), self.gpu.height()),
            };
        };

        let colors: Vec<&RenderTarget> = target
            .colors
            .iter()
            .filter_map(|id| self.buffers.get(id))
            .collect();
        let depth = target.depth.and_then(|id| self.buffers.get(&id));
        let size = colors
            .first()
            .copied()
            .or(depth)
            .map(|t| (t.width, t.height))
            .unwrap_or((0, 0));

        Attachments {
            colors: colors.iter().map(|t| t.view.clone()).collect(),
            depth: depth.map(|t| t.view.clone()),
            size,
        }
    }

    fn slot_view(&self, slot: Option<Slot>) -> wgpu::TextureView {
        match slot {
            Some(Slot::Texture(id)) => match self.textures.get(&id) {
                Some(texture) => texture.view.clone(),
                None => {
                    log::warn!("Texture {:?} is not alive, sampling white", id);
                    self.white.view.clone()
                }
            },
            Some(Slot::Buffer(id)) => match self.buffers.get(&id) {
                Some(buffer) if matches!(buffer.kind, BufferKind::Color { .. }) => {
                    buffer.view.clone()
                }
                Some(_) => {
                    log::warn!("Depth buffer {:?} can't be sampled, sampling white", id);
                    self.white.view.clone()
                }
                None => {
                    log::warn!("Frame buffer {:?} is not alive, sampling white", id);
                    self.white.view.clone()
                }
            },
            None => self.white.view.clone(),
        }
    }

    fn clear(&mut self, color: wgpu::Color) {
        if self.suspended {
            return;
        }
        let Some(mut frame) = self.frame.take() else {
            return;
        };
        let attachments = self.attachments(&frame);
        let color_attachments: Vec<_> = attachments
            .colors
            .iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();
        let depth_stencil_attachment =
            attachments
                .depth
                .as_ref()
                .map(|view| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                });

        if !color_attachments.is_empty() || depth_stencil_attachment.is_some() {
            frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Lamina Clear"),
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.frame = Some(frame);
    }

    fn draw(&mut self, shader: &Shader, transform: Mat4, geometry: Geometry, features: FeatureSet) {
        if self.suspended {
            return;
        }
        let Some(mut frame) = self.frame.take() else {
            log::trace!("Draw of '{}' outside a frame ignored", shader.label());
            return;
        };
        let attachments = self.attachments(&frame);
        if attachments.colors.is_empty() {
            log::warn!("Draw of '{}' has no color target, skipping", shader.label());
            self.frame = Some(frame);
            return;
        }

        let device = &self.gpu.device;
        let globals = Globals {
            transform: (GL_TO_WGPU * transform).to_cols_array_2d(),
            resolution: [attachments.size.0 as f32, attachments.size.1 as f32],
            time: self.start.elapsed().as_secs_f32(),
            _padding: 0.0,
        };
        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lamina Globals"),
            contents: bytemuck::bytes_of(&globals),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(shader.label()),
            contents: &shader.uniform_bytes(),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let views: Vec<wgpu::TextureView> =
            self.bound.iter().map(|slot| self.slot_view(*slot)).collect();
        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            },
        ];
        for (i, view) in views.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: TEXTURE_BINDING_BASE + i as u32,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lamina Draw Bind Group"),
            layout: &self.pipelines.layout,
            entries: &entries,
        });

        let key = PipelineKey {
            shader: shader.id(),
            color_targets: attachments.colors.len(),
            has_depth: attachments.depth.is_some(),
            features,
        };
        let pipeline = self
            .pipelines
            .get(&self.gpu.device, self.gpu.format(), shader, key);

        let mesh = match geometry {
            Geometry::Screen => None,
            Geometry::Quad => Some(&self.quad),
            Geometry::Mesh(id) => match self.meshes.get(&id) {
                Some(mesh) => Some(mesh),
                None => {
                    log::warn!("Mesh {:?} is not alive, skipping draw", id);
                    self.frame = Some(frame);
                    return;
                }
            },
        };

        let color_attachments: Vec<_> = attachments
            .colors
            .iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();
        let depth_stencil_attachment =
            attachments
                .depth
                .as_ref()
                .map(|view| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                });

        {
            let mut pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some(shader.label()),
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            match mesh {
                None => pass.draw(0..3, 0..1),
                Some(mesh) => {
                    pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                    pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }
        self.frame = Some(frame);
    }
}

fn upload_mesh(device: &wgpu::Device, vertices: &[Vertex], indices: &[u32], label: &str) -> GpuMesh {
    let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(indices),
        usage: wgpu::BufferUsages::INDEX,
    });
    GpuMesh {
        vertices: vertex_buffer,
        indices: index_buffer,
        index_count: indices.len() as u32,
    }
}

fn upload_texture(gpu: &GpuContext, data: &[u8], width: u32, height: u32, label: &str) -> GpuTexture {
    let texture = gpu.device.create_texture_with_data(
        &gpu.queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        data,
    );
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    GpuTexture { texture, view }
}

fn check_extent(device: &wgpu::Device, width: u32, height: u32) -> Result<(), RenderError> {
    fits_extent(width, height, device.limits().max_texture_dimension_2d)
        .then_some(())
        .ok_or(RenderError::BufferAllocation { width, height })
}

fn fits_extent(width: u32, height: u32, max: u32) -> bool {
    width > 0 && height > 0 && width <= max && height <= max
}
