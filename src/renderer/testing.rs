//! Test doubles: a backend that records calls and a headless native surface.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use glam::Mat4;

use super::{Binding, BufferKind, Color, Feature, FrameBuffer, FrameBufferId, FrameBufferSet, Renderer};
use crate::assets::{Mesh, MeshId, TextureId};
use crate::error::{RenderError, WindowError};
use crate::shader::Shader;
use crate::transform::Transform;
use crate::window::{NativeSurface, SurfaceFactory, Window, WindowConfig};

/// What a texture slot was bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Texture(TextureId),
    Buffer(FrameBufferId),
}

/// One recorded renderer operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    PreWindowInit,
    Init,
    Resize(u32, u32),
    SetClearColor(Color),
    Clear,
    PreRender,
    PostRender,
    Quad { shader: String, transform: Mat4 },
    Mesh { mesh: MeshId, shader: String, transform: Mat4 },
    RenderScreen { shader: String },
    Bind(Vec<Option<Bound>>),
    UseFrameBufferBegin(Vec<FrameBufferId>),
    UseFrameBufferEnd,
    Enable(Feature),
    Disable(Feature),
    CreateColorBuffer { attachment: u32, width: u32, height: u32 },
    CreateDepthBuffer { width: u32, height: u32 },
    ReleaseBuffer(FrameBufferId),
    Destroy,
}

/// Backend that performs nothing and remembers everything.
#[derive(Default)]
pub struct RecordingRenderer {
    calls: RefCell<Vec<Call>>,
    next_buffer: Cell<u64>,
    live: RefCell<HashSet<FrameBufferId>>,
    fail_allocations: Cell<bool>,
    destroyed: Cell<bool>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn take_calls(&self) -> Vec<Call> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    /// Makes every following buffer allocation fail.
    pub fn fail_allocations(&self, fail: bool) {
        self.fail_allocations.set(fail);
    }

    pub fn live_buffers(&self) -> usize {
        self.live.borrow().len()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn allocate(&self, kind: BufferKind, width: u32, height: u32) -> Result<FrameBuffer, RenderError> {
        if self.fail_allocations.get() || width == 0 || height == 0 {
            return Err(RenderError::BufferAllocation { width, height });
        }
        let id = FrameBufferId(self.next_buffer.get() + 1);
        self.next_buffer.set(id.0);
        self.live.borrow_mut().insert(id);
        Ok(FrameBuffer::new(id, kind, width, height))
    }
}

impl Renderer for RecordingRenderer {
    fn pre_window_init(&self) -> Result<(), RenderError> {
        self.record(Call::PreWindowInit);
        Ok(())
    }

    fn init(&self, _window: &Window) -> Result<(), RenderError> {
        self.record(Call::Init);
        Ok(())
    }

    fn on_window_resize(&self, width: u32, height: u32) {
        self.record(Call::Resize(width, height));
    }

    fn set_clear_color(&self, color: Color) {
        self.record(Call::SetClearColor(color));
    }

    fn clear(&self) {
        self.record(Call::Clear);
    }

    fn pre_render(&self) {
        self.record(Call::PreRender);
    }

    fn post_render(&self) {
        self.record(Call::PostRender);
    }

    fn render_quad(&self, window: &Window, shader: &Shader, transform: &Transform) {
        self.render_quad_matrix(window, shader, transform.matrix());
    }

    fn render_quad_matrix(&self, _window: &Window, shader: &Shader, transform: Mat4) {
        self.record(Call::Quad {
            shader: shader.label().to_owned(),
            transform,
        });
    }

    fn render_mesh(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: &Transform) {
        self.render_mesh_matrix(mesh, window, shader, transform.matrix());
    }

    fn render_mesh_matrix(&self, mesh: &Mesh, _window: &Window, shader: &Shader, transform: Mat4) {
        self.record(Call::Mesh {
            mesh: mesh.id(),
            shader: shader.label().to_owned(),
            transform,
        });
    }

    fn render_screen(&self, _window: &Window, shader: &Shader) {
        self.record(Call::RenderScreen {
            shader: shader.label().to_owned(),
        });
    }

    fn bind(&self, slots: &[Option<Binding<'_>>]) {
        let bound = slots
            .iter()
            .map(|slot| {
                slot.map(|binding| match binding {
                    Binding::Texture(t) => Bound::Texture(t.id()),
                    Binding::Buffer(b) => Bound::Buffer(b.id()),
                })
            })
            .collect();
        self.record(Call::Bind(bound));
    }

    fn use_frame_buffer(&self, target: &FrameBufferSet, draw: &mut dyn FnMut()) {
        let ids = target
            .colors
            .iter()
            .chain(target.depth.iter())
            .map(FrameBuffer::id)
            .collect();
        self.record(Call::UseFrameBufferBegin(ids));
        draw();
        self.record(Call::UseFrameBufferEnd);
    }

    fn enable(&self, feature: Feature) {
        self.record(Call::Enable(feature));
    }

    fn disable(&self, feature: Feature) {
        self.record(Call::Disable(feature));
    }

    fn create_color_buffer(
        &self,
        attachment: u32,
        width: u32,
        height: u32,
    ) -> Result<FrameBuffer, RenderError> {
        self.record(Call::CreateColorBuffer {
            attachment,
            width,
            height,
        });
        self.allocate(BufferKind::Color { attachment }, width, height)
    }

    fn create_depth_buffer(&self, width: u32, height: u32) -> Result<FrameBuffer, RenderError> {
        self.record(Call::CreateDepthBuffer { width, height });
        self.allocate(BufferKind::Depth, width, height)
    }

    fn release_buffer(&self, buffer: &FrameBuffer) {
        self.record(Call::ReleaseBuffer(buffer.id()));
        self.live.borrow_mut().remove(&buffer.id());
    }

    fn destroy(&self) {
        assert!(!self.destroyed.replace(true), "renderer destroyed twice");
        self.record(Call::Destroy);
    }
}

/// Observable state of a [`FakeSurface`].
#[derive(Debug)]
pub struct FakeSurfaceState {
    pub size: Cell<(u32, u32)>,
    pub title: RefCell<String>,
    pub fullscreen: Cell<bool>,
    pub shown: Cell<bool>,
    pub redraws: Cell<u32>,
    /// Whether `request_size` applies synchronously.
    pub immediate_resize: Cell<bool>,
}

impl Default for FakeSurfaceState {
    fn default() -> Self {
        Self {
            size: Cell::new((0, 0)),
            title: RefCell::new(String::new()),
            fullscreen: Cell::new(false),
            shown: Cell::new(false),
            redraws: Cell::new(0),
            immediate_resize: Cell::new(true),
        }
    }
}

pub struct FakeSurface {
    state: Rc<FakeSurfaceState>,
}

impl NativeSurface for FakeSurface {
    fn inner_size(&self) -> (u32, u32) {
        self.state.size.get()
    }

    fn request_size(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        if self.state.immediate_resize.get() {
            self.state.size.set((width, height));
            Some((width, height))
        } else {
            None
        }
    }

    fn set_title(&self, title: &str) {
        *self.state.title.borrow_mut() = title.to_owned();
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        self.state.fullscreen.set(fullscreen);
    }

    fn scale_factor(&self) -> f64 {
        2.0
    }

    fn request_redraw(&self) {
        self.state.redraws.set(self.state.redraws.get() + 1);
    }

    fn show(&self) {
        self.state.shown.set(true);
    }
}

/// Hands out [`FakeSurface`]s sharing one state, or fails on demand.
#[derive(Default)]
pub struct FakeFactory {
    pub state: Rc<FakeSurfaceState>,
    pub fail: bool,
}

impl FakeFactory {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl SurfaceFactory for FakeFactory {
    fn create_surface(&self, config: &WindowConfig) -> Result<Box<dyn NativeSurface>, WindowError> {
        if self.fail {
            return Err(WindowError::SurfaceCreation("no display".into()));
        }
        self.state.size.set((config.width, config.height));
        *self.state.title.borrow_mut() = config.title.clone();
        self.state.fullscreen.set(config.fullscreen);
        Ok(Box::new(FakeSurface {
            state: Rc::clone(&self.state),
        }))
    }
}

/// An initialized 800×600 window over its own recording backend.
pub fn test_window() -> Window {
    window_with(Rc::new(RecordingRenderer::new()))
}

/// An initialized 800×600 window bound to `renderer`.
pub fn window_with(renderer: Rc<dyn Renderer>) -> Window {
    let window = Window::new(renderer, WindowConfig::default().size(800, 600));
    window
        .init(&FakeFactory::default(), None)
        .expect("fake surface never fails");
    window
}
