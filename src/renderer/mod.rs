//! The renderer contract.
//!
//! [`Renderer`] is the capability surface every backend and every decorator
//! implements. Layers hold renderers as `Rc<dyn Renderer>` and several layers
//! may share one chain, so every operation takes `&self`; backends keep their
//! mutable state behind `Cell`/`RefCell`.
//!
//! # Call order
//!
//! ```text
//! pre_window_init → init(window) → { on_window_resize | frame }* → destroy
//! frame = pre_render → clear → draws / use_frame_buffer { draws } → post_render
//! ```
//!
//! # Decoration
//!
//! Cross-cutting behavior (camera transforms, screen-space UI, logging) is
//! added by wrapping a renderer rather than subclassing a backend; see
//! [`RendererDecorator`].

mod decorator;
mod instrumented;
#[cfg(test)]
pub(crate) mod testing;
mod ui;

pub use decorator::{RendererDecorator, validate_chain};
pub use instrumented::{InstrumentedRenderer, RenderStats};
pub use ui::UiRenderer;

use glam::Mat4;

use crate::assets::{Mesh, Texture};
use crate::error::RenderError;
use crate::shader::Shader;
use crate::transform::Transform;
use crate::window::Window;

/// Number of texture slots [`Renderer::bind`] can address.
pub const MAX_TEXTURE_SLOTS: usize = 4;

/// RGBA color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
}

impl From<Color> for wgpu::Color {
    fn from(c: Color) -> Self {
        wgpu::Color {
            r: c.r as f64,
            g: c.g as f64,
            b: c.b as f64,
            a: c.a as f64,
        }
    }
}

/// Toggleable backend state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
    DepthTest,
    Blend,
    CullFace,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameBufferId(pub(crate) u64);

/// What a [`FrameBuffer`] stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Color output for fragment `@location(attachment)`.
    Color { attachment: u32 },
    Depth,
}

/// Handle to an offscreen buffer allocated by a renderer.
///
/// Usable as a render target (through [`FrameBufferSet`]) and as a sampled
/// texture (through [`Binding::Buffer`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameBuffer {
    pub(crate) id: FrameBufferId,
    pub kind: BufferKind,
    pub width: u32,
    pub height: u32,
}

impl FrameBuffer {
    pub(crate) fn new(id: FrameBufferId, kind: BufferKind, width: u32, height: u32) -> Self {
        Self {
            id,
            kind,
            width,
            height,
        }
    }

    pub fn id(&self) -> FrameBufferId {
        self.id
    }
}

/// A render target made of color attachments and an optional depth buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameBufferSet {
    pub colors: Vec<FrameBuffer>,
    pub depth: Option<FrameBuffer>,
}

impl FrameBufferSet {
    /// Target size, taken from the first color attachment.
    pub fn size(&self) -> Option<(u32, u32)> {
        self.colors.first().map(|b| (b.width, b.height))
    }
}

/// Something that can occupy a texture slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Binding<'a> {
    Texture(&'a Texture),
    Buffer(&'a FrameBuffer),
}

/// The capability set every backend and decorator provides.
///
/// Operations are valid between [`init`](Renderer::init) and
/// [`destroy`](Renderer::destroy). Component-form draws
/// ([`render_quad`](Renderer::render_quad), [`render_mesh`](Renderer::render_mesh))
/// are defined as their matrix form applied to [`Transform::matrix`].
pub trait Renderer {
    /// Backend setup that must happen before any native surface exists.
    fn pre_window_init(&self) -> Result<(), RenderError>;

    /// Binds the renderer to a live window. Called once.
    fn init(&self, window: &Window) -> Result<(), RenderError>;

    /// Size-dependent state update. A zero dimension suspends drawing until
    /// the next non-zero resize.
    fn on_window_resize(&self, width: u32, height: u32);

    fn set_clear_color(&self, color: Color);

    /// Clears the current target (window or bound frame buffers).
    fn clear(&self);

    /// Starts a frame.
    fn pre_render(&self);

    /// Finishes and presents a frame.
    fn post_render(&self);

    fn render_quad(&self, window: &Window, shader: &Shader, transform: &Transform);

    fn render_quad_matrix(&self, window: &Window, shader: &Shader, transform: Mat4);

    fn render_mesh(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: &Transform);

    fn render_mesh_matrix(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: Mat4);

    /// Full-viewport pass over the current target.
    fn render_screen(&self, window: &Window, shader: &Shader);

    /// Binds slot `i` to `slots[i]`; `None` leaves that slot at its default.
    /// Slots past the end of `slots` are reset to their default as well.
    fn bind(&self, slots: &[Option<Binding<'_>>]);

    /// Routes every draw issued by `draw` into `target`, then restores the
    /// previous target.
    fn use_frame_buffer(&self, target: &FrameBufferSet, draw: &mut dyn FnMut());

    fn enable(&self, feature: Feature);

    fn disable(&self, feature: Feature);

    fn create_color_buffer(
        &self,
        attachment: u32,
        width: u32,
        height: u32,
    ) -> Result<FrameBuffer, RenderError>;

    fn create_depth_buffer(&self, width: u32, height: u32) -> Result<FrameBuffer, RenderError>;

    fn release_buffer(&self, buffer: &FrameBuffer);

    /// Releases every backend resource. Calling it twice is a bug.
    fn destroy(&self);

    /// The renderer this one wraps, if it is a decorator.
    fn decorated(&self) -> Option<&dyn Renderer> {
        None
    }
}
