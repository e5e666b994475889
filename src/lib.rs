//! # Lamina
//!
//! **Layered scene rendering and post-process composition for real-time games.**
//!
//! Declare a stack of layers, each drawn through a renderer (optionally seen
//! through a camera), attach offscreen filter passes sized relative to the
//! window, and let lamina compose the frame and keep everything in sync with
//! window resizes.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use lamina::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     run(|ctx| {
//!         let follow = Rc::new(Cell::new(Vec2::ZERO));
//!         let mut builder = ctx.scene_builder();
//!         builder.camera_2d_layer(follow.clone(), |layer, _camera| {
//!             let sky = layer.background(
//!                 "@fragment fn fs(@location(0) uv: vec2f) -> @location(0) vec4f {
//!                     return vec4f(uv, 0.5, 1.0);
//!                 }",
//!                 None,
//!                 |_| {},
//!             );
//!             layer.node(sky);
//!             Ok(())
//!         })?;
//!         ctx.set_scene(builder.build());
//!
//!         Ok(move |frame: &mut Frame| {
//!             follow.set(follow.get() + Vec2::X * frame.dt);
//!         })
//!     })
//! }
//! ```
//!
//! ## Pieces
//!
//! - [`Renderer`] is the capability surface; [`WgpuRenderer`] is the backend.
//! - [`RendererDecorator`] wraps a renderer and overrides only what it
//!   changes. [`Camera2D`], [`Camera3D`], [`UiRenderer`] and
//!   [`InstrumentedRenderer`] are decorators.
//! - [`SceneBuilder`] declares layers back to front and builds a [`Scene`].
//! - [`Filter`] renders its own nodes offscreen and composites them with a
//!   screen shader.
//! - [`Window`] fans resize and input events out to the renderer, the input
//!   handler and resize listeners.

mod app;
mod assets;
mod backend;
mod camera;
pub mod error;
mod filter;
pub mod format;
mod input;
pub mod logging;
mod node;
mod projection;
pub mod renderer;
pub mod scene;
mod shader;
mod tile_meta;
mod transform;
pub mod window;

pub use app::{AppConfig, Frame, SetupContext, run, run_with_config};
pub use assets::{Mesh, MeshId, Texture, TextureId, Vertex};
pub use backend::WgpuRenderer;
pub use camera::{Camera2D, Camera3D};
pub use error::{ConfigError, Error, RenderError, Result, TileMetaError, WindowError};
pub use filter::{Filter, FilterState};
pub use input::{Input, InputHandler};
pub use logging::{LoggingConfig, init_logging};
pub use node::{BackgroundNode, FnNode, Node};
pub use projection::{ClipPlanes, ProjectionMatrix};
pub use renderer::{
    Binding, BufferKind, Color, Feature, FrameBuffer, FrameBufferId, FrameBufferSet,
    InstrumentedRenderer, MAX_TEXTURE_SLOTS, RenderStats, Renderer, RendererDecorator,
    UiRenderer, validate_chain,
};
pub use scene::{FilterBuilder, Layer, LayerBuilder, LayerCamera, Scene, SceneBuilder};
pub use shader::{GLOBALS_WGSL, Shader, ShaderId, ShaderKind, UniformFn, UniformValue, Uniforms};
pub use tile_meta::TileMeta;
pub use transform::Transform;
pub use window::{Event, ListenerId, Platform, Window, WindowConfig, WindowState};

// Re-export glam math types for convenience
pub use glam::{IVec2, Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;
