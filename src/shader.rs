//! Shaders and their uniform blocks.
//!
//! A [`Shader`] is WGSL source plus the uniform values that will be uploaded
//! with its next draw. Uniforms are set through a procedure
//! ([`Shader::apply`]) right before the draw that needs them, so every draw
//! sees fresh values.
//!
//! # Uniform layout
//!
//! User uniforms are bound at `@group(0) @binding(1)` and packed in insertion
//! order with WGSL uniform-buffer alignment, so the WGSL struct simply
//! declares the same fields in the same order:
//!
//! ```wgsl
//! struct Params {
//!     intensity: f32,
//!     tint: vec3f,
//! }
//! @group(0) @binding(1) var<uniform> params: Params;
//! ```
//!
//! The backend also provides `@group(0) @binding(0)` with the draw transform,
//! the target resolution and the elapsed time (see [`GLOBALS_WGSL`]), a
//! sampler at binding 2 and texture slots at bindings 3 to 6.

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::error::ShaderError;

/// Declarations every lamina shader can paste in to reach the built-in bindings.
pub const GLOBALS_WGSL: &str = r#"
struct Globals {
    transform: mat4x4f,
    resolution: vec2f,
    time: f32,
    _pad: f32,
}
@group(0) @binding(0) var<uniform> globals: Globals;
@group(0) @binding(2) var tex_sampler: sampler;
@group(0) @binding(3) var tex0: texture_2d<f32>;
@group(0) @binding(4) var tex1: texture_2d<f32>;
@group(0) @binding(5) var tex2: texture_2d<f32>;
@group(0) @binding(6) var tex3: texture_2d<f32>;
"#;

/// Fullscreen-triangle vertex stage prepended to screen shaders.
const SCREEN_VERTEX_WGSL: &str = r#"
struct ScreenOut {
    @builtin(position) position: vec4f,
    @location(0) uv: vec2f,
}

@vertex
fn vs(@builtin(vertex_index) vi: u32) -> ScreenOut {
    let uv = vec2f(f32((vi << 1u) & 2u), f32(vi & 2u));
    var out: ScreenOut;
    out.position = vec4f(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2f(uv.x, 1.0 - uv.y);
    return out;
}
"#;

/// A single uniform value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    /// WGSL uniform-buffer (alignment, size) in bytes.
    fn layout(&self) -> (usize, usize) {
        match self {
            UniformValue::Float(_) | UniformValue::Int(_) => (4, 4),
            UniformValue::Vec2(_) => (8, 8),
            UniformValue::Vec3(_) => (16, 12),
            UniformValue::Vec4(_) => (16, 16),
            UniformValue::Mat4(_) => (16, 64),
        }
    }

    fn write(&self, out: &mut Vec<u8>) {
        match self {
            UniformValue::Float(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Int(v) => out.extend_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec2(v) => out.extend_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Vec3(v) => out.extend_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Vec4(v) => out.extend_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Mat4(m) => {
                out.extend_from_slice(bytemuck::cast_slice(&m.to_cols_array()))
            }
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

/// Named uniform values in declaration order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Uniforms {
    values: Vec<(String, UniformValue)>,
}

impl Uniforms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name`, keeping its original position if it was already set.
    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> &mut Self {
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((name.to_owned(), value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Packs the values as a WGSL uniform struct.
    ///
    /// The result is never empty (a 16-byte zero block stands in for an empty
    /// set) and its length is a multiple of 16.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (_, value) in &self.values {
            let (align, _) = value.layout();
            out.resize(align_up(out.len(), align), 0);
            value.write(&mut out);
        }
        out.resize(align_up(out.len(), 16).max(16), 0);
        out
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}

/// A procedure that fills a shader's uniforms right before a draw.
pub type UniformFn = Rc<dyn Fn(&mut Uniforms)>;

/// What kind of vertex input a shader expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Fullscreen pass; no vertex buffers.
    Screen,
    /// Quads and meshes; reads [`Vertex`](crate::Vertex) attributes.
    Geometry,
}

/// Process-unique shader identity, used by backends to cache pipelines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderId(u64);

static NEXT_SHADER_ID: AtomicU64 = AtomicU64::new(1);

/// WGSL source plus its pending uniform values.
///
/// Geometry shaders define both `vs` and `fs`; screen shaders only define
/// `fs` and receive `@location(0) uv: vec2f` from the built-in vertex stage.
pub struct Shader {
    id: ShaderId,
    label: String,
    kind: ShaderKind,
    source: String,
    uniforms: RefCell<Uniforms>,
}

impl Shader {
    /// A quad/mesh shader from complete WGSL source.
    pub fn new(label: impl Into<String>, source: impl Into<String>) -> Self {
        Self::with_kind(label.into(), ShaderKind::Geometry, source.into())
    }

    /// A fullscreen shader from fragment-only WGSL source.
    pub fn screen(label: impl Into<String>, fragment_source: &str) -> Self {
        let source = format!("{GLOBALS_WGSL}{SCREEN_VERTEX_WGSL}{fragment_source}");
        Self::with_kind(label.into(), ShaderKind::Screen, source)
    }

    /// Reads a fragment-only source file and builds a screen shader.
    pub fn screen_from_file(path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let fragment = std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::screen(path.display().to_string(), &fragment))
    }

    fn with_kind(label: String, kind: ShaderKind, source: String) -> Self {
        Self {
            id: ShaderId(NEXT_SHADER_ID.fetch_add(1, Ordering::Relaxed)),
            label,
            kind,
            source,
            uniforms: RefCell::new(Uniforms::new()),
        }
    }

    pub fn id(&self) -> ShaderId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Runs a uniform procedure against this shader's uniform block.
    pub fn apply(&self, procedure: impl FnOnce(&mut Uniforms)) {
        procedure(&mut *self.uniforms.borrow_mut());
    }

    /// Snapshot of the current uniform block.
    pub fn uniforms(&self) -> Uniforms {
        self.uniforms.borrow().clone()
    }

    pub fn uniform_bytes(&self) -> Vec<u8> {
        self.uniforms.borrow().to_bytes()
    }
}

impl fmt::Debug for Shader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shader")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}
