//! Error types shared across the crate.
//!
//! Each concern gets its own enum so callers can match on exactly what went
//! wrong; [`Error`] folds them together for the `?`-heavy paths (scene
//! building, window setup).

use thiserror::Error;

/// Programmer-side configuration mistakes.
///
/// These are reported from the constructing call and never recovered from;
/// a frame built from a bad configuration would be wrong anyway.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("renderer decorator chain contains a cycle (after {depth} links)")]
    DecoratorCycle { depth: usize },

    #[error("filter minimum width must be positive")]
    NonPositiveMinWidth,

    #[error("filter color buffer count must be within 1..={max}, got {count}")]
    ColorBufferCount { count: usize, max: usize },

    #[error("clip planes must satisfy far > near > 0 (near = {near}, far = {far})")]
    InvalidClipPlanes { near: f32, far: f32 },
}

/// Failures reported by a renderer backend.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no suitable graphics adapter: {0}")]
    Adapter(String),

    #[error("graphics device request failed: {0}")]
    Device(String),

    #[error("failed to create rendering surface: {0}")]
    Surface(String),

    #[error("renderer is already initialized")]
    AlreadyInitialized,

    #[error("renderer used before init")]
    NotInitialized,

    #[error("window has no native handle to render into")]
    MissingWindowHandle,

    #[error("cannot allocate a {width}x{height} frame buffer")]
    BufferAllocation { width: u32, height: u32 },

    #[error("texture data is {actual} bytes, expected {expected} for RGBA8")]
    TextureData { expected: usize, actual: usize },

    #[error("failed to load texture '{path}': {source}")]
    TextureLoad {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Window and windowing-platform failures.
#[derive(Debug, Error)]
pub enum WindowError {
    #[error("windowing platform is already initialized in this process")]
    PlatformAlreadyInitialized,

    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("native window wasn't created: {0}")]
    SurfaceCreation(String),

    #[error("window is already initialized")]
    AlreadyInitialized,

    #[error(transparent)]
    Renderer(#[from] RenderError),
}

/// Shader source problems.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to read shader '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Tile metadata decoding failures.
#[derive(Debug, Error)]
pub enum TileMetaError {
    #[error("malformed tile metadata: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid autotile bit string '{0}' (expected up to 9 binary digits)")]
    Bits(String),
}

/// Any error this crate produces.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error(transparent)]
    TileMeta(#[from] TileMetaError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
