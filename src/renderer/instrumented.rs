use std::cell::Cell;
use std::rc::Rc;

use glam::Mat4;

use super::{FrameBuffer, Renderer, RendererDecorator};
use crate::assets::Mesh;
use crate::error::RenderError;
use crate::shader::Shader;
use crate::transform::Transform;
use crate::window::Window;

/// Counters collected by [`InstrumentedRenderer`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub frames: u64,
    pub quads: u64,
    pub meshes: u64,
    pub screen_passes: u64,
    pub buffers_allocated: u64,
    pub buffers_released: u64,
}

impl RenderStats {
    pub fn draws(&self) -> u64 {
        self.quads + self.meshes + self.screen_passes
    }
}

/// Logs every draw at `trace` level and keeps running counts.
///
/// Component-form draws are reduced here, so each draw is counted once
/// whichever form the caller used.
pub struct InstrumentedRenderer {
    inner: Rc<dyn Renderer>,
    label: String,
    stats: Cell<RenderStats>,
}

impl InstrumentedRenderer {
    pub fn new(label: impl Into<String>, inner: Rc<dyn Renderer>) -> Self {
        Self {
            inner,
            label: label.into(),
            stats: Cell::new(RenderStats::default()),
        }
    }

    pub fn stats(&self) -> RenderStats {
        self.stats.get()
    }

    pub fn reset_stats(&self) {
        self.stats.set(RenderStats::default());
    }

    fn count(&self, update: impl FnOnce(&mut RenderStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }
}

impl RendererDecorator for InstrumentedRenderer {
    fn target(&self) -> &dyn Renderer {
        &*self.inner
    }

    fn post_render(&self) {
        self.inner.post_render();
        self.count(|s| s.frames += 1);
        let stats = self.stats.get();
        log::trace!(
            "[{}] frame {} done ({} draws so far)",
            self.label,
            stats.frames,
            stats.draws()
        );
    }

    fn render_quad(&self, window: &Window, shader: &Shader, transform: &Transform) {
        RendererDecorator::render_quad_matrix(self, window, shader, transform.matrix());
    }

    fn render_quad_matrix(&self, window: &Window, shader: &Shader, transform: Mat4) {
        log::trace!("[{}] quad with '{}'", self.label, shader.label());
        self.count(|s| s.quads += 1);
        self.inner.render_quad_matrix(window, shader, transform);
    }

    fn render_mesh(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: &Transform) {
        RendererDecorator::render_mesh_matrix(self, mesh, window, shader, transform.matrix());
    }

    fn render_mesh_matrix(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: Mat4) {
        log::trace!(
            "[{}] mesh {:?} ({} indices) with '{}'",
            self.label,
            mesh.id(),
            mesh.index_count(),
            shader.label()
        );
        self.count(|s| s.meshes += 1);
        self.inner.render_mesh_matrix(mesh, window, shader, transform);
    }

    fn render_screen(&self, window: &Window, shader: &Shader) {
        log::trace!("[{}] screen pass with '{}'", self.label, shader.label());
        self.count(|s| s.screen_passes += 1);
        self.inner.render_screen(window, shader);
    }

    fn create_color_buffer(
        &self,
        attachment: u32,
        width: u32,
        height: u32,
    ) -> Result<FrameBuffer, RenderError> {
        let buffer = self.inner.create_color_buffer(attachment, width, height)?;
        log::trace!(
            "[{}] color buffer {:?} at attachment {attachment}, {width}x{height}",
            self.label,
            buffer.id()
        );
        self.count(|s| s.buffers_allocated += 1);
        Ok(buffer)
    }

    fn create_depth_buffer(&self, width: u32, height: u32) -> Result<FrameBuffer, RenderError> {
        let buffer = self.inner.create_depth_buffer(width, height)?;
        log::trace!("[{}] depth buffer {:?}, {width}x{height}", self.label, buffer.id());
        self.count(|s| s.buffers_allocated += 1);
        Ok(buffer)
    }

    fn release_buffer(&self, buffer: &FrameBuffer) {
        log::trace!("[{}] release buffer {:?}", self.label, buffer.id());
        self.count(|s| s.buffers_released += 1);
        self.inner.release_buffer(buffer);
    }
}
