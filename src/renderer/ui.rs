use std::rc::Rc;

use glam::Mat4;

use super::{Renderer, RendererDecorator};
use crate::assets::Mesh;
use crate::shader::Shader;
use crate::transform::Transform;
use crate::window::Window;

/// Screen-space renderer for overlays.
///
/// Transforms are in pixels with the origin at the top-left corner of the
/// window and y pointing down. Any camera below this decorator is bypassed
/// since the UI projection replaces the whole view.
pub struct UiRenderer {
    inner: Rc<dyn Renderer>,
}

impl UiRenderer {
    pub fn new(inner: Rc<dyn Renderer>) -> Self {
        Self { inner }
    }

    /// Pixel-space orthographic projection for the window's current size.
    pub fn projection(window: &Window) -> Mat4 {
        let (width, height) = window.size();
        Mat4::orthographic_rh_gl(
            0.0,
            width.max(1) as f32,
            height.max(1) as f32,
            0.0,
            -1.0,
            1.0,
        )
    }
}

impl RendererDecorator for UiRenderer {
    fn target(&self) -> &dyn Renderer {
        &*self.inner
    }

    fn render_quad(&self, window: &Window, shader: &Shader, transform: &Transform) {
        RendererDecorator::render_quad_matrix(self, window, shader, transform.matrix());
    }

    fn render_quad_matrix(&self, window: &Window, shader: &Shader, transform: Mat4) {
        self.inner
            .render_quad_matrix(window, shader, Self::projection(window) * transform);
    }

    fn render_mesh(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: &Transform) {
        RendererDecorator::render_mesh_matrix(self, mesh, window, shader, transform.matrix());
    }

    fn render_mesh_matrix(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: Mat4) {
        self.inner
            .render_mesh_matrix(mesh, window, shader, Self::projection(window) * transform);
    }
}
