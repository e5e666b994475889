//! Cameras as renderer decorators.
//!
//! A camera wraps the renderer of its layer and premultiplies its projection
//! and view into every quad and mesh draw. Fullscreen passes,
//! buffer management and frame bracketing pass through untouched.

use std::cell::Cell;
use std::rc::Rc;

use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};

use crate::assets::Mesh;
use crate::projection::{ClipPlanes, ProjectionMatrix};
use crate::renderer::{Renderer, RendererDecorator};
use crate::shader::Shader;
use crate::transform::Transform;
use crate::window::Window;

/// A 2D camera that tracks a shared follow position.
///
/// The follow position is shared with game code, which moves it between
/// frames:
///
/// ```ignore
/// let follow = Rc::new(Cell::new(Vec2::ZERO));
/// builder.camera_2d_layer(follow.clone(), |layer, _camera| { /* ... */ })?;
/// follow.set(player_position);
/// ```
pub struct Camera2D {
    inner: Rc<dyn Renderer>,
    follow: Rc<Cell<Vec2>>,
}

impl Camera2D {
    pub fn new(inner: Rc<dyn Renderer>, follow: Rc<Cell<Vec2>>) -> Self {
        Self { inner, follow }
    }

    pub fn follow(&self) -> Vec2 {
        self.follow.get()
    }

    pub fn follow_handle(&self) -> Rc<Cell<Vec2>> {
        Rc::clone(&self.follow)
    }

    /// Translation by the negative follow position.
    pub fn view(&self) -> Mat4 {
        Mat4::from_translation((-self.follow.get()).extend(0.0))
    }

    /// Orthographic projection two world units tall, widened by the window's
    /// aspect ratio so world units stay square.
    pub fn projection(window: &Window) -> Mat4 {
        let half_width = window.aspect_ratio();
        Mat4::orthographic_rh_gl(-half_width, half_width, -1.0, 1.0, -1.0, 1.0)
    }

    /// `projection × view` for the given window.
    pub fn view_projection(&self, window: &Window) -> Mat4 {
        Self::projection(window) * self.view()
    }
}

impl RendererDecorator for Camera2D {
    fn target(&self) -> &dyn Renderer {
        &*self.inner
    }

    fn render_quad(&self, window: &Window, shader: &Shader, transform: &Transform) {
        RendererDecorator::render_quad_matrix(self, window, shader, transform.matrix());
    }

    fn render_quad_matrix(&self, window: &Window, shader: &Shader, transform: Mat4) {
        self.inner
            .render_quad_matrix(window, shader, self.view_projection(window) * transform);
    }

    fn render_mesh(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: &Transform) {
        RendererDecorator::render_mesh_matrix(self, mesh, window, shader, transform.matrix());
    }

    fn render_mesh_matrix(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: Mat4) {
        self.inner.render_mesh_matrix(
            mesh,
            window,
            shader,
            self.view_projection(window) * transform,
        );
    }
}

/// A perspective camera.
///
/// Position, rotation and field of view live in cells so a camera shared
/// with a layer can still be steered from frame callbacks. The projection is
/// rebuilt from the window's aspect ratio on every draw.
pub struct Camera3D {
    inner: Rc<dyn Renderer>,
    position: Cell<Vec3>,
    /// Euler angles in radians (pitch, yaw, roll applied X then Y then Z).
    rotation: Cell<Vec3>,
    /// Vertical field of view in degrees.
    fov: Cell<f32>,
    clip: Cell<ClipPlanes>,
}

impl Camera3D {
    pub const DEFAULT_FOV: f32 = 70.0;

    pub fn new(inner: Rc<dyn Renderer>) -> Self {
        Self {
            inner,
            position: Cell::new(Vec3::ZERO),
            rotation: Cell::new(Vec3::ZERO),
            fov: Cell::new(Self::DEFAULT_FOV),
            clip: Cell::new(ClipPlanes::default()),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position.get()
    }

    pub fn set_position(&self, position: Vec3) {
        self.position.set(position);
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation.get()
    }

    pub fn set_rotation(&self, rotation: Vec3) {
        self.rotation.set(rotation);
    }

    pub fn fov(&self) -> f32 {
        self.fov.get()
    }

    pub fn set_fov(&self, fov: f32) {
        self.fov.set(fov);
    }

    pub fn clip_planes(&self) -> ClipPlanes {
        self.clip.get()
    }

    pub fn set_clip_planes(&self, clip: ClipPlanes) {
        self.clip.set(clip);
    }

    /// Inverse of the camera's own placement.
    pub fn view(&self) -> Mat4 {
        let r = self.rotation.get();
        let orientation = Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z);
        Mat4::from_rotation_translation(orientation, self.position.get()).inverse()
    }

    pub fn projection(&self, aspect_ratio: f32) -> ProjectionMatrix {
        ProjectionMatrix::new(self.fov.get(), aspect_ratio, self.clip.get())
    }

    /// `projection × view` for the given window.
    pub fn view_projection(&self, window: &Window) -> Mat4 {
        self.projection(window.aspect_ratio()).to_mat4() * self.view()
    }
}

impl RendererDecorator for Camera3D {
    fn target(&self) -> &dyn Renderer {
        &*self.inner
    }

    fn render_quad(&self, window: &Window, shader: &Shader, transform: &Transform) {
        RendererDecorator::render_quad_matrix(self, window, shader, transform.matrix());
    }

    fn render_quad_matrix(&self, window: &Window, shader: &Shader, transform: Mat4) {
        self.inner
            .render_quad_matrix(window, shader, self.view_projection(window) * transform);
    }

    fn render_mesh(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: &Transform) {
        RendererDecorator::render_mesh_matrix(self, mesh, window, shader, transform.matrix());
    }

    fn render_mesh_matrix(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: Mat4) {
        self.inner.render_mesh_matrix(
            mesh,
            window,
            shader,
            self.view_projection(window) * transform,
        );
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec4;

    use super::*;
    use crate::renderer::testing::{Call, RecordingRenderer, test_window, window_with};
    use crate::window::Event;

    #[test]
    fn camera_2d_translates_by_negative_follow() {
        let window = test_window();
        let shader = Shader::new("sprite", "");
        let backend = Rc::new(RecordingRenderer::new());
        let follow = Rc::new(Cell::new(Vec2::new(5.0, -3.0)));
        let camera = Camera2D::new(backend.clone(), follow.clone());

        let transform = Transform::from_position(Vec3::new(6.0, -2.0, 0.0));
        Renderer::render_quad(&camera, &window, &shader, &transform);

        let Call::Quad { transform: m, .. } = &backend.calls()[0] else {
            panic!("expected a quad");
        };
        // 800x600 window: x is squeezed by 1 / aspect.
        assert!(m.w_axis.abs_diff_eq(Vec4::new(0.75, 1.0, 0.0, 1.0), 1e-6));

        follow.set(Vec2::ZERO);
        assert_eq!(camera.view(), Mat4::IDENTITY);
    }

    #[test]
    fn camera_2d_keeps_quads_square_across_aspect_ratios() {
        let shader = Shader::new("sprite", "");
        let backend = Rc::new(RecordingRenderer::new());
        let window = window_with(backend.clone());
        let camera = Camera2D::new(backend.clone(), Rc::new(Cell::new(Vec2::ZERO)));

        let mut extents = Vec::new();
        for (width, height) in [(800, 800), (1600, 800)] {
            window.dispatch(Event::Resized { width, height });
            backend.take_calls();
            Renderer::render_quad_matrix(&camera, &window, &shader, Mat4::IDENTITY);
            let Call::Quad { transform: m, .. } = &backend.calls()[0] else {
                panic!("expected a quad");
            };
            // Unit quad extent in pixels.
            let corner = m.project_point3(Vec3::new(1.0, 1.0, 0.0)) - m.project_point3(Vec3::ZERO);
            extents.push((corner.x * width as f32 / 2.0, corner.y * height as f32 / 2.0));
        }

        assert_eq!(extents[0], (400.0, 400.0));
        assert_eq!(extents[0], extents[1]);
    }

    #[test]
    fn camera_3d_premultiplies_projection_and_view() {
        let window = test_window();
        let shader = Shader::new("lit", "");
        let backend = Rc::new(RecordingRenderer::new());
        let camera = Camera3D::new(backend.clone());
        camera.set_position(Vec3::new(0.0, 0.0, 5.0));

        Renderer::render_quad_matrix(&camera, &window, &shader, Mat4::IDENTITY);

        let expected = ProjectionMatrix::new(70.0, 800.0 / 600.0, ClipPlanes::default()).to_mat4()
            * Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
        let Call::Quad { transform: m, .. } = &backend.calls()[0] else {
            panic!("expected a quad");
        };
        assert!(m.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn camera_3d_defaults() {
        let camera = Camera3D::new(Rc::new(RecordingRenderer::new()));
        assert_eq!(camera.fov(), 70.0);
        assert_eq!(camera.position(), Vec3::ZERO);
        assert_eq!(camera.clip_planes(), ClipPlanes::default());
        assert_eq!(camera.view(), Mat4::IDENTITY);
    }

    #[test]
    fn cameras_leave_screen_passes_alone() {
        let window = test_window();
        let shader = Shader::screen("blur", "");
        let backend = Rc::new(RecordingRenderer::new());
        let camera = Camera3D::new(backend.clone());

        Renderer::render_screen(&camera, &window, &shader);

        assert_eq!(
            backend.calls(),
            vec![Call::RenderScreen {
                shader: "blur".into()
            }]
        );
    }
}
