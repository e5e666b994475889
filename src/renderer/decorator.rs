//! Renderer decoration.

use std::collections::HashSet;

use glam::Mat4;

use super::{Binding, Color, Feature, FrameBuffer, FrameBufferSet, Renderer};
use crate::assets::Mesh;
use crate::error::{ConfigError, RenderError};
use crate::format;
use crate::shader::Shader;
use crate::transform::Transform;
use crate::window::Window;

/// A renderer that wraps another one.
///
/// Every method forwards to [`target`](RendererDecorator::target) unchanged
/// by default, and every decorator is a [`Renderer`] through a blanket impl.
/// Override only what you need; an override must still hand control (and the
/// result) to the target so the base contract keeps holding.
///
/// Because this trait mirrors [`Renderer`] method for method, call decorator
/// methods through an explicit path (`RendererDecorator::render_quad(self, ..)`)
/// when both traits are in scope.
///
/// # Example
///
/// ```ignore
/// struct Wireframe {
///     inner: Rc<dyn Renderer>,
/// }
///
/// impl RendererDecorator for Wireframe {
///     fn target(&self) -> &dyn Renderer {
///         &*self.inner
///     }
///
///     fn render_mesh_matrix(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: Mat4) {
///         self.inner.disable(Feature::CullFace);
///         self.inner.render_mesh_matrix(mesh, window, shader, transform);
///         self.inner.enable(Feature::CullFace);
///     }
/// }
/// ```
pub trait RendererDecorator {
    fn target(&self) -> &dyn Renderer;

    fn pre_window_init(&self) -> Result<(), RenderError> {
        self.target().pre_window_init()
    }

    fn init(&self, window: &Window) -> Result<(), RenderError> {
        self.target().init(window)
    }

    fn on_window_resize(&self, width: u32, height: u32) {
        self.target().on_window_resize(width, height)
    }

    fn set_clear_color(&self, color: Color) {
        self.target().set_clear_color(color)
    }

    fn clear(&self) {
        self.target().clear()
    }

    fn pre_render(&self) {
        self.target().pre_render()
    }

    fn post_render(&self) {
        self.target().post_render()
    }

    fn render_quad(&self, window: &Window, shader: &Shader, transform: &Transform) {
        self.target().render_quad(window, shader, transform)
    }

    fn render_quad_matrix(&self, window: &Window, shader: &Shader, transform: Mat4) {
        self.target().render_quad_matrix(window, shader, transform)
    }

    fn render_mesh(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: &Transform) {
        self.target().render_mesh(mesh, window, shader, transform)
    }

    fn render_mesh_matrix(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: Mat4) {
        self.target()
            .render_mesh_matrix(mesh, window, shader, transform)
    }

    fn render_screen(&self, window: &Window, shader: &Shader) {
        self.target().render_screen(window, shader)
    }

    fn bind(&self, slots: &[Option<Binding<'_>>]) {
        self.target().bind(slots)
    }

    fn use_frame_buffer(&self, target: &FrameBufferSet, draw: &mut dyn FnMut()) {
        self.target().use_frame_buffer(target, draw)
    }

    fn enable(&self, feature: Feature) {
        self.target().enable(feature)
    }

    fn disable(&self, feature: Feature) {
        self.target().disable(feature)
    }

    fn create_color_buffer(
        &self,
        attachment: u32,
        width: u32,
        height: u32,
    ) -> Result<FrameBuffer, RenderError> {
        self.target().create_color_buffer(attachment, width, height)
    }

    fn create_depth_buffer(&self, width: u32, height: u32) -> Result<FrameBuffer, RenderError> {
        self.target().create_depth_buffer(width, height)
    }

    fn release_buffer(&self, buffer: &FrameBuffer) {
        self.target().release_buffer(buffer)
    }

    fn destroy(&self) {
        self.target().destroy()
    }
}

impl<D: RendererDecorator> Renderer for D {
    fn pre_window_init(&self) -> Result<(), RenderError> {
        RendererDecorator::pre_window_init(self)
    }

    fn init(&self, window: &Window) -> Result<(), RenderError> {
        RendererDecorator::init(self, window)
    }

    fn on_window_resize(&self, width: u32, height: u32) {
        RendererDecorator::on_window_resize(self, width, height)
    }

    fn set_clear_color(&self, color: Color) {
        RendererDecorator::set_clear_color(self, color)
    }

    fn clear(&self) {
        RendererDecorator::clear(self)
    }

    fn pre_render(&self) {
        RendererDecorator::pre_render(self)
    }

    fn post_render(&self) {
        RendererDecorator::post_render(self)
    }

    fn render_quad(&self, window: &Window, shader: &Shader, transform: &Transform) {
        RendererDecorator::render_quad(self, window, shader, transform)
    }

    fn render_quad_matrix(&self, window: &Window, shader: &Shader, transform: Mat4) {
        RendererDecorator::render_quad_matrix(self, window, shader, transform)
    }

    fn render_mesh(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: &Transform) {
        RendererDecorator::render_mesh(self, mesh, window, shader, transform)
    }

    fn render_mesh_matrix(&self, mesh: &Mesh, window: &Window, shader: &Shader, transform: Mat4) {
        RendererDecorator::render_mesh_matrix(self, mesh, window, shader, transform)
    }

    fn render_screen(&self, window: &Window, shader: &Shader) {
        RendererDecorator::render_screen(self, window, shader)
    }

    fn bind(&self, slots: &[Option<Binding<'_>>]) {
        RendererDecorator::bind(self, slots)
    }

    fn use_frame_buffer(&self, target: &FrameBufferSet, draw: &mut dyn FnMut()) {
        RendererDecorator::use_frame_buffer(self, target, draw)
    }

    fn enable(&self, feature: Feature) {
        RendererDecorator::enable(self, feature)
    }

    fn disable(&self, feature: Feature) {
        RendererDecorator::disable(self, feature)
    }

    fn create_color_buffer(
        &self,
        attachment: u32,
        width: u32,
        height: u32,
    ) -> Result<FrameBuffer, RenderError> {
        RendererDecorator::create_color_buffer(self, attachment, width, height)
    }

    fn create_depth_buffer(&self, width: u32, height: u32) -> Result<FrameBuffer, RenderError> {
        RendererDecorator::create_depth_buffer(self, width, height)
    }

    fn release_buffer(&self, buffer: &FrameBuffer) {
        RendererDecorator::release_buffer(self, buffer)
    }

    fn destroy(&self) {
        RendererDecorator::destroy(self)
    }

    fn decorated(&self) -> Option<&dyn Renderer> {
        Some(self.target())
    }
}

/// Walks a decorator chain down to its backend.
///
/// Returns the number of decorators above the backend, or
/// [`ConfigError::DecoratorCycle`] if some renderer is reached twice.
pub fn validate_chain(renderer: &dyn Renderer) -> Result<usize, ConfigError> {
    let mut seen = HashSet::new();
    let mut current = renderer;
    let mut depth = 0;
    loop {
        let address = current as *const dyn Renderer as *const () as usize;
        if !seen.insert(address) {
            log::error!(
                "Renderer {} appears twice in its decorator chain",
                format::pointer(address as u64)
            );
            return Err(ConfigError::DecoratorCycle { depth });
        }
        match current.decorated() {
            Some(inner) => {
                current = inner;
                depth += 1;
            }
            None => return Ok(depth),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::OnceCell;
    use std::rc::Rc;

    use super::*;
    use crate::renderer::testing::{Call, RecordingRenderer, test_window};
    use crate::renderer::{BufferKind, FrameBufferId};
    use crate::assets::{MeshId, Texture, TextureId};

    /// Forwards everything.
    struct PassThrough(Rc<dyn Renderer>);

    impl RendererDecorator for PassThrough {
        fn target(&self) -> &dyn Renderer {
            &*self.0
        }
    }

    /// Overrides one operation.
    struct DoubleClear(Rc<dyn Renderer>);

    impl RendererDecorator for DoubleClear {
        fn target(&self) -> &dyn Renderer {
            &*self.0
        }

        fn clear(&self) {
            self.0.clear();
            self.0.clear();
        }
    }

    fn chain(depth: usize, backend: Rc<RecordingRenderer>) -> Rc<dyn Renderer> {
        let mut renderer: Rc<dyn Renderer> = backend;
        for _ in 0..depth {
            renderer = Rc::new(PassThrough(renderer));
        }
        renderer
    }

    fn invoke_every_operation(renderer: &dyn Renderer, window: &Window, shader: &Shader) {
        let mesh = Mesh {
            id: MeshId(7),
            index_count: 36,
        };
        let texture = Texture {
            id: TextureId(3),
            width: 16,
            height: 16,
        };
        let buffer = FrameBuffer::new(FrameBufferId(11), BufferKind::Color { attachment: 0 }, 8, 8);
        let transform = Transform::from_components(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 0.1, 0.2, 0.3);
        let matrix = Mat4::from_translation(glam::Vec3::new(9.0, 8.0, 7.0));

        renderer.pre_window_init().unwrap();
        renderer.init(window).unwrap();
        renderer.on_window_resize(640, 480);
        renderer.set_clear_color(Color::rgb(0.1, 0.2, 0.3));
        renderer.clear();
        renderer.pre_render();
        renderer.render_quad(window, shader, &transform);
        renderer.render_quad_matrix(window, shader, matrix);
        renderer.render_mesh(&mesh, window, shader, &transform);
        renderer.render_mesh_matrix(&mesh, window, shader, matrix);
        renderer.render_screen(window, shader);
        renderer.bind(&[Some(Binding::Texture(&texture)), None, Some(Binding::Buffer(&buffer))]);
        renderer.use_frame_buffer(
            &FrameBufferSet {
                colors: vec![buffer],
                depth: None,
            },
            &mut || {},
        );
        renderer.enable(Feature::DepthTest);
        renderer.disable(Feature::Blend);
        renderer.create_color_buffer(1, 320, 200).unwrap();
        renderer.create_depth_buffer(320, 200).unwrap();
        renderer.release_buffer(&buffer);
        renderer.post_render();
        renderer.destroy();
    }

    #[test]
    fn pass_through_chains_forward_each_call_once() {
        let window = test_window();
        let shader = Shader::new("plain", "");

        let direct = Rc::new(RecordingRenderer::new());
        invoke_every_operation(&*direct, &window, &shader);
        let expected = direct.calls();
        assert_eq!(expected.len(), 21);

        for depth in [1, 2, 5] {
            let backend = Rc::new(RecordingRenderer::new());
            let outer = chain(depth, Rc::clone(&backend));
            invoke_every_operation(&*outer, &window, &shader);
            assert_eq!(backend.calls(), expected, "depth {depth}");
        }
    }

    #[test]
    fn override_replaces_only_its_operation() {
        let backend = Rc::new(RecordingRenderer::new());
        let decorated = DoubleClear(backend.clone());

        Renderer::clear(&decorated);
        Renderer::enable(&decorated, Feature::Blend);

        assert_eq!(
            backend.calls(),
            vec![Call::Clear, Call::Clear, Call::Enable(Feature::Blend)]
        );
    }

    #[test]
    fn frame_buffer_draws_run_through_outer_renderer() {
        let window = test_window();
        let shader = Shader::new("plain", "");
        let backend = Rc::new(RecordingRenderer::new());
        let outer: Rc<dyn Renderer> = Rc::new(DoubleClear(backend.clone()));

        outer.use_frame_buffer(&FrameBufferSet::default(), &mut || {
            outer.clear();
            outer.render_screen(&window, &shader);
        });

        let calls = backend.calls();
        assert!(matches!(calls[0], Call::UseFrameBufferBegin(_)));
        assert_eq!(calls[1], Call::Clear);
        assert_eq!(calls[2], Call::Clear);
        assert!(matches!(calls[3], Call::RenderScreen { .. }));
        assert_eq!(calls[4], Call::UseFrameBufferEnd);
    }

    #[test]
    fn chain_depth_is_reported() {
        let backend = Rc::new(RecordingRenderer::new());
        assert_eq!(validate_chain(&*backend), Ok(0));
        assert_eq!(validate_chain(&*chain(3, backend)), Ok(3));
    }

    /// A decorator whose target is set after construction.
    struct LateBound(OnceCell<Rc<dyn Renderer>>);

    impl RendererDecorator for LateBound {
        fn target(&self) -> &dyn Renderer {
            &**self.0.get().expect("target set")
        }
    }

    #[test]
    fn self_targeting_chain_is_a_cycle() {
        let looped = Rc::new(LateBound(OnceCell::new()));
        let as_renderer: Rc<dyn Renderer> = looped.clone();
        let middle: Rc<dyn Renderer> = Rc::new(PassThrough(as_renderer));
        assert!(looped.0.set(middle).is_ok());

        assert_eq!(
            validate_chain(&*looped),
            Err(ConfigError::DecoratorCycle { depth: 2 })
        );
    }
}
