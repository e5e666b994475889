//! Drawables that live in layers.

use std::rc::Rc;

use crate::assets::Texture;
use crate::renderer::{Binding, Renderer};
use crate::shader::{Shader, UniformFn};
use crate::window::Window;

/// Something a layer can draw.
///
/// Nodes receive the layer's renderer on every call instead of storing one,
/// so the same node draws correctly through a camera, a UI projection or a
/// filter's offscreen target.
pub trait Node {
    fn render(&self, renderer: &dyn Renderer, window: &Window);
}

impl<N: Node + ?Sized> Node for Rc<N> {
    fn render(&self, renderer: &dyn Renderer, window: &Window) {
        (**self).render(renderer, window)
    }
}

impl<N: Node + ?Sized> Node for Box<N> {
    fn render(&self, renderer: &dyn Renderer, window: &Window) {
        (**self).render(renderer, window)
    }
}

/// A node made from a closure.
pub struct FnNode<F> {
    draw: F,
}

impl<F> FnNode<F>
where
    F: Fn(&dyn Renderer, &Window),
{
    pub fn new(draw: F) -> Self {
        Self { draw }
    }
}

impl<F> Node for FnNode<F>
where
    F: Fn(&dyn Renderer, &Window),
{
    fn render(&self, renderer: &dyn Renderer, window: &Window) {
        (self.draw)(renderer, window)
    }
}

/// Fullscreen shader pass, optionally sampling one texture from slot 0.
pub struct BackgroundNode {
    shader: Shader,
    texture: Option<Texture>,
    uniforms: UniformFn,
}

impl BackgroundNode {
    pub fn new(shader: Shader, texture: Option<Texture>, uniforms: UniformFn) -> Self {
        Self {
            shader,
            texture,
            uniforms,
        }
    }

    pub fn shader(&self) -> &Shader {
        &self.shader
    }
}

impl Node for BackgroundNode {
    fn render(&self, renderer: &dyn Renderer, window: &Window) {
        if let Some(texture) = &self.texture {
            renderer.bind(&[Some(Binding::Texture(texture))]);
        }
        self.shader.apply(|u| (self.uniforms)(u));
        renderer.render_screen(window, &self.shader);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::assets::TextureId;
    use crate::renderer::testing::{Bound, Call, RecordingRenderer, test_window};
    use crate::shader::{UniformValue, Uniforms};

    #[test]
    fn background_binds_then_draws() {
        let window = test_window();
        let backend = RecordingRenderer::new();
        let texture = Texture {
            id: TextureId(4),
            width: 2,
            height: 2,
        };
        let node = BackgroundNode::new(
            Shader::screen("sky", ""),
            Some(texture),
            Rc::new(|u: &mut Uniforms| {
                u.set("brightness", 0.8f32);
            }),
        );

        node.render(&backend, &window);

        assert_eq!(
            backend.calls(),
            vec![
                Call::Bind(vec![Some(Bound::Texture(TextureId(4)))]),
                Call::RenderScreen { shader: "sky".into() },
            ]
        );
        assert_eq!(
            node.shader().uniforms().get("brightness"),
            Some(UniformValue::Float(0.8))
        );
    }

    #[test]
    fn shared_nodes_render_through_rc() {
        let window = test_window();
        let backend = RecordingRenderer::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let node: Rc<dyn Node> = Rc::new(FnNode::new(move |_, _| counter.set(counter.get() + 1)));

        node.render(&backend, &window);
        Rc::clone(&node).render(&backend, &window);

        assert_eq!(hits.get(), 2);
    }
}
