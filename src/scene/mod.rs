//! Layered scene composition.
//!
//! A [`Scene`] is an ordered stack of [`Layer`]s painted back to front. Each
//! layer draws its nodes through one renderer, usually the base renderer
//! wrapped in a camera or UI decorator. Scenes are declared once with a
//! [`SceneBuilder`] and rebuilt only when the caller reconfigures them.
//!
//! # Example
//!
//! ```ignore
//! use lamina::*;
//!
//! let mut builder = SceneBuilder::new(renderer.clone(), &window);
//! builder
//!     .camera_3d_layer(|layer, camera| {
//!         camera.set_position(Vec3::new(0.0, 1.0, 4.0));
//!         layer.node(FnNode::new(move |r: &dyn Renderer, w: &Window| {
//!             r.render_mesh(&cube, w, &lit, &Transform::new());
//!         }));
//!         Ok(())
//!     })?
//!     .ui_layer(|layer| {
//!         let crosshair = layer.background(CROSSHAIR_WGSL, None, |_| {});
//!         layer.node(crosshair);
//!         Ok(())
//!     })?;
//! let scene = builder.build();
//!
//! // every frame
//! scene.render(&window);
//! ```

mod builder;

pub use builder::{FilterBuilder, LayerBuilder, SceneBuilder};

use std::fmt;
use std::rc::Rc;

use crate::camera::{Camera2D, Camera3D};
use crate::node::Node;
use crate::renderer::Renderer;
use crate::window::Window;

/// The camera a layer was declared with.
#[derive(Clone)]
pub enum LayerCamera {
    TwoD(Rc<Camera2D>),
    ThreeD(Rc<Camera3D>),
}

/// Nodes drawn through one renderer.
pub struct Layer {
    renderer: Rc<dyn Renderer>,
    nodes: Vec<Box<dyn Node>>,
    camera: Option<LayerCamera>,
}

impl Layer {
    pub fn renderer(&self) -> &Rc<dyn Renderer> {
        &self.renderer
    }

    pub fn camera(&self) -> Option<&LayerCamera> {
        self.camera.as_ref()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn render(&self, window: &Window) {
        for node in &self.nodes {
            node.render(&*self.renderer, window);
        }
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let camera = match self.camera {
            Some(LayerCamera::TwoD(_)) => "2d",
            Some(LayerCamera::ThreeD(_)) => "3d",
            None => "none",
        };
        f.debug_struct("Layer")
            .field("nodes", &self.nodes.len())
            .field("camera", &camera)
            .finish_non_exhaustive()
    }
}

/// Ordered layers, painted back to front.
#[derive(Debug, Default)]
pub struct Scene {
    layers: Vec<Layer>,
}

impl Scene {
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Renders every layer in declaration order.
    pub fn render(&self, window: &Window) {
        for layer in &self.layers {
            layer.render(window);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, OnceCell};

    use glam::{Vec2, Vec3};

    use super::*;
    use crate::error::{ConfigError, Error};
    use crate::filter::FilterState;
    use crate::node::FnNode;
    use crate::renderer::testing::{Call, RecordingRenderer, window_with};
    use crate::renderer::{InstrumentedRenderer, RendererDecorator};
    use crate::shader::Shader;
    use crate::window::Event;

    fn screen_node(label: &'static str) -> FnNode<impl Fn(&dyn Renderer, &Window)> {
        let shader = Shader::screen(label, "");
        FnNode::new(move |r: &dyn Renderer, w: &Window| r.render_screen(w, &shader))
    }

    fn screens(calls: &[Call]) -> Vec<String> {
        calls
            .iter()
            .filter_map(|c| match c {
                Call::RenderScreen { shader } => Some(shader.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn layers_paint_in_declaration_order() {
        let backend = Rc::new(RecordingRenderer::new());
        let window = window_with(backend.clone());
        let logged: Rc<dyn Renderer> = Rc::new(InstrumentedRenderer::new("log", backend.clone()));

        let mut builder = SceneBuilder::new(backend.clone(), &window);
        builder
            .ui_layer(|layer| {
                layer.node(screen_node("ui-a")).node(screen_node("ui-b"));
                Ok(())
            })
            .unwrap()
            .camera_3d_layer(|layer, _| {
                layer.node(screen_node("3d"));
                Ok(())
            })
            .unwrap()
            .custom_layer(logged, |layer| {
                layer.node(screen_node("custom"));
                Ok(())
            })
            .unwrap()
            .camera_2d_layer(Rc::new(Cell::new(Vec2::ZERO)), |layer, _| {
                layer.node(screen_node("2d"));
                Ok(())
            })
            .unwrap();
        let scene = builder.build();
        backend.take_calls();

        scene.render(&window);

        assert_eq!(scene.layers().len(), 4);
        assert_eq!(screens(&backend.calls()), ["ui-a", "ui-b", "3d", "custom", "2d"]);
    }

    #[test]
    fn camera_layers_expose_their_camera() {
        let backend = Rc::new(RecordingRenderer::new());
        let window = window_with(backend.clone());
        let mut builder = SceneBuilder::new(backend.clone(), &window);
        builder
            .camera_3d_layer(|_, camera| {
                assert_eq!(camera.fov(), 70.0);
                camera.set_position(Vec3::new(0.0, 0.0, 3.0));
                Ok(())
            })
            .unwrap();
        let scene = builder.build();

        let Some(LayerCamera::ThreeD(camera)) = scene.layers()[0].camera() else {
            panic!("expected a 3D camera");
        };
        assert_eq!(camera.position(), Vec3::new(0.0, 0.0, 3.0));
        assert!(scene.layers()[0].renderer().decorated().is_some());
    }

    #[test]
    fn layer_errors_propagate() {
        let backend = Rc::new(RecordingRenderer::new());
        let window = window_with(backend.clone());
        let mut builder = SceneBuilder::new(backend, &window);

        let result = builder.ui_layer(|layer| {
            layer.post("", 1, Some(0), |_| {})?;
            Ok(())
        });

        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::NonPositiveMinWidth))
        ));
    }

    struct LateBound(OnceCell<Rc<dyn Renderer>>);

    impl RendererDecorator for LateBound {
        fn target(&self) -> &dyn Renderer {
            &**self.0.get().expect("target set")
        }
    }

    #[test]
    fn cyclic_custom_renderer_is_rejected() {
        let backend = Rc::new(RecordingRenderer::new());
        let window = window_with(backend.clone());
        let looped = Rc::new(LateBound(OnceCell::new()));
        let as_renderer: Rc<dyn Renderer> = looped.clone();
        assert!(looped.0.set(as_renderer.clone()).is_ok());

        let mut builder = SceneBuilder::new(backend, &window);
        let result = builder.custom_layer(as_renderer, |_| Ok(()));

        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::DecoratorCycle { .. }))
        ));
    }

    #[test]
    fn filters_follow_window_resizes() {
        let backend = Rc::new(RecordingRenderer::new());
        let window = window_with(backend.clone());
        let mut builder = SceneBuilder::new(backend.clone(), &window);
        let mut filter = None;
        builder
            .camera_2d_layer(Rc::new(Cell::new(Vec2::ZERO)), |layer, _| {
                let window = layer.window();
                let f = layer.post("", 2, Some(400), |fb| {
                    assert_eq!(fb.resolution(window), (400, 300));
                    fb.node(screen_node("world")).shader(|u| {
                        u.set("amount", 1.0f32);
                    });
                })?;
                layer.node(Rc::clone(&f));
                filter = Some(f);
                Ok(())
            })
            .unwrap();
        let scene = builder.build();
        let filter = filter.unwrap();
        assert_eq!(filter.resolution(), Some((400, 300)));

        window.dispatch(Event::Resized { width: 1600, height: 800 });
        assert_eq!(filter.resolution(), Some((400, 200)));

        window.dispatch(Event::Resized { width: 0, height: 0 });
        assert_eq!(filter.state(), FilterState::Active);
        assert_eq!(filter.resolution(), Some((400, 200)));

        backend.take_calls();
        window.dispatch(Event::Resized { width: 800, height: 600 });
        scene.render(&window);
        assert_eq!(screens(&backend.calls()), ["world", "filter"]);
    }

    #[test]
    fn dropped_filters_ignore_later_resizes() {
        let backend = Rc::new(RecordingRenderer::new());
        let window = window_with(backend.clone());
        let mut builder = SceneBuilder::new(backend.clone(), &window);
        builder
            .ui_layer(|layer| {
                layer.post("", 1, None, |_| {})?;
                Ok(())
            })
            .unwrap();
        assert_eq!(backend.live_buffers(), 0);

        backend.take_calls();
        window.dispatch(Event::Resized { width: 900, height: 700 });
        assert_eq!(backend.calls(), vec![Call::Resize(900, 700)]);
    }

    #[test]
    fn rebuilt_scenes_do_not_pile_up_resize_listeners() {
        let backend = Rc::new(RecordingRenderer::new());
        let window = window_with(backend.clone());
        let before = window.resize_listener_count();

        for _ in 0..100 {
            let mut builder = SceneBuilder::new(backend.clone(), &window);
            builder
                .ui_layer(|layer| {
                    let filter = layer.post("", 1, None, |_| {})?;
                    layer.node(filter);
                    Ok(())
                })
                .unwrap();
            drop(builder.build());
        }
        assert_eq!(window.resize_listener_count(), before + 100);

        window.dispatch(Event::Resized { width: 900, height: 700 });
        assert_eq!(window.resize_listener_count(), before);
        assert_eq!(backend.live_buffers(), 0);
    }
}
