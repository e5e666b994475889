use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

use super::{Layer, LayerCamera, Scene};
use crate::assets::Texture;
use crate::camera::{Camera2D, Camera3D};
use crate::error::Result;
use crate::filter::Filter;
use crate::node::{BackgroundNode, Node};
use crate::renderer::{Renderer, UiRenderer, validate_chain};
use crate::shader::{Shader, UniformFn, Uniforms};
use crate::window::Window;

/// Declares the layers of a [`Scene`], back to front.
///
/// Camera and UI layers wrap the base renderer in a fresh decorator; custom
/// layers render through whatever renderer they're given.
///
/// ```ignore
/// let follow = Rc::new(Cell::new(Vec2::ZERO));
/// let mut builder = SceneBuilder::new(renderer.clone(), &window);
/// builder
///     .camera_2d_layer(follow.clone(), |layer, _camera| {
///         let bloom = layer.post(BLOOM_WGSL, 1, Some(480), |filter| {
///             filter.node(world_node);
///             filter.shader(|u| {
///                 u.set("strength", 0.6f32);
///             });
///         })?;
///         layer.node(bloom);
///         Ok(())
///     })?
///     .ui_layer(|layer| {
///         layer.node(hud);
///         Ok(())
///     })?;
/// let scene = builder.build();
/// ```
pub struct SceneBuilder<'w> {
    renderer: Rc<dyn Renderer>,
    window: &'w Window,
    layers: Vec<Layer>,
}

impl<'w> SceneBuilder<'w> {
    pub fn new(renderer: Rc<dyn Renderer>, window: &'w Window) -> Self {
        Self {
            renderer,
            window,
            layers: Vec::new(),
        }
    }

    /// The renderer camera and UI layers decorate.
    pub fn renderer(&self) -> &Rc<dyn Renderer> {
        &self.renderer
    }

    /// A layer drawn through `renderer` as-is.
    pub fn custom_layer(
        &mut self,
        renderer: Rc<dyn Renderer>,
        init: impl FnOnce(&mut LayerBuilder<'w>) -> Result<()>,
    ) -> Result<&mut Self> {
        validate_chain(&*renderer)?;
        let mut layer = LayerBuilder::new(renderer, self.window);
        init(&mut layer)?;
        self.layers.push(layer.finish(None));
        Ok(self)
    }

    /// A layer seen through a 2D camera that tracks `follow`.
    pub fn camera_2d_layer(
        &mut self,
        follow: Rc<Cell<Vec2>>,
        init: impl FnOnce(&mut LayerBuilder<'w>, &Rc<Camera2D>) -> Result<()>,
    ) -> Result<&mut Self> {
        let camera = Rc::new(Camera2D::new(Rc::clone(&self.renderer), follow));
        validate_chain(&*camera)?;
        let mut layer = LayerBuilder::new(camera.clone(), self.window);
        init(&mut layer, &camera)?;
        self.layers.push(layer.finish(Some(LayerCamera::TwoD(camera))));
        Ok(self)
    }

    /// A layer seen through a perspective camera at the origin with no
    /// rotation and a 70° field of view.
    pub fn camera_3d_layer(
        &mut self,
        init: impl FnOnce(&mut LayerBuilder<'w>, &Rc<Camera3D>) -> Result<()>,
    ) -> Result<&mut Self> {
        let camera = Rc::new(Camera3D::new(Rc::clone(&self.renderer)));
        validate_chain(&*camera)?;
        let mut layer = LayerBuilder::new(camera.clone(), self.window);
        init(&mut layer, &camera)?;
        self.layers
            .push(layer.finish(Some(LayerCamera::ThreeD(camera))));
        Ok(self)
    }

    /// A pixel-space overlay layer.
    pub fn ui_layer(
        &mut self,
        init: impl FnOnce(&mut LayerBuilder<'w>) -> Result<()>,
    ) -> Result<&mut Self> {
        let ui: Rc<dyn Renderer> = Rc::new(UiRenderer::new(Rc::clone(&self.renderer)));
        self.custom_layer(ui, init)
    }

    pub fn build(self) -> Scene {
        log::debug!("Built scene with {} layers", self.layers.len());
        Scene {
            layers: self.layers,
        }
    }
}

/// Collects the nodes of one layer.
pub struct LayerBuilder<'w> {
    renderer: Rc<dyn Renderer>,
    window: &'w Window,
    nodes: Vec<Box<dyn Node>>,
}

impl<'w> LayerBuilder<'w> {
    fn new(renderer: Rc<dyn Renderer>, window: &'w Window) -> Self {
        Self {
            renderer,
            window,
            nodes: Vec::new(),
        }
    }

    /// The renderer this layer draws through.
    pub fn renderer(&self) -> &Rc<dyn Renderer> {
        &self.renderer
    }

    pub fn window(&self) -> &'w Window {
        self.window
    }

    /// Appends a node; nodes draw in the order they're added.
    pub fn node(&mut self, node: impl Node + 'static) -> &mut Self {
        self.nodes.push(Box::new(node));
        self
    }

    /// Builds a post-process filter bound to this layer's renderer.
    ///
    /// `min_width` defaults to the window's shorter side, which keeps the
    /// buffers at full resolution. The filter follows window resizes for as
    /// long as it is alive; the first resize after it drops unregisters its
    /// listener. Add the returned filter to a layer with
    /// [`node`](Self::node) to composite it.
    pub fn post(
        &mut self,
        fragment: &str,
        color_buffer_count: usize,
        min_width: Option<u32>,
        init: impl FnOnce(&mut FilterBuilder),
    ) -> Result<Rc<Filter>> {
        let (width, height) = self.window.size();
        let min_width = min_width.unwrap_or_else(|| width.min(height).max(1));

        let mut builder = FilterBuilder::new(min_width);
        init(&mut builder);

        let filter = Rc::new(Filter::new(
            Rc::clone(&self.renderer),
            self.window,
            fragment,
            color_buffer_count,
            min_width,
            builder.uniforms,
            builder.nodes,
        )?);

        let weak = Rc::downgrade(&filter);
        let own_id = Rc::new(Cell::new(None));
        let listener_id = Rc::clone(&own_id);
        let id = self.window.add_resize_listener(move |window, width, height| {
            match weak.upgrade() {
                Some(filter) => filter.resize(width, height),
                None => {
                    if let Some(id) = listener_id.take() {
                        window.remove_resize_listener(id);
                    }
                }
            }
        });
        own_id.set(Some(id));
        Ok(filter)
    }

    /// A fullscreen shader node, optionally sampling `texture` from slot 0.
    pub fn background(
        &self,
        fragment: &str,
        texture: Option<Texture>,
        uniforms: impl Fn(&mut Uniforms) + 'static,
    ) -> BackgroundNode {
        BackgroundNode::new(
            Shader::screen("background", fragment),
            texture,
            Rc::new(uniforms),
        )
    }

    fn finish(self, camera: Option<LayerCamera>) -> Layer {
        Layer {
            renderer: self.renderer,
            nodes: self.nodes,
            camera,
        }
    }
}

/// Collects the nodes and uniforms of a filter.
pub struct FilterBuilder {
    min_width: u32,
    nodes: Vec<Box<dyn Node>>,
    uniforms: UniformFn,
}

impl FilterBuilder {
    fn new(min_width: u32) -> Self {
        Self {
            min_width,
            nodes: Vec::new(),
            uniforms: Rc::new(|_: &mut Uniforms| {}),
        }
    }

    /// Appends a node drawn into the filter's buffers.
    pub fn node(&mut self, node: impl Node + 'static) -> &mut Self {
        self.nodes.push(Box::new(node));
        self
    }

    /// Sets the procedure that fills the filter shader's uniforms each frame.
    pub fn shader(&mut self, uniforms: impl Fn(&mut Uniforms) + 'static) -> &mut Self {
        self.uniforms = Rc::new(uniforms);
        self
    }

    pub fn min_width(&self) -> u32 {
        self.min_width
    }

    /// The buffer size the filter will use in `window`.
    pub fn resolution(&self, window: &Window) -> (u32, u32) {
        let (width, height) = window.size();
        Filter::buffer_size(width, height, self.min_width)
    }
}
