//! Offscreen post-process passes.
//!
//! A [`Filter`] renders its own nodes into offscreen color buffers, then
//! composites them onto whatever target is current with a fullscreen shader.
//! Buffers follow the window: the scene builder registers a resize listener
//! that calls [`Filter::resize`].
//!
//! ```text
//! Unconfigured ──resize(w, h)──▶ Sized ──allocate ok──▶ Active
//!                                  ▲                      │
//!                                  └────resize(w, h)──────┘
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{ConfigError, Error, RenderError};
use crate::node::Node;
use crate::renderer::{Binding, FrameBufferSet, MAX_TEXTURE_SLOTS, Renderer};
use crate::shader::{Shader, UniformFn};
use crate::window::Window;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterState {
    /// No buffers yet (the window had no area when the filter was built).
    Unconfigured,
    /// Size known, buffers missing. Compositing is skipped.
    Sized,
    /// Buffers allocated; the filter draws every frame.
    Active,
}

pub struct Filter {
    renderer: Rc<dyn Renderer>,
    shader: Shader,
    color_buffer_count: usize,
    min_width: u32,
    uniforms: UniformFn,
    nodes: Vec<Box<dyn Node>>,
    buffers: RefCell<FrameBufferSet>,
    state: Cell<FilterState>,
}

impl Filter {
    /// Builds a filter and allocates its buffers for the window's current size.
    ///
    /// `fragment` is fragment-only WGSL (see [`Shader::screen`]); the color
    /// buffers are visible to it as `tex0..tex{n-1}`.
    pub fn new(
        renderer: Rc<dyn Renderer>,
        window: &Window,
        fragment: &str,
        color_buffer_count: usize,
        min_width: u32,
        uniforms: UniformFn,
        nodes: Vec<Box<dyn Node>>,
    ) -> Result<Self, Error> {
        if min_width == 0 {
            return Err(ConfigError::NonPositiveMinWidth.into());
        }
        if color_buffer_count == 0 || color_buffer_count > MAX_TEXTURE_SLOTS {
            return Err(ConfigError::ColorBufferCount {
                count: color_buffer_count,
                max: MAX_TEXTURE_SLOTS,
            }
            .into());
        }

        let filter = Self {
            renderer,
            shader: Shader::screen("filter", fragment),
            color_buffer_count,
            min_width,
            uniforms,
            nodes,
            buffers: RefCell::new(FrameBufferSet::default()),
            state: Cell::new(FilterState::Unconfigured),
        };

        let (width, height) = window.size();
        if width > 0 && height > 0 {
            filter.state.set(FilterState::Sized);
            filter.allocate(width, height)?;
        }
        Ok(filter)
    }

    /// Offscreen size for a `width`×`height` window.
    ///
    /// Windows whose shorter side is within `min_width` keep full resolution.
    /// Larger windows are scaled down to `min_width` pixels wide, keeping the
    /// aspect ratio.
    ///
    /// ```
    /// use lamina::Filter;
    ///
    /// assert_eq!(Filter::buffer_size(1920, 1080, 960), (960, 540));
    /// assert_eq!(Filter::buffer_size(1920, 1080, 2000), (1920, 1080));
    /// ```
    pub fn buffer_size(width: u32, height: u32, min_width: u32) -> (u32, u32) {
        if min_width >= width.min(height) {
            return (width, height);
        }
        let scaled = (height as f64 * min_width as f64 / width as f64).round();
        (min_width, (scaled as u32).max(1))
    }

    pub fn state(&self) -> FilterState {
        self.state.get()
    }

    pub fn min_width(&self) -> u32 {
        self.min_width
    }

    pub fn color_buffer_count(&self) -> usize {
        self.color_buffer_count
    }

    pub fn shader(&self) -> &Shader {
        &self.shader
    }

    /// Size of the current buffers, if any.
    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.buffers.borrow().size()
    }

    /// Reallocates the buffers for a new window size.
    ///
    /// A zero-area size is ignored. If allocation fails the filter stays
    /// [`FilterState::Sized`] and stops compositing until the next resize.
    pub fn resize(&self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.state.set(FilterState::Sized);
        self.release_buffers();
        if let Err(e) = self.allocate(width, height) {
            log::error!("Filter buffers weren't reallocated for {width}x{height}: {e}");
        }
    }

    fn allocate(&self, window_width: u32, window_height: u32) -> Result<(), RenderError> {
        let (width, height) = Self::buffer_size(window_width, window_height, self.min_width);

        let mut set = FrameBufferSet::default();
        match self.create_buffers(&mut set, width, height) {
            Ok(()) => {
                *self.buffers.borrow_mut() = set;
                self.state.set(FilterState::Active);
                Ok(())
            }
            Err(e) => {
                for buffer in set.colors.iter().chain(set.depth.iter()) {
                    self.renderer.release_buffer(buffer);
                }
                Err(e)
            }
        }
    }

    fn create_buffers(
        &self,
        set: &mut FrameBufferSet,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        for attachment in 0..self.color_buffer_count as u32 {
            set.colors
                .push(self.renderer.create_color_buffer(attachment, width, height)?);
        }
        set.depth = Some(self.renderer.create_depth_buffer(width, height)?);
        Ok(())
    }

    fn release_buffers(&self) {
        let old = std::mem::take(&mut *self.buffers.borrow_mut());
        for buffer in old.colors.iter().chain(old.depth.iter()) {
            self.renderer.release_buffer(buffer);
        }
    }
}

impl Node for Filter {
    fn render(&self, renderer: &dyn Renderer, window: &Window) {
        if self.state.get() != FilterState::Active {
            return;
        }
        let buffers = self.buffers.borrow();

        let offscreen = &*self.renderer;
        offscreen.use_frame_buffer(&buffers, &mut || {
            offscreen.clear();
            for node in &self.nodes {
                node.render(offscreen, window);
            }
        });

        let slots: Vec<_> = buffers
            .colors
            .iter()
            .map(|buffer| Some(Binding::Buffer(buffer)))
            .collect();
        renderer.bind(&slots);
        self.shader.apply(|u| (self.uniforms)(u));
        renderer.render_screen(window, &self.shader);
    }
}

impl Drop for Filter {
    fn drop(&mut self) {
        self.release_buffers();
    }
}
