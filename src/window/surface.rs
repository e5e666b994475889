use std::sync::Arc;

use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event_loop::ActiveEventLoop;
use winit::window::{Fullscreen, WindowAttributes};

use super::WindowConfig;
use crate::error::WindowError;

/// The platform window behind a [`Window`](super::Window).
///
/// Sizes are physical pixels.
pub trait NativeSurface {
    fn inner_size(&self) -> (u32, u32);

    /// Asks for a new inner size. Returns the applied size when the platform
    /// resized synchronously; otherwise a resize event follows later.
    fn request_size(&self, width: u32, height: u32) -> Option<(u32, u32)>;

    fn set_title(&self, title: &str);

    fn set_fullscreen(&self, fullscreen: bool);

    fn scale_factor(&self) -> f64;

    fn request_redraw(&self);

    fn show(&self);

    /// The winit window, for backends that render into it.
    fn handle(&self) -> Option<Arc<winit::window::Window>> {
        None
    }
}

/// Creates native surfaces.
pub trait SurfaceFactory {
    fn create_surface(&self, config: &WindowConfig)
    -> Result<Box<dyn NativeSurface>, WindowError>;
}

/// A winit window.
pub struct WinitSurface {
    window: Arc<winit::window::Window>,
}

impl WinitSurface {
    pub fn new(window: Arc<winit::window::Window>) -> Self {
        Self { window }
    }
}

impl NativeSurface for WinitSurface {
    fn inner_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn request_size(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        self.window
            .request_inner_size(PhysicalSize::new(width, height))
            .map(|size| (size.width, size.height))
    }

    fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }

    fn set_fullscreen(&self, fullscreen: bool) {
        self.window
            .set_fullscreen(fullscreen.then_some(Fullscreen::Borderless(None)));
    }

    fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    fn request_redraw(&self) {
        self.window.request_redraw();
    }

    fn show(&self) {
        self.window.set_visible(true);
    }

    fn handle(&self) -> Option<Arc<winit::window::Window>> {
        Some(Arc::clone(&self.window))
    }
}

impl SurfaceFactory for ActiveEventLoop {
    /// Creates a hidden window centered on the primary monitor.
    fn create_surface(
        &self,
        config: &WindowConfig,
    ) -> Result<Box<dyn NativeSurface>, WindowError> {
        let (min_width, min_height) = config.min_size;
        let mut attributes = WindowAttributes::default()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .with_min_inner_size(PhysicalSize::new(min_width, min_height))
            .with_visible(false);

        if config.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        } else if let Some(monitor) = self.primary_monitor() {
            let area = monitor.size();
            let origin = monitor.position();
            let x = origin.x + (area.width as i32 - config.width as i32) / 2;
            let y = origin.y + (area.height as i32 - config.height as i32) / 2;
            attributes = attributes.with_position(PhysicalPosition::new(x, y));
        }

        let window = self
            .create_window(attributes)
            .map_err(|e| WindowError::SurfaceCreation(e.to_string()))?;
        Ok(Box::new(WinitSurface::new(Arc::new(window))))
    }
}
