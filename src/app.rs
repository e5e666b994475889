use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use anyhow::Context;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow};
use winit::window::WindowId;

use crate::backend::WgpuRenderer;
use crate::input::{Input, InputHandler};
use crate::logging::{LoggingConfig, init_logging};
use crate::renderer::{Color, Renderer};
use crate::scene::{Scene, SceneBuilder};
use crate::window::{Event, Platform, Window, WindowConfig};

/// Configuration for the application runner.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub clear_color: Color,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            clear_color: Color::rgb(0.05, 0.05, 0.08),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.window = self.window.title(title);
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.window = self.window.size(width, height);
        self
    }

    pub fn min_size(mut self, width: u32, height: u32) -> Self {
        self.window = self.window.min_size(width, height);
        self
    }

    pub fn fullscreen(mut self, fullscreen: bool) -> Self {
        self.window = self.window.fullscreen(fullscreen);
        self
    }

    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }
}

/// Context provided during app setup.
///
/// The renderer is live and bound to the window, so meshes, textures and
/// filters can be created here.
pub struct SetupContext<'a> {
    /// The backend; also the asset entry point.
    pub renderer: &'a Rc<WgpuRenderer>,
    pub window: &'a Window,
    pub input: &'a Rc<RefCell<Input>>,
    scene: Option<Scene>,
}

impl<'a> SetupContext<'a> {
    /// The backend as the base of a decorator chain.
    pub fn base_renderer(&self) -> Rc<dyn Renderer> {
        self.renderer.clone()
    }

    /// A builder whose camera and UI layers decorate the backend.
    pub fn scene_builder(&self) -> SceneBuilder<'a> {
        SceneBuilder::new(self.base_renderer(), self.window)
    }

    /// The scene rendered every frame. Defaults to an empty scene.
    pub fn set_scene(&mut self, scene: Scene) {
        self.scene = Some(scene);
    }
}

/// Per-frame context handed to the frame closure.
pub struct Frame<'a> {
    pub window: &'a Window,
    /// Input state for this frame.
    pub input: &'a Input,
    /// Total elapsed time in seconds.
    pub time: f32,
    /// Delta time since last frame in seconds.
    pub dt: f32,
    renderer: &'a Rc<WgpuRenderer>,
    next_scene: Option<Scene>,
}

impl<'a> Frame<'a> {
    /// Current frames per second.
    pub fn fps(&self) -> f32 {
        if self.dt > 0.0 { 1.0 / self.dt } else { 0.0 }
    }

    pub fn width(&self) -> u32 {
        self.window.width()
    }

    pub fn height(&self) -> u32 {
        self.window.height()
    }

    pub fn renderer(&self) -> &Rc<WgpuRenderer> {
        self.renderer
    }

    /// A builder for a replacement scene.
    pub fn scene_builder(&self) -> SceneBuilder<'a> {
        let base: Rc<dyn Renderer> = self.renderer.clone();
        SceneBuilder::new(base, self.window)
    }

    /// Swaps in `scene` before this frame is rendered.
    pub fn replace_scene(&mut self, scene: Scene) {
        self.next_scene = Some(scene);
    }

    /// Closes the window after this frame.
    pub fn exit(&self) {
        self.window.set_should_close(true);
    }
}

/// Run a lamina application with the default configuration.
///
/// # Example
/// ```ignore
/// lamina::run(|ctx| {
///     let mut builder = ctx.scene_builder();
///     builder.ui_layer(|layer| {
///         let sky = layer.background(SKY_WGSL, None, |_| {});
///         layer.node(sky);
///         Ok(())
///     })?;
///     ctx.set_scene(builder.build());
///
///     Ok(move |frame: &mut Frame| {
///         if frame.input.key_pressed(KeyCode::Escape) {
///             frame.exit();
///         }
///     })
/// })?;
/// ```
pub fn run<S, F>(setup: S) -> anyhow::Result<()>
where
    S: FnOnce(&mut SetupContext) -> anyhow::Result<F>,
    F: FnMut(&mut Frame),
{
    run_with_config(AppConfig::default(), setup)
}

/// Run a lamina application with custom configuration.
///
/// Blocks until the window closes. Setup failures end the event loop and
/// are returned here.
pub fn run_with_config<S, F>(config: AppConfig, setup: S) -> anyhow::Result<()>
where
    S: FnOnce(&mut SetupContext) -> anyhow::Result<F>,
    F: FnMut(&mut Frame),
{
    init_logging(config.logging.clone());

    let platform = Platform::new().context("failed to start the windowing platform")?;
    let mut app = LaminaApp {
        config,
        renderer: Rc::new(WgpuRenderer::new()),
        setup: Some(setup),
        running: None,
        error: None,
    };
    platform.run(&mut app).context("event loop failed")?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct Running<F> {
    window: Window,
    input: Rc<RefCell<Input>>,
    scene: Scene,
    frame_fn: F,
    start_time: Instant,
    last_frame: Instant,
}

struct LaminaApp<S, F> {
    config: AppConfig,
    renderer: Rc<WgpuRenderer>,
    setup: Option<S>,
    running: Option<Running<F>>,
    error: Option<anyhow::Error>,
}

impl<S, F> LaminaApp<S, F>
where
    S: FnOnce(&mut SetupContext) -> anyhow::Result<F>,
    F: FnMut(&mut Frame),
{
    fn start(&self, event_loop: &ActiveEventLoop, setup: S) -> anyhow::Result<Running<F>> {
        let base: Rc<dyn Renderer> = self.renderer.clone();
        let window = Window::new(base, self.config.window.clone());
        let input = Rc::new(RefCell::new(Input::new()));
        let handler: Rc<RefCell<dyn InputHandler>> = input.clone();
        window
            .init(event_loop, Some(handler))
            .context("failed to create the window")?;
        self.renderer.set_clear_color(self.config.clear_color);

        let mut ctx = SetupContext {
            renderer: &self.renderer,
            window: &window,
            input: &input,
            scene: None,
        };
        let frame_fn = match setup(&mut ctx) {
            Ok(frame_fn) => frame_fn,
            Err(e) => {
                drop(ctx);
                window.destroy();
                return Err(e.context("application setup failed"));
            }
        };
        let scene = ctx.scene.take().unwrap_or_default();

        log::info!(
            "Running \"{}\" with {} layer(s)",
            window.title(),
            scene.layers().len()
        );
        window.mark_running();
        window.request_redraw();

        Ok(Running {
            window,
            input,
            scene,
            frame_fn,
            start_time: Instant::now(),
            last_frame: Instant::now(),
        })
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(Running { window, scene, .. }) = self.running.take() {
            // Filters release their buffers through the renderer, so the
            // scene goes before the window destroys it.
            drop(scene);
            window.destroy();
        }
        event_loop.exit();
    }
}

impl<F: FnMut(&mut Frame)> Running<F> {
    fn frame(&mut self, renderer: &Rc<WgpuRenderer>) {
        let now = Instant::now();
        let time = self.start_time.elapsed().as_secs_f32();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let next_scene = {
            let input = self.input.borrow();
            let mut frame = Frame {
                window: &self.window,
                input: &input,
                time,
                dt,
                renderer,
                next_scene: None,
            };
            (self.frame_fn)(&mut frame);
            frame.next_scene
        };
        if let Some(scene) = next_scene {
            log::debug!("Replacing scene ({} layer(s))", scene.layers().len());
            self.scene = scene;
        }

        let base = self.window.renderer();
        base.pre_render();
        base.clear();
        self.scene.render(&self.window);
        base.post_render();

        self.input.borrow_mut().end_frame();
        self.window.request_redraw();
    }
}

impl<S, F> ApplicationHandler for LaminaApp<S, F>
where
    S: FnOnce(&mut SetupContext) -> anyhow::Result<F>,
    F: FnMut(&mut Frame),
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(setup) = self.setup.take() else {
            return;
        };
        event_loop.set_control_flow(ControlFlow::Poll);

        match self.start(event_loop, setup) {
            Ok(running) => self.running = Some(running),
            Err(e) => {
                log::error!("{e:#}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(running) = self.running.as_mut() else {
            return;
        };

        if let Some(event) = Event::from_winit(&event) {
            running.window.dispatch(event);
        }
        if matches!(event, WindowEvent::RedrawRequested) {
            running.frame(&self.renderer);
        }

        if running.window.should_close() {
            self.shutdown(event_loop);
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.shutdown(event_loop);
    }
}
