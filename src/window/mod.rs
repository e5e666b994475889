//! The application window.
//!
//! A [`Window`] owns its native surface and fans platform events out to the
//! bound renderer, the input handler and any resize listeners. All state sits
//! behind cells: listeners and nodes receive `&Window` while the window is
//! dispatching, and they may still query and reconfigure it.

mod event;
mod platform;
mod surface;

pub use event::Event;
pub use platform::Platform;
pub use surface::{NativeSurface, SurfaceFactory, WinitSurface};

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::WindowError;
use crate::format;
use crate::input::InputHandler;
use crate::renderer::Renderer;

/// Minimum inner size enforced on native windows.
pub const MIN_WINDOW_SIZE: (u32, u32) = (600, 300);

/// Initial window settings.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub min_size: (u32, u32),
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "lamina".to_owned(),
            width: 1280,
            height: 720,
            min_size: MIN_WINDOW_SIZE,
            fullscreen: false,
        }
    }
}

impl WindowConfig {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn min_size(mut self, width: u32, height: u32) -> Self {
        self.min_size = (width, height);
        self
    }

    pub fn fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowState {
    /// Constructed; no native surface yet.
    Created,
    /// Surface and renderer are live.
    Initialized,
    /// The frame loop has started.
    Running,
}

/// Identifies a registered resize listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ResizeListener = Box<dyn FnMut(&Window, u32, u32)>;

pub struct Window {
    renderer: Rc<dyn Renderer>,
    config: WindowConfig,
    state: Cell<WindowState>,
    surface: RefCell<Option<Box<dyn NativeSurface>>>,
    size: Cell<(u32, u32)>,
    title: RefCell<String>,
    fullscreen: Cell<bool>,
    scale: Cell<f64>,
    input: RefCell<Option<Rc<RefCell<dyn InputHandler>>>>,
    listeners: RefCell<Vec<(ListenerId, ResizeListener)>>,
    next_listener: Cell<u64>,
    /// Listeners taken out for the resize being dispatched.
    dispatching: RefCell<Vec<ListenerId>>,
    removed_while_dispatching: RefCell<Vec<ListenerId>>,
    should_close: Cell<bool>,
}

impl Window {
    pub fn new(renderer: Rc<dyn Renderer>, config: WindowConfig) -> Self {
        Self {
            renderer,
            state: Cell::new(WindowState::Created),
            surface: RefCell::new(None),
            size: Cell::new((config.width, config.height)),
            title: RefCell::new(config.title.clone()),
            fullscreen: Cell::new(config.fullscreen),
            scale: Cell::new(1.0),
            input: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
            dispatching: RefCell::new(Vec::new()),
            removed_while_dispatching: RefCell::new(Vec::new()),
            should_close: Cell::new(false),
            config,
        }
    }

    /// Creates the native surface and brings the renderer up on it.
    ///
    /// On failure the error is logged and returned, and the window stays
    /// [`WindowState::Created`].
    pub fn init(
        &self,
        factory: &dyn SurfaceFactory,
        input: Option<Rc<RefCell<dyn InputHandler>>>,
    ) -> Result<(), WindowError> {
        if self.state.get() != WindowState::Created {
            return Err(WindowError::AlreadyInitialized);
        }

        if let Err(e) = self.renderer.pre_window_init() {
            log::error!("Renderer couldn't prepare for a window: {e}");
            return Err(e.into());
        }

        let surface = match factory.create_surface(&self.config) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("Native window wasn't created: {e}");
                return Err(e);
            }
        };
        self.size.set(surface.inner_size());
        self.scale.set(surface.scale_factor());
        *self.surface.borrow_mut() = Some(surface);

        if let Some(input) = input {
            input.borrow_mut().init(self);
            *self.input.borrow_mut() = Some(input);
        }

        if let Err(e) = self.renderer.init(self) {
            log::error!("Renderer couldn't attach to the window: {e}");
            self.input.borrow_mut().take();
            self.surface.borrow_mut().take();
            return Err(e.into());
        }

        self.with_surface(|s| s.show());
        self.state.set(WindowState::Initialized);
        log::trace!("Created window {self}");
        Ok(())
    }

    /// Marks the start of the frame loop.
    pub fn mark_running(&self) {
        if self.state.get() == WindowState::Initialized {
            self.state.set(WindowState::Running);
        }
    }

    pub fn state(&self) -> WindowState {
        self.state.get()
    }

    pub fn renderer(&self) -> &Rc<dyn Renderer> {
        &self.renderer
    }

    /// Routes one platform event.
    pub fn dispatch(&self, event: Event) {
        match event {
            Event::Resized { width, height } => self.on_resize(width, height),
            Event::Key { key, state, repeat } => {
                self.with_input(|input| input.on_key(key, state, repeat))
            }
            Event::MouseButton { button, state } => {
                self.with_input(|input| input.on_mouse_button(button, state))
            }
            Event::Scroll { delta } => self.with_input(|input| input.on_scroll(delta)),
            Event::CursorMoved { position } => {
                self.with_input(|input| input.on_cursor_move(position))
            }
            Event::ScaleFactorChanged { scale } => self.scale.set(scale),
            Event::CloseRequested => self.should_close.set(true),
            Event::RedrawRequested => {}
        }
    }

    fn on_resize(&self, width: u32, height: u32) {
        self.size.set((width, height));
        self.renderer.on_window_resize(width, height);

        let mut active = std::mem::take(&mut *self.listeners.borrow_mut());
        *self.dispatching.borrow_mut() = active.iter().map(|(id, _)| *id).collect();
        for (id, listener) in active.iter_mut() {
            if self.removed_while_dispatching.borrow().contains(id) {
                continue;
            }
            listener(self, width, height);
        }
        self.dispatching.borrow_mut().clear();

        let mut listeners = self.listeners.borrow_mut();
        let added = std::mem::replace(&mut *listeners, active);
        listeners.extend(added);
        let removed = std::mem::take(&mut *self.removed_while_dispatching.borrow_mut());
        listeners.retain(|(id, _)| !removed.contains(id));
    }

    fn with_input(&self, f: impl FnOnce(&mut dyn InputHandler)) {
        let input = self.input.borrow().clone();
        if let Some(input) = input {
            f(&mut *input.borrow_mut());
        }
    }

    fn with_surface(&self, f: impl FnOnce(&dyn NativeSurface)) {
        if let Some(surface) = self.surface.borrow().as_deref() {
            f(surface);
        }
    }

    /// Calls `listener` after every resize, after the renderer has seen it.
    pub fn add_resize_listener(
        &self,
        listener: impl FnMut(&Window, u32, u32) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Box::new(listener)));
        id
    }

    /// Returns whether the listener was registered.
    pub fn remove_resize_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(index) = listeners.iter().position(|(l, _)| *l == id) {
            drop(listeners.remove(index));
            return true;
        }
        let mut removed = self.removed_while_dispatching.borrow_mut();
        if self.dispatching.borrow().contains(&id) && !removed.contains(&id) {
            removed.push(id);
            return true;
        }
        false
    }

    /// Number of registered resize listeners.
    pub fn resize_listener_count(&self) -> usize {
        let taken = self.dispatching.borrow().len();
        let removed = self.removed_while_dispatching.borrow().len();
        self.listeners.borrow().len() + taken - removed
    }

    pub fn size(&self) -> (u32, u32) {
        self.size.get()
    }

    pub fn width(&self) -> u32 {
        self.size.get().0
    }

    pub fn height(&self) -> u32 {
        self.size.get().1
    }

    /// Width over height, or 1 while the window has no height.
    pub fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.size.get();
        if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }

    /// Requests a new inner size.
    ///
    /// The cached size only changes if the platform applied the resize right
    /// away; otherwise the following [`Event::Resized`] updates it.
    pub fn set_size(&self, width: u32, height: u32) {
        let applied = self
            .surface
            .borrow()
            .as_deref()
            .and_then(|s| s.request_size(width, height));
        if let Some(size) = applied {
            self.size.set(size);
        }
    }

    pub fn title(&self) -> String {
        self.title.borrow().clone()
    }

    pub fn set_title(&self, title: &str) {
        self.with_surface(|s| s.set_title(title));
        *self.title.borrow_mut() = title.to_owned();
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.get()
    }

    pub fn set_fullscreen(&self, fullscreen: bool) {
        self.with_surface(|s| s.set_fullscreen(fullscreen));
        self.fullscreen.set(fullscreen);
    }

    /// DPI scale factor of the monitor the window is on.
    pub fn content_scale(&self) -> f64 {
        self.scale.get()
    }

    pub fn request_redraw(&self) {
        self.with_surface(|s| s.request_redraw());
    }

    pub fn should_close(&self) -> bool {
        self.should_close.get()
    }

    pub fn set_should_close(&self, close: bool) {
        self.should_close.set(close);
    }

    /// The winit window behind this one, when there is one.
    pub fn native_handle(&self) -> Option<Arc<winit::window::Window>> {
        self.surface.borrow().as_ref().and_then(|s| s.handle())
    }

    /// Tears the window down: input and listeners first, then the renderer,
    /// then the native surface.
    pub fn destroy(self) {
        self.input.borrow_mut().take();
        self.listeners.borrow_mut().clear();
        if self.state.get() != WindowState::Created {
            self.renderer.destroy();
        }
        self.surface.borrow_mut().take();
        log::trace!("Destroyed window \"{}\"", format::double_quotes_escape(&self.title.borrow()));
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = self.size.get();
        write!(
            f,
            "{{ title: \"{}\", size: {width}x{height}, fullscreen: {}, scale: {} }}",
            format::double_quotes_escape(&self.title.borrow()),
            self.fullscreen.get(),
            format::percent(self.scale.get() as f32),
        )
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("title", &self.title.borrow())
            .field("size", &self.size.get())
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use winit::event::{ElementState, MouseButton};
    use winit::keyboard::KeyCode;

    use super::*;
    use crate::input::Input;
    use crate::renderer::testing::{Call, FakeFactory, RecordingRenderer};
    use crate::shader::Shader;
    use crate::transform::Transform;

    fn window(backend: &Rc<RecordingRenderer>) -> Window {
        Window::new(backend.clone(), WindowConfig::default().title("test").size(800, 600))
    }

    #[test]
    fn init_creates_surface_then_renderer() {
        let backend = Rc::new(RecordingRenderer::new());
        let factory = FakeFactory::default();
        let w = window(&backend);

        w.init(&factory, None).unwrap();

        assert_eq!(w.state(), WindowState::Initialized);
        assert_eq!(backend.calls(), vec![Call::PreWindowInit, Call::Init]);
        assert!(factory.state.shown.get());
        assert_eq!(w.content_scale(), 2.0);
        assert!(matches!(w.init(&factory, None), Err(WindowError::AlreadyInitialized)));
    }

    #[test]
    fn failed_surface_leaves_window_created() {
        let backend = Rc::new(RecordingRenderer::new());
        let w = window(&backend);

        let result = w.init(&FakeFactory::failing(), None);

        assert!(matches!(result, Err(WindowError::SurfaceCreation(_))));
        assert_eq!(w.state(), WindowState::Created);
        assert!(!backend.calls().contains(&Call::Init));

        w.init(&FakeFactory::default(), None).unwrap();
        assert_eq!(w.state(), WindowState::Initialized);
    }

    #[test]
    fn zero_size_resize_is_survivable() {
        let backend = Rc::new(RecordingRenderer::new());
        let w = window(&backend);
        w.init(&FakeFactory::default(), None).unwrap();
        let shader = Shader::new("s", "");

        w.dispatch(Event::Resized { width: 0, height: 0 });
        assert_eq!(w.size(), (0, 0));
        assert_eq!(w.aspect_ratio(), 1.0);

        w.dispatch(Event::Resized { width: 800, height: 600 });
        w.renderer().render_quad(&w, &shader, &Transform::new());

        let calls = backend.calls();
        assert!(calls.contains(&Call::Resize(0, 0)));
        assert!(calls.contains(&Call::Resize(800, 600)));
        assert!(matches!(calls.last(), Some(Call::Quad { .. })));
        assert!((w.aspect_ratio() - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn resize_updates_cache_then_renderer_then_listeners_in_order() {
        let backend = Rc::new(RecordingRenderer::new());
        let w = window(&backend);
        w.init(&FakeFactory::default(), None).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let seen = Rc::clone(&seen);
            let backend = Rc::clone(&backend);
            w.add_resize_listener(move |window, width, height| {
                assert_eq!(window.size(), (width, height));
                assert_eq!(backend.calls().last(), Some(&Call::Resize(width, height)));
                seen.borrow_mut().push(name);
            });
        }

        w.dispatch(Event::Resized { width: 1024, height: 768 });
        assert_eq!(*seen.borrow(), ["first", "second", "third"]);
    }

    #[test]
    fn removed_listeners_are_not_called() {
        let backend = Rc::new(RecordingRenderer::new());
        let w = window(&backend);
        let calls = Rc::new(Cell::new(0));

        let counter = Rc::clone(&calls);
        let id = w.add_resize_listener(move |_, _, _| counter.set(counter.get() + 1));
        w.dispatch(Event::Resized { width: 10, height: 10 });
        assert!(w.remove_resize_listener(id));
        assert!(!w.remove_resize_listener(id));
        w.dispatch(Event::Resized { width: 20, height: 20 });

        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn listener_can_remove_a_later_listener_while_dispatching() {
        let backend = Rc::new(RecordingRenderer::new());
        let w = window(&backend);
        let later_calls = Rc::new(Cell::new(0));
        let later_id = Rc::new(Cell::new(None));

        let target = Rc::clone(&later_id);
        w.add_resize_listener(move |window, _, _| {
            if let Some(id) = target.get() {
                window.remove_resize_listener(id);
            }
        });
        let counter = Rc::clone(&later_calls);
        later_id.set(Some(
            w.add_resize_listener(move |_, _, _| counter.set(counter.get() + 1)),
        ));
        let added = Rc::new(Cell::new(false));
        let flag = Rc::clone(&added);
        w.add_resize_listener(move |window, _, _| {
            if !flag.replace(true) {
                window.add_resize_listener(|_, _, _| {});
            }
        });

        w.dispatch(Event::Resized { width: 5, height: 5 });
        w.dispatch(Event::Resized { width: 6, height: 6 });

        assert_eq!(later_calls.get(), 0);
        assert_eq!(w.listeners.borrow().len(), 3);
        assert_eq!(w.resize_listener_count(), 3);
    }

    #[test]
    fn removing_twice_while_dispatching_reports_the_second_as_missing() {
        let backend = Rc::new(RecordingRenderer::new());
        let w = window(&backend);
        let results = Rc::new(RefCell::new(Vec::new()));
        let target = Rc::new(Cell::new(None));

        let seen = Rc::clone(&results);
        let victim = Rc::clone(&target);
        w.add_resize_listener(move |window, _, _| {
            if let Some(id) = victim.get() {
                seen.borrow_mut().push(window.remove_resize_listener(id));
                seen.borrow_mut().push(window.remove_resize_listener(id));
                seen.borrow_mut().push(window.remove_resize_listener(ListenerId(99)));
            }
        });
        target.set(Some(w.add_resize_listener(|_, _, _| {})));

        w.dispatch(Event::Resized { width: 5, height: 5 });

        assert_eq!(*results.borrow(), [true, false, false]);
        assert_eq!(w.resize_listener_count(), 1);
    }

    #[test]
    fn listener_can_remove_itself() {
        let backend = Rc::new(RecordingRenderer::new());
        let w = window(&backend);
        let calls = Rc::new(Cell::new(0));
        let own_id = Rc::new(Cell::new(None));

        let counter = Rc::clone(&calls);
        let id_slot = Rc::clone(&own_id);
        own_id.set(Some(w.add_resize_listener(move |window, _, _| {
            counter.set(counter.get() + 1);
            if let Some(id) = id_slot.get() {
                assert!(window.remove_resize_listener(id));
            }
        })));

        w.dispatch(Event::Resized { width: 5, height: 5 });
        w.dispatch(Event::Resized { width: 6, height: 6 });

        assert_eq!(calls.get(), 1);
        assert_eq!(w.resize_listener_count(), 0);
    }

    #[test]
    fn input_events_reach_the_handler() {
        let backend = Rc::new(RecordingRenderer::new());
        let w = window(&backend);
        let input = Rc::new(RefCell::new(Input::new()));
        w.init(&FakeFactory::default(), Some(input.clone())).unwrap();

        w.dispatch(Event::Key {
            key: KeyCode::KeyW,
            state: ElementState::Pressed,
            repeat: false,
        });
        w.dispatch(Event::MouseButton {
            button: MouseButton::Left,
            state: ElementState::Pressed,
        });
        w.dispatch(Event::CursorMoved {
            position: Vec2::new(3.0, 4.0),
        });
        w.dispatch(Event::Scroll {
            delta: Vec2::new(0.0, -1.0),
        });

        let input = input.borrow();
        assert!(input.key_down(KeyCode::KeyW));
        assert!(input.mouse_pressed(MouseButton::Left));
        assert_eq!(input.mouse_position(), Vec2::new(3.0, 4.0));
        assert_eq!(input.scroll_delta(), Vec2::new(0.0, -1.0));
    }

    #[test]
    fn close_request_is_remembered() {
        let w = window(&Rc::new(RecordingRenderer::new()));
        assert!(!w.should_close());
        w.dispatch(Event::CloseRequested);
        assert!(w.should_close());
    }

    #[test]
    fn set_size_waits_for_the_platform_when_deferred() {
        let backend = Rc::new(RecordingRenderer::new());
        let factory = FakeFactory::default();
        let w = window(&backend);
        w.init(&factory, None).unwrap();

        w.set_size(1000, 500);
        assert_eq!(w.size(), (1000, 500));

        factory.state.immediate_resize.set(false);
        w.set_size(640, 480);
        assert_eq!(w.size(), (1000, 500));
    }

    #[test]
    fn title_and_fullscreen_go_through_the_surface() {
        let factory = FakeFactory::default();
        let w = window(&Rc::new(RecordingRenderer::new()));
        w.init(&factory, None).unwrap();

        w.set_title("say \"hi\"");
        w.set_fullscreen(true);

        assert_eq!(*factory.state.title.borrow(), "say \"hi\"");
        assert!(factory.state.fullscreen.get());
        assert_eq!(
            w.to_string(),
            r#"{ title: "say \"hi\"", size: 800x600, fullscreen: true, scale: 200.0% }"#
        );
    }

    #[test]
    fn destroy_tears_down_renderer_once() {
        let backend = Rc::new(RecordingRenderer::new());
        let w = window(&backend);
        w.init(&FakeFactory::default(), None).unwrap();
        w.mark_running();
        assert_eq!(w.state(), WindowState::Running);

        w.destroy();
        assert_eq!(backend.calls().last(), Some(&Call::Destroy));
    }

    #[test]
    fn destroying_an_uninitialized_window_skips_the_renderer() {
        let backend = Rc::new(RecordingRenderer::new());
        window(&backend).destroy();
        assert!(backend.calls().is_empty());
    }
}
