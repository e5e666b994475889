use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Window events the engine reacts to, already stripped of platform detail.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// New inner size in physical pixels. Either side may be 0 (minimized).
    Resized { width: u32, height: u32 },
    Key {
        key: KeyCode,
        state: ElementState,
        repeat: bool,
    },
    MouseButton {
        button: MouseButton,
        state: ElementState,
    },
    /// Scroll amount in lines.
    Scroll { delta: Vec2 },
    /// Cursor position in physical pixels from the top-left corner.
    CursorMoved { position: Vec2 },
    ScaleFactorChanged { scale: f64 },
    CloseRequested,
    RedrawRequested,
}

/// Pixels per scroll line when a device reports pixel deltas.
const PIXELS_PER_LINE: f32 = 120.0;

impl Event {
    /// Translates a winit window event.
    ///
    /// Returns `None` for events the engine ignores and for keys winit
    /// couldn't identify.
    pub fn from_winit(event: &WindowEvent) -> Option<Event> {
        match event {
            WindowEvent::Resized(size) => Some(Event::Resized {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
                PhysicalKey::Code(key) => Some(Event::Key {
                    key,
                    state: event.state,
                    repeat: event.repeat,
                }),
                PhysicalKey::Unidentified(_) => None,
            },
            WindowEvent::MouseInput { state, button, .. } => Some(Event::MouseButton {
                button: *button,
                state: *state,
            }),
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    MouseScrollDelta::PixelDelta(pos) => {
                        Vec2::new(pos.x as f32, pos.y as f32) / PIXELS_PER_LINE
                    }
                };
                Some(Event::Scroll { delta })
            }
            WindowEvent::CursorMoved { position, .. } => Some(Event::CursorMoved {
                position: Vec2::new(position.x as f32, position.y as f32),
            }),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                Some(Event::ScaleFactorChanged {
                    scale: *scale_factor,
                })
            }
            WindowEvent::CloseRequested => Some(Event::CloseRequested),
            WindowEvent::RedrawRequested => Some(Event::RedrawRequested),
            _ => None,
        }
    }
}
