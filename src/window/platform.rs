use std::sync::atomic::{AtomicBool, Ordering};

use winit::application::ApplicationHandler;
use winit::event_loop::EventLoop;

use crate::error::WindowError;

static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Claim on the process-wide windowing slot. Released on drop.
#[derive(Debug)]
struct PlatformGuard(());

impl PlatformGuard {
    fn acquire() -> Result<Self, WindowError> {
        ACTIVE
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| PlatformGuard(()))
            .map_err(|_| WindowError::PlatformAlreadyInitialized)
    }
}

impl Drop for PlatformGuard {
    fn drop(&mut self) {
        ACTIVE.store(false, Ordering::Release);
    }
}

/// The windowing system for this process.
///
/// Only one may be alive at a time; it owns the event loop every window is
/// created from. Create it on the main thread before any window.
pub struct Platform {
    event_loop: EventLoop<()>,
    _guard: PlatformGuard,
}

impl Platform {
    pub fn new() -> Result<Self, WindowError> {
        let guard = PlatformGuard::acquire()?;
        let event_loop = EventLoop::new()?;
        log::debug!("Windowing platform initialized");
        Ok(Self {
            event_loop,
            _guard: guard,
        })
    }

    /// Runs the event loop until the application exits.
    pub fn run<A: ApplicationHandler>(self, app: &mut A) -> Result<(), WindowError> {
        let Platform { event_loop, _guard } = self;
        event_loop.run_app(app)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_fails_until_first_is_dropped() {
        let first = PlatformGuard::acquire().unwrap();
        assert!(matches!(
            PlatformGuard::acquire(),
            Err(WindowError::PlatformAlreadyInitialized)
        ));
        drop(first);
        let again = PlatformGuard::acquire();
        assert!(again.is_ok());
    }
}
