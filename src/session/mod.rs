//! Session Event Pump
//!
//! Drives the session engine's protocol events on a dedicated thread.
//! The engine is polled under the session lock and the lock is released
//! between polls so the serving thread can inject input.

use crate::engine::SharedSession;
use anyhow::Context;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info};

/// Pause between polls while the engine reports no pending events.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Pump session events until the engine disconnects or `cancel` is set.
pub fn pump_events(session: &SharedSession, cancel: &AtomicBool) -> anyhow::Result<()> {
    info!("session event pump started");
    loop {
        if cancel.load(Ordering::SeqCst) {
            debug!("session event pump cancelled");
            return Ok(());
        }
        {
            let mut engine = session.lock();
            if !engine
                .process_events()
                .context("session event processing failed")?
            {
                info!("session disconnected");
                return Ok(());
            }
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Run the event pump on its own thread.
pub fn spawn_pump(
    session: SharedSession,
    cancel: Arc<AtomicBool>,
) -> JoinHandle<anyhow::Result<()>> {
    thread::Builder::new()
        .name("session-pump".into())
        .spawn(move || pump_events(&session, &cancel))
        .expect("spawning session pump thread")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Result as EngineResult, SessionEngine, SessionInput};
    use crate::framebuffer::Point;
    use crate::input::keymap::ScanCode;
    use crate::input::pointer::PointerFlags;
    use parking_lot::Mutex;

    struct FiniteSession {
        remaining: usize,
    }

    impl SessionInput for FiniteSession {
        fn send_scancode(&mut self, _code: ScanCode, _down: bool) -> EngineResult<()> {
            Ok(())
        }
        fn send_unicode(&mut self, _ch: char, _down: bool) -> EngineResult<()> {
            Ok(())
        }
        fn send_synchronize(&mut self, _caps_lock: bool) -> EngineResult<()> {
            Ok(())
        }
        fn send_pause(&mut self) -> EngineResult<()> {
            Ok(())
        }
        fn send_mouse(&mut self, _flags: PointerFlags, _pos: Point) -> EngineResult<()> {
            Ok(())
        }
    }

    impl SessionEngine for FiniteSession {
        fn start(&mut self) -> EngineResult<()> {
            Ok(())
        }
        fn stop(&mut self) -> EngineResult<()> {
            Ok(())
        }
        fn wait_connect(&mut self) -> EngineResult<()> {
            Ok(())
        }
        fn process_events(&mut self) -> EngineResult<bool> {
            self.remaining = self.remaining.saturating_sub(1);
            Ok(self.remaining > 0)
        }
        fn dimensions(&self) -> (u16, u16) {
            (640, 480)
        }
    }

    #[test]
    fn test_pump_exits_on_disconnect() {
        let session: SharedSession = Arc::new(Mutex::new(
            Box::new(FiniteSession { remaining: 3 }) as Box<dyn SessionEngine>,
        ));
        let cancel = AtomicBool::new(false);
        pump_events(&session, &cancel).unwrap();
    }

    #[test]
    fn test_pump_exits_on_cancel() {
        let session: SharedSession = Arc::new(Mutex::new(
            Box::new(FiniteSession { remaining: usize::MAX }) as Box<dyn SessionEngine>,
        ));
        let cancel = AtomicBool::new(true);
        pump_events(&session, &cancel).unwrap();
    }
}
