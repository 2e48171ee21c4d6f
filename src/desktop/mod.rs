//! Desktop Backends
//!
//! A *desktop backend* is whatever currently fills the pixel buffer and
//! consumes client input: the login console before authentication, the
//! live session afterwards. [`DesktopSwitch`] is the hot-swap point the
//! serving engine is registered against; the active backend can be
//! replaced mid-connection without the serving engine noticing.

pub mod session;

use crate::engine::{LayoutResult, Result, ScreenLayout, ServingEngine};
use crate::framebuffer::Point;
use crate::input::keymap::ScanCode;
use crate::input::pointer::ButtonMask;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Surface a desktop backend presents to the serving engine.
///
/// All methods take `&self`: backends are shared across the serving and
/// pump threads and guard their own state internally.
pub trait Desktop: Send + Sync {
    /// A serving engine attached; publish the pixel buffer and start
    /// producing output.
    fn start(&self, server: Arc<dyn ServingEngine>) -> Result<()>;

    /// The serving engine detached; stop producing output.
    fn stop(&self);

    /// Tear the backend down for good (session disconnect, shutdown).
    fn terminate(&self);

    /// True between `start` and `stop`.
    fn is_running(&self) -> bool;

    /// Whether a new incoming client connection should be accepted.
    fn query_connection(&self) -> bool {
        true
    }

    /// A client asked to change the screen layout.
    fn set_screen_layout(&self, layout: ScreenLayout) -> LayoutResult;

    /// Pointer state report from a client.
    fn pointer_event(&self, pos: Point, buttons: ButtonMask);

    /// Key event from a client; `scancode` is present when the client
    /// supplied a hardware code.
    fn key_event(&self, keysym: u32, scancode: Option<ScanCode>, down: bool);

    /// Legacy cut-text from a client (already decoded to UTF-8).
    fn client_cut_text(&self, text: &str);

    /// A client asked for our clipboard contents.
    fn handle_clipboard_request(&self);

    /// A client announced whether it holds clipboard contents.
    fn handle_clipboard_announce(&self, available: bool);

    /// A client delivered its clipboard text.
    fn handle_clipboard_data(&self, text: &str);
}

/// Hot-swappable indirection between the serving engine and the active
/// backend.
///
/// The serving engine holds the switch for the lifetime of the listener;
/// [`DesktopSwitch::swap`] retargets every subsequent event. Events
/// arriving while no backend is active are dropped (layout requests are
/// refused).
#[derive(Default)]
pub struct DesktopSwitch {
    active: Mutex<Option<Arc<dyn Desktop>>>,
    server: Mutex<Option<Arc<dyn ServingEngine>>>,
}

impl DesktopSwitch {
    /// Create a switch with no active backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a switch with an initial backend.
    pub fn with_desktop(desktop: Arc<dyn Desktop>) -> Self {
        Self {
            active: Mutex::new(Some(desktop)),
            server: Mutex::new(None),
        }
    }

    /// Replace the active backend, returning the previous one.
    ///
    /// If a serving engine is attached, the old backend is stopped and
    /// the new one started against it, so clients see a seamless
    /// hand-over.
    pub fn swap(&self, next: Option<Arc<dyn Desktop>>) -> Result<Option<Arc<dyn Desktop>>> {
        let server = self.server.lock().clone();
        let mut active = self.active.lock();
        let previous = active.take();

        if let (Some(prev), Some(_)) = (&previous, &server) {
            prev.stop();
        }
        if let (Some(next), Some(server)) = (&next, server) {
            info!("switching active desktop backend");
            next.start(server)?;
        }
        *active = next;
        Ok(previous)
    }

    fn active(&self) -> Option<Arc<dyn Desktop>> {
        self.active.lock().clone()
    }
}

impl Desktop for DesktopSwitch {
    fn start(&self, server: Arc<dyn ServingEngine>) -> Result<()> {
        *self.server.lock() = Some(server.clone());
        match self.active() {
            Some(desktop) => desktop.start(server),
            None => Ok(()),
        }
    }

    fn stop(&self) {
        if let Some(desktop) = self.active() {
            desktop.stop();
        }
        *self.server.lock() = None;
    }

    fn terminate(&self) {
        if let Some(desktop) = self.active() {
            desktop.terminate();
        }
    }

    fn is_running(&self) -> bool {
        self.active().map_or(false, |d| d.is_running())
    }

    fn query_connection(&self) -> bool {
        self.active().map_or(true, |d| d.query_connection())
    }

    fn set_screen_layout(&self, layout: ScreenLayout) -> LayoutResult {
        match self.active() {
            Some(desktop) => desktop.set_screen_layout(layout),
            None => LayoutResult::Prohibited,
        }
    }

    fn pointer_event(&self, pos: Point, buttons: ButtonMask) {
        if let Some(desktop) = self.active() {
            desktop.pointer_event(pos, buttons);
        }
    }

    fn key_event(&self, keysym: u32, scancode: Option<ScanCode>, down: bool) {
        if let Some(desktop) = self.active() {
            desktop.key_event(keysym, scancode, down);
        }
    }

    fn client_cut_text(&self, text: &str) {
        if let Some(desktop) = self.active() {
            desktop.client_cut_text(text);
        }
    }

    fn handle_clipboard_request(&self) {
        if let Some(desktop) = self.active() {
            desktop.handle_clipboard_request();
        }
    }

    fn handle_clipboard_announce(&self, available: bool) {
        if let Some(desktop) = self.active() {
            desktop.handle_clipboard_announce(available);
        }
    }

    fn handle_clipboard_data(&self, text: &str) {
        if let Some(desktop) = self.active() {
            desktop.handle_clipboard_data(text);
        }
    }
}
