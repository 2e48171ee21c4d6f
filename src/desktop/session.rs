//! Session Desktop Backend
//!
//! The post-login backend: bridges the live session engine to the
//! serving engine. Client input is translated and injected into the
//! session under the session lock; graphics callbacks from the session
//! engine land in the shared pixel buffer and are forwarded as damage.
//!
//! Cursor updates arriving before a serving engine attaches are buffered
//! and replayed on attach, so clients connecting mid-session start with
//! the current cursor.

use crate::clipboard::ClipboardBridge;
use crate::desktop::Desktop;
use crate::engine::{
    GraphicsSink, LayoutResult, Result, ScreenLayout, ServingEngine, SharedSession,
};
use crate::framebuffer::{CursorImage, PixelBuffer, Point, Rect, Rgb, SharedPixelBuffer};
use crate::input::keymap::ScanCode;
use crate::input::keyboard::KeyboardTranslator;
use crate::input::pointer::{ButtonMask, PointerTranslator};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Desktop backend serving a connected session.
pub struct SessionDesktop {
    session: SharedSession,
    clipboard: Arc<ClipboardBridge>,
    buffer: SharedPixelBuffer,
    server: RwLock<Option<Arc<dyn ServingEngine>>>,
    pending_cursor: Mutex<Option<CursorImage>>,
    keyboard: Mutex<KeyboardTranslator>,
    pointer: Mutex<PointerTranslator>,
    running: AtomicBool,
    bg: Rgb,
}

impl SessionDesktop {
    /// Create a backend over a connected session.
    ///
    /// The pixel buffer takes the session's dimensions; the engine paints
    /// into it via the [`GraphicsSink`] impl.
    pub fn new(
        session: SharedSession,
        clipboard: Arc<ClipboardBridge>,
        wheel_rotation: u16,
        bg: Rgb,
    ) -> Self {
        let (width, height) = session.lock().dimensions();
        Self {
            session,
            clipboard,
            buffer: PixelBuffer::new_shared(width, height, bg),
            server: RwLock::new(None),
            pending_cursor: Mutex::new(None),
            keyboard: Mutex::new(KeyboardTranslator::new()),
            pointer: Mutex::new(PointerTranslator::with_wheel_rotation(wheel_rotation)),
            running: AtomicBool::new(false),
            bg,
        }
    }

    /// The session's shared pixel buffer.
    pub fn pixel_buffer(&self) -> SharedPixelBuffer {
        self.buffer.clone()
    }

    fn layout(&self) -> ScreenLayout {
        let buffer = self.buffer.read();
        ScreenLayout {
            width: buffer.width(),
            height: buffer.height(),
        }
    }

    fn attached_server(&self) -> Option<Arc<dyn ServingEngine>> {
        self.server.read().clone()
    }
}

impl Desktop for SessionDesktop {
    fn start(&self, server: Arc<dyn ServingEngine>) -> Result<()> {
        let layout = self.layout();
        server.set_pixel_buffer(self.buffer.clone(), layout);
        server.add_changed(Rect::from_size(0, 0, layout.width, layout.height))?;

        // Replay a cursor that arrived before we had anyone to show it to
        if let Some(cursor) = self.pending_cursor.lock().take() {
            server.set_cursor(&cursor)?;
            if let Some(pos) = cursor.position {
                server.set_cursor_pos(pos)?;
            }
        }

        self.clipboard.attach_server(server.clone());
        *self.server.write() = Some(server);
        self.running.store(true, Ordering::SeqCst);
        info!(width = layout.width, height = layout.height, "session desktop started");
        Ok(())
    }

    fn stop(&self) {
        self.clipboard.detach_server();
        if let Some(server) = self.server.write().take() {
            server.clear_pixel_buffer();
        }
        self.running.store(false, Ordering::SeqCst);
    }

    fn terminate(&self) {
        info!("terminating session");
        if let Err(err) = self.session.lock().stop() {
            warn!(%err, "session engine stop failed");
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The session cannot be resized from the serving side.
    fn set_screen_layout(&self, _layout: ScreenLayout) -> LayoutResult {
        LayoutResult::Prohibited
    }

    fn pointer_event(&self, pos: Point, buttons: ButtonMask) {
        let mut session = self.session.lock();
        let mut pointer = self.pointer.lock();
        if let Err(err) = pointer.pointer_event(&mut **session, pos, buttons) {
            warn!(%err, "pointer injection failed");
        }
    }

    fn key_event(&self, keysym: u32, scancode: Option<ScanCode>, down: bool) {
        let mut session = self.session.lock();
        let mut keyboard = self.keyboard.lock();
        if let Err(err) = keyboard.key_event(&mut **session, keysym, scancode, down) {
            warn!(%err, "key injection failed");
        }
    }

    fn client_cut_text(&self, text: &str) {
        if let Err(err) = self.clipboard.handle_data(text) {
            warn!(%err, "cut text relay failed");
        }
    }

    fn handle_clipboard_request(&self) {
        if let Err(err) = self.clipboard.handle_request() {
            warn!(%err, "clipboard request relay failed");
        }
    }

    fn handle_clipboard_announce(&self, available: bool) {
        if let Err(err) = self.clipboard.handle_announce(available) {
            warn!(%err, "clipboard announce relay failed");
        }
    }

    fn handle_clipboard_data(&self, text: &str) {
        if let Err(err) = self.clipboard.handle_data(text) {
            warn!(%err, "clipboard data relay failed");
        }
    }
}

impl GraphicsSink for SessionDesktop {
    fn damage(&self, region: Rect) {
        if let Some(server) = self.attached_server() {
            if let Err(err) = server.add_changed(region) {
                warn!(%err, "failed to report session damage");
            }
        }
    }

    fn set_cursor(&self, cursor: CursorImage) {
        match self.attached_server() {
            Some(server) => {
                if let Err(err) = server.set_cursor(&cursor) {
                    warn!(%err, "failed to forward cursor image");
                }
            }
            None => *self.pending_cursor.lock() = Some(cursor),
        }
    }

    fn move_cursor(&self, pos: Point) {
        match self.attached_server() {
            Some(server) => {
                if let Err(err) = server.set_cursor_pos(pos) {
                    warn!(%err, "failed to forward cursor position");
                }
            }
            None => {
                if let Some(cursor) = self.pending_cursor.lock().as_mut() {
                    cursor.position = Some(pos);
                }
            }
        }
    }

    fn resized(&self, width: u16, height: u16) {
        info!(width, height, "session desktop resized");
        self.buffer.write().resize(width, height, self.bg);
        if let Some(server) = self.attached_server() {
            server.set_pixel_buffer(self.buffer.clone(), ScreenLayout { width, height });
            if let Err(err) = server.add_changed(Rect::from_size(0, 0, width, height)) {
                warn!(%err, "failed to repaint after resize");
            }
        }
    }

    fn bell(&self) {
        if let Some(server) = self.attached_server() {
            if let Err(err) = server.bell() {
                warn!(%err, "failed to forward bell");
            }
        }
    }
}
