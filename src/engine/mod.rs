//! Collaborator Engine Interfaces
//!
//! The two protocol engines this crate bridges are external collaborators:
//! an RDP client engine (the *session engine*, producing the live desktop
//! and accepting input injection) and a VNC server engine (the *serving
//! engine*, exposing a pixel buffer and accepting network clients). Their
//! connection, encoding, and transport internals are out of scope here;
//! this module defines the capability traits through which they are
//! consumed. A bridge type implements or holds a trait object, registered
//! once, instead of callback functions recovering `self` from a context
//! pointer.

use crate::clipboard::formats::ClipboardFormat;
use crate::framebuffer::{CursorImage, Point, Rect, SharedPixelBuffer};
use crate::input::keymap::ScanCode;
use crate::input::pointer::PointerFlags;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors crossing the boundary to a collaborator engine.
///
/// Engines signal failure through values, never panics or exceptions;
/// callers decide whether a failure is fatal (login transport) or
/// absorbed (clipboard, damage notification).
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine's transport is gone
    #[error("engine disconnected")]
    Disconnected,

    /// A send into the engine failed
    #[error("engine transport error: {0}")]
    Transport(String),

    /// The virtual channel carrying the operation is not connected
    #[error("channel not connected: {0}")]
    ChannelNotConnected(&'static str),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of a screen layout negotiation request from a network client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutResult {
    /// Layout change accepted
    Accepted,
    /// Layout change rejected; the framebuffer keeps its dimensions
    Prohibited,
}

/// A single-screen layout published together with the pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    /// Framebuffer width in pixels
    pub width: u16,
    /// Framebuffer height in pixels
    pub height: u16,
}

/// Input injection into the session engine.
///
/// Mirrors the injection surface of an RDP input channel: scancodes,
/// Unicode character events, toggle-key synchronization, and pointer
/// flag words.
pub trait SessionInput: Send {
    /// Send a keyboard scancode down/up event
    fn send_scancode(&mut self, code: ScanCode, down: bool) -> Result<()>;

    /// Send a Unicode character input event
    fn send_unicode(&mut self, ch: char, down: bool) -> Result<()>;

    /// Set the remote toggle-key state directly (reliable only once per
    /// session; see the CapsLock inference in [`crate::input::keyboard`])
    fn send_synchronize(&mut self, caps_lock: bool) -> Result<()>;

    /// Send the pause key (used between a virtual CapsLock press and
    /// release)
    fn send_pause(&mut self) -> Result<()>;

    /// Send a pointer event with the given flag word at a position
    fn send_mouse(&mut self, flags: PointerFlags, pos: Point) -> Result<()>;
}

/// Lifecycle and event-dispatch surface of the session engine.
pub trait SessionEngine: SessionInput {
    /// Start the engine (spawns its transport)
    fn start(&mut self) -> Result<()>;

    /// Disconnect and stop the engine
    fn stop(&mut self) -> Result<()>;

    /// Block until the connection is established or fails
    fn wait_connect(&mut self) -> Result<()>;

    /// Pump pending protocol events. Returns `false` once the engine has
    /// disconnected and the pump should exit.
    fn process_events(&mut self) -> Result<bool>;

    /// Current remote desktop dimensions
    fn dimensions(&self) -> (u16, u16);
}

/// The session engine handle shared between the event pump thread and the
/// serving thread. The mutex is the session-wide lock: both threads hold
/// it while touching session state.
pub type SharedSession = Arc<Mutex<Box<dyn SessionEngine>>>;

/// Clipboard virtual-channel surface of the session engine (client side).
pub trait ClipboardChannel: Send + Sync {
    /// Advertise client capabilities (long format names)
    fn send_capabilities(&self) -> Result<()>;

    /// Send the client format list
    fn send_format_list(&self, formats: &[ClipboardFormat]) -> Result<()>;

    /// Acknowledge a server format list
    fn send_format_list_response(&self, ok: bool) -> Result<()>;

    /// Request clipboard data in the given format from the server
    fn send_data_request(&self, format: ClipboardFormat) -> Result<()>;

    /// Answer an outstanding server data request; `None` is a failure
    /// response with no payload
    fn send_data_response(&self, data: Option<&[u8]>) -> Result<()>;
}

/// Serving engine surface consumed by desktop backends.
///
/// Socket accept/remove and connection multiplexing stay inside the
/// engine; backends only publish pixels, cursors, the bell, and the
/// clipboard surface exposed to network clients.
pub trait ServingEngine: Send + Sync {
    /// Publish a pixel buffer and its screen layout
    fn set_pixel_buffer(&self, buffer: SharedPixelBuffer, layout: ScreenLayout);

    /// Detach the current pixel buffer
    fn clear_pixel_buffer(&self);

    /// Declare a region of the pixel buffer changed
    fn add_changed(&self, region: Rect) -> Result<()>;

    /// Set the cursor image shown to clients
    fn set_cursor(&self, cursor: &CursorImage) -> Result<()>;

    /// Move the cursor
    fn set_cursor_pos(&self, pos: Point) -> Result<()>;

    /// Ring the client bell
    fn bell(&self) -> Result<()>;

    /// Announce clipboard availability to clients
    fn announce_clipboard(&self, available: bool) -> Result<()>;

    /// Ask the client for its clipboard contents
    fn request_clipboard(&self) -> Result<()>;

    /// Deliver clipboard text to the client
    fn send_clipboard_data(&self, text: &str) -> Result<()>;
}

/// Graphics and notification callbacks pushed by the session engine into
/// the active backend.
pub trait GraphicsSink: Send + Sync {
    /// A region of the session framebuffer changed
    fn damage(&self, region: Rect);

    /// The session cursor image changed
    fn set_cursor(&self, cursor: CursorImage);

    /// The session cursor moved
    fn move_cursor(&self, pos: Point);

    /// The remote desktop was resized
    fn resized(&self, width: u16, height: u16);

    /// The session rang the bell
    fn bell(&self);
}
