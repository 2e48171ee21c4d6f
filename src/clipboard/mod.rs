//! Clipboard Bridging
//!
//! Relays clipboard text between the session engine (UTF-16LE with a
//! request/response channel) and the serving engine (UTF-8 cut text).
//! [`bridge::ClipboardBridge`] owns the negotiation state; [`formats`]
//! holds the format ids and text conversions.

pub mod bridge;
pub mod error;
pub mod formats;

pub use bridge::ClipboardBridge;
pub use error::{ClipboardError, Result};
pub use formats::ClipboardFormat;
