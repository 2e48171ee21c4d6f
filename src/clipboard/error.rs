//! Clipboard bridge errors

use crate::engine::EngineError;
use thiserror::Error;

/// Result type for clipboard operations
pub type Result<T> = std::result::Result<T, ClipboardError>;

/// Errors from the clipboard bridge.
#[derive(Error, Debug)]
pub enum ClipboardError {
    /// A send on the session clipboard channel failed
    #[error("clipboard channel error: {0}")]
    Channel(#[from] EngineError),
}
