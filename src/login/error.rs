//! Login errors

use thiserror::Error;

/// Result type for login operations
pub type Result<T> = std::result::Result<T, LoginError>;

/// Errors ending a login dialogue.
#[derive(Error, Debug)]
pub enum LoginError {
    /// Every permitted attempt failed authentication
    #[error("login failed after {0} attempts")]
    AttemptsExhausted(u32),

    /// The console transport broke mid-dialogue
    #[error("console transport error: {0}")]
    Io(#[from] std::io::Error),
}
