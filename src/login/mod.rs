//! Interactive Login
//!
//! The console-side login dialogue: a line editor for prompt input and a
//! greeter that gathers credentials and drives the connect attempt loop.

pub mod editor;
pub mod error;
pub mod greeter;

pub use editor::{EchoMode, LineEditor};
pub use error::{LoginError, Result};
pub use greeter::{parse_resolution, Credentials, Greeter, Resolution, DEFAULT_MAX_ATTEMPTS};
