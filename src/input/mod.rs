//! Input Translation
//!
//! Converts network-client input events (keysyms, pointer button masks)
//! into the scancode, Unicode, and pointer-flag events the session engine
//! injects. The translators are stateful: keyboard state carries the
//! pressed set and the inferred CapsLock state, pointer state carries the
//! previous button mask so transitions become press/release edges.

pub mod keyboard;
pub mod keymap;
pub mod pointer;

pub use keyboard::KeyboardTranslator;
pub use keymap::{scancode_for_keysym, ScanCode};
pub use pointer::{ButtonMask, PointerFlags, PointerTranslator};
