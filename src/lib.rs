//! # rdp2vnc
//!
//! Bridges an RDP client engine to a VNC server engine: network clients
//! connect to the serving side and drive a remote session on the other.
//! Before a session exists they land on a rendered terminal console where
//! a greeter collects credentials; once the session connects, the desktop
//! backend is hot-swapped underneath them.
//!
//! # Architecture
//!
//! ```text
//! rdp2vnc
//!   ├─> Desktop Switch (hot-swappable backend indirection)
//!   │     ├─> Terminal Console (login prompt, glyph rendering)
//!   │     └─> Session Desktop (live session bridging)
//!   ├─> Input Translators (keysym → scancode/unicode, mask → pointer flags)
//!   ├─> Clipboard Bridge (UTF-16LE ↔ UTF-8, format negotiation)
//!   └─> Session Pump (engine event polling thread)
//! ```
//!
//! # Data Flow
//!
//! **Pixels:** session engine → shared pixel buffer → serving engine → client
//!
//! **Input:** client → serving engine → active desktop → translators → session engine
//!
//! **Clipboard:** client ↔ serving engine ↔ clipboard bridge ↔ session channel

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Configuration loading and validation
pub mod config;

/// Clipboard bridging between the engines
pub mod clipboard;

/// Terminal login console backend
pub mod console;

/// Desktop backends and the hot-swap switch
pub mod desktop;

/// Collaborator engine traits and errors
pub mod engine;

/// Shared pixel buffer primitives
pub mod framebuffer;

/// Keyboard and pointer translation
pub mod input;

/// Interactive login dialogue
pub mod login;

/// Session engine event pump
pub mod session;
