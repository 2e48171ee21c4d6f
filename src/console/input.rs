//! Console Keystroke Encoding
//!
//! Turns client key events into the byte sequences a terminal reader
//! expects: control characters, CSI sequences for editing and function
//! keys, and UTF-8 for printable input. Modifier state is tracked here;
//! Ctrl+V is intercepted as a paste request instead of being encoded.

use crate::input::keymap::{self, keysym};

/// Result of translating one key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Write these bytes to the console input
    Bytes(Vec<u8>),
    /// The client asked to paste its clipboard
    PasteRequest,
    /// Nothing to send (release, lone modifier, unmapped key)
    Ignored,
}

/// Modifier tracking and keysym encoding for the console.
#[derive(Debug, Default)]
pub struct ConsoleInput {
    shift: bool,
    ctrl: bool,
    alt: bool,
}

impl ConsoleInput {
    /// Create with no modifiers held.
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate a key event. Releases only update modifier state.
    pub fn key_event(&mut self, ks: u32, down: bool) -> KeyAction {
        match ks {
            keysym::XK_SHIFT_L | keysym::XK_SHIFT_R => {
                self.shift = down;
                return KeyAction::Ignored;
            }
            keysym::XK_CONTROL_L | keysym::XK_CONTROL_R => {
                self.ctrl = down;
                return KeyAction::Ignored;
            }
            keysym::XK_ALT_L | keysym::XK_ALT_R => {
                self.alt = down;
                return KeyAction::Ignored;
            }
            _ => {}
        }
        if !down {
            return KeyAction::Ignored;
        }

        if self.ctrl {
            if ks == 0x76 || ks == 0x56 {
                return KeyAction::PasteRequest;
            }
            if let Some(byte) = control_byte(ks) {
                return KeyAction::Bytes(vec![byte]);
            }
        }

        if let Some(seq) = special_sequence(ks, self.shift) {
            return KeyAction::Bytes(seq.to_vec());
        }

        match keymap::keysym_to_char(ks) {
            Some(ch) => {
                let mut bytes = Vec::with_capacity(5);
                if self.alt {
                    bytes.push(0x1b);
                }
                let mut utf8 = [0u8; 4];
                bytes.extend_from_slice(ch.encode_utf8(&mut utf8).as_bytes());
                KeyAction::Bytes(bytes)
            }
            None => KeyAction::Ignored,
        }
    }
}

/// Control-key encoding: Ctrl+A..Z and the punctuation controls.
fn control_byte(ks: u32) -> Option<u8> {
    match ks {
        0x61..=0x7a => Some((ks - 0x60) as u8),
        0x41..=0x5a => Some((ks - 0x40) as u8),
        0x40 => Some(0x00),          // @
        0x5b..=0x5f => Some((ks - 0x40) as u8), // [ \ ] ^ _
        _ => None,
    }
}

/// Editing, navigation and function keys.
fn special_sequence(ks: u32, shift: bool) -> Option<&'static [u8]> {
    use keysym as k;
    let seq: &[u8] = match ks {
        k::XK_RETURN | k::XK_KP_ENTER => b"\r",
        k::XK_BACKSPACE => b"\x7f",
        k::XK_ESCAPE => b"\x1b",
        k::XK_TAB if shift => b"\x1b[Z",
        k::XK_TAB => b"\t",
        k::XK_UP => b"\x1b[A",
        k::XK_DOWN => b"\x1b[B",
        k::XK_RIGHT => b"\x1b[C",
        k::XK_LEFT => b"\x1b[D",
        k::XK_HOME => b"\x1b[1~",
        k::XK_INSERT => b"\x1b[2~",
        k::XK_DELETE => b"\x1b[3~",
        k::XK_END => b"\x1b[4~",
        k::XK_PAGE_UP => b"\x1b[5~",
        k::XK_PAGE_DOWN => b"\x1b[6~",
        k::XK_F1 => b"\x1bOP",
        k::XK_F2 => b"\x1bOQ",
        k::XK_F3 => b"\x1bOR",
        k::XK_F4 => b"\x1bOS",
        k::XK_F5 => b"\x1b[15~",
        k::XK_F6 => b"\x1b[17~",
        k::XK_F7 => b"\x1b[18~",
        k::XK_F8 => b"\x1b[19~",
        k::XK_F9 => b"\x1b[20~",
        k::XK_F10 => b"\x1b[21~",
        k::XK_F11 => b"\x1b[23~",
        k::XK_F12 => b"\x1b[24~",
        _ => return None,
    };
    Some(seq)
}
