//! Keysym Tables
//!
//! X11 keysym constants and the static keysym → scancode table used by
//! the advanced keyboard path (clients that cannot supply a hardware
//! code). Scancodes are PC/AT set 1 make codes; keys from the extended
//! block carry the extended flag.
//!
//! Lowercase letters are mapped, uppercase deliberately are not: an
//! uppercase keysym must flow through the combined-modifier remap or the
//! Unicode fallback in [`crate::input::keyboard`].

/// X11 keysym constants used by the translators.
pub mod keysym {
    #![allow(missing_docs)]

    pub const XK_BACKSPACE: u32 = 0xff08;
    pub const XK_TAB: u32 = 0xff09;
    pub const XK_RETURN: u32 = 0xff0d;
    pub const XK_PAUSE: u32 = 0xff13;
    pub const XK_ESCAPE: u32 = 0xff1b;
    pub const XK_HOME: u32 = 0xff50;
    pub const XK_LEFT: u32 = 0xff51;
    pub const XK_UP: u32 = 0xff52;
    pub const XK_RIGHT: u32 = 0xff53;
    pub const XK_DOWN: u32 = 0xff54;
    pub const XK_PAGE_UP: u32 = 0xff55;
    pub const XK_PAGE_DOWN: u32 = 0xff56;
    pub const XK_END: u32 = 0xff57;
    pub const XK_INSERT: u32 = 0xff63;
    pub const XK_KP_ENTER: u32 = 0xff8d;
    pub const XK_F1: u32 = 0xffbe;
    pub const XK_F2: u32 = 0xffbf;
    pub const XK_F3: u32 = 0xffc0;
    pub const XK_F4: u32 = 0xffc1;
    pub const XK_F5: u32 = 0xffc2;
    pub const XK_F6: u32 = 0xffc3;
    pub const XK_F7: u32 = 0xffc4;
    pub const XK_F8: u32 = 0xffc5;
    pub const XK_F9: u32 = 0xffc6;
    pub const XK_F10: u32 = 0xffc7;
    pub const XK_F11: u32 = 0xffc8;
    pub const XK_F12: u32 = 0xffc9;
    pub const XK_SHIFT_L: u32 = 0xffe1;
    pub const XK_SHIFT_R: u32 = 0xffe2;
    pub const XK_CONTROL_L: u32 = 0xffe3;
    pub const XK_CONTROL_R: u32 = 0xffe4;
    pub const XK_CAPS_LOCK: u32 = 0xffe5;
    pub const XK_ALT_L: u32 = 0xffe9;
    pub const XK_ALT_R: u32 = 0xffea;
    pub const XK_SUPER_L: u32 = 0xffeb;
    pub const XK_SUPER_R: u32 = 0xffec;
    pub const XK_DELETE: u32 = 0xffff;

    /// Keysyms above this carry a Unicode code point in the low bits.
    pub const UNICODE_OFFSET: u32 = 0x0100_0000;
}

/// A PC/AT set-1 scancode, with the extended (0xE0 prefix) flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanCode {
    /// Set-1 make code
    pub code: u8,
    /// True for keys from the extended block
    pub extended: bool,
}

impl ScanCode {
    /// Plain (non-extended) scancode
    pub const fn new(code: u8) -> Self {
        Self {
            code,
            extended: false,
        }
    }

    /// Extended (0xE0-prefixed) scancode
    pub const fn ext(code: u8) -> Self {
        Self {
            code,
            extended: true,
        }
    }
}

/// The CapsLock key, used for virtual press/release when the lock state
/// can no longer be set directly.
pub const SCANCODE_CAPSLOCK: ScanCode = ScanCode::new(0x3a);

/// Look up the target scancode for a keysym, if one is statically mapped.
pub fn scancode_for_keysym(keysym: u32) -> Option<ScanCode> {
    use self::keysym as ks;
    let code = match keysym {
        // Letters (lowercase only; see module docs)
        0x61 => ScanCode::new(0x1e), // a
        0x62 => ScanCode::new(0x30), // b
        0x63 => ScanCode::new(0x2e), // c
        0x64 => ScanCode::new(0x20), // d
        0x65 => ScanCode::new(0x12), // e
        0x66 => ScanCode::new(0x21), // f
        0x67 => ScanCode::new(0x22), // g
        0x68 => ScanCode::new(0x23), // h
        0x69 => ScanCode::new(0x17), // i
        0x6a => ScanCode::new(0x24), // j
        0x6b => ScanCode::new(0x25), // k
        0x6c => ScanCode::new(0x26), // l
        0x6d => ScanCode::new(0x32), // m
        0x6e => ScanCode::new(0x31), // n
        0x6f => ScanCode::new(0x18), // o
        0x70 => ScanCode::new(0x19), // p
        0x71 => ScanCode::new(0x10), // q
        0x72 => ScanCode::new(0x13), // r
        0x73 => ScanCode::new(0x1f), // s
        0x74 => ScanCode::new(0x14), // t
        0x75 => ScanCode::new(0x16), // u
        0x76 => ScanCode::new(0x2f), // v
        0x77 => ScanCode::new(0x11), // w
        0x78 => ScanCode::new(0x2d), // x
        0x79 => ScanCode::new(0x15), // y
        0x7a => ScanCode::new(0x2c), // z

        // Digit row
        0x31 => ScanCode::new(0x02), // 1
        0x32 => ScanCode::new(0x03),
        0x33 => ScanCode::new(0x04),
        0x34 => ScanCode::new(0x05),
        0x35 => ScanCode::new(0x06),
        0x36 => ScanCode::new(0x07),
        0x37 => ScanCode::new(0x08),
        0x38 => ScanCode::new(0x09),
        0x39 => ScanCode::new(0x0a), // 9
        0x30 => ScanCode::new(0x0b), // 0

        0x20 => ScanCode::new(0x39), // space

        ks::XK_ESCAPE => ScanCode::new(0x01),
        ks::XK_BACKSPACE => ScanCode::new(0x0e),
        ks::XK_TAB => ScanCode::new(0x0f),
        ks::XK_RETURN => ScanCode::new(0x1c),
        ks::XK_KP_ENTER => ScanCode::ext(0x1c),
        ks::XK_CAPS_LOCK => SCANCODE_CAPSLOCK,

        ks::XK_SHIFT_L => ScanCode::new(0x2a),
        ks::XK_SHIFT_R => ScanCode::new(0x36),
        ks::XK_CONTROL_L => ScanCode::new(0x1d),
        ks::XK_CONTROL_R => ScanCode::ext(0x1d),
        ks::XK_ALT_L => ScanCode::new(0x38),
        ks::XK_ALT_R => ScanCode::ext(0x38),
        ks::XK_SUPER_L => ScanCode::ext(0x5b),
        ks::XK_SUPER_R => ScanCode::ext(0x5c),

        ks::XK_F1 => ScanCode::new(0x3b),
        ks::XK_F2 => ScanCode::new(0x3c),
        ks::XK_F3 => ScanCode::new(0x3d),
        ks::XK_F4 => ScanCode::new(0x3e),
        ks::XK_F5 => ScanCode::new(0x3f),
        ks::XK_F6 => ScanCode::new(0x40),
        ks::XK_F7 => ScanCode::new(0x41),
        ks::XK_F8 => ScanCode::new(0x42),
        ks::XK_F9 => ScanCode::new(0x43),
        ks::XK_F10 => ScanCode::new(0x44),
        ks::XK_F11 => ScanCode::new(0x57),
        ks::XK_F12 => ScanCode::new(0x58),

        ks::XK_HOME => ScanCode::ext(0x47),
        ks::XK_UP => ScanCode::ext(0x48),
        ks::XK_PAGE_UP => ScanCode::ext(0x49),
        ks::XK_LEFT => ScanCode::ext(0x4b),
        ks::XK_RIGHT => ScanCode::ext(0x4d),
        ks::XK_END => ScanCode::ext(0x4f),
        ks::XK_DOWN => ScanCode::ext(0x50),
        ks::XK_PAGE_DOWN => ScanCode::ext(0x51),
        ks::XK_INSERT => ScanCode::ext(0x52),
        ks::XK_DELETE => ScanCode::ext(0x53),

        _ => return None,
    };
    Some(code)
}

/// Convert a keysym to the Unicode character it carries, if any.
///
/// Latin-1 keysyms map directly; keysyms in the Unicode block carry the
/// code point in their low 24 bits. Function and modifier keysyms have no
/// character.
pub fn keysym_to_char(keysym: u32) -> Option<char> {
    match keysym {
        0x20..=0x7e | 0xa0..=0xff => char::from_u32(keysym),
        ks if ks & keysym::UNICODE_OFFSET != 0 => char::from_u32(ks & 0x00ff_ffff),
        _ => None,
    }
}
