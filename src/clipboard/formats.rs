//! Clipboard Formats and Text Conversion
//!
//! The bridge negotiates exactly two formats with the session side: a raw
//! passthrough format and Unicode text. Session text is UTF-16LE with a
//! terminating NUL; the serving side speaks UTF-8 without one. Conversion
//! strips carriage returns on the way to the serving side and appends the
//! NUL on the way back.

/// Clipboard formats exchanged with the session engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardFormat {
    /// Raw passthrough format (id 0)
    Raw,
    /// UTF-16LE text (id 13)
    UnicodeText,
}

impl ClipboardFormat {
    /// Wire format id
    pub fn id(self) -> u32 {
        match self {
            ClipboardFormat::Raw => 0,
            ClipboardFormat::UnicodeText => 13,
        }
    }

    /// Parse a wire format id; unknown ids are unsupported.
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(ClipboardFormat::Raw),
            13 => Some(ClipboardFormat::UnicodeText),
            _ => None,
        }
    }
}

/// Decode UTF-16LE clipboard text to a UTF-8 string.
///
/// Decoding stops at the first NUL. Carriage returns are stripped so the
/// result uses bare line feeds. Unpaired surrogates become U+FFFD.
pub fn decode_utf16le_text(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();

    char::decode_utf16(units.into_iter())
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .filter(|&ch| ch != '\r')
        .collect()
}

/// Encode UTF-8 text as NUL-terminated UTF-16LE clipboard data.
pub fn encode_utf16le_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity((text.len() + 1) * 2);
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out.extend_from_slice(&[0, 0]);
    out
}
