//! Prompt Line Editor
//!
//! Reads one line at a time from a terminal-like byte stream, echoing as
//! it goes. Supports mid-line editing with backspace, delete, and the
//! left/right cursor keys; everything else that looks like a CSI sequence
//! is consumed silently. Masked mode echoes asterisks for password
//! prompts.

use std::io::{self, Read, Write};

/// How typed characters are echoed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoMode {
    /// Echo the character itself
    Plain,
    /// Echo an asterisk per character
    Masked,
}

/// A line editor over a byte stream pair.
#[derive(Debug)]
pub struct LineEditor<R, W> {
    reader: R,
    writer: W,
}

impl<R: Read, W: Write> LineEditor<R, W> {
    /// Wrap a reader/writer pair.
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Write text followed by a CRLF.
    pub fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes())?;
        self.writer.write_all(b"\r\n")?;
        self.writer.flush()
    }

    /// Prompt and read one line, editing in place until Enter.
    ///
    /// Returns the line without its terminator. An end-of-stream before
    /// Enter is an error: a half-entered line must not be treated as
    /// submitted.
    pub fn read_line(&mut self, prompt: &str, mode: EchoMode) -> io::Result<String> {
        self.writer.write_all(prompt.as_bytes())?;
        self.writer.flush()?;

        let mut line: Vec<char> = Vec::new();
        let mut cursor = 0usize;

        loop {
            match self.read_key()? {
                Key::Enter => {
                    self.writer.write_all(b"\r\n")?;
                    self.writer.flush()?;
                    return Ok(line.into_iter().collect());
                }
                Key::Backspace => {
                    if cursor == 0 {
                        continue;
                    }
                    cursor -= 1;
                    line.remove(cursor);
                    if cursor == line.len() {
                        self.writer.write_all(b"\x08 \x08")?;
                    } else {
                        self.writer.write_all(b"\x08\x1b[K")?;
                        self.echo_tail(&line, cursor, mode)?;
                    }
                    self.writer.flush()?;
                }
                Key::Delete => {
                    if cursor == line.len() {
                        continue;
                    }
                    line.remove(cursor);
                    self.writer.write_all(b"\x1b[K")?;
                    self.echo_tail(&line, cursor, mode)?;
                    self.writer.flush()?;
                }
                Key::Left => {
                    if cursor > 0 {
                        cursor -= 1;
                        self.writer.write_all(b"\x1b[D")?;
                        self.writer.flush()?;
                    }
                }
                Key::Right => {
                    if cursor < line.len() {
                        cursor += 1;
                        self.writer.write_all(b"\x1b[C")?;
                        self.writer.flush()?;
                    }
                }
                Key::Char(ch) => {
                    line.insert(cursor, ch);
                    self.echo_char(ch, mode)?;
                    cursor += 1;
                    if cursor < line.len() {
                        self.echo_tail(&line, cursor, mode)?;
                    }
                    self.writer.flush()?;
                }
                Key::Other => {}
            }
        }
    }

    fn echo_char(&mut self, ch: char, mode: EchoMode) -> io::Result<()> {
        match mode {
            EchoMode::Plain => {
                let mut utf8 = [0u8; 4];
                self.writer.write_all(ch.encode_utf8(&mut utf8).as_bytes())
            }
            EchoMode::Masked => self.writer.write_all(b"*"),
        }
    }

    /// Repaint everything after the cursor and move back onto it.
    fn echo_tail(&mut self, line: &[char], cursor: usize, mode: EchoMode) -> io::Result<()> {
        for &ch in &line[cursor..] {
            self.echo_char(ch, mode)?;
        }
        let back = line.len() - cursor;
        if back > 0 {
            write!(self.writer, "\x1b[{}D", back)?;
        }
        Ok(())
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        match self.reader.read(&mut byte)? {
            0 => Err(io::Error::from(io::ErrorKind::UnexpectedEof)),
            _ => Ok(byte[0]),
        }
    }

    fn read_key(&mut self) -> io::Result<Key> {
        let byte = self.read_byte()?;
        let key = match byte {
            b'\r' | b'\n' => Key::Enter,
            0x08 | 0x7f => Key::Backspace,
            0x1b => return self.read_escape(),
            0x00..=0x1f => Key::Other,
            _ => Key::Char(self.read_utf8(byte)?),
        };
        Ok(key)
    }

    /// Consume an escape sequence, recognizing cursor keys and delete.
    fn read_escape(&mut self) -> io::Result<Key> {
        if self.read_byte()? != b'[' {
            // A lone ESC or an unrecognized introducer: swallow it
            return Ok(Key::Other);
        }
        let mut params = Vec::new();
        loop {
            let byte = self.read_byte()?;
            if (0x40..=0x7e).contains(&byte) {
                return Ok(match (byte, params.as_slice()) {
                    (b'C', _) => Key::Right,
                    (b'D', _) => Key::Left,
                    (b'~', b"3") => Key::Delete,
                    _ => Key::Other,
                });
            }
            params.push(byte);
        }
    }

    /// Finish reading a UTF-8 character whose first byte was consumed.
    fn read_utf8(&mut self, first: u8) -> io::Result<char> {
        let len = match first {
            0x00..=0x7f => 1,
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            _ => 4,
        };
        let mut bytes = vec![first];
        for _ in 1..len {
            bytes.push(self.read_byte()?);
        }
        Ok(std::str::from_utf8(&bytes)
            .ok()
            .and_then(|s| s.chars().next())
            .unwrap_or(char::REPLACEMENT_CHARACTER))
    }
}

#[derive(Debug)]
enum Key {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Left,
    Right,
    Other,
}
