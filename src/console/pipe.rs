//! In-Process Byte Pipes
//!
//! Unidirectional byte streams between the console threads: the greeter
//! thread reads keystrokes and writes prompt output through `Read`/`Write`
//! handles, while the console feeds keystrokes in and drains output
//! without blocking its render loop.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use std::io::{self, Read, Write};

/// Create a connected pipe. Bytes written to the writer come out of the
/// reader in order.
pub fn byte_pipe() -> (PipeWriter, PipeReader) {
    let (tx, rx) = unbounded();
    (
        PipeWriter { tx },
        PipeReader {
            rx,
            pending: Vec::new(),
            closed: false,
        },
    )
}

/// Writing end of a byte pipe.
#[derive(Debug, Clone)]
pub struct PipeWriter {
    tx: Sender<Vec<u8>>,
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx
            .send(buf.to_vec())
            .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Reading end of a byte pipe.
#[derive(Debug)]
pub struct PipeReader {
    rx: Receiver<Vec<u8>>,
    pending: Vec<u8>,
    closed: bool,
}

impl PipeReader {
    /// Drain whatever is immediately available into `buf`, without
    /// blocking. Returns the number of bytes appended; zero means the
    /// pipe is currently empty (or closed and drained).
    pub fn try_read(&mut self, buf: &mut Vec<u8>) -> usize {
        let before = buf.len();
        buf.append(&mut self.pending);
        loop {
            match self.rx.try_recv() {
                Ok(chunk) => buf.extend_from_slice(&chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }
        buf.len() - before
    }

    /// True once every writer is dropped and the pipe is drained.
    /// Only meaningful after a `try_read` observed the disconnect.
    pub fn is_closed(&self) -> bool {
        self.closed && self.pending.is_empty()
    }
}

impl Read for PipeReader {
    /// Blocking read. Returns `Ok(0)` only after every writer is dropped
    /// and the pipe is drained.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pending.is_empty() {
            match self.rx.recv() {
                Ok(chunk) => self.pending = chunk,
                Err(_) => return Ok(0),
            }
        }
        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let (mut w, mut r) = byte_pipe();
        w.write_all(b"hello").unwrap();
        let mut buf = [0u8; 16];
        let n = r.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello");
    }

    #[test]
    fn test_read_spans_chunks() {
        let (mut w, mut r) = byte_pipe();
        w.write_all(b"ab").unwrap();
        w.write_all(b"cd").unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 1];
        for _ in 0..4 {
            let n = r.read(&mut buf).unwrap();
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"abcd");
    }

    #[test]
    fn test_eof_after_writer_dropped() {
        let (w, mut r) = byte_pipe();
        {
            let mut w = w;
            w.write_all(b"x").unwrap();
        }
        let mut buf = [0u8; 4];
        assert_eq!(r.read(&mut buf).unwrap(), 1);
        assert_eq!(r.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_try_read_does_not_block() {
        let (mut w, mut r) = byte_pipe();
        let mut buf = Vec::new();
        assert_eq!(r.try_read(&mut buf), 0);
        w.write_all(b"later").unwrap();
        assert_eq!(r.try_read(&mut buf), 5);
        assert_eq!(buf, b"later");
    }

    #[test]
    fn test_is_closed_after_drain() {
        let (mut w, mut r) = byte_pipe();
        w.write_all(b"bye").unwrap();
        drop(w);
        let mut buf = Vec::new();
        assert!(!r.is_closed());
        r.try_read(&mut buf);
        assert!(r.is_closed());
        assert_eq!(buf, b"bye");
    }

    #[test]
    fn test_write_after_reader_dropped_fails() {
        let (mut w, r) = byte_pipe();
        drop(r);
        assert!(w.write_all(b"x").is_err());
    }
}
