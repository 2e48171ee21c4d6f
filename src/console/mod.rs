//! Terminal Login Console
//!
//! A desktop backend that renders an in-process terminal emulator into
//! the shared pixel buffer. The greeter thread talks to it through a
//! pair of byte pipes as if they were a controlling terminal: keystrokes
//! from network clients come out of the input pipe, prompt output written
//! to the output pipe is fed through the emulator and painted as 16x16
//! glyph cells, centered in the framebuffer.
//!
//! Device status queries (`ESC[5n`, `ESC[6n`) embedded in the output are
//! answered on the input pipe before the bytes reach the emulator, so a
//! prompt writer can probe the cursor position.

pub mod font;
pub mod input;
pub mod pipe;
pub mod screen;

use crate::desktop::Desktop;
use crate::engine::{LayoutResult, Result, ScreenLayout, ServingEngine};
use crate::framebuffer::{PixelBuffer, Point, Rect, Rgb, SharedPixelBuffer};
use crate::input::keymap::ScanCode;
use crate::input::pointer::ButtonMask;
use font::{GLYPH_HEIGHT, GLYPH_WIDTH};
use input::{ConsoleInput, KeyAction};
use parking_lot::Mutex;
use pipe::{byte_pipe, PipeReader, PipeWriter};
use screen::{CellGrid, RowSpan};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Poll interval of the console render loop.
const PUMP_INTERVAL: Duration = Duration::from_millis(10);

/// Greeter-side endpoints of the console pipes.
///
/// Dropping the writer ends the console's render loop; see
/// [`TerminalConsole::pump`].
#[derive(Debug)]
pub struct ConsoleChannel {
    /// Keystrokes and query replies, read like terminal input
    pub input: PipeReader,
    /// Prompt output, written like a terminal
    pub output: PipeWriter,
}

struct ConsoleState {
    parser: vt100::Parser,
    grid: CellGrid,
    keys: ConsoleInput,
    bells: usize,
    /// Trailing bytes of the last feed that may be the start of a status
    /// query split across writes
    partial_query: Vec<u8>,
}

/// The login console backend.
pub struct TerminalConsole {
    state: Mutex<ConsoleState>,
    buffer: SharedPixelBuffer,
    layout: ScreenLayout,
    origin: Point,
    fg: Rgb,
    bg: Rgb,
    key_tx: Mutex<PipeWriter>,
    out_rx: Mutex<PipeReader>,
    server: Mutex<Option<Arc<dyn ServingEngine>>>,
    running: AtomicBool,
    finished: AtomicBool,
    requested_layout: Mutex<Option<ScreenLayout>>,
}

impl TerminalConsole {
    /// Create a console for a framebuffer of the given size, returning
    /// the greeter-side pipe endpoints alongside it.
    ///
    /// The cell grid is the largest 16x16 grid that fits; the remainder
    /// becomes a centering border in the background color.
    pub fn new(width: u16, height: u16, fg: Rgb, bg: Rgb) -> (Arc<Self>, ConsoleChannel) {
        let cols = width / GLYPH_WIDTH;
        let rows = height / GLYPH_HEIGHT;
        let origin = Point::new(
            (width - cols * GLYPH_WIDTH) / 2,
            (height - rows * GLYPH_HEIGHT) / 2,
        );

        let (key_tx, key_rx) = byte_pipe();
        let (out_tx, out_rx) = byte_pipe();

        let console = Arc::new(Self {
            state: Mutex::new(ConsoleState {
                parser: vt100::Parser::new(rows, cols, 0),
                grid: CellGrid::new(rows, cols, fg, bg),
                keys: ConsoleInput::new(),
                bells: 0,
                partial_query: Vec::new(),
            }),
            buffer: PixelBuffer::new_shared(width, height, bg),
            layout: ScreenLayout { width, height },
            origin,
            fg,
            bg,
            key_tx: Mutex::new(key_tx),
            out_rx: Mutex::new(out_rx),
            server: Mutex::new(None),
            running: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            requested_layout: Mutex::new(None),
        });
        (
            console,
            ConsoleChannel {
                input: key_rx,
                output: out_tx,
            },
        )
    }

    /// Grid size in cells.
    pub fn grid_size(&self) -> (u16, u16) {
        let state = self.state.lock();
        (state.grid.rows(), state.grid.cols())
    }

    /// The last screen layout a client asked for, if any. Consulted when
    /// the post-login session needs a size and none was entered.
    pub fn requested_layout(&self) -> Option<ScreenLayout> {
        *self.requested_layout.lock()
    }

    /// Drive the console until the greeter drops its output endpoint,
    /// [`Desktop::terminate`] is called, or `cancel` is set.
    pub fn pump(&self, cancel: &AtomicBool) {
        let mut chunk = Vec::new();
        loop {
            if cancel.load(Ordering::SeqCst) || self.finished.load(Ordering::SeqCst) {
                return;
            }
            chunk.clear();
            let closed = {
                let mut out_rx = self.out_rx.lock();
                out_rx.try_read(&mut chunk);
                out_rx.is_closed()
            };
            if !chunk.is_empty() {
                self.feed(&chunk);
            }
            if closed {
                debug!("console output pipe closed");
                return;
            }
            std::thread::sleep(PUMP_INTERVAL);
        }
    }

    /// Feed output bytes through the emulator and repaint changed cells.
    pub fn feed(&self, bytes: &[u8]) {
        let mut state = self.state.lock();

        // Rejoin a query prefix left over from the previous feed, and
        // withhold a new trailing prefix so a query split across writes
        // is still answered
        let mut data = std::mem::take(&mut state.partial_query);
        data.extend_from_slice(bytes);
        let keep = partial_query_suffix(&data);
        state.partial_query = data[data.len() - keep..].to_vec();
        let data = &data[..data.len() - keep];

        // Answer device status queries before the emulator consumes them
        let mut rest = data;
        while let Some(at) = find_status_query(rest) {
            state.parser.process(&rest[..at]);
            let reply = match rest[at + 2] {
                b'5' => "\x1b[0n".to_string(),
                _ => {
                    let (row, col) = state.parser.screen().cursor_position();
                    format!("\x1b[{};{}R", row + 1, col + 1)
                }
            };
            if let Err(err) = self.key_tx.lock().write_all(reply.as_bytes()) {
                warn!(%err, "failed to answer console status query");
            }
            rest = &rest[at + 4..];
        }
        state.parser.process(rest);

        let spans = {
            let ConsoleState { parser, grid, .. } = &mut *state;
            grid.update(parser.screen(), self.fg, self.bg)
        };
        self.render(&state, &spans);

        let bells = state.parser.screen().audible_bell_count();
        if bells != state.bells {
            state.bells = bells;
            if let Some(server) = self.server() {
                if let Err(err) = server.bell() {
                    warn!(%err, "failed to ring client bell");
                }
            }
        }
    }

    fn server(&self) -> Option<Arc<dyn ServingEngine>> {
        self.server.lock().clone()
    }

    /// Paint dirty spans into the pixel buffer and notify the serving
    /// engine.
    fn render(&self, state: &ConsoleState, spans: &[RowSpan]) {
        if spans.is_empty() {
            return;
        }
        let server = self.server();
        let mut buffer = self.buffer.write();

        for span in spans {
            // A span starting on a continuation cell repaints from the
            // wide cell that owns it
            let mut start = span.start;
            if start > 0 && state.grid.cell(span.row, start).ch == '\0' {
                start -= 1;
            }
            let mut end = span.end;
            if state.grid.cell(span.row, end - 1).wide {
                end = (end + 1).min(state.grid.cols());
            }

            let mut col = start;
            while col < end {
                let cell = state.grid.cell(span.row, col);
                if cell.ch == '\0' {
                    col += 1;
                    continue;
                }
                let cells = if cell.wide { 2 } else { 1 };
                font::draw_cell(
                    &mut buffer,
                    Point::new(
                        self.origin.x + col * GLYPH_WIDTH,
                        self.origin.y + span.row * GLYPH_HEIGHT,
                    ),
                    cell.ch,
                    cells,
                    cell.fg,
                    cell.bg,
                );
                col += cells;
            }

            if let Some(server) = &server {
                let region = Rect::from_size(
                    self.origin.x + start * GLYPH_WIDTH,
                    self.origin.y + span.row * GLYPH_HEIGHT,
                    (end - start) * GLYPH_WIDTH,
                    GLYPH_HEIGHT,
                );
                if let Err(err) = server.add_changed(region) {
                    warn!(%err, "failed to report console damage");
                }
            }
        }
    }

    fn write_input(&self, bytes: &[u8]) {
        if let Err(err) = self.key_tx.lock().write_all(bytes) {
            warn!(%err, "console input pipe closed");
        }
    }

    /// Paste text into the console input, normalizing line endings to
    /// carriage returns.
    fn paste(&self, text: &str) {
        let normalized = text.replace("\r\n", "\r").replace('\n', "\r");
        self.write_input(normalized.as_bytes());
    }
}

/// Find the next `ESC[5n` / `ESC[6n` query in `bytes`.
fn find_status_query(bytes: &[u8]) -> Option<usize> {
    bytes
        .windows(4)
        .position(|w| w[0] == 0x1b && w[1] == b'[' && (w[2] == b'5' || w[2] == b'6') && w[3] == b'n')
}

/// Length of a trailing proper prefix of a status query (at most 3 bytes).
fn partial_query_suffix(bytes: &[u8]) -> usize {
    let n = bytes.len();
    if n >= 3 && bytes[n - 3] == 0x1b && bytes[n - 2] == b'[' && (bytes[n - 1] == b'5' || bytes[n - 1] == b'6') {
        return 3;
    }
    if n >= 2 && bytes[n - 2] == 0x1b && bytes[n - 1] == b'[' {
        return 2;
    }
    if n >= 1 && bytes[n - 1] == 0x1b {
        return 1;
    }
    0
}

impl Desktop for TerminalConsole {
    fn start(&self, server: Arc<dyn ServingEngine>) -> Result<()> {
        server.set_pixel_buffer(self.buffer.clone(), self.layout);
        server.add_changed(Rect::from_size(
            0,
            0,
            self.layout.width,
            self.layout.height,
        ))?;
        *self.server.lock() = Some(server);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&self) {
        if let Some(server) = self.server.lock().take() {
            server.clear_pixel_buffer();
        }
        self.running.store(false, Ordering::SeqCst);
    }

    fn terminate(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The console does not resize; the request is remembered as a size
    /// hint for the session that follows.
    fn set_screen_layout(&self, layout: ScreenLayout) -> LayoutResult {
        *self.requested_layout.lock() = Some(layout);
        LayoutResult::Prohibited
    }

    fn pointer_event(&self, _pos: Point, _buttons: ButtonMask) {}

    fn key_event(&self, keysym: u32, _scancode: Option<ScanCode>, down: bool) {
        let action = self.state.lock().keys.key_event(keysym, down);
        match action {
            KeyAction::Bytes(bytes) => self.write_input(&bytes),
            KeyAction::PasteRequest => {
                if let Some(server) = self.server() {
                    if let Err(err) = server.request_clipboard() {
                        warn!(%err, "failed to request client clipboard");
                    }
                }
            }
            KeyAction::Ignored => {}
        }
    }

    fn client_cut_text(&self, text: &str) {
        self.paste(text);
    }

    fn handle_clipboard_request(&self) {}

    fn handle_clipboard_announce(&self, _available: bool) {}

    fn handle_clipboard_data(&self, text: &str) {
        self.paste(text);
    }
}
