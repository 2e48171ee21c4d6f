//! Bridge integration tests
//!
//! Drives the full console path: a greeter thread talking through the
//! console pipes, key events arriving through the desktop switch, and the
//! hand-over to a session backend after login.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use rdp2vnc::clipboard::{ClipboardBridge, ClipboardFormat};
use rdp2vnc::console::TerminalConsole;
use rdp2vnc::desktop::session::SessionDesktop;
use rdp2vnc::desktop::{Desktop, DesktopSwitch};
use rdp2vnc::engine::{
    ClipboardChannel, Result as EngineResult, ScreenLayout, ServingEngine, SessionEngine,
    SessionInput, SharedSession,
};
use rdp2vnc::framebuffer::{CursorImage, Point, Rect, Rgb, SharedPixelBuffer};
use rdp2vnc::input::keymap::{keysym, ScanCode};
use rdp2vnc::input::pointer::PointerFlags;
use rdp2vnc::login::{Credentials, Greeter, Resolution};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct RecordingServer {
    layouts: Mutex<Vec<ScreenLayout>>,
    changed: Mutex<Vec<Rect>>,
}

impl ServingEngine for RecordingServer {
    fn set_pixel_buffer(&self, _buffer: SharedPixelBuffer, layout: ScreenLayout) {
        self.layouts.lock().push(layout);
    }
    fn clear_pixel_buffer(&self) {}
    fn add_changed(&self, region: Rect) -> EngineResult<()> {
        self.changed.lock().push(region);
        Ok(())
    }
    fn set_cursor(&self, _cursor: &CursorImage) -> EngineResult<()> {
        Ok(())
    }
    fn set_cursor_pos(&self, _pos: Point) -> EngineResult<()> {
        Ok(())
    }
    fn bell(&self) -> EngineResult<()> {
        Ok(())
    }
    fn announce_clipboard(&self, _available: bool) -> EngineResult<()> {
        Ok(())
    }
    fn request_clipboard(&self) -> EngineResult<()> {
        Ok(())
    }
    fn send_clipboard_data(&self, _text: &str) -> EngineResult<()> {
        Ok(())
    }
}

#[derive(Default, Clone)]
struct SessionLog {
    scancodes: Arc<Mutex<Vec<(ScanCode, bool)>>>,
}

struct FakeSession {
    log: SessionLog,
}

impl SessionInput for FakeSession {
    fn send_scancode(&mut self, code: ScanCode, down: bool) -> EngineResult<()> {
        self.log.scancodes.lock().push((code, down));
        Ok(())
    }
    fn send_unicode(&mut self, _ch: char, _down: bool) -> EngineResult<()> {
        Ok(())
    }
    fn send_synchronize(&mut self, _caps_lock: bool) -> EngineResult<()> {
        Ok(())
    }
    fn send_pause(&mut self) -> EngineResult<()> {
        Ok(())
    }
    fn send_mouse(&mut self, _flags: PointerFlags, _pos: Point) -> EngineResult<()> {
        Ok(())
    }
}

impl SessionEngine for FakeSession {
    fn start(&mut self) -> EngineResult<()> {
        Ok(())
    }
    fn stop(&mut self) -> EngineResult<()> {
        Ok(())
    }
    fn wait_connect(&mut self) -> EngineResult<()> {
        Ok(())
    }
    fn process_events(&mut self) -> EngineResult<bool> {
        Ok(true)
    }
    fn dimensions(&self) -> (u16, u16) {
        (640, 480)
    }
}

struct NullChannel;

impl ClipboardChannel for NullChannel {
    fn send_capabilities(&self) -> EngineResult<()> {
        Ok(())
    }
    fn send_format_list(&self, _formats: &[ClipboardFormat]) -> EngineResult<()> {
        Ok(())
    }
    fn send_format_list_response(&self, _ok: bool) -> EngineResult<()> {
        Ok(())
    }
    fn send_data_request(&self, _format: ClipboardFormat) -> EngineResult<()> {
        Ok(())
    }
    fn send_data_response(&self, _data: Option<&[u8]>) -> EngineResult<()> {
        Ok(())
    }
}

/// Type a line through the desktop switch, ending with Enter.
fn type_line(desktop: &dyn Desktop, line: &str) {
    for ch in line.chars() {
        let ks = ch as u32;
        desktop.key_event(ks, None, true);
        desktop.key_event(ks, None, false);
    }
    desktop.key_event(keysym::XK_RETURN, None, true);
    desktop.key_event(keysym::XK_RETURN, None, false);
}

#[test]
fn test_console_login_then_session_swap() {
    init_tracing();
    let (console, channel) = TerminalConsole::new(800, 600, Rgb::BLACK, Rgb::WHITE);
    let server = Arc::new(RecordingServer::default());
    let switch = Arc::new(DesktopSwitch::with_desktop(console.clone()));
    switch.start(server.clone()).unwrap();

    let cancel = Arc::new(AtomicBool::new(false));
    let pump = {
        let console = console.clone();
        let cancel = cancel.clone();
        thread::spawn(move || console.pump(&cancel))
    };

    let greeter_thread = thread::spawn(move || {
        let greeter = Greeter::new("Bridge Test", 3);
        greeter.run(channel.input, channel.output, |c: &Credentials| {
            Some(c.clone())
        })
    });

    type_line(switch.as_ref(), "CORP\\alice");
    type_line(switch.as_ref(), "hunter2");
    type_line(switch.as_ref(), "1024x768");

    let creds = greeter_thread.join().unwrap().unwrap();
    assert_eq!(creds.domain.as_deref(), Some("CORP"));
    assert_eq!(creds.username, "alice");
    assert_eq!(creds.password, "hunter2");
    assert_eq!(
        creds.size,
        Resolution::Fixed {
            width: 1024,
            height: 768
        }
    );

    // The greeter dropped its pipe ends; the pump drains and exits
    pump.join().unwrap();

    // Prompt output was rendered and reported as damage
    assert!(!server.changed.lock().is_empty());

    // Hand the clients over to the established session
    let log = SessionLog::default();
    let session: SharedSession = Arc::new(Mutex::new(
        Box::new(FakeSession { log: log.clone() }) as Box<dyn SessionEngine>,
    ));
    let clipboard = Arc::new(ClipboardBridge::new(Arc::new(NullChannel)));
    let desktop = Arc::new(SessionDesktop::new(session, clipboard, 127, Rgb::BLACK));

    let previous = switch.swap(Some(desktop)).unwrap();
    assert!(previous.is_some());

    // The serving engine got the session buffer published over it
    let layouts = server.layouts.lock().clone();
    assert_eq!(
        layouts.last(),
        Some(&ScreenLayout {
            width: 640,
            height: 480
        })
    );

    // Key events now reach the session engine, not the console
    switch.key_event(0x61, None, true);
    assert_eq!(
        log.scancodes.lock().as_slice(),
        &[(ScanCode::new(0x1e), true)]
    );
}

#[test]
fn test_clipboard_paste_feeds_login_prompt() {
    init_tracing();
    let (console, channel) = TerminalConsole::new(640, 480, Rgb::BLACK, Rgb::WHITE);
    let switch = Arc::new(DesktopSwitch::with_desktop(console));
    switch.start(Arc::new(RecordingServer::default())).unwrap();

    let greeter_thread = thread::spawn(move || {
        let greeter = Greeter::new("Paste Test", 1);
        greeter.run(channel.input, channel.output, |c: &Credentials| {
            Some(c.clone())
        })
    });

    // Username arrives as pasted clipboard text, Enter typed after
    switch.handle_clipboard_data("bob");
    switch.key_event(keysym::XK_RETURN, None, true);
    type_line(switch.as_ref(), "pw");
    type_line(switch.as_ref(), "");

    let creds = greeter_thread.join().unwrap().unwrap();
    assert_eq!(creds.username, "bob");
    assert_eq!(creds.size, Resolution::Unspecified);
}

#[test]
fn test_console_refuses_layout_but_remembers_hint() {
    init_tracing();
    let (console, _channel) = TerminalConsole::new(640, 480, Rgb::BLACK, Rgb::WHITE);
    let switch = DesktopSwitch::with_desktop(console.clone());

    let layout = ScreenLayout {
        width: 1280,
        height: 1024,
    };
    assert_eq!(
        switch.set_screen_layout(layout),
        rdp2vnc::engine::LayoutResult::Prohibited
    );
    assert_eq!(console.requested_layout(), Some(layout));
}
