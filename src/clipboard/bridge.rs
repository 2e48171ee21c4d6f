//! Clipboard State Machine
//!
//! Relays clipboard contents between the session engine's clipboard
//! channel and the serving engine's client clipboard surface. Both sides
//! are request/response protocols with a single outstanding transfer, so
//! the bridge is a small state machine guarded by one mutex.
//!
//! Locking: the bridge takes only its own state lock. Session-side entry
//! points run on the engine's channel thread with no other locks held;
//! serving-side entry points run on the serving thread, which already
//! holds the session lock. Serving-engine failures are absorbed here (a
//! gone client must not tear down the session); channel failures are
//! returned to the caller.

use crate::clipboard::error::Result;
use crate::clipboard::formats::{
    decode_utf16le_text, encode_utf16le_text, ClipboardFormat,
};
use crate::engine::{ClipboardChannel, ServingEngine};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct ClipboardState {
    /// Session formats were announced to the serving side and not yet
    /// consumed by a client request
    announced: bool,
    /// Format id of an unanswered session data request
    requested_format: Option<u32>,
    /// The serving client declared it has clipboard contents
    serving_available: bool,
    /// A client request for session clipboard data is in flight
    awaiting_session_data: bool,
    /// The client format list was sent and no new data arrived since
    formats_sent_once: bool,
}

/// Bidirectional clipboard relay between the two engines.
pub struct ClipboardBridge {
    channel: Arc<dyn ClipboardChannel>,
    server: Mutex<Option<Arc<dyn ServingEngine>>>,
    state: Mutex<ClipboardState>,
}

impl ClipboardBridge {
    /// Create a bridge over the session clipboard channel. No serving
    /// engine is attached yet; see [`ClipboardBridge::attach_server`].
    pub fn new(channel: Arc<dyn ClipboardChannel>) -> Self {
        Self {
            channel,
            server: Mutex::new(None),
            state: Mutex::new(ClipboardState::default()),
        }
    }

    /// Attach the serving engine that relays to network clients.
    pub fn attach_server(&self, server: Arc<dyn ServingEngine>) {
        *self.server.lock() = Some(server);
    }

    /// Detach the serving engine. Session-side traffic is answered with
    /// failure responses while detached.
    pub fn detach_server(&self) {
        *self.server.lock() = None;
    }

    fn server(&self) -> Option<Arc<dyn ServingEngine>> {
        self.server.lock().clone()
    }

    // --- session side -----------------------------------------------------

    /// The session channel is up: advertise capabilities and the client
    /// format list.
    pub fn monitor_ready(&self) -> Result<()> {
        debug!("clipboard channel ready");
        self.channel.send_capabilities()?;
        self.send_client_format_list()
    }

    /// The session announced new clipboard formats.
    ///
    /// The list is acknowledged and availability is forwarded to network
    /// clients regardless of the ids it carries; the format is chosen at
    /// request time. An in-flight data response stays valid.
    pub fn server_format_list(&self, format_ids: &[u32]) -> Result<()> {
        debug!(?format_ids, "session clipboard formats announced");
        self.state.lock().announced = true;
        self.channel.send_format_list_response(true)?;

        if let Some(server) = self.server() {
            if let Err(err) = server.announce_clipboard(true) {
                warn!(%err, "failed to announce clipboard to clients");
            }
        }
        Ok(())
    }

    /// The session requested clipboard data from our side.
    ///
    /// Unsupported formats and requests arriving while no client clipboard
    /// is available are answered immediately with a failure response;
    /// otherwise the serving client is asked for its contents and the
    /// answer is deferred to [`ClipboardBridge::handle_data`].
    pub fn server_format_data_request(&self, format_id: u32) -> Result<()> {
        let reject = {
            let mut state = self.state.lock();
            state.requested_format = Some(format_id);
            let supported = ClipboardFormat::from_id(format_id).is_some();
            !supported || !state.serving_available
        };
        if reject {
            debug!(format_id, "rejecting session clipboard request");
            return self.send_session_data_response(None);
        }

        match self.server() {
            Some(server) => {
                if let Err(err) = server.request_clipboard() {
                    warn!(%err, "failed to request client clipboard");
                    return self.send_session_data_response(None);
                }
                Ok(())
            }
            None => self.send_session_data_response(None),
        }
    }

    /// The session answered our data request.
    ///
    /// Stale responses (none outstanding) are discarded. Text is decoded
    /// from UTF-16LE, carriage returns stripped, and delivered to the
    /// serving client.
    pub fn server_format_data_response(&self, data: Option<&[u8]>) -> Result<()> {
        {
            let mut state = self.state.lock();
            if !state.awaiting_session_data {
                debug!("discarding unsolicited clipboard data response");
                return Ok(());
            }
            state.awaiting_session_data = false;
        }

        let Some(data) = data else {
            debug!("session clipboard request failed");
            return Ok(());
        };
        let text = decode_utf16le_text(data);

        if let Some(server) = self.server() {
            if let Err(err) = server.send_clipboard_data(&text) {
                warn!(%err, "failed to deliver clipboard text to client");
            }
        }
        Ok(())
    }

    // --- serving side -----------------------------------------------------

    /// A network client asked for the session clipboard contents.
    ///
    /// Only honored while an announcement is outstanding; the answer
    /// arrives via [`ClipboardBridge::server_format_data_response`].
    pub fn handle_request(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if !state.announced {
                return Ok(());
            }
            state.announced = false;
            state.awaiting_session_data = true;
        }
        Ok(self.channel.send_data_request(ClipboardFormat::UnicodeText)?)
    }

    /// A network client announced whether it holds clipboard contents.
    pub fn handle_announce(&self, available: bool) -> Result<()> {
        let outstanding = {
            let mut state = self.state.lock();
            state.serving_available = available;
            !available && state.requested_format.is_some()
        };

        if outstanding {
            // The session is still waiting; fail its request now.
            self.send_session_data_response(None)?;
        }
        if available {
            self.send_client_format_list()?;
        }
        Ok(())
    }

    /// A network client delivered its clipboard text.
    ///
    /// Answers the outstanding session request if one exists; either way
    /// the format-list guard resets so fresh contents are re-announced.
    pub fn handle_data(&self, text: &str) -> Result<()> {
        self.state.lock().formats_sent_once = false;

        let outstanding = self.state.lock().requested_format.is_some();
        if outstanding {
            let data = encode_utf16le_text(text);
            self.send_session_data_response(Some(&data))?;
        }
        Ok(())
    }

    // --- helpers ----------------------------------------------------------

    /// Answer the outstanding session data request; no-op when none is
    /// outstanding.
    fn send_session_data_response(&self, data: Option<&[u8]>) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.requested_format.take().is_none() {
                return Ok(());
            }
        }
        Ok(self.channel.send_data_response(data)?)
    }

    /// Send the client format list, at most once per clipboard change.
    ///
    /// A failure response flushes any transfer the session still thinks
    /// is pending before the new list lands.
    fn send_client_format_list(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.formats_sent_once {
                return Ok(());
            }
            state.formats_sent_once = true;
        }
        self.send_session_data_response(None)?;
        Ok(self
            .channel
            .send_format_list(&[ClipboardFormat::Raw, ClipboardFormat::UnicodeText])?)
    }
}

impl std::fmt::Debug for ClipboardBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipboardBridge")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Result as EngineResult, ScreenLayout};
    use crate::framebuffer::{CursorImage, Point, Rect, SharedPixelBuffer};

    #[derive(Debug, PartialEq)]
    enum ChannelOp {
        Capabilities,
        FormatList(Vec<u32>),
        FormatListResponse(bool),
        DataRequest(u32),
        DataResponse(Option<Vec<u8>>),
    }

    #[derive(Default)]
    struct FakeChannel {
        ops: Mutex<Vec<ChannelOp>>,
    }

    impl FakeChannel {
        fn take(&self) -> Vec<ChannelOp> {
            std::mem::take(&mut *self.ops.lock())
        }
    }

    impl ClipboardChannel for FakeChannel {
        fn send_capabilities(&self) -> EngineResult<()> {
            self.ops.lock().push(ChannelOp::Capabilities);
            Ok(())
        }
        fn send_format_list(&self, formats: &[ClipboardFormat]) -> EngineResult<()> {
            self.ops
                .lock()
                .push(ChannelOp::FormatList(formats.iter().map(|f| f.id()).collect()));
            Ok(())
        }
        fn send_format_list_response(&self, ok: bool) -> EngineResult<()> {
            self.ops.lock().push(ChannelOp::FormatListResponse(ok));
            Ok(())
        }
        fn send_data_request(&self, format: ClipboardFormat) -> EngineResult<()> {
            self.ops.lock().push(ChannelOp::DataRequest(format.id()));
            Ok(())
        }
        fn send_data_response(&self, data: Option<&[u8]>) -> EngineResult<()> {
            self.ops
                .lock()
                .push(ChannelOp::DataResponse(data.map(|d| d.to_vec())));
            Ok(())
        }
    }

    #[derive(Debug, PartialEq)]
    enum ServerOp {
        Announce(bool),
        Request,
        Data(String),
    }

    #[derive(Default)]
    struct FakeServer {
        ops: Mutex<Vec<ServerOp>>,
    }

    impl FakeServer {
        fn take(&self) -> Vec<ServerOp> {
            std::mem::take(&mut *self.ops.lock())
        }
    }

    impl ServingEngine for FakeServer {
        fn set_pixel_buffer(&self, _buffer: SharedPixelBuffer, _layout: ScreenLayout) {}
        fn clear_pixel_buffer(&self) {}
        fn add_changed(&self, _region: Rect) -> EngineResult<()> {
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
        fn announce_clipboard(&self, available: bool) -> EngineResult<()> {
            self.ops.lock().push(ServerOp::Announce(available));
            Ok(())
        }
        fn request_clipboard(&self) -> EngineResult<()> {
            self.ops.lock().push(ServerOp::Request);
            Ok(())
        }
        fn send_clipboard_data(&self, text: &str) -> EngineResult<()> {
            self.ops.lock().push(ServerOp::Data(text.to_string()));
            Ok(())
        }
    }

    fn bridge() -> (Arc<FakeChannel>, Arc<FakeServer>, ClipboardBridge) {
        let channel = Arc::new(FakeChannel::default());
        let server = Arc::new(FakeServer::default());
        let bridge = ClipboardBridge::new(channel.clone());
        bridge.attach_server(server.clone());
        (channel, server, bridge)
    }

    #[test]
    fn test_monitor_ready_sends_capabilities_and_formats() {
        let (channel, _server, bridge) = bridge();
        bridge.monitor_ready().unwrap();
        assert_eq!(
            channel.take(),
            vec![
                ChannelOp::Capabilities,
                ChannelOp::FormatList(vec![0, 13]),
            ]
        );
    }

    #[test]
    fn test_session_to_client_flow() {
        let (channel, server, bridge) = bridge();

        // Session announces text; clients get the availability flag
        bridge.server_format_list(&[13]).unwrap();
        assert_eq!(channel.take(), vec![ChannelOp::FormatListResponse(true)]);
        assert_eq!(server.take(), vec![ServerOp::Announce(true)]);

        // A client asks; the bridge requests Unicode text from the session
        bridge.handle_request().unwrap();
        assert_eq!(channel.take(), vec![ChannelOp::DataRequest(13)]);

        // Session answers with UTF-16LE CRLF text; client gets bare LF
        let data = encode_utf16le_text("copy\r\nme");
        bridge.server_format_data_response(Some(&data)).unwrap();
        assert_eq!(server.take(), vec![ServerOp::Data("copy\nme".into())]);
    }

    #[test]
    fn test_format_list_without_text_still_announces() {
        let (channel, server, bridge) = bridge();

        // Only an unknown format id: availability is forwarded anyway
        bridge.server_format_list(&[1]).unwrap();
        assert_eq!(channel.take(), vec![ChannelOp::FormatListResponse(true)]);
        assert_eq!(server.take(), vec![ServerOp::Announce(true)]);

        // The announcement is live; a client request asks for Unicode text
        bridge.handle_request().unwrap();
        assert_eq!(channel.take(), vec![ChannelOp::DataRequest(13)]);
    }

    #[test]
    fn test_format_list_keeps_inflight_response_alive() {
        let (channel, server, bridge) = bridge();
        bridge.server_format_list(&[13]).unwrap();
        bridge.handle_request().unwrap();
        channel.take();
        server.take();

        // A new format list lands before the data response arrives
        bridge.server_format_list(&[13]).unwrap();
        channel.take();
        server.take();

        // The response to the earlier request is still delivered
        let data = encode_utf16le_text("still valid");
        bridge.server_format_data_response(Some(&data)).unwrap();
        assert_eq!(server.take(), vec![ServerOp::Data("still valid".into())]);
    }

    #[test]
    fn test_second_client_request_ignored_without_new_announce() {
        let (channel, _server, bridge) = bridge();
        bridge.server_format_list(&[13]).unwrap();
        channel.take();

        bridge.handle_request().unwrap();
        assert_eq!(channel.take(), vec![ChannelOp::DataRequest(13)]);

        // Announcement consumed; a second request sends nothing
        bridge.handle_request().unwrap();
        assert!(channel.take().is_empty());
    }

    #[test]
    fn test_unsolicited_session_data_discarded() {
        let (_channel, server, bridge) = bridge();
        let data = encode_utf16le_text("stale");
        bridge.server_format_data_response(Some(&data)).unwrap();
        assert!(server.take().is_empty());
    }

    #[test]
    fn test_client_to_session_flow() {
        let (channel, server, bridge) = bridge();

        // Client announces contents; session gets the format list
        bridge.handle_announce(true).unwrap();
        assert_eq!(channel.take(), vec![ChannelOp::FormatList(vec![0, 13])]);

        // Session requests the text; the client is asked
        bridge.server_format_data_request(13).unwrap();
        assert_eq!(server.take(), vec![ServerOp::Request]);
        assert!(channel.take().is_empty());

        // Client delivers; session receives NUL-terminated UTF-16LE
        bridge.handle_data("paste me").unwrap();
        assert_eq!(
            channel.take(),
            vec![ChannelOp::DataResponse(Some(encode_utf16le_text("paste me")))]
        );
    }

    #[test]
    fn test_unsupported_format_request_rejected() {
        let (channel, server, bridge) = bridge();
        bridge.handle_announce(true).unwrap();
        channel.take();

        // CF_TEXT (1) is not negotiated
        bridge.server_format_data_request(1).unwrap();
        assert_eq!(channel.take(), vec![ChannelOp::DataResponse(None)]);
        assert!(server.take().is_empty());
    }

    #[test]
    fn test_request_without_client_clipboard_rejected() {
        let (channel, _server, bridge) = bridge();
        bridge.server_format_data_request(13).unwrap();
        assert_eq!(channel.take(), vec![ChannelOp::DataResponse(None)]);
    }

    #[test]
    fn test_clipboard_withdrawn_fails_outstanding_request() {
        let (channel, server, bridge) = bridge();
        bridge.handle_announce(true).unwrap();
        channel.take();
        bridge.server_format_data_request(13).unwrap();
        server.take();

        // Client withdraws while the session waits
        bridge.handle_announce(false).unwrap();
        assert_eq!(channel.take(), vec![ChannelOp::DataResponse(None)]);
    }

    #[test]
    fn test_format_list_guard_resets_on_new_data() {
        let (channel, _server, bridge) = bridge();

        bridge.handle_announce(true).unwrap();
        assert_eq!(channel.take(), vec![ChannelOp::FormatList(vec![0, 13])]);

        // Repeated announce without new data: guarded
        bridge.handle_announce(true).unwrap();
        assert!(channel.take().is_empty());

        // New data resets the guard; the next announce re-sends
        bridge.handle_data("fresh").unwrap();
        channel.take();
        bridge.handle_announce(true).unwrap();
        assert_eq!(channel.take(), vec![ChannelOp::FormatList(vec![0, 13])]);
    }
}
