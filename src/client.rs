use std::sync::{Arc, Mutex};

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use secrecy::ExposeSecret;
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use crate::client::consts::{CLIENT_CLOSE_REASON, CLOSE_HANDSHAKE_TIMEOUT};
use crate::client::state::{Link, Outbound, SessionState};
use crate::error::{CloseReason, ConnectionErrorKind, Error, Result, CLOSE_NORMAL};
use crate::observer::{SessionEvent, SessionObserver};
use crate::turn::TurnProcessor;
use crate::types::audio::{INPUT_AUDIO_MIME, SCREEN_FRAME_MIME};
use crate::types::events::{ClientContent, RealtimeInput};
use crate::types::{build_setup_message, Blob, ClientMessage, Content, ServerMessage, SessionConfig};

mod config;
mod consts;
mod state;
mod stats;
mod utils;

pub use config::{Config, ConfigBuilder};
pub use state::ConnectionStatus;
pub use stats::Stats;

pub type EventRx = mpsc::UnboundedReceiver<SessionEvent>;

/// A client for one realtime session at a time.
///
/// `connect` opens the socket and sends the setup message; the server's confirmation
/// arrives later as [`SessionObserver::on_setup_complete`]. Sends never queue while
/// disconnected: they fail with a "not connected" protocol error instead.
pub struct Client {
    config: Config,
    session: SessionConfig,
    observer: Arc<dyn SessionObserver>,
    state: Arc<SessionState>,
    stats: Arc<Mutex<Stats>>,
}

impl Client {
    pub fn new(config: Config, session: SessionConfig, observer: Arc<dyn SessionObserver>) -> Self {
        Self {
            config,
            session,
            observer,
            state: Arc::new(SessionState::new()),
            stats: Arc::new(Mutex::new(Stats::new())),
        }
    }

    /// A client whose events are delivered on an unbounded channel.
    pub fn with_channel(config: Config, session: SessionConfig) -> (Self, EventRx) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(config, session, Arc::new(tx)), rx)
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub fn status(&self) -> ConnectionStatus {
        self.state.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.state.subscribe()
    }

    /// True once the server has confirmed the setup message.
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn stats(&self) -> Stats {
        if let Ok(stats_guard) = self.stats.lock() {
            stats_guard.clone()
        } else {
            tracing::error!("failed to get stats");
            Stats::new()
        }
    }

    /// Opens the socket and sends the setup message.
    ///
    /// Fails without side effects if a connection attempt or session is already live.
    pub async fn connect(&self) -> Result<()> {
        if self.config.api_key().expose_secret().is_empty() {
            return Err(Error::connection(
                ConnectionErrorKind::MissingCredential,
                "no API key configured",
            ));
        }
        let id = self.state.begin_connect()?;

        let surface = self.session.api_surface();
        let url = utils::build_url(&self.config, surface);
        tracing::info!(
            connection = id,
            host = utils::normalize_host(self.config.host()),
            surface = ?surface,
            model = self.session.model(),
            "connecting"
        );

        let stream = match tokio_tungstenite::connect_async(url).await {
            Ok((stream, _)) => stream,
            Err(e) => {
                tracing::error!(connection = id, "failed to connect: {}", e);
                if !self.state.fail(id) {
                    return Err(cancelled());
                }
                return Err(Error::connection(ConnectionErrorKind::Handshake, e.to_string()));
            }
        };
        self.open(id, stream).await
    }

    /// Like [`connect`](Self::connect), over a WebSocket stream the caller already opened.
    pub async fn attach<S>(&self, stream: S) -> Result<()>
    where
        S: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Send + 'static,
    {
        let id = self.state.begin_connect()?;
        self.open(id, stream).await
    }

    async fn open<S>(&self, id: u64, stream: S) -> Result<()>
    where
        S: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Send + 'static,
    {
        let (mut write, read) = stream.split();

        if !self.state.is_connecting(id) {
            tracing::info!(connection = id, "disconnected while connecting");
            close_cancelled(id, &mut write).await;
            return Err(cancelled());
        }

        let setup = ClientMessage::Setup(build_setup_message(&self.session));
        let text = match serde_json::to_string(&setup) {
            Ok(text) => text,
            Err(e) => {
                if !self.state.fail(id) {
                    return Err(cancelled());
                }
                return Err(Error::connection(ConnectionErrorKind::Setup, e.to_string()).with_retryable(false));
            }
        };
        tracing::debug!(connection = id, setup = %text, "sending setup");
        if let Err(e) = write.send(Message::Text(text)).await {
            tracing::error!(connection = id, "failed to send setup: {}", e);
            if !self.state.fail(id) {
                return Err(cancelled());
            }
            return Err(Error::connection(ConnectionErrorKind::Setup, e.to_string()));
        }

        let (tx, rx) = mpsc::channel(self.config.capacity());
        let opened = {
            let _gate = self.state.gate();
            let opened = self.state.open(Link { id, tx });
            if opened {
                self.observer.on_open();
            }
            opened
        };
        if !opened {
            tracing::info!(connection = id, "disconnected while sending setup");
            close_cancelled(id, &mut write).await;
            return Err(cancelled());
        }

        tokio::spawn(write_loop(id, write, rx, self.state.clone(), self.observer.clone()));
        tokio::spawn(read_loop(
            read,
            Dispatcher {
                id,
                state: self.state.clone(),
                observer: self.observer.clone(),
                stats: self.stats.clone(),
                processor: TurnProcessor::new(),
            },
        ));
        Ok(())
    }

    /// Closes the socket with a normal closure and releases the session at once,
    /// so `connect` may be called again immediately.
    pub async fn disconnect(&self) {
        let link = {
            let _gate = self.state.gate();
            let Some(link) = self.state.release() else {
                tracing::debug!("disconnect without an open socket");
                return;
            };
            self.observer
                .on_close(&CloseReason::new(CLOSE_NORMAL, CLIENT_CLOSE_REASON));
            link
        };
        tracing::info!(connection = link.id, "disconnected");
        if link.tx.send(Outbound::Close).await.is_err() {
            tracing::debug!(connection = link.id, "writer already stopped");
        }
    }

    async fn send_message(&self, message: ClientMessage) -> Result<()> {
        let link = self.state.link().ok_or_else(Error::not_connected)?;
        let text = serde_json::to_string(&message).map_err(Error::encode)?;
        link.tx
            .send(Outbound::Frame(text))
            .await
            .map_err(|_| Error::connection(ConnectionErrorKind::Send, "socket is closed"))
    }

    pub async fn send_realtime_input(&self, input: RealtimeInput) -> Result<()> {
        self.send_message(ClientMessage::RealtimeInput(input)).await
    }

    /// Sends a chunk of 16 kHz PCM16 microphone audio.
    pub async fn send_audio(&self, pcm: &[u8]) -> Result<()> {
        self.send_realtime_input(RealtimeInput::audio(Blob::from_bytes(INPUT_AUDIO_MIME, pcm)))
            .await
    }

    /// Sends one JPEG-encoded screen or camera frame.
    pub async fn send_screen_frame(&self, jpeg: &[u8]) -> Result<()> {
        self.send_realtime_input(RealtimeInput::video(Blob::from_bytes(SCREEN_FRAME_MIME, jpeg)))
            .await
    }

    /// Marks the start of user speech when server-side VAD is disabled.
    pub async fn send_activity_start(&self) -> Result<()> {
        self.send_realtime_input(RealtimeInput::activity_start()).await
    }

    pub async fn send_activity_end(&self) -> Result<()> {
        self.send_realtime_input(RealtimeInput::activity_end()).await
    }

    pub async fn send_audio_stream_end(&self) -> Result<()> {
        self.send_realtime_input(RealtimeInput::audio_stream_end()).await
    }

    pub async fn send_client_content(&self, turns: Vec<Content>, turn_complete: bool) -> Result<()> {
        self.send_message(ClientMessage::ClientContent(ClientContent::new(turns, turn_complete)))
            .await
    }

    /// Sends a complete user text turn.
    pub async fn send_text(&self, text: &str) -> Result<()> {
        self.send_client_content(vec![Content::user_text(text)], true).await
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(link) = self.state.release() {
            if link.tx.try_send(Outbound::Close).is_err() {
                tracing::debug!(connection = link.id, "could not queue close on drop");
            }
        }
    }
}

fn client_close_frame() -> CloseFrame<'static> {
    CloseFrame {
        code: CloseCode::Normal,
        reason: CLIENT_CLOSE_REASON.into(),
    }
}

fn cancelled() -> Error {
    Error::connection(ConnectionErrorKind::Cancelled, "disconnected while connecting")
}

async fn close_cancelled<W>(id: u64, write: &mut W)
where
    W: Sink<Message, Error = WsError> + Unpin,
{
    if let Err(e) = write.send(Message::Close(Some(client_close_frame()))).await {
        tracing::debug!(connection = id, "failed to close cancelled socket: {}", e);
    }
}

/// Delivers `error` unless connection `id` has been released.
fn report_error(state: &SessionState, id: u64, observer: &dyn SessionObserver, error: &Error) {
    let _gate = state.gate();
    if state.is_current(id) {
        observer.on_error(error);
    }
}

async fn write_loop<W>(
    id: u64,
    mut write: W,
    mut rx: mpsc::Receiver<Outbound>,
    state: Arc<SessionState>,
    observer: Arc<dyn SessionObserver>,
) where
    W: Sink<Message, Error = WsError> + Unpin,
{
    while let Some(outbound) = rx.recv().await {
        match outbound {
            Outbound::Frame(text) => {
                if let Err(e) = write.send(Message::Text(text)).await {
                    tracing::error!(connection = id, "failed to send message: {}", e);
                    let error = Error::connection(ConnectionErrorKind::Send, e.to_string());
                    report_error(&state, id, observer.as_ref(), &error);
                    break;
                }
            }
            Outbound::Close => {
                if let Err(e) = write.send(Message::Close(Some(client_close_frame()))).await {
                    tracing::debug!(connection = id, "failed to send close: {}", e);
                }
                break;
            }
        }
    }
    tracing::debug!(connection = id, "writer stopped");
}

enum Step {
    Continue,
    Closed(CloseReason),
    /// The connection was released by `disconnect` or replaced.
    Detached,
}

/// Per-connection receive side: parses frames and feeds the turn processor.
struct Dispatcher {
    id: u64,
    state: Arc<SessionState>,
    observer: Arc<dyn SessionObserver>,
    stats: Arc<Mutex<Stats>>,
    processor: TurnProcessor,
}

impl Dispatcher {
    fn update_stats(&self, update: impl FnOnce(&mut Stats)) {
        if let Ok(mut stats_guard) = self.stats.lock() {
            update(&mut *stats_guard);
        } else {
            tracing::error!("failed to update stats");
        }
    }

    /// Handles one read result. The gate is held throughout, so a `disconnect` either
    /// happens before this frame (which is then dropped) or after its callbacks.
    fn handle(&mut self, message: Result<Message, WsError>) -> Step {
        let state = self.state.clone();
        let _gate = state.gate();
        if !state.is_current(self.id) {
            return Step::Detached;
        }
        match message {
            Ok(Message::Text(text)) => self.frame(&text),
            Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                Ok(text) => self.frame(text),
                Err(_) => {
                    tracing::warn!(connection = self.id, len = bytes.len(), "dropping non-UTF-8 binary frame");
                    self.update_stats(Stats::frame_dropped);
                }
            },
            Ok(Message::Close(frame)) => {
                return Step::Closed(match frame {
                    Some(frame) => CloseReason::new(u16::from(frame.code), frame.reason.to_string()),
                    None => CloseReason::new(1005, ""),
                });
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(connection = self.id, "failed to read message: {}", e);
                self.observer
                    .on_error(&Error::connection(ConnectionErrorKind::Socket, e.to_string()));
            }
        }
        Step::Continue
    }

    fn finish(&self, reason: CloseReason) {
        let _gate = self.state.gate();
        if self.state.mark_closed(self.id, reason.is_clean()) {
            tracing::info!(connection = self.id, code = reason.code, reason = %reason.reason, "connection closed");
            self.observer.on_close(&reason);
        }
    }

    fn frame(&mut self, text: &str) {
        self.update_stats(Stats::frame_received);

        let message = match serde_json::from_str::<ServerMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                let preview: String = text.chars().take(200).collect();
                tracing::warn!(connection = self.id, "dropping unparseable frame: {}, text=> {:?}", e, preview);
                self.update_stats(Stats::frame_dropped);
                return;
            }
        };
        tracing::debug!(connection = self.id, "received message: {}", message.kind());

        if let Some(usage) = message.usage() {
            self.update_stats(|stats| stats.update_usage(usage));
            tracing::debug!(
                total_tokens = usage.total_token_count(),
                prompt_tokens = usage.prompt_token_count(),
                response_tokens = usage.response_token_count(),
                "usage"
            );
        }

        if matches!(message, ServerMessage::SetupComplete) {
            if !self.state.mark_ready(self.id) {
                tracing::warn!(connection = self.id, "ignoring repeated setup complete");
                return;
            }
            tracing::info!(connection = self.id, "setup complete, session ready");
        }

        self.processor.process(message, self.observer.as_ref());
    }
}

async fn read_loop<R>(mut read: R, mut dispatcher: Dispatcher)
where
    R: Stream<Item = Result<Message, WsError>> + Unpin,
{
    let id = dispatcher.id;
    let mut status = dispatcher.state.subscribe();
    let mut close = None;
    let mut detached = false;

    loop {
        tokio::select! {
            message = read.next() => {
                let Some(message) = message else {
                    break;
                };
                match dispatcher.handle(message) {
                    Step::Continue => {}
                    Step::Closed(reason) => {
                        close = Some(reason);
                        break;
                    }
                    Step::Detached => {
                        detached = true;
                        break;
                    }
                }
            }
            changed = status.changed() => {
                if changed.is_err() || !dispatcher.state.is_current(id) {
                    detached = true;
                    break;
                }
            }
        }
    }

    if detached {
        drain(id, read).await;
        return;
    }
    dispatcher.finish(close.unwrap_or_else(CloseReason::abnormal));
    tracing::debug!(connection = id, "reader stopped");
}

/// Waits a bounded time for the peer to answer our close frame, then drops the socket.
async fn drain<R>(id: u64, mut read: R)
where
    R: Stream<Item = Result<Message, WsError>> + Unpin,
{
    let handshake = tokio::time::timeout(CLOSE_HANDSHAKE_TIMEOUT, async {
        while let Some(Ok(_)) = read.next().await {}
    })
    .await;
    if handshake.is_err() {
        tracing::debug!(connection = id, "peer did not answer close in time");
    }
    tracing::debug!(connection = id, "reader detached");
}
