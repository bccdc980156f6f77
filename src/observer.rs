use tokio::sync::mpsc;

use crate::error::{CloseReason, Error};
use crate::turn::Speaker;
use crate::types::events::UsageMetadata;

/// Receives everything a session reports, one method per event.
///
/// Calls for one client never overlap. Frame callbacks arrive in frame order, and once
/// `on_close` has been delivered for a connection nothing more arrives from it. Calls
/// are made with an internal lock held and may come from the connection's own tasks or the
/// task calling `connect`/`disconnect`, so return quickly and hand heavy work such as
/// playback to another task.
pub trait SessionObserver: Send + Sync + 'static {
    /// The socket is open and the setup message was sent.
    fn on_open(&self) {}

    /// The server accepted the setup message; the session is ready.
    fn on_setup_complete(&self) {}

    fn on_close(&self, _reason: &CloseReason) {}

    fn on_error(&self, _error: &Error) {}

    /// Decoded model audio, PCM16 at 24 kHz.
    fn on_audio(&self, _pcm: &[u8]) {}

    fn on_text(&self, _text: &str) {}

    fn on_input_transcription(&self, _text: &str) {}

    fn on_output_transcription(&self, _text: &str) {}

    /// The model's current turn was cut off. Anything buffered for playback is stale.
    fn on_interrupted(&self) {}

    fn on_turn_complete(&self) {}

    fn on_speaker_changed(&self, _speaker: Speaker) {}

    fn on_usage(&self, _usage: &UsageMetadata) {}

    fn on_go_away(&self, _time_left: Option<&str>) {}
}

/// Owned form of every observer callback, for channel-based consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Open,
    SetupComplete,
    Close(CloseReason),
    Error(Error),
    Audio(Vec<u8>),
    Text(String),
    InputTranscription(String),
    OutputTranscription(String),
    Interrupted,
    TurnComplete,
    SpeakerChanged(Speaker),
    Usage(UsageMetadata),
    GoAway(Option<String>),
}

impl SessionObserver for mpsc::UnboundedSender<SessionEvent> {
    fn on_open(&self) {
        forward(self, SessionEvent::Open);
    }

    fn on_setup_complete(&self) {
        forward(self, SessionEvent::SetupComplete);
    }

    fn on_close(&self, reason: &CloseReason) {
        forward(self, SessionEvent::Close(reason.clone()));
    }

    fn on_error(&self, error: &Error) {
        forward(self, SessionEvent::Error(error.clone()));
    }

    fn on_audio(&self, pcm: &[u8]) {
        forward(self, SessionEvent::Audio(pcm.to_vec()));
    }

    fn on_text(&self, text: &str) {
        forward(self, SessionEvent::Text(text.to_string()));
    }

    fn on_input_transcription(&self, text: &str) {
        forward(self, SessionEvent::InputTranscription(text.to_string()));
    }

    fn on_output_transcription(&self, text: &str) {
        forward(self, SessionEvent::OutputTranscription(text.to_string()));
    }

    fn on_interrupted(&self) {
        forward(self, SessionEvent::Interrupted);
    }

    fn on_turn_complete(&self) {
        forward(self, SessionEvent::TurnComplete);
    }

    fn on_speaker_changed(&self, speaker: Speaker) {
        forward(self, SessionEvent::SpeakerChanged(speaker));
    }

    fn on_usage(&self, usage: &UsageMetadata) {
        forward(self, SessionEvent::Usage(usage.clone()));
    }

    fn on_go_away(&self, time_left: Option<&str>) {
        forward(self, SessionEvent::GoAway(time_left.map(str::to_string)));
    }
}

fn forward(tx: &mpsc::UnboundedSender<SessionEvent>, event: SessionEvent) {
    if tx.send(event).is_err() {
        tracing::trace!("session event receiver dropped");
    }
}
