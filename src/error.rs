use std::time::Duration;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the session core reports.
///
/// Each variant has a stable machine-readable [`code`](Error::code) and says whether an
/// automatic retry makes sense. The core itself never retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("connection error: {message}")]
    Connection {
        kind: ConnectionErrorKind,
        message: String,
        retryable: bool,
    },

    #[error("audio device error: {message}")]
    AudioDevice {
        kind: AudioDeviceErrorKind,
        message: String,
    },

    #[error("session timed out after {} minutes", .media.limit().as_secs() / 60)]
    SessionTimeout { media: SessionMedia },

    #[error("protocol error: {message}")]
    Protocol {
        kind: ProtocolErrorKind,
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// `connect` was called while a connection attempt or session was live.
    AlreadyConnected,
    /// No API key was configured.
    MissingCredential,
    /// The socket could not be opened.
    Handshake,
    /// The setup message could not be built or sent.
    Setup,
    /// The socket failed after it was open.
    Socket,
    /// The socket layer refused an outgoing frame.
    Send,
    /// `disconnect` was called while the connection was still being opened.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioDeviceErrorKind {
    PermissionDenied,
    NotFound,
    Busy,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolErrorKind {
    /// A send was attempted without an open, connected session.
    NotConnected,
    /// An outgoing message could not be serialized.
    Encode,
}

/// What a session streams, which determines how long the service keeps it alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMedia {
    AudioOnly,
    AudioVideo,
}

impl SessionMedia {
    pub fn from_video(has_video: bool) -> Self {
        if has_video {
            SessionMedia::AudioVideo
        } else {
            SessionMedia::AudioOnly
        }
    }

    pub fn limit(&self) -> Duration {
        match self {
            SessionMedia::AudioOnly => Duration::from_secs(15 * 60),
            SessionMedia::AudioVideo => Duration::from_secs(2 * 60),
        }
    }
}

impl Error {
    /// A connection error that is retryable unless its kind says otherwise.
    pub fn connection(kind: ConnectionErrorKind, message: impl Into<String>) -> Self {
        let retryable = !matches!(
            kind,
            ConnectionErrorKind::AlreadyConnected
                | ConnectionErrorKind::MissingCredential
                | ConnectionErrorKind::Cancelled
        );
        Error::Connection {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn audio_device(kind: AudioDeviceErrorKind, message: impl Into<String>) -> Self {
        Error::AudioDevice {
            kind,
            message: message.into(),
        }
    }

    pub fn session_timeout(has_video: bool) -> Self {
        Error::SessionTimeout {
            media: SessionMedia::from_video(has_video),
        }
    }

    pub fn not_connected() -> Self {
        Error::Protocol {
            kind: ProtocolErrorKind::NotConnected,
            message: "not connected yet".to_string(),
        }
    }

    pub fn encode(err: serde_json::Error) -> Self {
        Error::Protocol {
            kind: ProtocolErrorKind::Encode,
            message: err.to_string(),
        }
    }

    /// Overrides the default retry policy of a connection error.
    pub fn with_retryable(self, retryable: bool) -> Self {
        match self {
            Error::Connection { kind, message, .. } => Error::Connection {
                kind,
                message,
                retryable,
            },
            other => other,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::Connection { kind, .. } => match kind {
                ConnectionErrorKind::AlreadyConnected => "ALREADY_CONNECTED",
                ConnectionErrorKind::MissingCredential => "MISSING_API_KEY",
                ConnectionErrorKind::Handshake => "CONNECTION_FAILED",
                ConnectionErrorKind::Setup => "SETUP_FAILED",
                ConnectionErrorKind::Socket => "SOCKET_ERROR",
                ConnectionErrorKind::Send => "SEND_FAILED",
                ConnectionErrorKind::Cancelled => "CONNECTION_CANCELLED",
            },
            Error::AudioDevice { kind, .. } => match kind {
                AudioDeviceErrorKind::PermissionDenied => "AUDIO_PERMISSION_DENIED",
                AudioDeviceErrorKind::NotFound => "AUDIO_DEVICE_NOT_FOUND",
                AudioDeviceErrorKind::Busy => "AUDIO_DEVICE_BUSY",
                AudioDeviceErrorKind::Other => "AUDIO_DEVICE_ERROR",
            },
            Error::SessionTimeout { media } => match media {
                SessionMedia::AudioOnly => "SESSION_TIMEOUT",
                SessionMedia::AudioVideo => "SESSION_TIMEOUT_VIDEO",
            },
            Error::Protocol { kind, .. } => match kind {
                ProtocolErrorKind::NotConnected => "NOT_CONNECTED",
                ProtocolErrorKind::Encode => "ENCODE_FAILED",
            },
        }
    }

    /// Family name of the error, used as a secondary lookup key for user-facing text.
    pub fn name(&self) -> &'static str {
        match self {
            Error::Connection { .. } => "ConnectionError",
            Error::AudioDevice { .. } => "AudioDeviceError",
            Error::SessionTimeout { .. } => "SessionTimeoutError",
            Error::Protocol { .. } => "ProtocolError",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Connection { retryable, .. } => *retryable,
            Error::AudioDevice { .. } => false,
            // a fresh session, never a resumed one
            Error::SessionTimeout { .. } => true,
            Error::Protocol { .. } => false,
        }
    }

    pub fn is_not_connected(&self) -> bool {
        matches!(
            self,
            Error::Protocol {
                kind: ProtocolErrorKind::NotConnected,
                ..
            }
        )
    }
}

/// Why a session's socket closed, classified from the close code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    pub code: u16,
    pub reason: String,
    pub kind: CloseKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    /// 1000
    Normal,
    /// 1001
    GoingAway,
    /// 1006, or the stream ended without a close frame
    Abnormal,
    /// 1007, the server rejected a message
    InvalidPayload,
    /// 1008, typically a bad API key or an unsupported model
    PolicyViolation,
    /// 1011, includes quota exhaustion
    ServerError,
    Other,
}

pub const CLOSE_NORMAL: u16 = 1000;
pub const CLOSE_ABNORMAL: u16 = 1006;

impl CloseReason {
    pub fn new(code: u16, reason: impl Into<String>) -> Self {
        let kind = match code {
            // 1005: a close frame without a status code
            1000 | 1005 => CloseKind::Normal,
            1001 => CloseKind::GoingAway,
            1006 => CloseKind::Abnormal,
            1007 => CloseKind::InvalidPayload,
            1008 => CloseKind::PolicyViolation,
            1011 => CloseKind::ServerError,
            _ => CloseKind::Other,
        };
        Self {
            code,
            reason: reason.into(),
            kind,
        }
    }

    /// The stream ended without a close handshake.
    pub fn abnormal() -> Self {
        Self::new(CLOSE_ABNORMAL, "connection lost")
    }

    pub fn is_normal(&self) -> bool {
        self.kind == CloseKind::Normal
    }

    /// Normal closure or an orderly server shutdown.
    pub fn is_clean(&self) -> bool {
        matches!(self.kind, CloseKind::Normal | CloseKind::GoingAway)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_errors_are_retryable_by_default() {
        let err = Error::connection(ConnectionErrorKind::Handshake, "refused");
        assert!(err.is_retryable());
        assert_eq!(err.code(), "CONNECTION_FAILED");
        assert!(!err.with_retryable(false).is_retryable());
    }

    #[test]
    fn misuse_is_not_retryable() {
        assert!(!Error::connection(ConnectionErrorKind::AlreadyConnected, "busy").is_retryable());
        assert!(!Error::connection(ConnectionErrorKind::MissingCredential, "no key").is_retryable());
        assert!(!Error::not_connected().is_retryable());
        assert!(Error::not_connected().is_not_connected());
    }

    #[test]
    fn audio_device_errors_never_retry() {
        for kind in [
            AudioDeviceErrorKind::PermissionDenied,
            AudioDeviceErrorKind::NotFound,
            AudioDeviceErrorKind::Busy,
            AudioDeviceErrorKind::Other,
        ] {
            let err = Error::audio_device(kind, "mic");
            assert!(!err.is_retryable());
            assert!(!err.clone().with_retryable(true).is_retryable());
        }
    }

    #[test]
    fn session_timeout_caps() {
        let audio = Error::session_timeout(false);
        let video = Error::session_timeout(true);
        assert!(audio.is_retryable() && video.is_retryable());
        assert_eq!(SessionMedia::AudioOnly.limit(), Duration::from_secs(900));
        assert_eq!(SessionMedia::AudioVideo.limit(), Duration::from_secs(120));
        assert_eq!(audio.to_string(), "session timed out after 15 minutes");
        assert_eq!(video.to_string(), "session timed out after 2 minutes");
    }

    #[test]
    fn close_codes_are_classified() {
        assert!(CloseReason::new(1000, "bye").is_normal());
        assert_eq!(CloseReason::new(1008, "API key not valid").kind, CloseKind::PolicyViolation);
        assert_eq!(CloseReason::new(1011, "quota").kind, CloseKind::ServerError);
        assert_eq!(CloseReason::new(4000, "").kind, CloseKind::Other);
        assert_eq!(CloseReason::abnormal().kind, CloseKind::Abnormal);
    }
}
