pub mod client;
pub mod server;

pub use client::*;
pub use server::*;

/// Every frame the client may send. Serialized externally tagged, e.g. `{"setup": {...}}`.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ClientMessage {
    Setup(Setup),
    RealtimeInput(RealtimeInput),
    ClientContent(ClientContent),
}

/// Every frame the server may send, decided once at deserialization time.
#[derive(Debug, Clone, serde::Deserialize, PartialEq)]
#[serde(try_from = "server::ServerEnvelope")]
pub enum ServerMessage {
    /// The server accepted the `setup` message.
    SetupComplete,
    /// Model output and turn signals, optionally with usage piggybacked on the same frame.
    ServerContent {
        content: ServerContent,
        usage: Option<UsageMetadata>,
    },
    /// Standalone token accounting.
    UsageMetadata(UsageMetadata),
    /// The server is about to close the session.
    GoAway(GoAway),
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::SetupComplete => "setup_complete",
            ServerMessage::ServerContent { .. } => "server_content",
            ServerMessage::UsageMetadata(_) => "usage_metadata",
            ServerMessage::GoAway(_) => "go_away",
        }
    }

    pub fn usage(&self) -> Option<&UsageMetadata> {
        match self {
            ServerMessage::ServerContent { usage, .. } => usage.as_ref(),
            ServerMessage::UsageMetadata(usage) => Some(usage),
            _ => None,
        }
    }
}
