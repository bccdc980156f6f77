use std::fmt;

use crate::content::{Content, Part};
use crate::events::ServerMessage;

/// Model output and turn-taking signals.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ServerContent {
    #[serde(alias = "modelTurn", skip_serializing_if = "Option::is_none")]
    model_turn: Option<Content>,

    /// The model finished its turn
    #[serde(alias = "turnComplete", default)]
    turn_complete: bool,

    /// The model's turn was cut off, usually because the user started speaking
    #[serde(default)]
    interrupted: bool,

    /// The model finished generating; playback of the turn may still be in flight
    #[serde(alias = "generationComplete", default)]
    generation_complete: bool,

    #[serde(alias = "inputTranscription", skip_serializing_if = "Option::is_none")]
    input_transcription: Option<Transcription>,

    #[serde(alias = "outputTranscription", skip_serializing_if = "Option::is_none")]
    output_transcription: Option<Transcription>,
}

impl ServerContent {
    pub fn model_turn(&self) -> Option<&Content> {
        self.model_turn.as_ref()
    }

    /// Parts of the model turn, empty when there is none.
    pub fn parts(&self) -> &[Part] {
        match &self.model_turn {
            Some(turn) => &turn.parts,
            None => &[],
        }
    }

    pub fn turn_complete(&self) -> bool {
        self.turn_complete
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn generation_complete(&self) -> bool {
        self.generation_complete
    }

    pub fn input_transcription(&self) -> Option<&str> {
        self.input_transcription.as_ref().map(|t| t.text.as_str())
    }

    pub fn output_transcription(&self) -> Option<&str> {
        self.output_transcription.as_ref().map(|t| t.text.as_str())
    }
}

/// A transcription delta. Deltas are appended by the caller, never replaced.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Transcription {
    #[serde(default)]
    text: String,
}

/// Token accounting for the session so far.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct UsageMetadata {
    #[serde(alias = "promptTokenCount", default)]
    prompt_token_count: u32,

    #[serde(alias = "responseTokenCount", default)]
    response_token_count: u32,

    #[serde(alias = "totalTokenCount", default)]
    total_token_count: u32,

    #[serde(alias = "promptTokensDetails", default, skip_serializing_if = "Vec::is_empty")]
    prompt_tokens_details: Vec<ModalityTokenCount>,

    #[serde(alias = "responseTokensDetails", default, skip_serializing_if = "Vec::is_empty")]
    response_tokens_details: Vec<ModalityTokenCount>,
}

impl UsageMetadata {
    pub fn prompt_token_count(&self) -> u32 {
        self.prompt_token_count
    }

    pub fn response_token_count(&self) -> u32 {
        self.response_token_count
    }

    pub fn total_token_count(&self) -> u32 {
        self.total_token_count
    }

    pub fn prompt_tokens_details(&self) -> &[ModalityTokenCount] {
        &self.prompt_tokens_details
    }

    pub fn response_tokens_details(&self) -> &[ModalityTokenCount] {
        &self.response_tokens_details
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ModalityTokenCount {
    modality: String,

    #[serde(alias = "tokenCount", default)]
    token_count: u32,
}

impl ModalityTokenCount {
    pub fn modality(&self) -> &str {
        &self.modality
    }

    pub fn token_count(&self) -> u32 {
        self.token_count
    }
}

/// `goAway` notice sent shortly before the server terminates the connection.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct GoAway {
    /// Protobuf duration string, e.g. "10s"
    #[serde(alias = "timeLeft", skip_serializing_if = "Option::is_none")]
    time_left: Option<String>,
}

impl GoAway {
    pub fn time_left(&self) -> Option<&str> {
        self.time_left.as_deref()
    }
}

/// Raw shape of a server frame before it's narrowed to one [`ServerMessage`] variant.
#[derive(Debug, serde::Deserialize)]
#[doc(hidden)]
pub struct ServerEnvelope {
    #[serde(alias = "setupComplete")]
    setup_complete: Option<serde_json::Value>,

    #[serde(alias = "serverContent")]
    server_content: Option<ServerContent>,

    #[serde(alias = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,

    #[serde(alias = "goAway")]
    go_away: Option<GoAway>,
}

#[derive(Debug)]
pub struct UnrecognizedServerMessage;

impl fmt::Display for UnrecognizedServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("server message carries no recognized payload")
    }
}

impl TryFrom<ServerEnvelope> for ServerMessage {
    type Error = UnrecognizedServerMessage;

    fn try_from(envelope: ServerEnvelope) -> Result<Self, Self::Error> {
        if envelope.setup_complete.is_some() {
            return Ok(ServerMessage::SetupComplete);
        }
        if let Some(content) = envelope.server_content {
            return Ok(ServerMessage::ServerContent {
                content,
                usage: envelope.usage_metadata,
            });
        }
        if let Some(usage) = envelope.usage_metadata {
            return Ok(ServerMessage::UsageMetadata(usage));
        }
        if let Some(go_away) = envelope.go_away {
            return Ok(ServerMessage::GoAway(go_away));
        }
        Err(UnrecognizedServerMessage)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_server_content_defaults() {
        let content: ServerContent = serde_json::from_str("{}").unwrap();
        assert!(!content.turn_complete());
        assert!(!content.interrupted());
        assert!(content.parts().is_empty());
        assert_eq!(content.input_transcription(), None);
    }

    #[test]
    fn test_transcriptions() {
        let content: ServerContent = serde_json::from_str(
            r#"{"inputTranscription": {"text": "hi"}, "output_transcription": {"text": "hello"}}"#,
        )
        .unwrap();
        assert_eq!(content.input_transcription(), Some("hi"));
        assert_eq!(content.output_transcription(), Some("hello"));
    }
}
