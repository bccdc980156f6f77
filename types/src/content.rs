use crate::audio::{self, Base64EncodedAudioBytes};

/// Who authored a piece of content.
#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "model")]
    Model,
}

/// A multi-part message, used for conversation turns and the system instruction.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: &str) -> Self {
        Self {
            role: Some(Role::User),
            parts: vec![Part::text(text)],
        }
    }

    /// Content without a role, as the system instruction is sent.
    pub fn text(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

/// One piece of a [`Content`]: either text or inline media.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(alias = "inlineData", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,

    /// A reasoning summary rather than answer content
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub thought: bool,
}

impl Part {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            inline_data: None,
            thought: false,
        }
    }

    pub fn inline(blob: Blob) -> Self {
        Self {
            text: None,
            inline_data: Some(blob),
            thought: false,
        }
    }
}

/// Inline media: a MIME type plus base64 payload.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Blob {
    #[serde(alias = "mimeType")]
    pub mime_type: String,

    pub data: Base64EncodedAudioBytes,
}

impl Blob {
    pub fn new(mime_type: &str, data: Base64EncodedAudioBytes) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            data,
        }
    }

    /// Encodes `bytes` for transport.
    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self::new(mime_type, audio::encode(bytes))
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        audio::decode(&self.data)
    }

    pub fn is_audio(&self) -> bool {
        audio::is_audio_mime(&self.mime_type)
    }
}
