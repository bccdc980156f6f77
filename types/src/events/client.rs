use crate::content::{Blob, Content};

/// `setup` message, the first frame of every session.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Setup {
    /// Fully qualified model name, e.g. `models/gemini-live-2.5-flash-preview`
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub realtime_input_config: Option<RealtimeInputConfig>,

    /// Presence enables transcription of the user's audio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<AudioTranscriptionConfig>,

    /// Presence enables transcription of the model's audio.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_transcription: Option<AudioTranscriptionConfig>,

    /// Top level, unlike affective dialog which lives in the generation config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proactivity: Option<ProactivityConfig>,
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum Modality {
    #[serde(rename = "AUDIO")]
    Audio,
    #[serde(rename = "TEXT")]
    Text,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct GenerationConfig {
    pub response_modalities: Vec<Modality>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_config: Option<SpeechConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_affective_dialog: Option<bool>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct SpeechConfig {
    pub voice_config: VoiceConfig,
}

impl SpeechConfig {
    pub fn prebuilt(voice_name: &str) -> Self {
        Self {
            voice_config: VoiceConfig {
                prebuilt_voice_config: PrebuiltVoiceConfig {
                    voice_name: voice_name.to_string(),
                },
            },
        }
    }

    pub fn voice_name(&self) -> &str {
        &self.voice_config.prebuilt_voice_config.voice_name
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct VoiceConfig {
    pub prebuilt_voice_config: PrebuiltVoiceConfig,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct PrebuiltVoiceConfig {
    pub voice_name: String,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ThinkingConfig {
    pub thinking_budget: i32,
    pub include_thoughts: bool,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct RealtimeInputConfig {
    pub automatic_activity_detection: AutomaticActivityDetection,
}

/// Server-side voice activity detection settings.
///
/// When `disabled` is set the other fields are omitted and the client marks turns with
/// `activity_start` / `activity_end`.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct AutomaticActivityDetection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_of_speech_sensitivity: Option<StartSensitivity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_of_speech_sensitivity: Option<EndSensitivity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub silence_duration_ms: Option<i32>,
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum StartSensitivity {
    #[serde(rename = "START_SENSITIVITY_LOW")]
    Low,
    #[serde(rename = "START_SENSITIVITY_HIGH")]
    High,
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum EndSensitivity {
    #[serde(rename = "END_SENSITIVITY_LOW")]
    Low,
    #[serde(rename = "END_SENSITIVITY_HIGH")]
    High,
}

/// Empty marker; only its presence matters.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct AudioTranscriptionConfig {}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ProactivityConfig {
    pub proactive_audio: bool,
}

/// `realtime_input` message. Exactly one field is set per message.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct RealtimeInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<Blob>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<Blob>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_start: Option<ActivityStart>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_end: Option<ActivityEnd>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_stream_end: Option<bool>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ActivityStart {}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ActivityEnd {}

impl RealtimeInput {
    pub fn audio(blob: Blob) -> Self {
        Self {
            audio: Some(blob),
            ..Default::default()
        }
    }

    pub fn video(blob: Blob) -> Self {
        Self {
            video: Some(blob),
            ..Default::default()
        }
    }

    pub fn activity_start() -> Self {
        Self {
            activity_start: Some(ActivityStart {}),
            ..Default::default()
        }
    }

    pub fn activity_end() -> Self {
        Self {
            activity_end: Some(ActivityEnd {}),
            ..Default::default()
        }
    }

    /// Tells the server the microphone was closed so it can flush buffered audio.
    pub fn audio_stream_end() -> Self {
        Self {
            audio_stream_end: Some(true),
            ..Default::default()
        }
    }
}

/// `client_content` message: complete conversation turns, typically typed text.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct ClientContent {
    pub turns: Vec<Content>,
    pub turn_complete: bool,
}

impl ClientContent {
    pub fn new(turns: Vec<Content>, turn_complete: bool) -> Self {
        Self {
            turns,
            turn_complete,
        }
    }
}
