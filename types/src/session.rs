use std::convert::Infallible;
use std::str::FromStr;

use crate::audio::DEFAULT_VOICE;
use crate::content::Content;
use crate::events::client::{
    AudioTranscriptionConfig, AutomaticActivityDetection, EndSensitivity, GenerationConfig, Modality,
    ProactivityConfig, RealtimeInputConfig, Setup, SpeechConfig, StartSensitivity, ThinkingConfig,
};

pub const DEFAULT_MODEL: &str = "gemini-live-2.5-flash-preview";

/// What the model answers with. Only one modality is active per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseModality {
    #[default]
    Audio,
    Text,
}

/// Voice activity detection sensitivity. The service only knows two levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sensitivity {
    #[default]
    Low,
    High,
}

impl Sensitivity {
    /// Parses `"low"` / `"high"` in any case. Anything else is `Low`.
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("high") {
            Sensitivity::High
        } else {
            Sensitivity::Low
        }
    }
}

impl FromStr for Sensitivity {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Sensitivity::parse_lenient(s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VadConfig {
    /// When false the server does no activity detection; the client signals turns itself.
    pub enabled: bool,
    pub start_sensitivity: Sensitivity,
    pub end_sensitivity: Sensitivity,
    /// Silence required before the server ends the user's turn.
    pub silence_duration_ms: i32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_sensitivity: Sensitivity::High,
            end_sensitivity: Sensitivity::High,
            silence_duration_ms: 500,
        }
    }
}

impl VadConfig {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Which protocol surface a session must talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiSurface {
    Stable,
    /// Required by affective dialog and proactive audio.
    Preview,
}

impl ApiSurface {
    pub fn for_session(config: &SessionConfig) -> Self {
        if config.enable_affective_dialog || config.enable_proactive_audio {
            ApiSurface::Preview
        } else {
            ApiSurface::Stable
        }
    }
}

/// Caller-facing session settings, fixed for the lifetime of one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    model: String,
    response_modality: ResponseModality,
    /// Only used for audio responses.
    voice: String,
    system_instruction: String,
    /// Zero or less disables extended reasoning.
    thinking_budget: i32,
    enable_affective_dialog: bool,
    enable_proactive_audio: bool,
    enable_input_transcription: bool,
    enable_output_transcription: bool,
    vad: Option<VadConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            response_modality: ResponseModality::Audio,
            voice: DEFAULT_VOICE.to_string(),
            system_instruction: String::new(),
            thinking_budget: 0,
            enable_affective_dialog: false,
            enable_proactive_audio: false,
            enable_input_transcription: false,
            enable_output_transcription: false,
            vad: Some(VadConfig::default()),
        }
    }
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn response_modality(&self) -> ResponseModality {
        self.response_modality
    }

    pub fn voice(&self) -> &str {
        &self.voice
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn thinking_budget(&self) -> i32 {
        self.thinking_budget
    }

    pub fn affective_dialog(&self) -> bool {
        self.enable_affective_dialog
    }

    pub fn proactive_audio(&self) -> bool {
        self.enable_proactive_audio
    }

    pub fn input_transcription(&self) -> bool {
        self.enable_input_transcription
    }

    pub fn output_transcription(&self) -> bool {
        self.enable_output_transcription
    }

    pub fn vad(&self) -> Option<&VadConfig> {
        self.vad.as_ref()
    }

    pub fn api_surface(&self) -> ApiSurface {
        ApiSurface::for_session(self)
    }
}

pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.config.model = model.to_string();
        self
    }

    pub fn with_response_modality(mut self, modality: ResponseModality) -> Self {
        self.config.response_modality = modality;
        self
    }

    pub fn with_voice(mut self, voice: &str) -> Self {
        self.config.voice = voice.to_string();
        self
    }

    pub fn with_system_instruction(mut self, instruction: &str) -> Self {
        self.config.system_instruction = instruction.to_string();
        self
    }

    pub fn with_thinking_budget(mut self, budget: i32) -> Self {
        self.config.thinking_budget = budget;
        self
    }

    pub fn with_affective_dialog(mut self, enabled: bool) -> Self {
        self.config.enable_affective_dialog = enabled;
        self
    }

    pub fn with_proactive_audio(mut self, enabled: bool) -> Self {
        self.config.enable_proactive_audio = enabled;
        self
    }

    pub fn with_input_transcription(mut self, enabled: bool) -> Self {
        self.config.enable_input_transcription = enabled;
        self
    }

    pub fn with_output_transcription(mut self, enabled: bool) -> Self {
        self.config.enable_output_transcription = enabled;
        self
    }

    pub fn with_vad(mut self, vad: VadConfig) -> Self {
        self.config.vad = Some(vad);
        self
    }

    /// Leaves `realtime_input_config` out of the setup message so the server default applies.
    pub fn without_vad(mut self) -> Self {
        self.config.vad = None;
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}

/// Translates a [`SessionConfig`] into the `setup` message sent when the socket opens.
///
/// This is the only place that knows the wire layout of the session settings. Note that
/// affective dialog goes inside `generation_config` while proactivity sits beside it.
pub fn build_setup_message(config: &SessionConfig) -> Setup {
    let audio = config.response_modality == ResponseModality::Audio;

    let voice = config.voice.trim();
    let speech_config = (audio && !voice.is_empty()).then(|| SpeechConfig::prebuilt(voice));

    let thinking_config = (config.thinking_budget > 0).then(|| ThinkingConfig {
        thinking_budget: config.thinking_budget,
        include_thoughts: true,
    });

    let generation_config = GenerationConfig {
        response_modalities: vec![match config.response_modality {
            ResponseModality::Audio => Modality::Audio,
            ResponseModality::Text => Modality::Text,
        }],
        speech_config,
        thinking_config,
        enable_affective_dialog: config.enable_affective_dialog.then_some(true),
    };

    let instruction = config.system_instruction.trim();
    let system_instruction = (!instruction.is_empty()).then(|| Content::text(instruction));

    let realtime_input_config = config.vad.as_ref().map(|vad| RealtimeInputConfig {
        automatic_activity_detection: activity_detection(vad),
    });

    Setup {
        model: qualified_model_name(&config.model),
        generation_config: Some(generation_config),
        system_instruction,
        realtime_input_config,
        input_audio_transcription: config.enable_input_transcription.then(AudioTranscriptionConfig::default),
        output_audio_transcription: config.enable_output_transcription.then(AudioTranscriptionConfig::default),
        proactivity: config.enable_proactive_audio.then_some(ProactivityConfig { proactive_audio: true }),
    }
}

fn activity_detection(vad: &VadConfig) -> AutomaticActivityDetection {
    if !vad.enabled {
        return AutomaticActivityDetection {
            disabled: Some(true),
            ..Default::default()
        };
    }
    AutomaticActivityDetection {
        disabled: None,
        start_of_speech_sensitivity: Some(match vad.start_sensitivity {
            Sensitivity::Low => StartSensitivity::Low,
            Sensitivity::High => StartSensitivity::High,
        }),
        end_of_speech_sensitivity: Some(match vad.end_sensitivity {
            Sensitivity::Low => EndSensitivity::Low,
            Sensitivity::High => EndSensitivity::High,
        }),
        silence_duration_ms: Some(vad.silence_duration_ms),
    }
}

fn qualified_model_name(model: &str) -> String {
    let model = model.trim();
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}
