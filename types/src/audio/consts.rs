/// Sample rate of PCM16 audio sent from the microphone.
pub const INPUT_SAMPLE_RATE: u32 = 16_000;

/// Sample rate of PCM16 audio produced by the model.
pub const OUTPUT_SAMPLE_RATE: u32 = 24_000;

/// MIME type attached to outgoing microphone chunks.
pub const INPUT_AUDIO_MIME: &str = "audio/pcm;rate=16000";

/// MIME type the service uses for model audio.
pub const OUTPUT_AUDIO_MIME: &str = "audio/pcm;rate=24000";

/// MIME type attached to outgoing screen or camera frames.
pub const SCREEN_FRAME_MIME: &str = "image/jpeg";

/// Voice used when the caller doesn't pick one.
pub const DEFAULT_VOICE: &str = "Puck";
