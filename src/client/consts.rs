use std::time::Duration;

pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";

pub const DEFAULT_HOST: &str = "generativelanguage.googleapis.com";

pub const STABLE_PATH: &str = "ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";
pub const PREVIEW_PATH: &str = "ws/google.ai.generativelanguage.v1alpha.GenerativeService.BidiGenerateContent";

pub const DEFAULT_CAPACITY: usize = 1024;

pub const CLIENT_CLOSE_REASON: &str = "Client disconnect";

/// How long a released connection waits for the server to answer its close frame.
pub const CLOSE_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
