use secrecy::SecretString;

use crate::client::consts::{DEFAULT_CAPACITY, DEFAULT_HOST, GEMINI_API_KEY};

/// Where and how to reach the service. Session behaviour lives in
/// [`SessionConfig`](crate::types::SessionConfig).
#[derive(Debug)]
pub struct Config {
    host: String,
    api_key: SecretString,
    capacity: usize,
}

pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    /// Host name; a scheme prefix and trailing slashes are tolerated and stripped.
    pub fn with_host(mut self, host: &str) -> Self {
        self.config.host = host.to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.config.api_key = SecretString::from(api_key.to_string());
        self
    }

    /// Number of outgoing frames that may queue before sends wait.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity.max(1);
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Defaults, with the API key taken from `GEMINI_API_KEY` if set.
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            api_key: std::env::var(GEMINI_API_KEY).unwrap_or_default().into(),
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn api_key(&self) -> &SecretString {
        &self.api_key
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
