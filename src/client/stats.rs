use crate::types::events::UsageMetadata;

/// Running totals for one client across its sessions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    total_tokens: u64,
    prompt_tokens: u64,
    response_tokens: u64,
    frames_received: u64,
    frames_dropped: u64,
}

impl Stats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn update_usage(&mut self, usage: &UsageMetadata) {
        self.total_tokens += u64::from(usage.total_token_count());
        self.prompt_tokens += u64::from(usage.prompt_token_count());
        self.response_tokens += u64::from(usage.response_token_count());
    }

    pub(crate) fn frame_received(&mut self) {
        self.frames_received += 1;
    }

    pub(crate) fn frame_dropped(&mut self) {
        self.frames_dropped += 1;
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn prompt_tokens(&self) -> u64 {
        self.prompt_tokens
    }

    pub fn response_tokens(&self) -> u64 {
        self.response_tokens
    }

    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    /// Frames that arrived but could not be parsed.
    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped
    }
}
