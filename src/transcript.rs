use chrono::{DateTime, Utc};

use crate::observer::SessionEvent;
use crate::types::Role;

/// One line of the conversation as shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptMessage {
    pub id: u64,
    pub role: Role,
    pub text: String,
    /// When the first delta of this line arrived.
    pub timestamp: DateTime<Utc>,
    /// False while deltas may still be appended.
    pub is_final: bool,
}

/// Accumulates transcription and text deltas into transcript lines.
///
/// Each role has at most one open line. Deltas extend it; a turn boundary closes it.
#[derive(Debug, Default)]
pub struct TranscriptLog {
    messages: Vec<TranscriptMessage>,
    next_id: u64,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[TranscriptMessage] {
        &self.messages
    }

    fn open_line(&mut self, role: Role) -> Option<&mut TranscriptMessage> {
        self.messages.iter_mut().rev().find(|m| m.role == role && !m.is_final)
    }

    pub fn append(&mut self, role: Role, delta: &str) {
        if delta.is_empty() {
            return;
        }
        if let Some(line) = self.open_line(role) {
            line.text.push_str(delta);
            return;
        }
        self.next_id += 1;
        self.messages.push(TranscriptMessage {
            id: self.next_id,
            role,
            text: delta.to_string(),
            timestamp: Utc::now(),
            is_final: false,
        });
    }

    /// Closes the open line of `role`, if any.
    pub fn commit(&mut self, role: Role) {
        if let Some(line) = self.open_line(role) {
            line.is_final = true;
        }
    }

    pub fn end_turn(&mut self) {
        self.commit(Role::User);
        self.commit(Role::Model);
    }

    /// Discards the model's open line: content of an interrupted turn is void.
    pub fn interrupt(&mut self) {
        self.messages.retain(|m| m.role != Role::Model || m.is_final);
    }

    /// Removes and returns the closed lines, oldest first, e.g. for archiving.
    pub fn take_final(&mut self) -> Vec<TranscriptMessage> {
        let (done, open): (Vec<_>, Vec<_>) = std::mem::take(&mut self.messages)
            .into_iter()
            .partition(|m| m.is_final);
        self.messages = open;
        done
    }

    /// Feeds a session event into the log; events that carry no transcript are ignored.
    pub fn observe(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::InputTranscription(text) => self.append(Role::User, text),
            SessionEvent::OutputTranscription(text) | SessionEvent::Text(text) => self.append(Role::Model, text),
            SessionEvent::TurnComplete => self.end_turn(),
            SessionEvent::Interrupted => self.interrupt(),
            _ => {}
        }
    }
}
