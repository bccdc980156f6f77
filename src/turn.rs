use crate::observer::SessionObserver;
use crate::types::events::{ServerContent, ServerMessage};

/// Who currently holds the floor, inferred from turn events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Speaker {
    #[default]
    None,
    User,
    Model,
}

/// Interprets decoded server messages and drives the observer.
#[derive(Debug, Default)]
pub struct TurnProcessor {
    speaker: Speaker,
}

impl TurnProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn process(&mut self, message: ServerMessage, observer: &dyn SessionObserver) {
        match message {
            ServerMessage::SetupComplete => observer.on_setup_complete(),
            ServerMessage::ServerContent { content, usage } => {
                self.server_content(&content, observer);
                if let Some(usage) = usage {
                    observer.on_usage(&usage);
                }
            }
            ServerMessage::UsageMetadata(usage) => observer.on_usage(&usage),
            ServerMessage::GoAway(go_away) => {
                tracing::warn!(time_left = ?go_away.time_left(), "server is going away");
                observer.on_go_away(go_away.time_left());
            }
        }
    }

    fn server_content(&mut self, content: &ServerContent, observer: &dyn SessionObserver) {
        if content.interrupted() {
            // nothing else on an interrupted message is meaningful
            tracing::debug!("model turn interrupted");
            observer.on_interrupted();
            self.set_speaker(Speaker::User, observer);
            return;
        }

        if let Some(text) = content.input_transcription().filter(|t| !t.is_empty()) {
            self.set_speaker(Speaker::User, observer);
            observer.on_input_transcription(text);
        }
        if let Some(text) = content.output_transcription().filter(|t| !t.is_empty()) {
            self.set_speaker(Speaker::Model, observer);
            observer.on_output_transcription(text);
        }

        for part in content.parts() {
            if part.thought {
                tracing::trace!("skipping thought part");
                continue;
            }
            if let Some(text) = &part.text {
                self.set_speaker(Speaker::Model, observer);
                observer.on_text(text);
            }
            if let Some(blob) = &part.inline_data {
                if !blob.is_audio() {
                    tracing::debug!(mime_type = %blob.mime_type, "skipping non-audio inline data");
                    continue;
                }
                match blob.decode() {
                    Ok(pcm) => {
                        self.set_speaker(Speaker::Model, observer);
                        observer.on_audio(&pcm);
                    }
                    Err(e) => tracing::warn!("failed to decode model audio: {}", e),
                }
            }
        }

        if content.turn_complete() {
            observer.on_turn_complete();
            self.set_speaker(Speaker::None, observer);
        }
    }

    fn set_speaker(&mut self, speaker: Speaker, observer: &dyn SessionObserver) {
        if self.speaker != speaker {
            self.speaker = speaker;
            observer.on_speaker_changed(speaker);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::SessionEvent;
    use crate::types::audio;
    use tokio::sync::mpsc;

    fn run(processor: &mut TurnProcessor, frames: &[&str]) -> Vec<SessionEvent> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        for frame in frames {
            let message: ServerMessage = serde_json::from_str(frame).unwrap();
            processor.process(message, &tx);
        }
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn without_speaker(events: Vec<SessionEvent>) -> Vec<SessionEvent> {
        events
            .into_iter()
            .filter(|e| !matches!(e, SessionEvent::SpeakerChanged(_)))
            .collect()
    }

    #[test]
    fn setup_complete_only_signals_ready() {
        let events = run(&mut TurnProcessor::new(), &[r#"{"setupComplete": {}}"#]);
        assert_eq!(events, vec![SessionEvent::SetupComplete]);
    }

    #[test]
    fn interrupted_message_suppresses_everything_else() {
        let audio = audio::encode(&[1, 2, 3]);
        let interrupted = format!(
            r#"{{"serverContent": {{
                "interrupted": true,
                "turnComplete": true,
                "inputTranscription": {{"text": "wait"}},
                "outputTranscription": {{"text": "so"}},
                "modelTurn": {{"parts": [{{"text": "ignored"}}, {{"inlineData": {{"mimeType": "audio/pcm;rate=24000", "data": "{audio}"}}}}]}}
            }}}}"#
        );
        let mut processor = TurnProcessor::new();
        let events = without_speaker(run(
            &mut processor,
            &[
                r#"{"serverContent": {"modelTurn": {"parts": [{"text": "Once upon"}]}}}"#,
                interrupted.as_str(),
                r#"{"serverContent": {"modelTurn": {"parts": [{"text": "Sure"}]}, "turnComplete": true}}"#,
            ],
        ));
        assert_eq!(
            events,
            vec![
                SessionEvent::Text("Once upon".into()),
                SessionEvent::Interrupted,
                SessionEvent::Text("Sure".into()),
                SessionEvent::TurnComplete,
            ]
        );
    }

    #[test]
    fn dispatch_order_within_one_message() {
        let audio = audio::encode(&[0, 255, 128]);
        let frame = format!(
            r#"{{"serverContent": {{
                "turnComplete": true,
                "inputTranscription": {{"text": "hello"}},
                "outputTranscription": {{"text": "hi there"}},
                "modelTurn": {{"parts": [{{"text": "hi"}}, {{"inlineData": {{"mimeType": "audio/pcm;rate=24000", "data": "{audio}"}}}}]}}
            }}}}"#
        );
        let events = without_speaker(run(&mut TurnProcessor::new(), &[frame.as_str()]));
        assert_eq!(
            events,
            vec![
                SessionEvent::InputTranscription("hello".into()),
                SessionEvent::OutputTranscription("hi there".into()),
                SessionEvent::Text("hi".into()),
                SessionEvent::Audio(vec![0, 255, 128]),
                SessionEvent::TurnComplete,
            ]
        );
    }

    #[test]
    fn non_audio_and_corrupt_media_are_skipped() {
        let frame = r#"{"serverContent": {"modelTurn": {"parts": [
            {"inlineData": {"mimeType": "image/png", "data": "AAAA"}},
            {"inlineData": {"mimeType": "audio/pcm;rate=24000", "data": "%%%"}},
            {"text": "still here"}
        ]}}}"#;
        let events = without_speaker(run(&mut TurnProcessor::new(), &[frame]));
        assert_eq!(events, vec![SessionEvent::Text("still here".into())]);
    }

    #[test]
    fn thought_parts_are_not_text() {
        let frame = r#"{"serverContent": {"modelTurn": {"parts": [
            {"text": "**Planning** the user wants a greeting", "thought": true},
            {"text": "Hello!"}
        ]}, "turnComplete": true}}"#;
        let events = without_speaker(run(&mut TurnProcessor::new(), &[frame]));
        assert_eq!(events, vec![SessionEvent::Text("Hello!".into()), SessionEvent::TurnComplete]);
    }

    #[test]
    fn empty_transcriptions_are_not_emitted() {
        let frame = r#"{"serverContent": {"inputTranscription": {"text": ""}, "outputTranscription": {}}}"#;
        assert!(run(&mut TurnProcessor::new(), &[frame]).is_empty());
    }

    #[test]
    fn speaker_follows_turns() {
        let mut processor = TurnProcessor::new();
        let events = run(
            &mut processor,
            &[
                r#"{"serverContent": {"inputTranscription": {"text": "hey"}}}"#,
                r#"{"serverContent": {"inputTranscription": {"text": " you"}}}"#,
                r#"{"serverContent": {"modelTurn": {"parts": [{"text": "yes?"}]}}}"#,
            ],
        );
        let speakers: Vec<_> = events
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::SpeakerChanged(s) => Some(s),
                _ => None,
            })
            .collect();
        assert_eq!(speakers, vec![Speaker::User, Speaker::Model]);
        assert_eq!(processor.speaker(), Speaker::Model);

        run(&mut processor, &[r#"{"serverContent": {"turnComplete": true}}"#]);
        assert_eq!(processor.speaker(), Speaker::None);
    }

    #[test]
    fn usage_and_go_away_are_forwarded() {
        let events = run(
            &mut TurnProcessor::new(),
            &[
                r#"{"serverContent": {"turnComplete": true}, "usageMetadata": {"totalTokenCount": 12}}"#,
                r#"{"goAway": {"timeLeft": "5s"}}"#,
            ],
        );
        assert!(matches!(&events[0], SessionEvent::TurnComplete));
        assert!(matches!(&events[1], SessionEvent::Usage(u) if u.total_token_count() == 12));
        assert_eq!(events[2], SessionEvent::GoAway(Some("5s".into())));
    }
}
