//! Observes relayed realtime events and keeps what the interview needs.

use chrono::Utc;
use serde::Serialize;

use crate::interview::session::{Speaker, TranscriptEntry};
use crate::realtime::audio::{duration_ms, pcm16_sample_count};
use crate::realtime::protocol::{ClientEvent, ServerEvent};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub input_audio_ms: u64,
    pub output_audio_ms: u64,
    pub responses: u32,
    pub user_turns: u32,
    pub errors: u32,
}

#[derive(Debug, Default)]
pub struct SessionRecorder {
    transcript: Vec<TranscriptEntry>,
    assistant_partial: String,
    input_samples: usize,
    output_samples: usize,
    responses: u32,
    errors: Vec<String>,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, speaker: Speaker, text: &str) {
        let text = text.trim();
        if !text.is_empty() {
            self.transcript.push(TranscriptEntry {
                speaker,
                text: text.to_string(),
                at: Utc::now(),
            });
        }
    }

    pub fn observe_client(&mut self, event: &ClientEvent) {
        if let ClientEvent::InputAudioBufferAppend { audio } = event {
            match pcm16_sample_count(audio) {
                Ok(count) => self.input_samples += count,
                Err(e) => self.errors.push(format!("client audio: {e}")),
            }
        }
    }

    pub fn observe_server(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::AudioDelta { delta } => match pcm16_sample_count(delta) {
                Ok(count) => self.output_samples += count,
                Err(e) => self.errors.push(format!("provider audio: {e}")),
            },
            ServerEvent::AudioTranscriptDelta { delta } => self.assistant_partial.push_str(delta),
            ServerEvent::AudioTranscriptDone { transcript } => {
                let text = if transcript.trim().is_empty() {
                    std::mem::take(&mut self.assistant_partial)
                } else {
                    self.assistant_partial.clear();
                    transcript.clone()
                };
                self.push(Speaker::Assistant, &text);
            }
            ServerEvent::InputTranscriptionCompleted { transcript } => {
                self.push(Speaker::User, transcript)
            }
            ServerEvent::ResponseDone => self.responses += 1,
            ServerEvent::Error { error } => self.errors.push(error.message.clone()),
            _ => {}
        }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            input_audio_ms: duration_ms(self.input_samples),
            output_audio_ms: duration_ms(self.output_samples),
            responses: self.responses,
            user_turns: self
                .transcript
                .iter()
                .filter(|e| e.speaker == Speaker::User)
                .count() as u32,
            errors: self.errors.len() as u32,
        }
    }

    /// Ends the recording. An assistant transcript cut off mid-response is
    /// kept as a final entry.
    pub fn finish(mut self) -> (Vec<TranscriptEntry>, SessionStats) {
        let partial = std::mem::take(&mut self.assistant_partial);
        self.push(Speaker::Assistant, &partial);
        let stats = self.stats();
        (self.transcript, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::audio::encode_audio;
    use crate::realtime::protocol::ErrorDetail;

    #[test]
    fn test_collects_transcript_in_order() {
        let mut recorder = SessionRecorder::new();
        recorder.observe_server(&ServerEvent::AudioTranscriptDelta { delta: "Hi, ".into() });
        recorder.observe_server(&ServerEvent::AudioTranscriptDelta { delta: "tell me".into() });
        recorder.observe_server(&ServerEvent::AudioTranscriptDone {
            transcript: "Hi, tell me about yourself.".into(),
        });
        recorder.observe_server(&ServerEvent::InputTranscriptionCompleted {
            transcript: " I am a data engineer. ".into(),
        });
        recorder.observe_server(&ServerEvent::ResponseDone);

        let stats = recorder.stats();
        assert_eq!(stats.responses, 1);
        assert_eq!(stats.user_turns, 1);

        let (transcript, _) = recorder.finish();
        let texts: Vec<_> = transcript
            .iter()
            .map(|e| (e.speaker, e.text.as_str()))
            .collect();
        assert_eq!(
            texts,
            vec![
                (Speaker::Assistant, "Hi, tell me about yourself."),
                (Speaker::User, "I am a data engineer."),
            ]
        );
    }

    #[test]
    fn test_empty_done_falls_back_to_deltas() {
        let mut recorder = SessionRecorder::new();
        recorder.observe_server(&ServerEvent::AudioTranscriptDelta { delta: "Welcome".into() });
        recorder.observe_server(&ServerEvent::AudioTranscriptDone { transcript: String::new() });
        let (transcript, _) = recorder.finish();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].text, "Welcome");
    }

    #[test]
    fn test_counts_audio_and_errors() {
        let mut recorder = SessionRecorder::new();
        let second = encode_audio(&vec![0.1; 24_000]);
        recorder.observe_server(&ServerEvent::AudioDelta { delta: second.clone() });
        recorder.observe_client(&ClientEvent::InputAudioBufferAppend { audio: second });
        recorder.observe_server(&ServerEvent::AudioDelta { delta: "%%%".into() });
        recorder.observe_server(&ServerEvent::Error {
            error: ErrorDetail {
                message: "rate limited".into(),
                kind: None,
                code: None,
            },
        });
        let stats = recorder.stats();
        assert_eq!(stats.output_audio_ms, 1000);
        assert_eq!(stats.input_audio_ms, 1000);
        assert_eq!(stats.errors, 2);
        assert_eq!(recorder.errors()[1], "rate limited");
    }

    #[test]
    fn test_finish_keeps_interrupted_response() {
        let mut recorder = SessionRecorder::new();
        recorder.observe_server(&ServerEvent::AudioTranscriptDelta { delta: "So what".into() });
        let (transcript, _) = recorder.finish();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].speaker, Speaker::Assistant);
    }
}
