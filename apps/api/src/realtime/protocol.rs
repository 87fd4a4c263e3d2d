//! JSON event types of the upstream realtime audio API.
//!
//! Only the events the bridge inspects are typed; everything else parses to
//! `Unknown` and is still relayed untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const AUDIO_FORMAT_PCM16: &str = "pcm16";
pub const TRANSCRIPTION_MODEL: &str = "whisper-1";
pub const DEFAULT_REALTIME_VOICE: &str = "alloy";
pub const REALTIME_VOICES: &[&str] = &[
    "alloy", "ash", "ballad", "coral", "echo", "sage", "shimmer", "verse",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionConfig {
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnDetection {
    #[serde(rename = "type")]
    pub kind: String,
    pub threshold: f32,
    pub prefix_padding_ms: u32,
    pub silence_duration_ms: u32,
}

impl Default for TurnDetection {
    fn default() -> Self {
        Self {
            kind: "server_vad".to_string(),
            threshold: 0.5,
            prefix_padding_ms: 300,
            silence_duration_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modalities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_audio_transcription: Option<TranscriptionConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_detection: Option<TurnDetection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl SessionConfig {
    /// Session settings for a voice interview: PCM16 both ways, input
    /// transcription and server-side voice activity detection.
    pub fn for_interview(instructions: impl Into<String>, voice: &str) -> Self {
        Self {
            modalities: vec!["text".to_string(), "audio".to_string()],
            instructions: Some(instructions.into()),
            voice: Some(voice.to_string()),
            input_audio_format: Some(AUDIO_FORMAT_PCM16.to_string()),
            output_audio_format: Some(AUDIO_FORMAT_PCM16.to_string()),
            input_audio_transcription: Some(TranscriptionConfig {
                model: TRANSCRIPTION_MODEL.to_string(),
            }),
            turn_detection: Some(TurnDetection::default()),
            temperature: Some(0.8),
        }
    }
}

/// Events sent by the browser (and by the bridge itself) to the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ClientEvent {
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionConfig },
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend { audio: String },
    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioBufferCommit,
    #[serde(rename = "input_audio_buffer.clear")]
    InputAudioBufferClear,
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate { item: Value },
    #[serde(rename = "response.create")]
    ResponseCreate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        response: Option<Value>,
    },
    #[serde(rename = "response.cancel")]
    ResponseCancel,
    #[serde(other)]
    Unknown,
}

impl ClientEvent {
    pub fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or(ClientEvent::Unknown)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Events received from the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "session.created")]
    SessionCreated { session: Value },
    #[serde(rename = "session.updated")]
    SessionUpdated { session: Value },
    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted,
    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped,
    #[serde(rename = "conversation.item.input_audio_transcription.completed")]
    InputTranscriptionCompleted { transcript: String },
    #[serde(rename = "response.audio.delta")]
    AudioDelta { delta: String },
    #[serde(rename = "response.audio.done")]
    AudioDone,
    #[serde(rename = "response.audio_transcript.delta")]
    AudioTranscriptDelta { delta: String },
    #[serde(rename = "response.audio_transcript.done")]
    AudioTranscriptDone { transcript: String },
    #[serde(rename = "response.done")]
    ResponseDone,
    #[serde(rename = "error")]
    Error { error: ErrorDetail },
    #[serde(other)]
    Unknown,
}

impl ServerEvent {
    /// Malformed or unrecognised frames parse to `Unknown`.
    pub fn parse(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or(ServerEvent::Unknown)
    }
}

/// An `error` event in the provider's shape, for failures raised by the
/// bridge itself.
pub fn bridge_error_event(message: &str) -> String {
    serde_json::json!({
        "type": "error",
        "error": { "type": "bridge_error", "message": message }
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_update_wire_shape() {
        let event = ClientEvent::SessionUpdate {
            session: SessionConfig::for_interview("Be brief.", "verse"),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "session.update");
        assert_eq!(value["session"]["instructions"], "Be brief.");
        assert_eq!(value["session"]["voice"], "verse");
        assert_eq!(value["session"]["input_audio_format"], "pcm16");
        assert_eq!(value["session"]["output_audio_format"], "pcm16");
        assert_eq!(value["session"]["input_audio_transcription"]["model"], "whisper-1");
        assert_eq!(value["session"]["turn_detection"]["type"], "server_vad");
    }

    #[test]
    fn test_unit_client_events_serialize_with_type_only() {
        let value = serde_json::to_value(ClientEvent::InputAudioBufferCommit).unwrap();
        assert_eq!(value, json!({"type": "input_audio_buffer.commit"}));
    }

    #[test]
    fn test_server_events_ignore_extra_fields() {
        let raw = r#"{"type":"response.audio.delta","event_id":"e1","response_id":"r1",
                      "item_id":"i1","output_index":0,"content_index":0,"delta":"AAA="}"#;
        assert_eq!(
            ServerEvent::parse(raw),
            ServerEvent::AudioDelta { delta: "AAA=".into() }
        );
        let raw = r#"{"type":"input_audio_buffer.speech_started","event_id":"e2","audio_start_ms":120}"#;
        assert_eq!(ServerEvent::parse(raw), ServerEvent::SpeechStarted);
    }

    #[test]
    fn test_error_event_parses() {
        let raw = r#"{"type":"error","error":{"type":"invalid_request_error","message":"bad"}}"#;
        match ServerEvent::parse(raw) {
            ServerEvent::Error { error } => {
                assert_eq!(error.message, "bad");
                assert_eq!(error.kind.as_deref(), Some("invalid_request_error"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            ServerEvent::parse(&bridge_error_event("upstream down")),
            ServerEvent::Error { .. }
        ));
    }

    #[test]
    fn test_unknown_and_malformed_frames() {
        assert_eq!(ServerEvent::parse(r#"{"type":"rate_limits.updated"}"#), ServerEvent::Unknown);
        assert_eq!(ServerEvent::parse("not json"), ServerEvent::Unknown);
        // known type, missing payload
        assert_eq!(ServerEvent::parse(r#"{"type":"response.audio.delta"}"#), ServerEvent::Unknown);
        assert_eq!(ClientEvent::parse(r#"{"type":"something.new"}"#), ClientEvent::Unknown);
        assert_eq!(
            ClientEvent::parse(r#"{"type":"input_audio_buffer.append","audio":"AQI="}"#),
            ClientEvent::InputAudioBufferAppend { audio: "AQI=".into() }
        );
    }
}
