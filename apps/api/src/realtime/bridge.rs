//! Relays a browser WebSocket to the provider's realtime endpoint.
//!
//! Frames pass through in socket order in both directions. The bridge adds
//! two things of its own: the `session.update` sent once the provider
//! reports `session.created`, and framing of raw binary PCM16 from the
//! browser into `input_audio_buffer.append` events.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::tungstenite::Message as UpstreamMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::interview::repository::append_transcript;
use crate::interview::session::TranscriptEntry;
use crate::realtime::audio::{encode_audio, pcm16_to_float, FrameChunker};
use crate::realtime::protocol::{bridge_error_event, ClientEvent, ServerEvent, SessionConfig};
use crate::realtime::recorder::{SessionRecorder, SessionStats};
use crate::state::AppState;

const REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

type UpstreamSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct BridgeParams {
    pub user_id: Uuid,
    pub session_id: Option<Uuid>,
    pub interview_type: String,
    pub session: SessionConfig,
}

/// Per-connection relay state, independent of the sockets.
pub struct Relay {
    session: SessionConfig,
    configured: bool,
    recorder: SessionRecorder,
    chunker: FrameChunker,
}

fn append_event(samples: &[f32]) -> Option<String> {
    serde_json::to_string(&ClientEvent::InputAudioBufferAppend {
        audio: encode_audio(samples),
    })
    .ok()
}

impl Relay {
    pub fn new(session: SessionConfig) -> Self {
        Self {
            session,
            configured: false,
            recorder: SessionRecorder::new(),
            chunker: FrameChunker::default(),
        }
    }

    /// A text frame from the browser. Returns the frames to send upstream.
    /// A commit first flushes any partially framed binary audio.
    pub fn client_text(&mut self, text: String) -> Vec<String> {
        let event = ClientEvent::parse(&text);
        let mut out = Vec::new();
        if event == ClientEvent::InputAudioBufferCommit {
            if let Some(event) = self.chunker.flush().and_then(|rest| append_event(&rest)) {
                self.recorder.observe_client(&ClientEvent::parse(&event));
                out.push(event);
            }
        }
        self.recorder.observe_client(&event);
        out.push(text);
        out
    }

    /// Raw little-endian PCM16 from the browser, framed into append events.
    pub fn client_binary(&mut self, bytes: &[u8]) -> Vec<String> {
        let samples = match pcm16_to_float(bytes) {
            Ok(samples) => samples,
            Err(e) => {
                warn!("Dropping binary audio frame: {e}");
                return Vec::new();
            }
        };
        self.chunker
            .push(&samples)
            .iter()
            .filter_map(|frame| append_event(frame))
            .inspect(|event| self.recorder.observe_client(&ClientEvent::parse(event)))
            .collect()
    }

    /// A text frame from the provider. Returns a `session.update` to send
    /// upstream the first time the session is created.
    pub fn upstream_text(&mut self, text: &str) -> Option<String> {
        let event = ServerEvent::parse(text);
        self.recorder.observe_server(&event);
        if matches!(event, ServerEvent::SessionCreated { .. }) && !self.configured {
            self.configured = true;
            return serde_json::to_string(&ClientEvent::SessionUpdate {
                session: self.session.clone(),
            })
            .ok();
        }
        None
    }

    pub fn errors(&self) -> &[String] {
        self.recorder.errors()
    }

    pub fn finish(self) -> (Vec<TranscriptEntry>, SessionStats) {
        self.recorder.finish()
    }
}

async fn connect_upstream(config: &Config) -> anyhow::Result<UpstreamSocket> {
    let url = format!("{REALTIME_URL}?model={}", config.realtime_model);
    let mut request = url.into_client_request()?;
    let headers = request.headers_mut();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", config.openai_api_key))?,
    );
    headers.insert("OpenAI-Beta", HeaderValue::from_static("realtime=v1"));

    let (socket, response) = connect_async(request).await?;
    debug!("Realtime upstream connected ({})", response.status());
    Ok(socket)
}

/// Runs one bridged session until either side closes.
pub async fn run_bridge(mut client: WebSocket, state: AppState, params: BridgeParams) {
    let upstream = match connect_upstream(&state.config).await {
        Ok(socket) => socket,
        Err(e) => {
            warn!("Realtime upstream connection failed: {e:#}");
            let _ = client
                .send(Message::Text(bridge_error_event(
                    "Could not connect to the realtime voice service",
                )))
                .await;
            let _ = client.send(Message::Close(None)).await;
            return;
        }
    };
    info!(
        "Realtime {} interview started for user {}",
        params.interview_type, params.user_id
    );

    let (mut client_tx, mut client_rx) = client.split();
    let (mut upstream_tx, mut upstream_rx) = upstream.split();
    let mut relay = Relay::new(params.session);

    loop {
        tokio::select! {
            msg = client_rx.next() => {
                let outgoing = match msg {
                    Some(Ok(Message::Text(text))) => relay.client_text(text),
                    Some(Ok(Message::Binary(bytes))) => relay.client_binary(&bytes),
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!("Client socket error: {e}");
                        break;
                    }
                };
                let mut failed = false;
                for frame in outgoing {
                    if upstream_tx.send(UpstreamMessage::Text(frame)).await.is_err() {
                        failed = true;
                        break;
                    }
                }
                if failed {
                    break;
                }
            }
            msg = upstream_rx.next() => {
                match msg {
                    Some(Ok(UpstreamMessage::Text(text))) => {
                        if let Some(update) = relay.upstream_text(&text) {
                            if upstream_tx.send(UpstreamMessage::Text(update)).await.is_err() {
                                break;
                            }
                        }
                        if client_tx.send(Message::Text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(UpstreamMessage::Binary(bytes))) => {
                        if client_tx.send(Message::Binary(bytes)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(UpstreamMessage::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Realtime upstream error: {e}");
                        break;
                    }
                }
            }
        }
    }

    let _ = client_tx.send(Message::Close(None)).await;
    let _ = upstream_tx.send(UpstreamMessage::Close(None)).await;

    for error in relay.errors() {
        debug!("Realtime session error: {error}");
    }
    let (transcript, stats) = relay.finish();
    info!(
        "Realtime interview for user {} closed: {} transcript entries, {} ms in, {} ms out, {} responses, {} errors",
        params.user_id,
        transcript.len(),
        stats.input_audio_ms,
        stats.output_audio_ms,
        stats.responses,
        stats.errors
    );

    if let Some(session_id) = params.session_id {
        if transcript.is_empty() {
            return;
        }
        match append_transcript(&state.db, session_id, params.user_id, &transcript).await {
            Ok(true) => {}
            Ok(false) => warn!("Interview session {session_id} vanished before transcript save"),
            Err(e) => warn!("Failed to save realtime transcript for {session_id}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::audio::{float_to_pcm16, FRAME_SAMPLES};
    use serde_json::Value;

    fn relay() -> Relay {
        Relay::new(SessionConfig::for_interview("Interview me.", "alloy"))
    }

    #[test]
    fn test_session_update_sent_once_after_created() {
        let mut relay = relay();
        assert!(relay.upstream_text(r#"{"type":"rate_limits.updated"}"#).is_none());
        let update = relay
            .upstream_text(r#"{"type":"session.created","session":{"id":"sess_1"}}"#)
            .unwrap();
        let value: Value = serde_json::from_str(&update).unwrap();
        assert_eq!(value["type"], "session.update");
        assert_eq!(value["session"]["instructions"], "Interview me.");
        assert!(relay
            .upstream_text(r#"{"type":"session.created","session":{}}"#)
            .is_none());
    }

    #[test]
    fn test_client_text_is_forwarded_verbatim() {
        let mut relay = relay();
        let frame = r#"{"type":"response.create","extra":1}"#.to_string();
        assert_eq!(relay.client_text(frame.clone()), vec![frame]);
    }

    #[test]
    fn test_binary_audio_is_framed() {
        let mut relay = relay();
        let bytes = float_to_pcm16(&vec![0.2; FRAME_SAMPLES + 100]);
        let frames = relay.client_binary(&bytes);
        assert_eq!(frames.len(), 1);
        assert!(matches!(
            ClientEvent::parse(&frames[0]),
            ClientEvent::InputAudioBufferAppend { .. }
        ));

        // commit flushes the 100 leftover samples before the commit itself
        let commit = r#"{"type":"input_audio_buffer.commit"}"#.to_string();
        let out = relay.client_text(commit.clone());
        assert_eq!(out.len(), 2);
        assert_eq!(out[1], commit);

        assert!(relay.client_binary(&[1, 2, 3]).is_empty());
        let (_, stats) = relay.finish();
        // FRAME_SAMPLES + 100 samples at 24 kHz
        assert_eq!(stats.input_audio_ms, 174);
    }

    #[test]
    fn test_transcript_collected_through_relay() {
        let mut relay = relay();
        relay.upstream_text(
            r#"{"type":"conversation.item.input_audio_transcription.completed","item_id":"i","content_index":0,"transcript":"I lead a platform team."}"#,
        );
        relay.upstream_text(r#"{"type":"response.audio_transcript.done","transcript":"How large is the team?"}"#);
        let (transcript, _) = relay.finish();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].text, "How large is the team?");
    }
}
