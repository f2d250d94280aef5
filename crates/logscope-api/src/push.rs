use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};
use url::Url;

use logscope_stream::{EventStream, PushError, PushTransport};
use logscope_types::LogEvent;

use crate::client::ApiError;

/// One push-channel frame: an event name plus its payload
#[derive(Deserialize)]
struct Envelope {
    event: String,
    data: serde_json::Value,
}

/// WebSocket push transport for the log service's `/stream` endpoint.
///
/// The server sends one JSON envelope per text frame; only `new_log`
/// envelopes carry log events. Malformed frames are dropped with a warning
/// rather than propagated (§7c of the service contract: best available
/// state beats a dead stream).
pub struct WsTransport {
    url: Url,
}

impl WsTransport {
    /// Derive the push-channel URL from the service's HTTP base URL
    pub fn from_base(base: &Url) -> Result<Self, ApiError> {
        let mut url = base.join("stream")?;
        let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
        // set_scheme only fails for special-scheme mismatches that cannot
        // occur when mapping http(s) to ws(s)
        let _ = url.set_scheme(scheme);
        Ok(Self { url })
    }
}

#[async_trait]
impl PushTransport for WsTransport {
    async fn connect(&self) -> Result<EventStream, PushError> {
        let (socket, _response) = connect_async(self.url.as_str())
            .await
            .map_err(|e| PushError::Connect(e.to_string()))?;

        let events = socket.filter_map(|frame| async move {
            match frame {
                Ok(Message::Text(text)) => decode_frame(text.as_str()),
                Ok(Message::Close(_)) => None,
                Ok(_) => None,
                Err(e) => Some(Err(PushError::Channel(e.to_string()))),
            }
        });

        Ok(events.boxed())
    }
}

/// Decode one text frame into a log event; `None` drops the frame
fn decode_frame(text: &str) -> Option<Result<LogEvent, PushError>> {
    match serde_json::from_str::<Envelope>(text) {
        Ok(envelope) if envelope.event == "new_log" => {
            match serde_json::from_value(envelope.data) {
                Ok(event) => Some(Ok(event)),
                Err(e) => {
                    warn!(error = %e, "dropping malformed new_log payload");
                    None
                }
            }
        }
        Ok(envelope) => {
            debug!(event = %envelope.event, "ignoring push frame");
            None
        }
        Err(e) => {
            warn!(error = %e, "dropping undecodable push frame");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_url_from_http_base() {
        let base = Url::parse("http://localhost:4000/").unwrap();
        let transport = WsTransport::from_base(&base).unwrap();
        assert_eq!(transport.url.as_str(), "ws://localhost:4000/stream");
    }

    #[test]
    fn test_stream_url_from_https_base() {
        let base = Url::parse("https://logs.example.com/").unwrap();
        let transport = WsTransport::from_base(&base).unwrap();
        assert_eq!(transport.url.as_str(), "wss://logs.example.com/stream");
    }

    #[test]
    fn test_decode_new_log_frame() {
        let frame = r#"{
            "event": "new_log",
            "data": { "id": 5, "timestamp": "2024-05-01T12:00:00Z",
                      "level": "ERROR", "service": "auth", "message": "fail login" }
        }"#;
        let event = decode_frame(frame).unwrap().unwrap();
        assert_eq!(event.id, 5);
        assert_eq!(event.service, "auth");
    }

    #[test]
    fn test_unknown_event_is_skipped() {
        let frame = r#"{ "event": "heartbeat", "data": {} }"#;
        assert!(decode_frame(frame).is_none());
    }

    #[test]
    fn test_malformed_payload_is_dropped_not_propagated() {
        // Missing fields in the payload
        let frame = r#"{ "event": "new_log", "data": { "id": 5 } }"#;
        assert!(decode_frame(frame).is_none());

        // Not JSON at all
        assert!(decode_frame("not json").is_none());
    }
}
