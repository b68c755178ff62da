//! Stream wire frames

use serde::Serialize;
use serde_json::Value;

use crate::errors::PayloadError;

/// Channel name carrying the logs of a deployment
pub fn log_channel(id: &str) -> String {
    format!("logs:{}", id)
}

/// Frame sent to the streaming backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ClientFrame {
    Subscribe { channel: String },
    Unsubscribe { channel: String },
    Ping,
}

impl ClientFrame {
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Frame received from the streaming backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerFrame {
    /// A log line published on a channel
    Message { channel: String, line: String },
    Pong,
}

/// Decode an inbound text frame.
///
/// `data` may be the payload object itself or a JSON document encoded as a
/// string; either way it must expose a string `log` field.
pub fn decode(text: &str) -> Result<ServerFrame, PayloadError> {
    let frame: Value =
        serde_json::from_str(text).map_err(|e| PayloadError::InvalidJson(e.to_string()))?;

    match frame.get("event").and_then(Value::as_str) {
        Some("message") => {}
        Some("pong") => return Ok(ServerFrame::Pong),
        Some(other) => return Err(PayloadError::UnknownEvent(other.to_string())),
        None => return Err(PayloadError::UnknownEvent("<missing>".to_string())),
    }

    let channel = frame
        .get("channel")
        .and_then(Value::as_str)
        .ok_or(PayloadError::MissingChannel)?
        .to_string();

    let line = match frame.get("data") {
        Some(Value::String(encoded)) => {
            let inner: Value = serde_json::from_str(encoded)
                .map_err(|e| PayloadError::InvalidJson(e.to_string()))?;
            extract_log(&inner)?
        }
        Some(data @ Value::Object(_)) => extract_log(data)?,
        _ => return Err(PayloadError::MissingLog),
    };

    Ok(ServerFrame::Message { channel, line })
}

fn extract_log(payload: &Value) -> Result<String, PayloadError> {
    payload
        .get("log")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(PayloadError::MissingLog)
}
