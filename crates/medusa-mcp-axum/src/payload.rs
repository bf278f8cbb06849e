//! Request body accumulation and JSON-RPC payload parsing.

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use medusa_mcp_core::protocol::Message;
use serde_json::Value;

use crate::error::HttpError;

/// One POSTed payload: a single message or a JSON-RPC batch.
#[derive(Debug)]
pub enum Payload {
    /// A single message.
    Single(Message),
    /// A batch array of messages.
    Batch(Vec<Message>),
}

impl Payload {
    /// The messages in arrival order.
    #[must_use]
    pub fn into_messages(self) -> Vec<Message> {
        match self {
            Self::Single(message) => vec![message],
            Self::Batch(messages) => messages,
        }
    }
}

/// Turn a buffered body (or its rejection) into bytes.
///
/// The size guard is enforced by `DefaultBodyLimit`; its rejection becomes
/// 413 here.
pub fn read_body(body: Result<Bytes, BytesRejection>) -> Result<Bytes, HttpError> {
    body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            tracing::warn!("Rejected request body over the size limit");
            HttpError::PayloadTooLarge
        } else {
            HttpError::Internal(rejection.body_text())
        }
    })
}

/// Parse a body into a [`Payload`].
///
/// Invalid JSON is [`HttpError::InvalidJson`]; JSON that is not a JSON-RPC
/// message (or an empty batch) is [`HttpError::InvalidMessage`].
pub fn parse_payload(body: &[u8]) -> Result<Payload, HttpError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Request body is not valid JSON");
        HttpError::InvalidJson
    })?;

    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Err(HttpError::InvalidMessage("empty batch".to_string()));
            }
            items
                .into_iter()
                .map(parse_message)
                .collect::<Result<Vec<_>, _>>()
                .map(Payload::Batch)
        }
        other => parse_message(other).map(Payload::Single),
    }
}

fn parse_message(value: Value) -> Result<Message, HttpError> {
    Message::from_value(value).map_err(|e| HttpError::InvalidMessage(e.to_string()))
}

/// Whether a body holds nothing but whitespace.
pub fn is_blank(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_message() {
        let payload = parse_payload(br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).unwrap();
        assert!(matches!(payload, Payload::Single(Message::Request(_))));
    }

    #[test]
    fn test_batch() {
        let payload = parse_payload(
            br#"[{"jsonrpc":"2.0","id":1,"method":"ping"},{"jsonrpc":"2.0","method":"notifications/initialized"}]"#,
        )
        .unwrap();
        assert_eq!(payload.into_messages().len(), 2);
    }

    #[test]
    fn test_not_json() {
        assert!(matches!(parse_payload(b"not-json"), Err(HttpError::InvalidJson)));
    }

    #[test]
    fn test_json_but_not_jsonrpc() {
        assert!(matches!(
            parse_payload(br#"{"hello":"world"}"#),
            Err(HttpError::InvalidMessage(_))
        ));
        assert!(matches!(parse_payload(b"[]"), Err(HttpError::InvalidMessage(_))));
    }

    #[test]
    fn test_negative_id_is_a_request() {
        let payload = parse_payload(br#"{"jsonrpc":"2.0","id":-1,"method":"ping"}"#).unwrap();
        assert!(matches!(payload, Payload::Single(Message::Request(_))));

        let payload = parse_payload(br#"{"jsonrpc":"2.0","id":1.5,"method":"ping"}"#).unwrap();
        assert!(matches!(payload, Payload::Single(Message::Request(_))));
    }

    #[test]
    fn test_bad_id_in_batch_rejects_batch() {
        let result = parse_payload(
            br#"[{"jsonrpc":"2.0","id":1,"method":"ping"},{"jsonrpc":"2.0","id":null,"method":"ping"}]"#,
        );
        assert!(matches!(result, Err(HttpError::InvalidMessage(_))));
    }

    #[test]
    fn test_blank() {
        assert!(is_blank(b""));
        assert!(is_blank(b" \r\n"));
        assert!(!is_blank(b"{}"));
    }
}
