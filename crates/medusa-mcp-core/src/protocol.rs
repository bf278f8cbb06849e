//! JSON-RPC 2.0 framing for MCP traffic.
//!
//! A frame is classified by the members it carries, not by trial
//! deserialization:
//!
//! | `method` | `id` | `result` / `error` | Frame |
//! |----------|------|--------------------|-------|
//! | yes | yes | - | [`Request`] |
//! | yes | no | - | [`Notification`] |
//! | no | yes | exactly one | [`Response`] |
//!
//! Anything else, or a `jsonrpc` member other than `"2.0"`, is rejected with
//! [`McpError::InvalidRequest`]. A request whose `id` is malformed is an
//! invalid request; it never degrades into a notification.
//!
//! ```rust
//! use medusa_mcp_core::protocol::{Message, RequestId};
//!
//! let msg = Message::from_slice(br#"{"jsonrpc":"2.0","id":-7,"method":"ping"}"#).unwrap();
//! assert_eq!(msg.method(), Some("ping"));
//! assert_eq!(msg.id(), Some(&RequestId::from(-7i64)));
//! ```

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::error::{JsonRpcError, McpError};

/// The only JSON-RPC version this server speaks.
pub const JSONRPC_VERSION: &str = "2.0";

/// The `jsonrpc` member. Serializes as `"2.0"` and refuses anything else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Version;

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let version = String::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(Self)
        } else {
            Err(de::Error::invalid_value(
                de::Unexpected::Str(&version),
                &"\"2.0\"",
            ))
        }
    }
}

/// A request id as sent by the peer.
///
/// Numbers are kept as `serde_json::Number`, so negative and fractional ids
/// are echoed back exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric id.
    Number(Number),
    /// String id.
    String(String),
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        Self::Number(id.into())
    }
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        Self::Number(id.into())
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self::String(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self::String(id.to_owned())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => fmt::Display::fmt(n, f),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// A method call that expects exactly one [`Response`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Always `"2.0"`.
    pub jsonrpc: Version,
    /// Correlates the response.
    pub id: RequestId,
    /// Method name, e.g. `tools/call`.
    pub method: String,
    /// Method parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// A request with no parameters.
    #[must_use]
    pub fn new(method: impl Into<String>, id: impl Into<RequestId>) -> Self {
        Self {
            jsonrpc: Version,
            id: id.into(),
            method: method.into(),
            params: None,
        }
    }

    /// Attach parameters.
    #[must_use]
    pub fn params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }
}

/// The reply to a [`Request`].
///
/// `id` is `None` only when the request could not be read far enough to
/// recover its id; it is then written as `"id": null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Always `"2.0"`.
    pub jsonrpc: Version,
    /// The id of the request being answered.
    pub id: Option<RequestId>,
    /// Set on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Set on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl Response {
    /// A successful reply.
    #[must_use]
    pub fn success(id: impl Into<RequestId>, result: Value) -> Self {
        Self {
            jsonrpc: Version,
            id: Some(id.into()),
            result: Some(result),
            error: None,
        }
    }

    /// A failed reply.
    #[must_use]
    pub fn error(id: impl Into<RequestId>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: Version,
            id: Some(id.into()),
            result: None,
            error: Some(error),
        }
    }

    /// A failed reply to a frame whose id is unknown.
    ///
    /// Used for parse errors and frames that are not JSON-RPC at all.
    #[must_use]
    pub fn unattributed(error: &McpError) -> Self {
        Self {
            jsonrpc: Version,
            id: None,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Whether this reply carries an error.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A one-way message. It has no id and gets no reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Always `"2.0"`.
    pub jsonrpc: Version,
    /// Notification name, e.g. `notifications/initialized`.
    pub method: String,
    /// Notification parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    /// A notification with no parameters.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            jsonrpc: Version,
            method: method.into(),
            params: None,
        }
    }
}

/// Any JSON-RPC frame.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Message {
    /// A method call.
    Request(Request),
    /// A reply.
    Response(Response),
    /// A one-way message.
    Notification(Notification),
}

/// Which frame a JSON object claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Request,
    Notification,
    Response,
}

impl Shape {
    fn of(object: &Map<String, Value>) -> Result<Self, McpError> {
        let has = |key: &str| object.contains_key(key);
        match (has("method"), has("id")) {
            (true, true) => Ok(Self::Request),
            (true, false) => Ok(Self::Notification),
            (false, true) if has("result") != has("error") => Ok(Self::Response),
            (false, true) => Err(McpError::invalid_request(
                "response must carry exactly one of result or error",
            )),
            (false, false) => Err(McpError::invalid_request(
                "object has neither method nor id",
            )),
        }
    }
}

impl Message {
    /// Parse one frame from raw bytes.
    ///
    /// Bytes that are not JSON are [`McpError::Parse`]; JSON that is not a
    /// JSON-RPC message is [`McpError::InvalidRequest`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self, McpError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| McpError::parse(e.to_string()))?;
        Self::from_value(value)
    }

    /// Classify and decode an already-parsed JSON value.
    pub fn from_value(value: Value) -> Result<Self, McpError> {
        let Value::Object(object) = value else {
            return Err(McpError::invalid_request("expected a JSON object"));
        };
        let shape = Shape::of(&object)?;
        let value = Value::Object(object);

        let decoded = match shape {
            Shape::Request => serde_json::from_value(value).map(Self::Request),
            Shape::Notification => serde_json::from_value(value).map(Self::Notification),
            Shape::Response => serde_json::from_value(value).map(Self::Response),
        };
        decoded.map_err(|e| McpError::invalid_request(e.to_string()))
    }

    /// Method name for requests and notifications.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.method),
            Self::Notification(n) => Some(&n.method),
            Self::Response(_) => None,
        }
    }

    /// The id, if this frame carries one.
    #[must_use]
    pub const fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(r) => Some(&r.id),
            Self::Response(r) => r.id.as_ref(),
            Self::Notification(_) => None,
        }
    }

    /// Whether this frame expects a reply.
    #[must_use]
    pub const fn is_request(&self) -> bool {
        matches!(self, Self::Request(_))
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

impl From<Request> for Message {
    fn from(r: Request) -> Self {
        Self::Request(r)
    }
}

impl From<Response> for Message {
    fn from(r: Response) -> Self {
        Self::Response(r)
    }
}

impl From<Notification> for Message {
    fn from(n: Notification) -> Self {
        Self::Notification(n)
    }
}
