//! JSON-RPC 2.0 envelope and message classification.

use lspwire_core::RpcError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// JSON-RPC protocol version emitted on every outgoing message.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC request ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Integer ID.
    Number(i64),
    /// String ID.
    String(String),
}

impl From<i64> for RequestId {
    fn from(id: i64) -> Self {
        RequestId::Number(id)
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        RequestId::String(id)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        RequestId::String(id.to_owned())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestId::Number(n) => write!(f, "{n}"),
            RequestId::String(s) => write!(f, "{s:?}"),
        }
    }
}

fn jsonrpc_version() -> String {
    JSONRPC_VERSION.to_owned()
}

/// Keeps an explicit `null` distinct from an absent field.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// The generic JSON-RPC message shape.
///
/// Every field is optional on the wire; [`Envelope::classify`] decides which
/// kind of message a decoded envelope is. `jsonrpc` is ignored on read and
/// always written as `"2.0"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Protocol version.
    #[serde(skip_deserializing, default = "jsonrpc_version")]
    pub jsonrpc: String,
    /// Request ID (absent for notifications).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    /// Method name (absent for responses).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Call parameters.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub params: Option<Value>,
    /// Result (successful responses). `Some(Value::Null)` is a real `null`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub result: Option<Value>,
    /// Error (failed responses).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Envelope {
    fn empty() -> Self {
        Self {
            jsonrpc: jsonrpc_version(),
            id: None,
            method: None,
            params: None,
            result: None,
            error: None,
        }
    }

    /// Creates a request envelope.
    #[must_use]
    pub fn request(id: RequestId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id: Some(id),
            method: Some(method.into()),
            params,
            ..Self::empty()
        }
    }

    /// Creates a notification envelope (no ID).
    #[must_use]
    pub fn notification(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            method: Some(method.into()),
            params,
            ..Self::empty()
        }
    }

    /// Creates a success response.
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            id: Some(id),
            result: Some(result),
            ..Self::empty()
        }
    }

    /// Creates an error response.
    #[must_use]
    pub fn failure(id: RequestId, error: RpcError) -> Self {
        Self {
            id: Some(id),
            error: Some(error),
            ..Self::empty()
        }
    }

    /// Creates a response from a handler outcome.
    #[must_use]
    pub fn response(id: RequestId, outcome: Result<Value, RpcError>) -> Self {
        match outcome {
            Ok(result) => Self::success(id, result),
            Err(error) => Self::failure(id, error),
        }
    }

    /// Decodes an envelope from a framed payload.
    pub fn from_slice(payload: &[u8]) -> Result<Self, EnvelopeError> {
        serde_json::from_slice(payload).map_err(EnvelopeError::Json)
    }

    /// Encodes the envelope to JSON bytes.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Classifies the envelope by which of `method` and `id` are present.
    pub fn classify(self) -> Result<Message, EnvelopeError> {
        match (self.method, self.id) {
            (Some(method), Some(id)) => Ok(Message::Request(IncomingCall {
                id: Some(id),
                method,
                params: self.params,
            })),
            (Some(method), None) => Ok(Message::Notification(IncomingCall {
                id: None,
                method,
                params: self.params,
            })),
            (None, Some(id)) => Ok(Message::Response(Response {
                id,
                result: self.result,
                error: self.error,
            })),
            (None, None) => Err(EnvelopeError::MissingMethodAndId),
        }
    }
}

/// A request or notification read off the wire, params still undecoded.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingCall {
    /// Request ID (`None` for notifications).
    pub id: Option<RequestId>,
    /// Method name.
    pub method: String,
    /// Raw parameters.
    pub params: Option<Value>,
}

/// A response read off the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// ID of the request being answered.
    pub id: RequestId,
    /// Result field, if present (may be `null`).
    pub result: Option<Value>,
    /// Error field, if present.
    pub error: Option<RpcError>,
}

impl Response {
    /// Resolves the response into exactly one of success or failure.
    ///
    /// Both or neither of `result`/`error` present is a protocol error.
    pub fn into_outcome(self) -> Result<Result<Value, RpcError>, EnvelopeError> {
        match (self.result, self.error) {
            (Some(result), None) => Ok(Ok(result)),
            (None, Some(error)) => Ok(Err(error)),
            (Some(_), Some(_)) => Err(EnvelopeError::ResultAndError(self.id)),
            (None, None) => Err(EnvelopeError::MissingOutcome(self.id)),
        }
    }
}

/// A classified JSON-RPC message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Method and ID present.
    Request(IncomingCall),
    /// Method present, no ID.
    Notification(IncomingCall),
    /// ID present, no method.
    Response(Response),
}

/// Failures turning a payload into a classified message.
#[derive(Debug)]
pub enum EnvelopeError {
    /// The payload is not a JSON-RPC object.
    Json(serde_json::Error),
    /// Neither `method` nor `id` is present.
    MissingMethodAndId,
    /// A response carries both `result` and `error`.
    ResultAndError(RequestId),
    /// A response carries neither `result` nor `error`.
    MissingOutcome(RequestId),
}

impl std::fmt::Display for EnvelopeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvelopeError::Json(e) => write!(f, "invalid envelope: {e}"),
            EnvelopeError::MissingMethodAndId => {
                write!(f, "malformed envelope: neither method nor id present")
            }
            EnvelopeError::ResultAndError(id) => {
                write!(f, "response {id} carries both result and error")
            }
            EnvelopeError::MissingOutcome(id) => {
                write!(f, "response {id} carries neither result nor error")
            }
        }
    }
}

impl std::error::Error for EnvelopeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EnvelopeError::Json(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lspwire_core::ErrorCode;
    use serde_json::json;

    fn classify(raw: &str) -> Result<Message, EnvelopeError> {
        Envelope::from_slice(raw.as_bytes())?.classify()
    }

    #[test]
    fn request_serialization() {
        let env = Envelope::request(RequestId::Number(1), "shutdown", None);
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json, json!({"jsonrpc": "2.0", "id": 1, "method": "shutdown"}));
    }

    #[test]
    fn null_result_is_emitted() {
        let env = Envelope::success(RequestId::Number(3), Value::Null);
        let text = String::from_utf8(env.to_vec().unwrap()).unwrap();
        assert_eq!(text, r#"{"jsonrpc":"2.0","id":3,"result":null}"#);
    }

    #[test]
    fn classifies_notification() {
        let msg = classify(r#"{"jsonrpc":"2.0","method":"exit"}"#).unwrap();
        assert!(matches!(msg, Message::Notification(call) if call.method == "exit" && call.params.is_none()));
    }

    #[test]
    fn classifies_request_with_string_id() {
        let msg = classify(r#"{"id":"abc","method":"textDocument/hover","params":{}}"#).unwrap();
        match msg {
            Message::Request(call) => {
                assert_eq!(call.id, Some(RequestId::from("abc")));
                assert_eq!(call.params, Some(json!({})));
            }
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn null_result_is_distinct_from_absent() {
        let Message::Response(resp) = classify(r#"{"id":1,"result":null}"#).unwrap() else {
            panic!("expected response");
        };
        assert_eq!(resp.into_outcome().unwrap(), Ok(Value::Null));

        let Message::Response(resp) = classify(r#"{"id":1}"#).unwrap() else {
            panic!("expected response");
        };
        assert!(matches!(
            resp.into_outcome(),
            Err(EnvelopeError::MissingOutcome(RequestId::Number(1)))
        ));
    }

    #[test]
    fn response_with_error() {
        let Message::Response(resp) =
            classify(r#"{"id":2,"error":{"code":-32601,"message":"nope"}}"#).unwrap()
        else {
            panic!("expected response");
        };
        let err = resp.into_outcome().unwrap().unwrap_err();
        assert_eq!(err.code, ErrorCode::MethodNotFound);
    }

    #[test]
    fn response_with_both_outcomes_is_rejected() {
        let Message::Response(resp) =
            classify(r#"{"id":2,"result":1,"error":{"code":1,"message":"x"}}"#).unwrap()
        else {
            panic!("expected response");
        };
        assert!(matches!(
            resp.into_outcome(),
            Err(EnvelopeError::ResultAndError(_))
        ));
    }

    #[test]
    fn jsonrpc_field_is_ignored_on_read() {
        let msg = classify(r#"{"jsonrpc":1,"method":"exit"}"#).unwrap();
        assert!(matches!(msg, Message::Notification(_)));
    }

    #[test]
    fn neither_method_nor_id_is_malformed() {
        assert!(matches!(
            classify(r#"{"result":5}"#),
            Err(EnvelopeError::MissingMethodAndId)
        ));
        assert!(matches!(classify("[1,2]"), Err(EnvelopeError::Json(_))));
    }
}
