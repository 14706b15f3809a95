//! JSON-RPC error codes and the error object carried in responses.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error codes defined by JSON-RPC 2.0 and the Language Server Protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Invalid JSON was received.
    ParseError,
    /// The JSON sent is not a valid request object.
    InvalidRequest,
    /// The method does not exist or is not available.
    MethodNotFound,
    /// Invalid method parameters.
    InvalidParams,
    /// Internal JSON-RPC error.
    InternalError,
    /// A request arrived before the server was initialized.
    ServerNotInitialized,
    /// Generic code for errors without a dedicated code.
    UnknownErrorCode,
    /// A request failed but was syntactically correct.
    RequestFailed,
    /// The server cancelled the request.
    ServerCancelled,
    /// The document changed while the request was being computed.
    ContentModified,
    /// The client cancelled the request.
    RequestCancelled,
    /// Any code not covered above.
    Custom(i32),
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        match code {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::InternalError => -32603,
            ErrorCode::ServerNotInitialized => -32002,
            ErrorCode::UnknownErrorCode => -32001,
            ErrorCode::RequestFailed => -32803,
            ErrorCode::ServerCancelled => -32802,
            ErrorCode::ContentModified => -32801,
            ErrorCode::RequestCancelled => -32800,
            ErrorCode::Custom(code) => code,
        }
    }
}

impl From<i32> for ErrorCode {
    fn from(code: i32) -> Self {
        match code {
            -32700 => ErrorCode::ParseError,
            -32600 => ErrorCode::InvalidRequest,
            -32601 => ErrorCode::MethodNotFound,
            -32602 => ErrorCode::InvalidParams,
            -32603 => ErrorCode::InternalError,
            -32002 => ErrorCode::ServerNotInitialized,
            -32001 => ErrorCode::UnknownErrorCode,
            -32803 => ErrorCode::RequestFailed,
            -32802 => ErrorCode::ServerCancelled,
            -32801 => ErrorCode::ContentModified,
            -32800 => ErrorCode::RequestCancelled,
            other => ErrorCode::Custom(other),
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i32((*self).into())
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        i32::deserialize(deserializer).map(ErrorCode::from)
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", i32::from(*self))
    }
}

/// The JSON-RPC `error` object.
///
/// Handlers report failures with this type; it is encoded verbatim into the
/// response sent back to the peer. It is also what a caller receives when the
/// peer answers one of its requests with an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Additional error data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    /// Creates an error with the given code and message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attaches additional data to the error.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// The requested method is not registered.
    #[must_use]
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!("Method not found: {method}"),
        )
    }

    /// The parameters could not be decoded for the method.
    #[must_use]
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidParams, message)
    }

    /// The message was not a valid request object.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// An internal failure while handling the request.
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// The request was cancelled before a result was produced.
    #[must_use]
    pub fn request_cancelled() -> Self {
        Self::new(ErrorCode::RequestCancelled, "Request cancelled")
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::internal_error(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_round_trip_through_i32() {
        for code in [
            ErrorCode::ParseError,
            ErrorCode::InvalidRequest,
            ErrorCode::MethodNotFound,
            ErrorCode::InvalidParams,
            ErrorCode::InternalError,
            ErrorCode::ServerNotInitialized,
            ErrorCode::UnknownErrorCode,
            ErrorCode::RequestFailed,
            ErrorCode::ServerCancelled,
            ErrorCode::ContentModified,
            ErrorCode::RequestCancelled,
            ErrorCode::Custom(42),
        ] {
            assert_eq!(ErrorCode::from(i32::from(code)), code);
        }
    }

    #[test]
    fn rpc_error_serializes_as_wire_object() {
        let err = RpcError::method_not_found("textDocument/hover");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], -32601);
        assert_eq!(json["message"], "Method not found: textDocument/hover");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn rpc_error_deserializes_unknown_code_as_custom() {
        let err: RpcError =
            serde_json::from_str(r#"{"code":7,"message":"odd","data":[1]}"#).unwrap();
        assert_eq!(err.code, ErrorCode::Custom(7));
        assert_eq!(err.data, Some(serde_json::json!([1])));
    }

    #[test]
    fn display_includes_code_and_message() {
        let err = RpcError::invalid_params("missing field `textDocument`");
        assert_eq!(err.to_string(), "[-32602] missing field `textDocument`");
    }
}
