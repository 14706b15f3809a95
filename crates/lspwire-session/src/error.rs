//! Session error taxonomy.
//!
//! - [`ProtocolError`]: a single inbound message could not be used. The
//!   session keeps running and reports it on the event stream.
//! - [`CallError`]: what the caller of an outbound request sees when it
//!   does not get a result.
//! - [`SessionError`]: why the session stopped.

use lspwire_core::RpcError;
use lspwire_protocol::{DecodeError, EnvelopeError, RequestId};
use lspwire_transport::TransportError;

/// A recoverable, per-message protocol failure.
#[derive(Debug)]
pub enum ProtocolError {
    /// The payload is not a usable JSON-RPC envelope.
    MalformedEnvelope(EnvelopeError),
    /// A request or notification could not be decoded.
    ///
    /// `id` is set for requests; an error response was sent for them.
    Decode {
        /// Request ID, `None` for notifications.
        id: Option<RequestId>,
        /// The decode failure.
        error: DecodeError,
    },
    /// A response named an ID with no pending call.
    UnknownResponseId(RequestId),
    /// A response for a pending call carried both or neither of
    /// `result`/`error`. The call was failed.
    MalformedResponse(EnvelopeError),
    /// The ID generator produced an ID that is still pending.
    DuplicateRequestId(RequestId),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::MalformedEnvelope(e) => write!(f, "{e}"),
            ProtocolError::Decode { id: Some(id), error } => {
                write!(f, "request {id}: {error}")
            }
            ProtocolError::Decode { id: None, error } => write!(f, "notification: {error}"),
            ProtocolError::UnknownResponseId(id) => {
                write!(f, "response for unknown request id {id}")
            }
            ProtocolError::MalformedResponse(e) => write!(f, "{e}"),
            ProtocolError::DuplicateRequestId(id) => {
                write!(f, "request id {id} is already pending")
            }
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::MalformedEnvelope(e) | ProtocolError::MalformedResponse(e) => Some(e),
            ProtocolError::Decode { error, .. } => Some(error),
            ProtocolError::UnknownResponseId(_) | ProtocolError::DuplicateRequestId(_) => None,
        }
    }
}

/// Failure of an outbound request.
#[derive(Debug)]
pub enum CallError {
    /// The peer answered with an error object.
    Rpc(RpcError),
    /// The session closed before a response arrived.
    SessionClosed,
    /// The caller abandoned the request.
    Cancelled,
    /// The params could not be encoded.
    Encode(serde_json::Error),
    /// The result did not match the method's result type.
    Decode(serde_json::Error),
    /// The response carried both or neither of `result`/`error`.
    MalformedResponse(String),
    /// The assigned ID collided with a pending call.
    DuplicateId(RequestId),
}

impl std::fmt::Display for CallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallError::Rpc(e) => write!(f, "peer returned error: {e}"),
            CallError::SessionClosed => write!(f, "session closed"),
            CallError::Cancelled => write!(f, "request cancelled"),
            CallError::Encode(e) => write!(f, "failed to encode params: {e}"),
            CallError::Decode(e) => write!(f, "failed to decode result: {e}"),
            CallError::MalformedResponse(reason) => write!(f, "malformed response: {reason}"),
            CallError::DuplicateId(id) => write!(f, "request id {id} is already pending"),
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CallError::Rpc(e) => Some(e),
            CallError::Encode(e) | CallError::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RpcError> for CallError {
    fn from(err: RpcError) -> Self {
        CallError::Rpc(err)
    }
}

/// Why a session stopped abnormally.
#[derive(Debug)]
pub enum SessionError {
    /// Framing or I/O failure on the byte channel.
    Transport(TransportError),
    /// The session task panicked or was aborted.
    Task(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Transport(e) => write!(f, "transport failure: {e}"),
            SessionError::Task(reason) => write!(f, "session task failed: {reason}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Transport(e) => Some(e),
            SessionError::Task(_) => None,
        }
    }
}

impl From<TransportError> for SessionError {
    fn from(err: TransportError) -> Self {
        SessionError::Transport(err)
    }
}
