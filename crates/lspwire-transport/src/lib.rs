//! Transport layer for lspwire.
//!
//! Messages travel over any duplex byte channel (stdio pipes, sockets,
//! in-process queues) framed by `Content-Length` headers. This crate
//! provides:
//!
//! - [`FrameCodec`]: push-based header/body parser and framing on send
//! - [`FrameReader`] / [`FrameWriter`]: async framed I/O over tokio
//!   `AsyncRead` / `AsyncWrite`
//!
//! The transport knows nothing about JSON-RPC semantics beyond serializing
//! an [`Envelope`](lspwire_protocol::Envelope).

#![forbid(unsafe_code)]

mod codec;
mod framed;

pub use codec::{CodecError, FrameCodec};
pub use framed::{FrameReader, FrameWriter};

/// Transport error types.
#[derive(Debug)]
pub enum TransportError {
    /// I/O error on the byte source or sink.
    Io(std::io::Error),
    /// Framing or encoding error.
    Codec(CodecError),
    /// The channel is closed.
    Closed,
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::Io(e) => write!(f, "I/O error: {e}"),
            TransportError::Codec(e) => write!(f, "Codec error: {e}"),
            TransportError::Closed => write!(f, "Transport closed"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Io(e) => Some(e),
            TransportError::Codec(e) => Some(e),
            TransportError::Closed => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err)
    }
}

impl From<CodecError> for TransportError {
    fn from(err: CodecError) -> Self {
        TransportError::Codec(err)
    }
}
