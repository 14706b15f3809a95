//! lspwire: the transport and message-routing core of a Language Server
//! Protocol implementation.
//!
//! This crate re-exports the pieces most applications need:
//!
//! - Framed I/O over any tokio byte stream ([`transport`])
//! - The JSON-RPC envelope, method traits and [`Dispatcher`]
//! - A bidirectional [`Session`] with request correlation
//! - [`TokenDeltaEngine`] for incremental semantic tokens
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use lspwire::prelude::*;
//!
//! enum ServerRequest { Shutdown }
//! enum ServerNotification { Exit }
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .register_request::<Shutdown>(|()| ServerRequest::Shutdown)
//!     .register_notification::<Exit>(|()| ServerNotification::Exit);
//!
//! let (session, mut events) = Session::start(
//!     tokio::io::stdin(),
//!     tokio::io::stdout(),
//!     Arc::new(dispatcher),
//!     SessionConfig::from_env(),
//! );
//!
//! while let Some(event) = events.next().await {
//!     match event {
//!         Event::Request { request: ServerRequest::Shutdown, reply, .. } => reply.ok(())?,
//!         Event::Notification(ServerNotification::Exit) => break,
//!         Event::ProtocolError(err) => eprintln!("protocol error: {err}"),
//!     }
//! }
//! session.close().await?;
//! ```

#![forbid(unsafe_code)]

pub use lspwire_core::{ErrorCode, RpcError, SessionConfig, config, logging};
pub use lspwire_protocol::{
    DecodeError, Dispatcher, Envelope, EnvelopeError, Message, Notification, Request, RequestId,
    ThreeOf, TwoOf, UnionError, dispatch, messages,
};
pub use lspwire_session::{
    CallError, Event, EventStream, PendingRequest, ProtocolError, ReplyHandle, Session,
    SessionError,
};
pub use lspwire_tokens::{DecodedToken, TokenDeltaEngine};

/// Wire types: positions, ranges and semantic token shapes.
pub mod types {
    pub use lspwire_protocol::{
        CancelParams, InitializedParams, Position, Range, SemanticTokens, SemanticTokensDelta,
        SemanticTokensDeltaParams, SemanticTokensEdit, SemanticTokensFullDeltaResult,
        SemanticTokensLegend, SemanticTokensParams, SemanticTokensRangeParams,
        TextDocumentIdentifier,
    };
}

/// Framing and framed I/O.
pub mod transport {
    pub use lspwire_transport::{CodecError, FrameCodec, FrameReader, FrameWriter, TransportError};
}

/// Commonly used items.
pub mod prelude {
    pub use crate::messages::{
        Cancel, Exit, Initialized, SemanticTokensFull, SemanticTokensFullDelta,
        SemanticTokensRange, Shutdown,
    };
    pub use crate::types::*;
    pub use crate::{
        CallError, Dispatcher, ErrorCode, Event, EventStream, Notification, ProtocolError,
        ReplyHandle, Request, RequestId, RpcError, Session, SessionConfig, TokenDeltaEngine,
        TwoOf,
    };
}
