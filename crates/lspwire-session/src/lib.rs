//! Bidirectional JSON-RPC session for lspwire.
//!
//! Either side of a connection may send requests and notifications at any
//! time. A [`Session`] assigns request IDs, remembers which calls are still
//! waiting, matches responses back to them regardless of arrival order and
//! turns inbound traffic into typed [`Event`]s through a shared
//! [`Dispatcher`](lspwire_protocol::Dispatcher).
//!
//! # Example
//!
//! ```ignore
//! let (session, mut events) = Session::start(stdin, stdout, dispatcher, SessionConfig::from_env());
//!
//! let tokens = session.request::<SemanticTokensFull>(params).await?;
//!
//! while let Some(event) = events.next().await {
//!     match event {
//!         Event::Request { request: ServerRequest::Shutdown, reply, .. } => reply.ok(())?,
//!         Event::Notification(ServerNotification::Exit) => break,
//!         Event::ProtocolError(err) => eprintln!("protocol error: {err}"),
//!         _ => {}
//!     }
//! }
//! session.close().await?;
//! ```
//!
//! # Failure Domains
//!
//! A bad message (unknown method, invalid params, unknown response ID) is
//! reported as [`Event::ProtocolError`] and the session keeps going. A
//! framing or I/O failure ends the session; every pending call then fails
//! with [`CallError::SessionClosed`].

#![forbid(unsafe_code)]

mod actor;
mod error;
mod event;
mod pending;
mod reply;
mod session;

pub use error::{CallError, ProtocolError, SessionError};
pub use event::{Event, EventStream};
pub use pending::PendingRequest;
pub use reply::ReplyHandle;
pub use session::Session;
