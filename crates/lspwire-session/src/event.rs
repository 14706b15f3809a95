//! Inbound events delivered to the session owner.

use lspwire_protocol::RequestId;
use tokio::sync::mpsc;

use crate::{ProtocolError, ReplyHandle};

/// Something the peer sent, or a recoverable failure while reading it.
#[derive(Debug)]
pub enum Event<R, N> {
    /// A decoded notification.
    Notification(N),
    /// A decoded request. Answer it through `reply`.
    Request {
        /// The peer's request ID.
        id: RequestId,
        /// The decoded request.
        request: R,
        /// One-shot response channel for this request.
        reply: ReplyHandle,
    },
    /// A message that could not be used. The session keeps running.
    ProtocolError(ProtocolError),
}

/// Stream of inbound [`Event`]s.
///
/// Ends (returns `None`) once the session has stopped.
#[derive(Debug)]
pub struct EventStream<R, N> {
    rx: mpsc::UnboundedReceiver<Event<R, N>>,
}

impl<R, N> EventStream<R, N> {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Event<R, N>>) -> Self {
        Self { rx }
    }

    /// Waits for the next event.
    pub async fn next(&mut self) -> Option<Event<R, N>> {
        self.rx.recv().await
    }

    /// Returns the next event if one is already queued.
    pub fn try_next(&mut self) -> Option<Event<R, N>> {
        self.rx.try_recv().ok()
    }
}
