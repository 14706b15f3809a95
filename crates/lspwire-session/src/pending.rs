//! Outbound request futures.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use lspwire_protocol::{Request, RequestId};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::CallError;
use crate::session::Command;

pub(crate) type Slot = oneshot::Sender<Result<Value, CallError>>;

/// A request that has been handed to the session and awaits its response.
///
/// Resolves exactly once with the decoded result or a [`CallError`].
/// Dropping it before completion abandons the call: the pending entry is
/// removed and, if the session is configured to, `$/cancelRequest` is sent.
#[must_use = "dropping a PendingRequest abandons the call"]
pub struct PendingRequest<M: Request> {
    id: RequestId,
    rx: oneshot::Receiver<Result<Value, CallError>>,
    commands: mpsc::UnboundedSender<Command>,
    notify_peer: bool,
    cancelled: bool,
    finished: bool,
    _method: PhantomData<fn() -> M>,
}

impl<M: Request> PendingRequest<M> {
    pub(crate) fn new(
        id: RequestId,
        rx: oneshot::Receiver<Result<Value, CallError>>,
        commands: mpsc::UnboundedSender<Command>,
        notify_peer: bool,
    ) -> Self {
        Self {
            id,
            rx,
            commands,
            notify_peer,
            cancelled: false,
            finished: false,
            _method: PhantomData,
        }
    }

    /// The ID assigned to this request.
    #[must_use]
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// The method name.
    #[must_use]
    pub fn method(&self) -> &'static str {
        M::METHOD
    }

    /// Abandons the call. Awaiting it afterwards yields
    /// [`CallError::Cancelled`]; a late response is ignored.
    pub fn cancel(&mut self) {
        if self.finished || self.cancelled {
            return;
        }
        self.cancelled = true;
        self.rx.close();
        self.abandon();
    }

    fn abandon(&self) {
        // The session may already be gone; nothing is pending then.
        let _ = self.commands.send(Command::Abandon {
            id: self.id.clone(),
            notify_peer: self.notify_peer,
        });
    }
}

impl<M: Request> std::fmt::Debug for PendingRequest<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequest")
            .field("id", &self.id)
            .field("method", &M::METHOD)
            .field("cancelled", &self.cancelled)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<M: Request> Future for PendingRequest<M> {
    type Output = Result<M::Result, CallError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = &mut *self;
        if this.finished {
            return Poll::Ready(Err(CallError::Cancelled));
        }
        if this.cancelled {
            this.finished = true;
            return Poll::Ready(Err(CallError::Cancelled));
        }

        let outcome = match Pin::new(&mut this.rx).poll(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(outcome) => outcome,
        };
        this.finished = true;

        Poll::Ready(match outcome {
            Ok(Ok(value)) => serde_json::from_value(value).map_err(CallError::Decode),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(CallError::SessionClosed),
        })
    }
}

impl<M: Request> Drop for PendingRequest<M> {
    fn drop(&mut self) {
        if !self.finished && !self.cancelled {
            self.abandon();
        }
    }
}
