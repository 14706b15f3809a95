//! Session handle.
//!
//! A [`Session`] owns one byte channel to one peer. A background task reads
//! frames, classifies them and correlates responses with pending calls; the
//! handle queues outbound work for that task. Cloning the handle is cheap
//! and every clone talks to the same task.
//!
//! The session stops once every handle and every [`PendingRequest`] is
//! dropped. Queued writes are flushed first.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use lspwire_core::logging::{debug, targets};
use lspwire_core::SessionConfig;
use lspwire_protocol::{
    Dispatcher, Notification, Request, RequestId, encode_notification, encode_request,
};
use lspwire_transport::FrameWriter;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::actor::{Actor, write_loop};
use crate::pending::Slot;
use crate::{CallError, EventStream, PendingRequest, SessionError};

/// Work queued for the session task.
#[derive(Debug)]
pub(crate) enum Command {
    /// Register a pending call and write the request.
    Request {
        id: RequestId,
        method: &'static str,
        params: Option<Value>,
        slot: Slot,
    },
    /// Write a notification.
    Notify {
        method: &'static str,
        params: Option<Value>,
    },
    /// Drop a pending call, optionally telling the peer.
    Abandon { id: RequestId, notify_peer: bool },
    /// Report the number of pending calls.
    PendingCount(oneshot::Sender<usize>),
    /// Stop the session.
    Close,
}

#[derive(Debug)]
struct Shared {
    commands: mpsc::UnboundedSender<Command>,
    next_id: AtomicI64,
    cancel_on_abandon: bool,
    task: Mutex<Option<JoinHandle<Result<(), SessionError>>>>,
}

/// Handle to a running JSON-RPC session.
#[derive(Debug, Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

impl Session {
    /// Starts a session over `reader`/`writer` on the current tokio runtime.
    ///
    /// Inbound requests and notifications are decoded through `dispatcher`
    /// and delivered on the returned [`EventStream`], in wire order.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start<Rd, Wr, R, N>(
        reader: Rd,
        writer: Wr,
        dispatcher: Arc<Dispatcher<R, N>>,
        config: SessionConfig,
    ) -> (Self, EventStream<R, N>)
    where
        Rd: AsyncRead + Unpin + Send + 'static,
        Wr: AsyncWrite + Unpin + Send + 'static,
        R: Send + 'static,
        N: Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let writer = tokio::spawn(write_loop(FrameWriter::new(writer), outbound_rx));
        let actor = Actor::new(
            reader,
            dispatcher,
            &config,
            command_rx,
            outbound_tx,
            writer,
            event_tx,
        );
        let task = tokio::spawn(actor.run());

        let session = Self {
            shared: Arc::new(Shared {
                commands: command_tx,
                next_id: AtomicI64::new(1),
                cancel_on_abandon: config.cancel_on_abandon,
                task: Mutex::new(Some(task)),
            }),
        };
        (session, EventStream::new(event_rx))
    }

    fn next_id(&self) -> RequestId {
        RequestId::Number(self.shared.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Sends a request and returns a future for its response.
    ///
    /// The request is registered as pending before it is written, so the
    /// response cannot race ahead of the registration.
    ///
    /// # Errors
    ///
    /// Fails immediately if the params cannot be encoded or the session has
    /// stopped.
    pub fn send_request<M: Request>(
        &self,
        params: M::Params,
    ) -> Result<PendingRequest<M>, CallError> {
        let (method, params) = encode_request::<M>(&params).map_err(CallError::Encode)?;
        let id = self.next_id();
        let (slot, rx) = oneshot::channel();

        debug!(target: targets::SESSION, "Sending request {} ({})", id, method);
        self.shared
            .commands
            .send(Command::Request {
                id: id.clone(),
                method,
                params,
                slot,
            })
            .map_err(|_| CallError::SessionClosed)?;

        Ok(PendingRequest::new(
            id,
            rx,
            self.shared.commands.clone(),
            self.shared.cancel_on_abandon,
        ))
    }

    /// Sends a request and waits for its decoded result.
    ///
    /// # Errors
    ///
    /// See [`CallError`].
    pub async fn request<M: Request>(&self, params: M::Params) -> Result<M::Result, CallError> {
        self.send_request::<M>(params)?.await
    }

    /// Queues a notification for writing.
    ///
    /// # Errors
    ///
    /// Fails if the params cannot be encoded or the session has stopped.
    pub fn send_notification<M: Notification>(&self, params: M::Params) -> Result<(), CallError> {
        let (method, params) = encode_notification::<M>(&params).map_err(CallError::Encode)?;
        debug!(target: targets::SESSION, "Sending notification {}", method);
        self.shared
            .commands
            .send(Command::Notify { method, params })
            .map_err(|_| CallError::SessionClosed)
    }

    /// Number of outbound calls still waiting for a response.
    pub async fn pending_count(&self) -> usize {
        let (tx, rx) = oneshot::channel();
        if self.shared.commands.send(Command::PendingCount(tx)).is_err() {
            return 0;
        }
        rx.await.unwrap_or(0)
    }

    /// Returns true once the session task has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.commands.is_closed()
    }

    /// Stops the session and waits for teardown.
    ///
    /// Every pending call fails with [`CallError::SessionClosed`] and the
    /// event stream ends. Calling it again, or after the peer disconnected,
    /// returns `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns the fatal error if the session had already failed.
    pub async fn close(&self) -> Result<(), SessionError> {
        // Already stopped if the send fails.
        let _ = self.shared.commands.send(Command::Close);
        self.wait().await
    }

    /// Waits until the session stops on its own (peer disconnect or a fatal
    /// error) or another handle closes it.
    ///
    /// Only the first caller observes the outcome; later callers wait for
    /// teardown and get `Ok(())`.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that stopped the session.
    pub async fn wait(&self) -> Result<(), SessionError> {
        let mut task = self.shared.task.lock().await;
        match task.take() {
            Some(handle) => match handle.await {
                Ok(result) => result,
                Err(err) => Err(SessionError::Task(err.to_string())),
            },
            None => Ok(()),
        }
    }
}
