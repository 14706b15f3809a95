//! The session tasks.
//!
//! Two tasks per session. The reader task owns the framed reader and the
//! pending table, so correlation state is never shared; it waits on frames
//! from the peer and commands from session handles, and never on a write.
//! The writer task owns the sink and drains a queue of envelopes.

use std::collections::HashMap;
use std::sync::Arc;

use lspwire_core::logging::{debug, error, info, targets, trace, warn};
use lspwire_core::{RpcError, SessionConfig};
use lspwire_protocol::{
    CancelParams, Dispatcher, Envelope, IncomingCall, Message, RequestId, Response,
    encode_notification, messages::Cancel,
};
use lspwire_transport::{FrameReader, FrameWriter, TransportError};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use crate::pending::Slot;
use crate::session::Command;
use crate::{CallError, Event, ProtocolError, ReplyHandle, SessionError};

pub(crate) type WriterTask = JoinHandle<Result<(), TransportError>>;

/// Writes queued envelopes until every sender is gone, then shuts the sink.
pub(crate) async fn write_loop<Wr: AsyncWrite + Unpin>(
    mut writer: FrameWriter<Wr>,
    mut queue: mpsc::UnboundedReceiver<Envelope>,
) -> Result<(), TransportError> {
    while let Some(envelope) = queue.recv().await {
        writer.write_envelope(&envelope).await?;
    }
    if let Err(err) = writer.shutdown().await {
        debug!(target: targets::SESSION, "Writer shutdown failed: {}", err);
    }
    Ok(())
}

/// Why the read loop stopped.
enum Stop {
    /// `close()` was called or every handle was dropped. Queued writes are
    /// flushed.
    Closed,
    /// The peer closed its side.
    Disconnected,
    /// Fatal transport or task failure.
    Failed(SessionError),
}

struct PendingCall {
    method: &'static str,
    slot: Slot,
}

pub(crate) struct Actor<Rd, R, N> {
    reader: FrameReader<Rd>,
    dispatcher: Arc<Dispatcher<R, N>>,
    pending: HashMap<RequestId, PendingCall>,
    commands: mpsc::UnboundedReceiver<Command>,
    outbound: mpsc::UnboundedSender<Envelope>,
    writer: Option<WriterTask>,
    events: mpsc::UnboundedSender<Event<R, N>>,
}

impl<Rd, R, N> Actor<Rd, R, N>
where
    Rd: AsyncRead + Unpin,
    R: 'static,
    N: 'static,
{
    pub(crate) fn new(
        reader: Rd,
        dispatcher: Arc<Dispatcher<R, N>>,
        config: &SessionConfig,
        commands: mpsc::UnboundedReceiver<Command>,
        outbound: mpsc::UnboundedSender<Envelope>,
        writer: WriterTask,
        events: mpsc::UnboundedSender<Event<R, N>>,
    ) -> Self {
        Self {
            reader: FrameReader::with_config(reader, config),
            dispatcher,
            pending: HashMap::new(),
            commands,
            outbound,
            writer: Some(writer),
            events,
        }
    }

    pub(crate) async fn run(mut self) -> Result<(), SessionError> {
        info!(target: targets::SESSION, "Session started");

        let stop = loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Close) => {
                        debug!(target: targets::SESSION, "Close requested");
                        break Stop::Closed;
                    }
                    None => {
                        debug!(target: targets::SESSION, "All session handles dropped");
                        break Stop::Closed;
                    }
                    Some(command) => self.handle_command(command),
                },
                frame = self.reader.next_frame() => match frame {
                    Ok(Some(payload)) => self.handle_payload(&payload),
                    Ok(None) => {
                        info!(target: targets::SESSION, "Peer closed the connection");
                        break Stop::Disconnected;
                    }
                    Err(err) => break Stop::Failed(SessionError::Transport(err)),
                },
                written = wait_writer(&mut self.writer) => break match written {
                    Ok(Ok(())) => Stop::Failed(SessionError::Transport(TransportError::Closed)),
                    Ok(Err(err)) => Stop::Failed(SessionError::Transport(err)),
                    Err(err) => Stop::Failed(SessionError::Task(err.to_string())),
                },
            }
        };

        self.teardown(stop).await
    }

    fn queue(&self, envelope: Envelope) {
        // A closed queue means the writer stopped; the select loop sees that.
        if self.outbound.send(envelope).is_err() {
            debug!(target: targets::SESSION, "Writer gone; dropping outbound message");
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Request {
                id,
                method,
                params,
                slot,
            } => {
                if self.pending.contains_key(&id) {
                    warn!(target: targets::SESSION, "Request id {} is already pending", id);
                    let _ = slot.send(Err(CallError::DuplicateId(id.clone())));
                    self.emit(Event::ProtocolError(ProtocolError::DuplicateRequestId(id)));
                    return;
                }
                self.pending.insert(id.clone(), PendingCall { method, slot });
                self.queue(Envelope::request(id, method, params));
            }
            Command::Notify { method, params } => {
                self.queue(Envelope::notification(method, params));
            }
            Command::Abandon { id, notify_peer } => {
                let Some(call) = self.pending.remove(&id) else {
                    trace!(target: targets::SESSION, "Abandoned request {} already settled", id);
                    return;
                };
                debug!(target: targets::SESSION, "Request {} ({}) abandoned", id, call.method);
                let _ = call.slot.send(Err(CallError::Cancelled));
                if notify_peer {
                    self.send_cancel(id);
                }
            }
            Command::PendingCount(tx) => {
                let _ = tx.send(self.pending.len());
            }
            Command::Close => {}
        }
    }

    fn send_cancel(&self, id: RequestId) {
        match encode_notification::<Cancel>(&CancelParams { id }) {
            Ok((method, params)) => self.queue(Envelope::notification(method, params)),
            Err(err) => {
                warn!(target: targets::SESSION, "Failed to encode cancel notification: {}", err);
            }
        }
    }

    fn handle_payload(&mut self, payload: &[u8]) {
        let message = match Envelope::from_slice(payload).and_then(Envelope::classify) {
            Ok(message) => message,
            Err(err) => {
                warn!(target: targets::SESSION, "Malformed message: {}", err);
                if let Some(id) = request_id_of(payload) {
                    let reply = RpcError::invalid_request(err.to_string());
                    self.queue(Envelope::failure(id, reply));
                }
                self.emit(Event::ProtocolError(ProtocolError::MalformedEnvelope(err)));
                return;
            }
        };

        match message {
            Message::Request(call) => self.handle_request(call),
            Message::Notification(call) => self.handle_notification(call),
            Message::Response(response) => self.handle_response(response),
        }
    }

    fn handle_request(&mut self, call: IncomingCall) {
        let IncomingCall { id, method, params } = call;
        let Some(id) = id else {
            return;
        };
        debug!(target: targets::SESSION, "Received request {} ({})", id, method);

        match self.dispatcher.decode_request(&method, params) {
            Ok(request) => {
                let reply = ReplyHandle::new(id.clone(), method, self.outbound.downgrade());
                self.emit(Event::Request { id, request, reply });
            }
            Err(err) => {
                warn!(target: targets::SESSION, "Rejecting request {}: {}", id, err);
                self.queue(Envelope::failure(id.clone(), err.to_rpc_error()));
                self.emit(Event::ProtocolError(ProtocolError::Decode {
                    id: Some(id),
                    error: err,
                }));
            }
        }
    }

    fn handle_notification(&mut self, call: IncomingCall) {
        debug!(target: targets::SESSION, "Received notification {}", call.method);
        match self.dispatcher.decode_notification(&call.method, call.params) {
            Ok(notification) => self.emit(Event::Notification(notification)),
            Err(err) => {
                warn!(target: targets::SESSION, "Dropping notification: {}", err);
                self.emit(Event::ProtocolError(ProtocolError::Decode {
                    id: None,
                    error: err,
                }));
            }
        }
    }

    fn handle_response(&mut self, response: Response) {
        let Some(call) = self.pending.remove(&response.id) else {
            warn!(
                target: targets::SESSION,
                "Response for unknown request id {}", response.id
            );
            self.emit(Event::ProtocolError(ProtocolError::UnknownResponseId(
                response.id,
            )));
            return;
        };

        debug!(
            target: targets::SESSION,
            "Received response {} ({})", response.id, call.method
        );
        match response.into_outcome() {
            Ok(outcome) => {
                let _ = call.slot.send(outcome.map_err(CallError::Rpc));
            }
            Err(err) => {
                warn!(target: targets::SESSION, "Malformed response: {}", err);
                let _ = call
                    .slot
                    .send(Err(CallError::MalformedResponse(err.to_string())));
                self.emit(Event::ProtocolError(ProtocolError::MalformedResponse(err)));
            }
        }
    }

    fn emit(&self, event: Event<R, N>) {
        if let Err(mpsc::error::SendError(event)) = self.events.send(event) {
            match event {
                Event::Request { reply, .. } => {
                    let _ = reply.err(RpcError::internal_error("No handler for requests"));
                }
                _ => trace!(target: targets::SESSION, "Event stream closed; dropping event"),
            }
        }
    }

    async fn teardown(self, stop: Stop) -> Result<(), SessionError> {
        let Actor {
            mut commands,
            mut pending,
            outbound,
            writer,
            events,
            ..
        } = self;

        commands.close();
        while let Ok(command) = commands.try_recv() {
            match command {
                Command::Request { slot, .. } => {
                    let _ = slot.send(Err(CallError::SessionClosed));
                }
                Command::PendingCount(tx) => {
                    let _ = tx.send(0);
                }
                _ => {}
            }
        }

        let failed = pending.len();
        for (_, call) in pending.drain() {
            let _ = call.slot.send(Err(CallError::SessionClosed));
        }
        if failed > 0 {
            debug!(
                target: targets::SESSION,
                "Failed {} pending request(s) on close", failed
            );
        }
        drop(events);
        drop(outbound);

        let flush = matches!(stop, Stop::Closed);
        if let Some(writer) = writer {
            if flush {
                match writer.await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => debug!(target: targets::SESSION, "Final flush failed: {}", err),
                    Err(err) => debug!(target: targets::SESSION, "Writer task failed: {}", err),
                }
            } else {
                writer.abort();
            }
        }

        let result = match stop {
            Stop::Failed(err) => {
                error!(target: targets::SESSION, "Session failed: {}", err);
                Err(err)
            }
            Stop::Closed | Stop::Disconnected => Ok(()),
        };
        info!(target: targets::SESSION, "Session closed");
        result
    }
}

/// Resolves when the writer task ends; pending forever once it has.
async fn wait_writer(writer: &mut Option<WriterTask>) -> Result<Result<(), TransportError>, JoinError> {
    match writer {
        Some(handle) => {
            let result = handle.await;
            *writer = None;
            result
        }
        None => std::future::pending().await,
    }
}

/// Recovers the ID of a request-shaped payload that failed to decode as an
/// envelope, so an error response can still be sent.
fn request_id_of(payload: &[u8]) -> Option<RequestId> {
    let value: Value = serde_json::from_slice(payload).ok()?;
    let object = value.as_object()?;
    if !object.contains_key("method") {
        return None;
    }
    serde_json::from_value(object.get("id")?.clone()).ok()
}
