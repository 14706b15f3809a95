use lspwire_core::RpcError;
use lspwire_core::logging::{debug, targets, warn};
use std::fmt;

use lspwire_protocol::{Envelope, RequestId};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::CallError;

/// Response channel for one inbound request.
///
/// Consumed by value, so a request is answered at most once. Dropping the
/// handle without answering sends nothing and logs a warning.
///
/// The handle does not keep the session alive: once the session stops,
/// answering fails with [`CallError::SessionClosed`].
pub struct ReplyHandle {
    id: RequestId,
    method: String,
    outbound: mpsc::WeakUnboundedSender<Envelope>,
    answered: bool,
}

impl fmt::Debug for ReplyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplyHandle")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("answered", &self.answered)
            .finish_non_exhaustive()
    }
}

impl ReplyHandle {
    pub(crate) fn new(
        id: RequestId,
        method: String,
        outbound: mpsc::WeakUnboundedSender<Envelope>,
    ) -> Self {
        Self {
            id,
            method,
            outbound,
            answered: false,
        }
    }

    /// The ID of the request being answered.
    #[must_use]
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    /// The method of the request being answered.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Sends a success or error response.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::SessionClosed`] if the session has stopped.
    pub fn respond(mut self, outcome: Result<Value, RpcError>) -> Result<(), CallError> {
        self.answered = true;
        let id = self.id.clone();
        debug!(target: targets::SESSION, "Answering request {} ({})", id, self.method);
        let outbound = self.outbound.upgrade().ok_or(CallError::SessionClosed)?;
        outbound
            .send(Envelope::response(id, outcome))
            .map_err(|_| CallError::SessionClosed)
    }

    /// Serializes `result` and sends it as a success response.
    ///
    /// A result that fails to serialize is answered with an internal error.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::SessionClosed`] if the session has stopped.
    pub fn ok<T: Serialize>(self, result: T) -> Result<(), CallError> {
        let outcome = serde_json::to_value(result)
            .map_err(|e| RpcError::internal_error(format!("Failed to serialize result: {e}")));
        self.respond(outcome)
    }

    /// Sends an error response.
    ///
    /// # Errors
    ///
    /// Returns [`CallError::SessionClosed`] if the session has stopped.
    pub fn err(self, error: RpcError) -> Result<(), CallError> {
        self.respond(Err(error))
    }
}

impl Drop for ReplyHandle {
    fn drop(&mut self) {
        if !self.answered {
            warn!(
                target: targets::SESSION,
                "Request {} ({}) dropped without a response", self.id, self.method
            );
        }
    }
}
