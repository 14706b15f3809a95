//! Method-name dispatch.
//!
//! A [`Dispatcher`] is the single table mapping wire method names to a
//! parameter decoder and a constructor for the application's typed message
//! enums. Requests and notifications live in separate namespaces. The same
//! dispatcher is shared by every session, whatever its transport.
//!
//! # Example
//!
//! ```ignore
//! enum ServerRequest { Shutdown, Tokens(SemanticTokensParams) }
//! enum ServerNotification { Exit, Cancel(CancelParams) }
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher
//!     .register_request::<Shutdown>(|()| ServerRequest::Shutdown)
//!     .register_request::<SemanticTokensFull>(ServerRequest::Tokens)
//!     .register_notification::<Exit>(|()| ServerNotification::Exit)
//!     .register_notification::<Cancel>(ServerNotification::Cancel);
//! ```

use std::collections::HashMap;

use lspwire_core::RpcError;
use lspwire_core::logging::{debug, targets, warn};
use serde_json::Value;

use crate::messages::{Notification, Request};

type Decoder<T> = Box<dyn Fn(Option<Value>) -> Result<T, serde_json::Error> + Send + Sync>;

/// Routes method names to typed request and notification values.
pub struct Dispatcher<R, N> {
    requests: HashMap<&'static str, Decoder<R>>,
    notifications: HashMap<&'static str, Decoder<N>>,
}

impl<R, N> std::fmt::Debug for Dispatcher<R, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut requests: Vec<_> = self.requests.keys().collect();
        let mut notifications: Vec<_> = self.notifications.keys().collect();
        requests.sort();
        notifications.sort();
        f.debug_struct("Dispatcher")
            .field("requests", &requests)
            .field("notifications", &notifications)
            .finish()
    }
}

impl<R: 'static, N: 'static> Default for Dispatcher<R, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: 'static, N: 'static> Dispatcher<R, N> {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self {
            requests: HashMap::new(),
            notifications: HashMap::new(),
        }
    }

    /// Registers a request method with the constructor for its typed value.
    ///
    /// Registering the same method twice replaces the earlier entry.
    pub fn register_request<M: Request>(
        &mut self,
        construct: impl Fn(M::Params) -> R + Send + Sync + 'static,
    ) -> &mut Self {
        let decoder: Decoder<R> =
            Box::new(move |params| decode_params::<M::Params>(params).map(&construct));
        if self.requests.insert(M::METHOD, decoder).is_some() {
            warn!(target: targets::DISPATCH, "Request method replaced: {}", M::METHOD);
        }
        self
    }

    /// Registers a notification method with the constructor for its typed value.
    ///
    /// Registering the same method twice replaces the earlier entry.
    pub fn register_notification<M: Notification>(
        &mut self,
        construct: impl Fn(M::Params) -> N + Send + Sync + 'static,
    ) -> &mut Self {
        let decoder: Decoder<N> =
            Box::new(move |params| decode_params::<M::Params>(params).map(&construct));
        if self.notifications.insert(M::METHOD, decoder).is_some() {
            warn!(target: targets::DISPATCH, "Notification method replaced: {}", M::METHOD);
        }
        self
    }

    /// Returns true if a request method is registered.
    #[must_use]
    pub fn has_request(&self, method: &str) -> bool {
        self.requests.contains_key(method)
    }

    /// Returns true if a notification method is registered.
    #[must_use]
    pub fn has_notification(&self, method: &str) -> bool {
        self.notifications.contains_key(method)
    }

    /// Decodes an incoming request into its typed value.
    pub fn decode_request(&self, method: &str, params: Option<Value>) -> Result<R, DecodeError> {
        let decoder = self
            .requests
            .get(method)
            .ok_or_else(|| DecodeError::UnrecognizedMethod(method.to_owned()))?;
        debug!(target: targets::DISPATCH, "Decoding request {}", method);
        decoder(params).map_err(|source| DecodeError::InvalidParams {
            method: method.to_owned(),
            source,
        })
    }

    /// Decodes an incoming notification into its typed value.
    pub fn decode_notification(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<N, DecodeError> {
        let decoder = self
            .notifications
            .get(method)
            .ok_or_else(|| DecodeError::UnrecognizedMethod(method.to_owned()))?;
        debug!(target: targets::DISPATCH, "Decoding notification {}", method);
        decoder(params).map_err(|source| DecodeError::InvalidParams {
            method: method.to_owned(),
            source,
        })
    }
}

/// Encodes request params into `(method, params)` for the wire.
pub fn encode_request<M: Request>(
    params: &M::Params,
) -> Result<(&'static str, Option<Value>), serde_json::Error> {
    Ok((M::METHOD, encode_params(params)?))
}

/// Encodes notification params into `(method, params)` for the wire.
pub fn encode_notification<M: Notification>(
    params: &M::Params,
) -> Result<(&'static str, Option<Value>), serde_json::Error> {
    Ok((M::METHOD, encode_params(params)?))
}

/// `null` params (including `()`) are omitted from the envelope.
fn encode_params<P: serde::Serialize>(params: &P) -> Result<Option<Value>, serde_json::Error> {
    match serde_json::to_value(params)? {
        Value::Null => Ok(None),
        value => Ok(Some(value)),
    }
}

/// Absent params decode as `null`, so `()` accepts them and structs reject them.
fn decode_params<P: serde::de::DeserializeOwned>(
    params: Option<Value>,
) -> Result<P, serde_json::Error> {
    serde_json::from_value(params.unwrap_or(Value::Null))
}

/// Failure decoding an incoming call.
#[derive(Debug)]
pub enum DecodeError {
    /// No entry for the method name.
    UnrecognizedMethod(String),
    /// Params missing or not matching the method's schema.
    InvalidParams {
        /// Method name.
        method: String,
        /// Underlying decode error.
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// The error object to send back when the call was a request.
    #[must_use]
    pub fn to_rpc_error(&self) -> RpcError {
        match self {
            DecodeError::UnrecognizedMethod(method) => RpcError::method_not_found(method),
            DecodeError::InvalidParams { method, source } => {
                RpcError::invalid_params(format!("Invalid params for {method}: {source}"))
            }
        }
    }
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::UnrecognizedMethod(method) => write!(f, "unrecognized method: {method}"),
            DecodeError::InvalidParams { method, source } => {
                write!(f, "invalid params for {method}: {source}")
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::UnrecognizedMethod(_) => None,
            DecodeError::InvalidParams { source, .. } => Some(source),
        }
    }
}
