//! JSON-RPC envelope, method dispatch and base LSP wire types.
//!
//! This crate provides:
//! - The generic JSON-RPC [`Envelope`] and its classification into
//!   requests, notifications and responses
//! - [`Request`] / [`Notification`] method traits and a small base catalog
//! - The [`Dispatcher`] registry mapping method names to typed values
//! - [`TwoOf`] / [`ThreeOf`] untagged unions
//! - Positions, ranges and semantic token wire shapes
//!
//! # Wire Format
//!
//! Envelopes are UTF-8 JSON objects. Framing is handled by the transport
//! crate.

#![forbid(unsafe_code)]

pub mod dispatch;
mod jsonrpc;
pub mod messages;
mod types;
mod union;

pub use dispatch::{DecodeError, Dispatcher, encode_notification, encode_request};
pub use jsonrpc::{
    Envelope, EnvelopeError, IncomingCall, JSONRPC_VERSION, Message, RequestId, Response,
};
pub use messages::{Notification, Request};
pub use types::*;
pub use union::{ThreeOf, TwoOf, UnionError};
