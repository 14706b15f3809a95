//! Core types shared by every lspwire crate.
//!
//! This crate provides:
//! - [`RpcError`] and [`ErrorCode`], the JSON-RPC error object and codes
//! - [`logging`] targets and re-exported `log` macros
//! - [`SessionConfig`] for tuning sessions and framers

#![forbid(unsafe_code)]

pub mod config;
mod error;
pub mod logging;

pub use config::SessionConfig;
pub use error::{ErrorCode, RpcError};
