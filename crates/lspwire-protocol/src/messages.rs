//! Typed method definitions.
//!
//! A method is a zero-sized marker type implementing [`Request`] or
//! [`Notification`]; it ties a wire method name to its parameter and result
//! types. The catalog below covers only the methods the core itself relies
//! on. Applications define the rest of the protocol the same way.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::types::{
    CancelParams, InitializedParams, SemanticTokens, SemanticTokensDeltaParams,
    SemanticTokensFullDeltaResult, SemanticTokensParams, SemanticTokensRangeParams,
};

/// A method that expects a response.
pub trait Request: 'static {
    /// Wire method name.
    const METHOD: &'static str;
    /// Parameter type. `()` means the message carries no `params`.
    type Params: Serialize + DeserializeOwned + Send + 'static;
    /// Result type.
    type Result: Serialize + DeserializeOwned + Send + 'static;
}

/// A method with no response.
pub trait Notification: 'static {
    /// Wire method name.
    const METHOD: &'static str;
    /// Parameter type. `()` means the message carries no `params`.
    type Params: Serialize + DeserializeOwned + Send + 'static;
}

/// `initialized` notification.
#[derive(Debug)]
pub enum Initialized {}

impl Notification for Initialized {
    const METHOD: &'static str = "initialized";
    type Params = InitializedParams;
}

/// `exit` notification.
#[derive(Debug)]
pub enum Exit {}

impl Notification for Exit {
    const METHOD: &'static str = "exit";
    type Params = ();
}

/// `$/cancelRequest` notification. Advisory only.
#[derive(Debug)]
pub enum Cancel {}

impl Notification for Cancel {
    const METHOD: &'static str = "$/cancelRequest";
    type Params = CancelParams;
}

/// `shutdown` request.
#[derive(Debug)]
pub enum Shutdown {}

impl Request for Shutdown {
    const METHOD: &'static str = "shutdown";
    type Params = ();
    type Result = ();
}

/// `textDocument/semanticTokens/full` request.
#[derive(Debug)]
pub enum SemanticTokensFull {}

impl Request for SemanticTokensFull {
    const METHOD: &'static str = "textDocument/semanticTokens/full";
    type Params = SemanticTokensParams;
    type Result = Option<SemanticTokens>;
}

/// `textDocument/semanticTokens/full/delta` request.
#[derive(Debug)]
pub enum SemanticTokensFullDelta {}

impl Request for SemanticTokensFullDelta {
    const METHOD: &'static str = "textDocument/semanticTokens/full/delta";
    type Params = SemanticTokensDeltaParams;
    type Result = Option<SemanticTokensFullDeltaResult>;
}

/// `textDocument/semanticTokens/range` request.
#[derive(Debug)]
pub enum SemanticTokensRange {}

impl Request for SemanticTokensRange {
    const METHOD: &'static str = "textDocument/semanticTokens/range";
    type Params = SemanticTokensRangeParams;
    type Result = Option<SemanticTokens>;
}
