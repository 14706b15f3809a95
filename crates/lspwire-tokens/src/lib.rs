//! Incremental semantic token buffer.
//!
//! Servers send semantic tokens as a flat array of relative-encoded
//! quintuples `(deltaLine, deltaStartChar, length, tokenType, modifiers)`,
//! either whole or as edits against the previous result. A
//! [`TokenDeltaEngine`] keeps the client's copy of that array current and
//! decodes it into absolute ranges on demand.
//!
//! ```ignore
//! let mut engine = TokenDeltaEngine::new(legend);
//! engine.apply_full(&[0, 0, 7, 15, 0]);
//! for token in engine.decode_tokens(visible_range) {
//!     paint(token.range, &token.token_type);
//! }
//! ```

#![forbid(unsafe_code)]

mod engine;

pub use engine::{DecodedToken, TokenDeltaEngine};
