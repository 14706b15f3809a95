//! Base LSP wire types used by the core.
//!
//! The full catalog of protocol payloads lives outside this crate; only the
//! shapes the core itself reads or produces are defined here.

use serde::{Deserialize, Serialize};

use crate::jsonrpc::RequestId;
use crate::union::TwoOf;

/// Zero-based position in a text document.
///
/// Ordering is by line, then character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Line number.
    pub line: u32,
    /// Character offset on the line.
    pub character: u32,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// Half-open range between two positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    /// Start position (inclusive).
    pub start: Position,
    /// End position (exclusive).
    pub end: Position,
}

impl Range {
    /// Creates a range.
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Identifies a text document by URI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextDocumentIdentifier {
    /// Document URI.
    pub uri: String,
}

/// `$/cancelRequest` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelParams {
    /// ID of the request to cancel.
    pub id: RequestId,
}

/// `initialized` params (an empty object).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializedParams {}

// ============================================================================
// Semantic tokens
// ============================================================================

/// Names used to interpret token type indices and modifier bits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticTokensLegend {
    /// Token type names, indexed by `tokenTypeIndex`.
    pub token_types: Vec<String>,
    /// Token modifier names, indexed by bit position.
    pub token_modifiers: Vec<String>,
}

/// A full semantic token result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticTokens {
    /// Identifier for a later delta request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    /// Relative-encoded token quintuples.
    pub data: Vec<u32>,
}

/// One splice of a semantic token delta.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticTokensEdit {
    /// Start offset into the previous token array.
    pub start: u32,
    /// Number of elements to remove.
    pub delete_count: u32,
    /// Elements to insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u32>>,
}

/// A delta semantic token result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticTokensDelta {
    /// Identifier for the next delta request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_id: Option<String>,
    /// Edits against the previous token array.
    pub edits: Vec<SemanticTokensEdit>,
}

/// `textDocument/semanticTokens/full/delta` result: full tokens or a delta.
///
/// `SemanticTokens` is declared first; a payload carrying `data` decodes as a
/// full result.
pub type SemanticTokensFullDeltaResult = TwoOf<SemanticTokens, SemanticTokensDelta>;

/// `textDocument/semanticTokens/full` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticTokensParams {
    /// The document.
    pub text_document: TextDocumentIdentifier,
}

/// `textDocument/semanticTokens/full/delta` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticTokensDeltaParams {
    /// The document.
    pub text_document: TextDocumentIdentifier,
    /// `resultId` of the previous response.
    pub previous_result_id: String,
}

/// `textDocument/semanticTokens/range` params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticTokensRangeParams {
    /// The document.
    pub text_document: TextDocumentIdentifier,
    /// Range to compute tokens for.
    pub range: Range,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn positions_order_by_line_then_character() {
        assert!(Position::new(0, 9) < Position::new(1, 0));
        assert!(Position::new(2, 3) < Position::new(2, 4));
        assert_eq!(Position::new(1, 1), Position::new(1, 1));
    }

    #[test]
    fn full_delta_result_prefers_full_tokens() {
        let full: SemanticTokensFullDeltaResult =
            serde_json::from_value(json!({"resultId": "1", "data": [0, 0, 7, 15, 0]})).unwrap();
        assert!(matches!(full, TwoOf::First(SemanticTokens { ref data, .. }) if data.len() == 5));

        let delta: SemanticTokensFullDeltaResult = serde_json::from_value(json!({
            "resultId": "2",
            "edits": [{"start": 5, "deleteCount": 5}]
        }))
        .unwrap();
        match delta {
            TwoOf::Second(delta) => {
                assert_eq!(delta.result_id.as_deref(), Some("2"));
                assert_eq!(delta.edits[0].delete_count, 5);
                assert!(delta.edits[0].data.is_none());
            }
            TwoOf::First(_) => panic!("expected delta"),
        }
    }

    #[test]
    fn legend_uses_camel_case() {
        let legend = SemanticTokensLegend {
            token_types: vec!["keyword".into()],
            token_modifiers: vec![],
        };
        assert_eq!(
            serde_json::to_value(&legend).unwrap(),
            json!({"tokenTypes": ["keyword"], "tokenModifiers": []})
        );
    }

    #[test]
    fn cancel_params_accept_either_id_kind() {
        let numeric: CancelParams = serde_json::from_value(json!({"id": 4})).unwrap();
        assert_eq!(numeric.id, RequestId::Number(4));
        let text: CancelParams = serde_json::from_value(json!({"id": "x"})).unwrap();
        assert_eq!(text.id, RequestId::String("x".into()));
    }
}
