//! The semantic token buffer.

use std::collections::BTreeSet;

use lspwire_core::logging::{debug, targets, trace};
use lspwire_protocol::{
    Position, Range, SemanticTokens, SemanticTokensDelta, SemanticTokensEdit,
    SemanticTokensFullDeltaResult, SemanticTokensLegend, TwoOf,
};

/// Elements per encoded token.
const TOKEN_STRIDE: usize = 5;

/// A token resolved to absolute positions and legend names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedToken {
    /// Span of the token on a single line.
    pub range: Range,
    /// Name from the legend's token types.
    pub token_type: String,
    /// Modifier names. Always empty: modifier bits are not decoded.
    pub modifiers: BTreeSet<String>,
}

/// Client-side copy of a document's relative-encoded semantic tokens.
///
/// Fed by full results and delta edits from the server; answers range
/// queries with absolute positions. Not synchronized: wrap it in a lock if
/// more than one task mutates it.
///
/// The buffer is assumed to hold whole quintuples in position order, as the
/// server sends them. Neither is checked.
#[derive(Debug, Clone)]
pub struct TokenDeltaEngine {
    legend: SemanticTokensLegend,
    data: Vec<u32>,
    result_id: Option<String>,
}

impl TokenDeltaEngine {
    /// Creates an empty buffer resolving types through `legend`.
    #[must_use]
    pub fn new(legend: SemanticTokensLegend) -> Self {
        Self {
            legend,
            data: Vec::new(),
            result_id: None,
        }
    }

    /// The legend supplied at construction.
    #[must_use]
    pub fn legend(&self) -> &SemanticTokensLegend {
        &self.legend
    }

    /// The raw encoded buffer.
    #[must_use]
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Number of encoded tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() / TOKEN_STRIDE
    }

    /// Returns true if the buffer holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The `resultId` of the last result applied through [`Self::apply`],
    /// to send as `previousResultId` in the next delta request.
    #[must_use]
    pub fn result_id(&self) -> Option<&str> {
        self.result_id.as_deref()
    }

    /// Replaces the buffer with `new_data`.
    ///
    /// Only the tail after the longest common prefix is rewritten. Affected
    /// ranges are not computed; the returned list is always empty.
    pub fn apply_full(&mut self, new_data: &[u32]) -> Vec<Range> {
        let prefix = self
            .data
            .iter()
            .zip(new_data)
            .take_while(|(old, new)| old == new)
            .count();

        if prefix == self.data.len() && prefix == new_data.len() {
            trace!(target: targets::TOKENS, "Full result unchanged ({} values)", prefix);
            return Vec::new();
        }

        self.data.truncate(prefix);
        self.data.extend_from_slice(&new_data[prefix..]);
        debug!(
            target: targets::TOKENS,
            "Full result replaced {} values after a common prefix of {}",
            new_data.len() - prefix,
            prefix
        );
        Vec::new()
    }

    /// Applies delta edits expressed against the current buffer's indices.
    ///
    /// Edits are applied from the highest `start` down so that each one
    /// still sees the offsets it was computed against. Edits reaching past
    /// the end of the buffer are clamped to it. Affected ranges are not
    /// computed; the returned list is always empty.
    pub fn apply_delta(&mut self, mut edits: Vec<SemanticTokensEdit>) -> Vec<Range> {
        edits.sort_by(|a, b| b.start.cmp(&a.start));

        for edit in edits {
            let len = self.data.len();
            let start = (edit.start as usize).min(len);
            let end = start.saturating_add(edit.delete_count as usize).min(len);
            let insert = edit.data.unwrap_or_default();
            trace!(
                target: targets::TOKENS,
                "Splicing [{}, {}) with {} values",
                start,
                end,
                insert.len()
            );
            self.data.splice(start..end, insert);
        }
        Vec::new()
    }

    /// Applies a `textDocument/semanticTokens/full/delta` result and
    /// remembers its `resultId`.
    pub fn apply(&mut self, result: SemanticTokensFullDeltaResult) -> Vec<Range> {
        match result {
            TwoOf::First(SemanticTokens { result_id, data }) => {
                self.result_id = result_id;
                self.apply_full(&data)
            }
            TwoOf::Second(SemanticTokensDelta { result_id, edits }) => {
                self.result_id = result_id;
                self.apply_delta(edits)
            }
        }
    }

    /// Decodes the tokens overlapping `range`.
    ///
    /// A token touching either boundary counts as overlapping. Tokens whose
    /// type index is outside the legend are skipped.
    #[must_use]
    pub fn decode_tokens(&self, range: Range) -> Vec<DecodedToken> {
        let mut tokens = Vec::new();
        let mut line = 0u32;
        let mut start_char = 0u32;

        for quintuple in self.data.chunks_exact(TOKEN_STRIDE) {
            let [delta_line, delta_start, length, token_type, _modifiers] = quintuple else {
                continue;
            };

            line = line.wrapping_add(*delta_line);
            start_char = if *delta_line == 0 {
                start_char.wrapping_add(*delta_start)
            } else {
                *delta_start
            };

            let start = Position::new(line, start_char);
            let end = Position::new(line, start_char.wrapping_add(*length));

            if start >= range.end {
                break;
            }
            if end < range.start {
                continue;
            }

            let Some(name) = self.legend.token_types.get(*token_type as usize) else {
                trace!(
                    target: targets::TOKENS,
                    "Token type index {} outside legend; skipping",
                    token_type
                );
                continue;
            };

            tokens.push(DecodedToken {
                range: Range::new(start, end),
                token_type: name.clone(),
                modifiers: BTreeSet::new(),
            });
        }
        tokens
    }
}
