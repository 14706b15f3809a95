//! Structured logging for lspwire.
//!
//! All lspwire crates log through the standard [`log`] facade. Nothing here
//! installs a logger; applications initialize their preferred backend.
//!
//! # Log Levels
//!
//! - **error**: Fatal framing or I/O failures that end a session
//! - **warn**: Recovered protocol errors, reply handles dropped unanswered
//! - **info**: Session lifecycle (start, close)
//! - **debug**: Request/response flow, dispatch decisions
//! - **trace**: Wire-level frame details
//!
//! # Log Targets
//!
//! - `lspwire`: Root target for all lspwire logs
//! - `lspwire::transport`: Byte source/sink reads and writes
//! - `lspwire::codec`: Header parsing and framing
//! - `lspwire::session`: Correlation, classification, teardown
//! - `lspwire::dispatch`: Method decoding
//! - `lspwire::tokens`: Semantic token buffer updates
//!
//! Example filter: `RUST_LOG=lspwire::session=debug,lspwire::codec=trace`

pub use log::{debug, error, info, trace, warn};

pub use log::{Level, LevelFilter};

/// Log targets used by lspwire components.
pub mod targets {
    /// Root target for all lspwire logs.
    pub const LSPWIRE: &str = "lspwire";

    /// Byte source and sink I/O.
    pub const TRANSPORT: &str = "lspwire::transport";

    /// Header parsing and framing.
    pub const CODEC: &str = "lspwire::codec";

    /// Session correlation and classification.
    pub const SESSION: &str = "lspwire::session";

    /// Method-name dispatch.
    pub const DISPATCH: &str = "lspwire::dispatch";

    /// Semantic token buffer.
    pub const TOKENS: &str = "lspwire::tokens";
}

/// Returns whether logging is enabled at the given level for the given target.
///
/// Useful to skip rendering payloads that are only needed for trace output.
#[inline]
#[must_use]
pub fn is_enabled(level: Level, target: &str) -> bool {
    log::log_enabled!(target: target, level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_targets_are_hierarchical() {
        assert!(targets::TRANSPORT.starts_with(targets::LSPWIRE));
        assert!(targets::CODEC.starts_with(targets::LSPWIRE));
        assert!(targets::SESSION.starts_with(targets::LSPWIRE));
        assert!(targets::DISPATCH.starts_with(targets::LSPWIRE));
        assert!(targets::TOKENS.starts_with(targets::LSPWIRE));
    }

    #[test]
    fn disabled_without_logger() {
        // No logger is installed in unit tests.
        assert!(!is_enabled(Level::Trace, targets::CODEC));
    }
}
