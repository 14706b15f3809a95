//! Session configuration.

/// Default upper bound for a single framed message (10 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Default number of bytes requested per read from the byte source.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 8 * 1024;

/// Tunables for a session and its framer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Largest `Content-Length` accepted before the framer fails.
    pub max_message_size: usize,
    /// Bytes requested per read from the source (minimum 1).
    pub read_chunk_size: usize,
    /// Send `$/cancelRequest` to the peer when a pending call is abandoned.
    pub cancel_on_abandon: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            cancel_on_abandon: true,
        }
    }
}

impl SessionConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration from environment variables.
    ///
    /// Respects:
    /// - `LSPWIRE_MAX_MESSAGE_SIZE`: Maximum message size in bytes
    /// - `LSPWIRE_READ_CHUNK_SIZE`: Read chunk size in bytes
    /// - `LSPWIRE_CANCEL_ON_ABANDON`: 0/false to disable remote cancel notifications
    ///
    /// Missing or unparsable values fall back to the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let max_message_size = lookup("LSPWIRE_MAX_MESSAGE_SIZE")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(defaults.max_message_size);

        let read_chunk_size = lookup("LSPWIRE_READ_CHUNK_SIZE")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(defaults.read_chunk_size);

        let cancel_on_abandon = lookup("LSPWIRE_CANCEL_ON_ABANDON")
            .map(|s| !matches!(s.to_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(defaults.cancel_on_abandon);

        Self {
            max_message_size,
            read_chunk_size,
            cancel_on_abandon,
        }
    }

    /// Sets the maximum message size.
    #[must_use]
    pub fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Sets the read chunk size. Zero is clamped to one.
    #[must_use]
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// Enables or disables `$/cancelRequest` on abandonment.
    #[must_use]
    pub fn with_cancel_on_abandon(mut self, enabled: bool) -> Self {
        self.cancel_on_abandon = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = SessionConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, SessionConfig::default());
    }

    #[test]
    fn reads_values_from_environment() {
        let config = SessionConfig::from_lookup(lookup_from(&[
            ("LSPWIRE_MAX_MESSAGE_SIZE", "2048"),
            ("LSPWIRE_READ_CHUNK_SIZE", " 16 "),
            ("LSPWIRE_CANCEL_ON_ABANDON", "false"),
        ]));
        assert_eq!(config.max_message_size, 2048);
        assert_eq!(config.read_chunk_size, 16);
        assert!(!config.cancel_on_abandon);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = SessionConfig::from_lookup(lookup_from(&[
            ("LSPWIRE_MAX_MESSAGE_SIZE", "lots"),
            ("LSPWIRE_READ_CHUNK_SIZE", "0"),
        ]));
        assert_eq!(config.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
        assert_eq!(config.read_chunk_size, DEFAULT_READ_CHUNK_SIZE);
    }

    #[test]
    fn builder_clamps_chunk_size() {
        let config = SessionConfig::new().with_read_chunk_size(0);
        assert_eq!(config.read_chunk_size, 1);
    }
}
