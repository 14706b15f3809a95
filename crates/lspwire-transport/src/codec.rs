//! Message codec for framing JSON-RPC payloads.
//!
//! LSP frames every payload with HTTP-like headers:
//!
//! ```text
//! Content-Length: <n>\r\n
//! (<Header-Name>: <value>\r\n)*
//! \r\n
//! <n bytes of UTF-8 JSON>
//! ```
//!
//! Unknown headers are ignored. Header lines must end in CR LF; a bare LF is
//! a fatal framing error.

use lspwire_core::logging::{targets, trace};
use lspwire_protocol::Envelope;

/// Longest header line accepted before the stream is considered malformed.
const MAX_HEADER_LINE: usize = 8 * 1024;

/// Threshold for compacting the buffer (bytes already consumed).
const COMPACT_THRESHOLD: usize = 4096;

const CONTENT_LENGTH: &str = "Content-Length";

/// Codec for encoding/decoding Content-Length framed payloads.
///
/// Decoding is push-based: [`FrameCodec::feed`] appends raw bytes and
/// [`FrameCodec::decode_next`] pulls at most one complete payload. Partial
/// headers or bodies stay buffered until more bytes arrive.
#[derive(Debug)]
pub struct FrameCodec {
    /// Buffer for incomplete messages.
    buffer: Vec<u8>,
    /// Read position in buffer (data before this has been consumed).
    read_pos: usize,
    /// Maximum allowed payload size in bytes.
    max_message_size: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCodec {
    /// Creates a new codec with default settings (10MB limit).
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_message_size(lspwire_core::config::DEFAULT_MAX_MESSAGE_SIZE)
    }

    /// Creates a codec with the given payload size limit.
    #[must_use]
    pub fn with_max_message_size(max_message_size: usize) -> Self {
        Self {
            buffer: Vec::new(),
            read_pos: 0,
            max_message_size,
        }
    }

    /// Returns the maximum allowed payload size in bytes.
    #[must_use]
    pub fn max_message_size(&self) -> usize {
        self.max_message_size
    }

    /// Frames a payload: `Content-Length: <n>\r\n\r\n` followed by the bytes.
    #[must_use]
    pub fn encode(payload: &[u8]) -> Vec<u8> {
        let header = format!("{CONTENT_LENGTH}: {}\r\n\r\n", payload.len());
        let mut bytes = Vec::with_capacity(header.len() + payload.len());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    /// Serializes and frames an envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn encode_envelope(envelope: &Envelope) -> Result<Vec<u8>, CodecError> {
        let payload = envelope.to_vec()?;
        Ok(Self::encode(&payload))
    }

    /// Appends raw bytes from the source.
    pub fn feed(&mut self, data: &[u8]) {
        // Compact buffer if read_pos is large (to prevent unbounded growth)
        if self.read_pos >= COMPACT_THRESHOLD {
            self.buffer.drain(..self.read_pos);
            self.read_pos = 0;
        }
        self.buffer.extend_from_slice(data);
    }

    /// Returns true if unconsumed bytes are buffered.
    #[must_use]
    pub fn has_buffered(&self) -> bool {
        self.read_pos < self.buffer.len()
    }

    /// Feeds bytes and returns every payload they complete.
    ///
    /// # Errors
    ///
    /// Returns the first framing error; the buffer is cleared.
    pub fn decode(&mut self, data: &[u8]) -> Result<Vec<Vec<u8>>, CodecError> {
        self.feed(data);
        let mut payloads = Vec::new();
        while let Some(payload) = self.decode_next()? {
            payloads.push(payload);
        }
        Ok(payloads)
    }

    /// Extracts the next complete payload from the buffer, if any.
    ///
    /// Returns `Ok(None)` when more bytes are needed. Blank lines before a
    /// header block are skipped.
    ///
    /// # Errors
    ///
    /// Framing errors are fatal: the buffer is cleared and the stream must
    /// not be decoded further.
    pub fn decode_next(&mut self) -> Result<Option<Vec<u8>>, CodecError> {
        match self.try_decode() {
            Ok(payload) => Ok(payload),
            Err(err) => {
                self.clear();
                Err(err)
            }
        }
    }

    fn try_decode(&mut self) -> Result<Option<Vec<u8>>, CodecError> {
        let mut pos = self.read_pos;
        let mut content_length: Option<usize> = None;
        let mut saw_header = false;

        loop {
            let Some(offset) = self.buffer[pos..].iter().position(|&b| b == b'\n') else {
                if self.buffer.len() - pos > MAX_HEADER_LINE {
                    return Err(CodecError::MalformedFraming(format!(
                        "header line exceeds {MAX_HEADER_LINE} bytes"
                    )));
                }
                return Ok(None);
            };
            let newline = pos + offset;
            if newline == pos || self.buffer[newline - 1] != b'\r' {
                return Err(CodecError::MalformedFraming(
                    "header line terminated by bare LF".to_owned(),
                ));
            }
            let line = &self.buffer[pos..newline - 1];
            pos = newline + 1;

            if line.is_empty() {
                if saw_header {
                    break;
                }
                // Stray blank line between messages.
                self.read_pos = pos;
                continue;
            }
            saw_header = true;

            let (name, value) = parse_header_line(line)?;
            trace!(target: targets::CODEC, "Header {}: {}", name, value);
            if name.eq_ignore_ascii_case(CONTENT_LENGTH) {
                if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(CodecError::InvalidContentLength(value.to_owned()));
                }
                let length = value
                    .parse::<usize>()
                    .map_err(|_| CodecError::InvalidContentLength(value.to_owned()))?;
                if length > self.max_message_size {
                    return Err(CodecError::MessageTooLarge(length));
                }
                content_length = Some(length);
            }
        }

        let length = content_length.ok_or(CodecError::ContentLengthMissing)?;
        if self.buffer.len() - pos < length {
            return Ok(None);
        }

        let payload = self.buffer[pos..pos + length].to_vec();
        self.read_pos = pos + length;
        trace!(target: targets::CODEC, "Decoded frame of {} bytes", length);
        Ok(Some(payload))
    }

    /// Clears the internal buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.read_pos = 0;
    }
}

fn parse_header_line(line: &[u8]) -> Result<(&str, &str), CodecError> {
    let text = std::str::from_utf8(line)
        .map_err(|_| CodecError::MalformedFraming("header line is not UTF-8".to_owned()))?;
    if text.contains('\r') {
        return Err(CodecError::MalformedFraming(
            "carriage return inside header field".to_owned(),
        ));
    }
    let (name, value) = text
        .split_once(':')
        .ok_or_else(|| CodecError::MalformedFraming(format!("header without colon: {text}")))?;
    Ok((name.trim(), value.trim()))
}

/// Codec error types.
#[derive(Debug)]
pub enum CodecError {
    /// A header line is not `Name: Value` terminated by CR LF.
    MalformedFraming(String),
    /// The header block has no `Content-Length`.
    ContentLengthMissing,
    /// `Content-Length` is not a base-10 integer.
    InvalidContentLength(String),
    /// Declared payload exceeds the configured limit.
    MessageTooLarge(usize),
    /// JSON encoding error.
    Json(serde_json::Error),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::MalformedFraming(reason) => write!(f, "Malformed framing: {reason}"),
            CodecError::ContentLengthMissing => write!(f, "Missing Content-Length header"),
            CodecError::InvalidContentLength(value) => {
                write!(f, "Invalid Content-Length: {value:?}")
            }
            CodecError::MessageTooLarge(size) => write!(f, "Message too large: {size} bytes"),
            CodecError::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CodecError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::Json(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lspwire_protocol::RequestId;
    use proptest::prelude::*;
    use std::error::Error;

    #[test]
    fn frame_of_empty_object() {
        assert_eq!(FrameCodec::encode(b"{}"), b"Content-Length: 2\r\n\r\n{}".to_vec());
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let envelope = Envelope::request(RequestId::Number(1), "shutdown", None);
        let encoded = FrameCodec::encode_envelope(&envelope).unwrap();
        assert!(encoded.starts_with(b"Content-Length: "));

        let mut codec = FrameCodec::new();
        let payloads = codec.decode(&encoded).unwrap();
        assert_eq!(payloads.len(), 1);
        let decoded = Envelope::from_slice(&payloads[0]).unwrap();
        assert_eq!(decoded.method.as_deref(), Some("shutdown"));
        assert!(!codec.has_buffered());
    }

    #[test]
    fn extra_headers_are_ignored_in_any_order() {
        let input = b"Another-Header: x\r\nContent-Length: 4\r\nAnd-Another: y\r\n\r\nnull";
        let mut codec = FrameCodec::new();
        assert_eq!(codec.decode(input).unwrap(), vec![b"null".to_vec()]);

        let input = b"Content-Type: application/vscode-jsonrpc; charset=utf-8\r\ncontent-length: 2\r\n\r\n[]";
        let mut codec = FrameCodec::new();
        assert_eq!(codec.decode(input).unwrap(), vec![b"[]".to_vec()]);
    }

    #[test]
    fn test_decode_multiple_messages() {
        let mut input = FrameCodec::encode(b"{\"a\":1}");
        input.extend(FrameCodec::encode(b"{\"b\":2}"));

        let mut codec = FrameCodec::new();
        let payloads = codec.decode(&input).unwrap();
        assert_eq!(payloads, vec![b"{\"a\":1}".to_vec(), b"{\"b\":2}".to_vec()]);
    }

    #[test]
    fn test_decode_partial_message() {
        let mut codec = FrameCodec::new();

        let messages = codec.decode(b"Content-Len").unwrap();
        assert!(messages.is_empty());
        let messages = codec.decode(b"gth: 7\r\n\r\n{\"x\"").unwrap();
        assert!(messages.is_empty());
        let messages = codec.decode(b":1}").unwrap();
        assert_eq!(messages, vec![b"{\"x\":1}".to_vec()]);
    }

    #[test]
    fn truncated_body_yields_nothing() {
        let mut codec = FrameCodec::new();
        let payloads = codec.decode(b"Content-Length: 10\r\n\r\n12345").unwrap();
        assert!(payloads.is_empty());
        assert!(codec.has_buffered());
    }

    #[test]
    fn bare_lf_is_malformed() {
        let mut codec = FrameCodec::new();
        let result = codec.decode(b"Content-Length: 2\n\r\n{}");
        assert!(matches!(result, Err(CodecError::MalformedFraming(_))));
        assert!(!codec.has_buffered());

        let mut codec = FrameCodec::new();
        let result = codec.decode(b"Content-Length: 2\r\n\n{}");
        assert!(matches!(result, Err(CodecError::MalformedFraming(_))));
    }

    #[test]
    fn carriage_return_inside_field_is_malformed() {
        let mut codec = FrameCodec::new();
        let result = codec.decode(b"Content-Length: 2\rX\r\n\r\n{}");
        assert!(matches!(result, Err(CodecError::MalformedFraming(_))));
    }

    #[test]
    fn missing_content_length() {
        let mut codec = FrameCodec::new();
        let result = codec.decode(b"Content-Type: text/plain\r\n\r\n{}");
        assert!(matches!(result, Err(CodecError::ContentLengthMissing)));
    }

    #[test]
    fn invalid_content_length() {
        let mut codec = FrameCodec::new();
        let result = codec.decode(b"Content-Length: ten\r\n\r\n");
        assert!(matches!(result, Err(CodecError::InvalidContentLength(v)) if v == "ten"));
    }

    #[test]
    fn signed_content_length_is_invalid() {
        for value in ["+5", "-5", "", "5 5"] {
            let mut codec = FrameCodec::new();
            let input = format!("Content-Length: {value}\r\n\r\nhello");
            let result = codec.decode(input.as_bytes());
            assert!(
                matches!(result, Err(CodecError::InvalidContentLength(ref v)) if v == value),
                "accepted {value:?}"
            );
        }
    }

    #[test]
    fn stray_blank_lines_are_skipped() {
        let mut input = b"\r\n\r\n".to_vec();
        input.extend(FrameCodec::encode(b"1"));
        let mut codec = FrameCodec::new();
        assert_eq!(codec.decode(&input).unwrap(), vec![b"1".to_vec()]);
    }

    #[test]
    fn test_decode_rejects_oversized_message() {
        let mut codec = FrameCodec::with_max_message_size(8);
        let result = codec.decode(b"Content-Length: 9\r\n\r\n");
        assert!(matches!(result, Err(CodecError::MessageTooLarge(9))));
    }

    #[test]
    fn overlong_header_line_is_malformed() {
        let mut codec = FrameCodec::new();
        let junk = vec![b'a'; MAX_HEADER_LINE + 1];
        let result = codec.decode(&junk);
        assert!(matches!(result, Err(CodecError::MalformedFraming(_))));
    }

    #[test]
    fn compacts_after_many_frames() {
        let mut codec = FrameCodec::new();
        let frame = FrameCodec::encode(&[b'x'; 1000]);
        for _ in 0..20 {
            assert_eq!(codec.decode(&frame).unwrap().len(), 1);
        }
        assert!(codec.buffer.len() < COMPACT_THRESHOLD + frame.len());
    }

    #[test]
    fn test_codec_error_display() {
        let json_err = CodecError::Json(serde_json::from_str::<()>("invalid").unwrap_err());
        let size_err = CodecError::MessageTooLarge(1000);

        assert!(json_err.to_string().contains("JSON error"));
        assert!(size_err.to_string().contains("1000"));
        assert!(CodecError::ContentLengthMissing.to_string().contains("Content-Length"));
    }

    #[test]
    fn test_codec_error_source() {
        let json_err = CodecError::Json(serde_json::from_str::<()>("invalid").unwrap_err());
        let size_err = CodecError::MessageTooLarge(1000);

        assert!(json_err.source().is_some());
        assert!(size_err.source().is_none());
    }

    proptest! {
        #[test]
        fn framing_round_trip(payload in proptest::collection::vec(any::<u8>(), 0..512)) {
            let mut codec = FrameCodec::new();
            let decoded = codec.decode(&FrameCodec::encode(&payload)).unwrap();
            prop_assert_eq!(decoded, vec![payload]);
            prop_assert!(!codec.has_buffered());
        }

        #[test]
        fn round_trip_survives_arbitrary_split(
            payload in proptest::collection::vec(any::<u8>(), 0..256),
            split in 0usize..300,
        ) {
            let framed = FrameCodec::encode(&payload);
            let split = split.min(framed.len());
            let mut codec = FrameCodec::new();
            let mut decoded = codec.decode(&framed[..split]).unwrap();
            decoded.extend(codec.decode(&framed[split..]).unwrap());
            prop_assert_eq!(decoded, vec![payload]);
        }
    }
}
