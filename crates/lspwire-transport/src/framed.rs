//! Async framed I/O over tokio byte streams.
//!
//! [`FrameReader`] turns an `AsyncRead` into a lazy, single-pass sequence of
//! payloads. [`FrameWriter`] frames and writes payloads to an `AsyncWrite`.
//!
//! # Cancel-Safety
//!
//! [`FrameReader::next_frame`] is cancel-safe: bytes are only consumed from
//! the source inside a single `read` call and are pushed into the codec
//! before the next await point, so dropping the future between polls never
//! loses data. This lets a session `select!` over it.

use lspwire_core::SessionConfig;
use lspwire_core::logging::{targets, trace, warn};
use lspwire_protocol::Envelope;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{CodecError, FrameCodec, TransportError};

/// Reads Content-Length framed payloads from a byte source.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    codec: FrameCodec,
    chunk: Vec<u8>,
    finished: bool,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Creates a reader with default settings.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &SessionConfig::default())
    }

    /// Creates a reader using the size limits from `config`.
    #[must_use]
    pub fn with_config(reader: R, config: &SessionConfig) -> Self {
        Self {
            reader,
            codec: FrameCodec::with_max_message_size(config.max_message_size),
            chunk: vec![0; config.read_chunk_size.max(1)],
            finished: false,
        }
    }

    /// Returns true once the sequence has ended (EOF or a framing error).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Reads the next payload.
    ///
    /// Returns `Ok(None)` when the source closes, including when it closes
    /// in the middle of a message; the partial message is discarded. Once
    /// `None` or an error has been returned, every later call returns
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// I/O failures and framing errors end the sequence.
    pub async fn next_frame(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        if self.finished {
            return Ok(None);
        }

        loop {
            match self.codec.decode_next() {
                Ok(Some(payload)) => return Ok(Some(payload)),
                Ok(None) => {}
                Err(err) => {
                    self.finished = true;
                    return Err(TransportError::Codec(err));
                }
            }

            let read = match self.reader.read(&mut self.chunk).await {
                Ok(read) => read,
                Err(err) => {
                    self.finished = true;
                    return Err(TransportError::Io(err));
                }
            };

            if read == 0 {
                self.finished = true;
                if self.codec.has_buffered() {
                    warn!(
                        target: targets::TRANSPORT,
                        "Source closed in the middle of a message; discarding partial frame"
                    );
                }
                return Ok(None);
            }

            trace!(target: targets::TRANSPORT, "Read {} bytes", read);
            self.codec.feed(&self.chunk[..read]);
        }
    }

    /// Consumes the reader, returning the underlying source.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Writes Content-Length framed payloads to a byte sink.
#[derive(Debug)]
pub struct FrameWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Creates a writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Frames, writes and flushes a payload.
    pub async fn write_payload(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let bytes = FrameCodec::encode(payload);
        self.writer.write_all(&bytes).await?;
        self.writer.flush().await?;
        trace!(target: targets::TRANSPORT, "Wrote frame of {} bytes", payload.len());
        Ok(())
    }

    /// Serializes, frames and writes an envelope.
    pub async fn write_envelope(&mut self, envelope: &Envelope) -> Result<(), TransportError> {
        let payload = envelope.to_vec().map_err(CodecError::Json)?;
        self.write_payload(&payload).await
    }

    /// Flushes and shuts down the sink.
    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.writer.flush().await?;
        self.writer.shutdown().await?;
        Ok(())
    }

    /// Consumes the writer, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lspwire_protocol::RequestId;
    use std::io::Cursor;

    #[tokio::test]
    async fn reads_frames_then_ends() {
        let mut input = FrameCodec::encode(b"{}");
        input.extend(FrameCodec::encode(b"[1]"));
        let mut reader = FrameReader::new(Cursor::new(input));

        assert_eq!(reader.next_frame().await.unwrap(), Some(b"{}".to_vec()));
        assert_eq!(reader.next_frame().await.unwrap(), Some(b"[1]".to_vec()));
        assert_eq!(reader.next_frame().await.unwrap(), None);
        assert!(reader.is_finished());
        assert_eq!(reader.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn tiny_chunks_reassemble() {
        let input = FrameCodec::encode(br#"{"jsonrpc":"2.0","method":"exit"}"#);
        let config = SessionConfig::default().with_read_chunk_size(1);
        let mut reader = FrameReader::with_config(Cursor::new(input), &config);

        let payload = reader.next_frame().await.unwrap().unwrap();
        let envelope = Envelope::from_slice(&payload).unwrap();
        assert_eq!(envelope.method.as_deref(), Some("exit"));
    }

    #[tokio::test]
    async fn truncated_body_ends_sequence_without_payload() {
        let input = b"Content-Length: 10\r\n\r\n12345".to_vec();
        let mut reader = FrameReader::new(Cursor::new(input));
        assert_eq!(reader.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_source_ends_immediately() {
        let mut reader = FrameReader::new(Cursor::new(Vec::new()));
        assert_eq!(reader.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn framing_error_is_fatal() {
        let mut input = b"Content-Length: 2\n\n{}".to_vec();
        input.extend(FrameCodec::encode(b"{}"));
        let mut reader = FrameReader::new(Cursor::new(input));

        let result = reader.next_frame().await;
        assert!(matches!(
            result,
            Err(TransportError::Codec(CodecError::MalformedFraming(_)))
        ));
        assert_eq!(reader.next_frame().await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_content_length_is_fatal() {
        let input = b"X-Trace: 1\r\n\r\n{}".to_vec();
        let mut reader = FrameReader::new(Cursor::new(input));
        assert!(matches!(
            reader.next_frame().await,
            Err(TransportError::Codec(CodecError::ContentLengthMissing))
        ));
    }

    #[tokio::test]
    async fn writer_frames_envelopes() {
        let mut writer = FrameWriter::new(Vec::new());
        writer
            .write_envelope(&Envelope::request(RequestId::Number(1), "shutdown", None))
            .await
            .unwrap();
        let written = String::from_utf8(writer.into_inner()).unwrap();
        let body = r#"{"jsonrpc":"2.0","id":1,"method":"shutdown"}"#;
        assert_eq!(
            written,
            format!("Content-Length: {}\r\n\r\n{}", body.len(), body)
        );
    }

    #[tokio::test]
    async fn duplex_round_trip() {
        let (client, server) = tokio::io::duplex(64);
        let mut writer = FrameWriter::new(client);
        let mut reader = FrameReader::new(server);

        let payload = vec![b'z'; 500];
        let expected = payload.clone();
        let write = tokio::spawn(async move {
            writer.write_payload(&payload).await.unwrap();
            writer.shutdown().await.unwrap();
        });

        assert_eq!(reader.next_frame().await.unwrap(), Some(expected));
        assert_eq!(reader.next_frame().await.unwrap(), None);
        write.await.unwrap();
    }
}
