//! Multipart Encoder
//!
//! Serializes form parts into a multipart/form-data body (RFC 2046 framing),
//! either into memory, into a file through chunked streaming writes, or as a
//! lazily read stream.

use bytes::Bytes;
use std::io::{self, Read};
use std::path::Path;
use tracing::{debug, warn};

use super::boundary::Boundary;
use super::part::{FileSource, FormPart};
use super::sink::{ByteSink, FileSink, MemorySink};
use super::source::{ChainedSource, PartSource};
use crate::error::MultipartError;

/// Default copy chunk size for binary payloads.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

const LINE_BREAK: &[u8] = b"\r\n";

/// Encoder configuration.
#[derive(Clone, Debug)]
pub struct EncoderConfig {
    /// Size of each read/write when copying binary payloads.
    pub chunk_size: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// multipart/form-data body encoder.
#[derive(Clone, Debug, Default)]
pub struct MultipartEncoder {
    config: EncoderConfig,
}

impl MultipartEncoder {
    /// Create an encoder. A zero chunk size falls back to the default.
    pub fn new(mut config: EncoderConfig) -> Self {
        if config.chunk_size == 0 {
            config.chunk_size = DEFAULT_CHUNK_SIZE;
        }
        Self { config }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode `parts` fully in memory.
    ///
    /// File-reference parts are read whole, so this is meant for small files.
    pub fn encode_to_buffer(
        &self,
        parts: &[FormPart],
        boundary: &Boundary,
    ) -> Result<Vec<u8>, MultipartError> {
        let mut sink = MemorySink::new();
        let written = self.encode_into(&mut sink, parts, boundary)?;
        debug!(parts = parts.len(), bytes = written, "Encoded multipart body in memory");
        Ok(sink.into_inner())
    }

    /// Stream the encoded body into a new file at `destination`.
    ///
    /// Fails with `DestinationExists` rather than overwriting. Returns the
    /// file size as reported by the filesystem. On failure the partially
    /// written file is left in place.
    pub fn encode_to_file(
        &self,
        destination: &Path,
        parts: &[FormPart],
        boundary: &Boundary,
    ) -> Result<u64, MultipartError> {
        let mut sink = FileSink::create(destination)?;
        let written = self.encode_into(&mut sink, parts, boundary)?;
        drop(sink);

        let on_disk = std::fs::metadata(destination)
            .map_err(MultipartError::SinkWriteError)?
            .len();
        if on_disk != written {
            warn!(
                path = %destination.display(),
                written,
                on_disk,
                "Multipart byte count disagrees with file size"
            );
            return Err(MultipartError::SizeMismatch {
                path: destination.to_path_buf(),
                written,
                on_disk,
            });
        }

        debug!(
            path = %destination.display(),
            parts = parts.len(),
            bytes = on_disk,
            "Encoded multipart body to file"
        );
        Ok(on_disk)
    }

    /// Build a reader that yields the encoded body lazily.
    ///
    /// Referenced files are opened when the reader reaches them; a missing
    /// file surfaces as a read error at that point.
    pub fn encode_to_reader(
        &self,
        parts: &[FormPart],
        boundary: &Boundary,
    ) -> Result<ChainedSource, MultipartError> {
        let mut sources = Vec::with_capacity(parts.len() * 3 + 1);
        for part in parts {
            sources.push(PartSource::from_bytes(part.preamble(boundary.as_str())));
            sources.push(match part {
                FormPart::Image { source, .. } => PartSource::lazy(source),
                _ => PartSource::from_bytes(inline_payload(part)?),
            });
            sources.push(PartSource::from_bytes(LINE_BREAK));
        }
        sources.push(PartSource::from_bytes(boundary.closing()));
        Ok(ChainedSource::new(sources))
    }

    /// Write the body into any sink. Returns the number of bytes written.
    pub fn encode_into<S: ByteSink>(
        &self,
        sink: &mut S,
        parts: &[FormPart],
        boundary: &Boundary,
    ) -> Result<u64, MultipartError> {
        let mut written = 0u64;

        for part in parts {
            written += sink.write_all_chunked(part.preamble(boundary.as_str()).as_bytes())?;
            written += match part {
                FormPart::Image { source, .. } => self.copy_file_source(sink, source)?,
                _ => sink.write_all_chunked(&inline_payload(part)?)?,
            };
            written += sink.write_all_chunked(LINE_BREAK)?;
        }
        written += sink.write_all_chunked(boundary.closing().as_bytes())?;

        sink.finish().map_err(MultipartError::SinkWriteError)?;
        Ok(written)
    }

    fn copy_file_source<S: ByteSink>(
        &self,
        sink: &mut S,
        source: &FileSource,
    ) -> Result<u64, MultipartError> {
        let mut reader = PartSource::open(source).map_err(MultipartError::SourceReadError)?;
        let mut chunk = vec![0u8; self.config.chunk_size];
        let mut copied = 0u64;

        loop {
            let read = match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(MultipartError::SourceReadError(e)),
            };
            copied += sink.write_all_chunked(&chunk[..read])?;
        }

        Ok(copied)
    }
}

/// Payload bytes of a part that is not streamed from a file source.
fn inline_payload(part: &FormPart) -> Result<Bytes, MultipartError> {
    match part {
        FormPart::Text { value, .. } => Ok(Bytes::copy_from_slice(value.as_bytes())),
        FormPart::Json { name, payload } => serde_json::to_vec(payload)
            .map(Bytes::from)
            .map_err(|e| MultipartError::StringEncodingFailed {
                name: name.clone(),
                message: e.to_string(),
            }),
        FormPart::Other { value, .. } => Ok(value.clone()),
        FormPart::Image { source, .. } => match source {
            FileSource::InMemory(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => std::fs::read(path)
                .map(Bytes::from)
                .map_err(MultipartError::SourceReadError),
        },
    }
}
