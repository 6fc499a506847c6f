//! Byte Sinks
//!
//! Writable destinations for an encoded body. A sink may accept only part of
//! a chunk per call; [`ByteSink::write_all_chunked`] keeps the unwritten
//! remainder and reissues writes until the chunk is flushed.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::MultipartError;

/// Writable byte destination.
pub trait ByteSink {
    /// Offer `chunk` to the sink. Returns how many bytes were accepted,
    /// which may be fewer than offered.
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<usize>;

    /// Flush anything buffered.
    fn finish(&mut self) -> io::Result<()>;

    /// Write the whole chunk, looping over partial writes.
    fn write_all_chunked(&mut self, chunk: &[u8]) -> Result<u64, MultipartError> {
        let mut remaining = chunk;
        while !remaining.is_empty() {
            match self.write_chunk(remaining) {
                Ok(0) => {
                    return Err(MultipartError::SinkWriteError(io::Error::new(
                        io::ErrorKind::WriteZero,
                        "sink accepted no bytes",
                    )))
                }
                Ok(accepted) => remaining = &remaining[accepted..],
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(MultipartError::SinkWriteError(e)),
            }
        }
        Ok(chunk.len() as u64)
    }
}

/// Growable in-memory sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    buffer: Vec<u8>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

impl ByteSink for MemorySink {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(chunk);
        Ok(chunk.len())
    }

    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// File-backed sink. The file must not exist beforehand.
///
/// The handle is closed when the sink is dropped, whichever way encoding ends.
#[derive(Debug)]
pub struct FileSink {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl FileSink {
    /// Create a new file at `path`.
    pub fn create(path: &Path) -> Result<Self, MultipartError> {
        if path.exists() {
            return Err(MultipartError::DestinationExists {
                path: path.to_path_buf(),
            });
        }

        // create_new also refuses a file that appears after the check above.
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    MultipartError::DestinationExists {
                        path: path.to_path_buf(),
                    }
                } else {
                    MultipartError::SinkCreationFailed {
                        path: path.to_path_buf(),
                        source: e,
                    }
                }
            })?;

        Ok(Self {
            writer: BufWriter::new(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSink for FileSink {
    fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<usize> {
        self.writer.write(chunk)
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()
    }
}
