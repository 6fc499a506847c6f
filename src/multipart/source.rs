//! Byte Sources
//!
//! Readable origins for part payloads, and a chained source that reads an
//! ordered list of them as one stream.

use bytes::Bytes;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::PathBuf;

use super::part::FileSource;

/// Readable payload origin.
#[derive(Debug)]
pub enum PartSource {
    /// In-memory bytes.
    Memory(Cursor<Bytes>),
    /// An open file.
    File(File),
    /// A file opened on first read.
    Deferred(PathBuf),
}

impl PartSource {
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self::Memory(Cursor::new(bytes.into()))
    }

    /// Open a source for `file`, opening files immediately.
    pub fn open(file: &FileSource) -> io::Result<Self> {
        match file {
            FileSource::InMemory(bytes) => Ok(Self::from_bytes(bytes.clone())),
            FileSource::Path(path) => Ok(Self::File(File::open(path)?)),
        }
    }

    /// Source for `file` that defers opening files until read.
    pub fn lazy(file: &FileSource) -> Self {
        match file {
            FileSource::InMemory(bytes) => Self::from_bytes(bytes.clone()),
            FileSource::Path(path) => Self::Deferred(path.clone()),
        }
    }
}

impl Read for PartSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Self::Deferred(path) = self {
            let file = File::open(&*path)?;
            *self = Self::File(file);
        }
        match self {
            Self::Memory(cursor) => cursor.read(buf),
            Self::File(file) => file.read(buf),
            Self::Deferred(_) => unreachable!("deferred source opened above"),
        }
    }
}

/// Ordered list of sources read back to back.
///
/// `current` indexes the source being drained; exhausted sources are dropped
/// so their file handles close as soon as they are done.
#[derive(Debug)]
pub struct ChainedSource {
    sources: Vec<Option<PartSource>>,
    current: usize,
}

impl ChainedSource {
    pub fn new(sources: Vec<PartSource>) -> Self {
        Self {
            sources: sources.into_iter().map(Some).collect(),
            current: 0,
        }
    }

    /// Whether any source is left to read.
    pub fn has_more(&self) -> bool {
        self.current < self.sources.len()
    }

    fn advance(&mut self) {
        self.sources[self.current] = None;
        self.current += 1;
    }
}

impl Read for ChainedSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.has_more() {
            let read = match self.sources[self.current].as_mut() {
                Some(source) => source.read(buf)?,
                None => 0,
            };
            if read > 0 {
                return Ok(read);
            }
            self.advance();
        }
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chained_source_reads_in_order() {
        let mut source = ChainedSource::new(vec![
            PartSource::from_bytes("abc"),
            PartSource::from_bytes(""),
            PartSource::from_bytes("def"),
        ]);

        let mut out = String::new();
        source.read_to_string(&mut out).unwrap();
        assert_eq!(out, "abcdef");
        assert!(!source.has_more());
    }

    #[test]
    fn test_small_reads_cross_sources() {
        let mut source = ChainedSource::new(vec![
            PartSource::from_bytes("ab"),
            PartSource::from_bytes("cd"),
        ]);

        let mut buf = [0u8; 3];
        let n = source.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ab");
        let n = source.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"cd");
        assert_eq!(source.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_deferred_file_opened_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload.bin");
        std::fs::write(&path, b"file-bytes").unwrap();

        let mut source = ChainedSource::new(vec![
            PartSource::from_bytes("["),
            PartSource::lazy(&FileSource::Path(path)),
            PartSource::from_bytes("]"),
        ]);

        let mut out = Vec::new();
        source.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"[file-bytes]");
    }

    #[test]
    fn test_missing_deferred_file_errors() {
        let mut source = ChainedSource::new(vec![PartSource::lazy(&FileSource::Path(
            PathBuf::from("/definitely/not/here.bin"),
        ))]);

        let mut out = Vec::new();
        assert!(source.read_to_end(&mut out).is_err());
    }
}
