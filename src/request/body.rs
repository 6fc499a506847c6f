//! Request Bodies
//!
//! Bodies are either absent, held in memory, or streamed from a temporary
//! file that is removed once the last request referencing it is dropped.

use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, warn};

const TEMP_DIR_PREFIX: &str = "fluent-http-";
const BODY_FILE_NAME: &str = "body.multipart";

/// Private temporary directory holding one request body file.
///
/// The directory and everything in it are deleted when this is dropped.
/// Deletion failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct TempBody {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl TempBody {
    /// Create a fresh directory under the system temp directory. The body
    /// file itself is not created.
    pub fn new() -> io::Result<Self> {
        Self::new_in(&std::env::temp_dir())
    }

    /// Create a fresh directory under `dir`.
    pub fn new_in(dir: &Path) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir_in(dir)?;
        let path = dir.path().join(BODY_FILE_NAME);
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    /// Path the body is encoded to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempBody {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        let dir_path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => debug!(path = %dir_path.display(), "Removed temporary body"),
            Err(e) => warn!(
                path = %dir_path.display(),
                error = %e,
                "Failed to remove temporary body"
            ),
        }
    }
}

/// Body streamed from a temporary file.
#[derive(Clone, Debug)]
pub struct StreamedFile {
    file: Arc<TempBody>,
    len: u64,
}

impl StreamedFile {
    pub fn new(file: TempBody, len: u64) -> Self {
        Self {
            file: Arc::new(file),
            len,
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Request body.
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Bytes(Bytes),
    File(StreamedFile),
}

impl RequestBody {
    /// Body length in bytes, if there is a body.
    pub fn len(&self) -> Option<u64> {
        match self {
            Self::Empty => None,
            Self::Bytes(bytes) => Some(bytes.len() as u64),
            Self::File(file) => Some(file.len()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len().unwrap_or(0) == 0
    }

    /// Load the whole body into memory.
    pub async fn to_bytes(&self) -> io::Result<Bytes> {
        match self {
            Self::Empty => Ok(Bytes::new()),
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::File(file) => tokio::fs::read(file.path()).await.map(Bytes::from),
        }
    }
}
