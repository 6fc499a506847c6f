//! Token Store
//!
//! Holds the current token and the pending PKCE verifier, and mirrors the
//! token to a single JSON file. All reads and writes of the in-memory state
//! are serialized by one async mutex; file access is serialized by another.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{ConfigurationError, FluentResult, StorageError};
use crate::types::OAuth2Token;

/// File name of the persisted token.
pub const TOKEN_FILE_NAME: &str = "token.json";

#[derive(Debug, Default)]
struct State {
    current_token: Option<OAuth2Token>,
    pending_code_verifier: Option<String>,
    /// Bumped by every persisting store; a background write whose
    /// generation is behind this is skipped.
    persist_generation: u64,
}

#[derive(Debug)]
struct Inner {
    path: PathBuf,
    state: Mutex<State>,
    file: Mutex<()>,
}

/// Shared token state. Clones refer to the same store.
///
/// Only one store should own a given token path at a time.
#[derive(Clone, Debug)]
pub struct TokenStore {
    inner: Arc<Inner>,
}

/// Completion of a background token write started by [`TokenStore::store`].
///
/// Dropping the handle does not cancel the write.
#[derive(Debug)]
pub struct PersistHandle {
    task: JoinHandle<FluentResult<()>>,
}

impl PersistHandle {
    /// Wait for the write to finish.
    pub async fn wait(self) -> FluentResult<()> {
        self.task.await.map_err(|e| StorageError::TaskFailed {
            message: e.to_string(),
        })?
    }
}

impl TokenStore {
    /// Store persisting to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                state: Mutex::new(State::default()),
                file: Mutex::new(()),
            }),
        }
    }

    /// Store persisting to `<data dir>/<app_name>/token.json`.
    pub fn in_data_dir(app_name: &str) -> FluentResult<Self> {
        let dir = dirs::data_dir().ok_or(ConfigurationError::NoDataDirectory)?;
        Ok(Self::new(dir.join(app_name).join(TOKEN_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Replace the current token without touching the file.
    pub async fn store_in_memory(&self, token: OAuth2Token) {
        self.inner.state.lock().await.current_token = Some(token);
    }

    /// Write `token` to the file, removing any existing file first.
    ///
    /// Not atomic: a crash between the delete and the write leaves no file.
    pub async fn store_to_file(&self, token: &OAuth2Token) -> FluentResult<()> {
        let _guard = self.inner.file.lock().await;
        write_token_file(&self.inner.path, token).await
    }

    /// Replace the current token and persist it in the background.
    ///
    /// The in-memory token is updated before this returns; the file catches
    /// up later. Await the returned handle to observe the write.
    pub async fn store(&self, token: OAuth2Token) -> PersistHandle {
        let generation = {
            let mut state = self.inner.state.lock().await;
            state.current_token = Some(token.clone());
            state.persist_generation += 1;
            state.persist_generation
        };

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(async move {
            let _guard = inner.file.lock().await;
            if inner.state.lock().await.persist_generation != generation {
                debug!(generation, "Skipping superseded token write");
                return Ok(());
            }
            let result = write_token_file(&inner.path, &token).await;
            if let Err(e) = &result {
                warn!(path = %inner.path.display(), error = %e, "Failed to persist token");
            }
            result
        });

        PersistHandle { task }
    }

    /// Replace the pending PKCE verifier.
    pub async fn store_code_verifier(&self, verifier: impl Into<String>) {
        self.inner.state.lock().await.pending_code_verifier = Some(verifier.into());
    }

    /// Remove and return the pending PKCE verifier.
    pub async fn take_code_verifier(&self) -> Option<String> {
        self.inner.state.lock().await.pending_code_verifier.take()
    }

    /// Pending PKCE verifier, left in place.
    pub async fn code_verifier(&self) -> Option<String> {
        self.inner.state.lock().await.pending_code_verifier.clone()
    }

    /// Load the persisted token into memory and return it.
    ///
    /// An absent file is not an error. Contents that do not decode fail with
    /// [`StorageError::Decode`] and leave memory untouched.
    pub async fn read_from_file(&self) -> FluentResult<Option<OAuth2Token>> {
        let bytes = {
            let _guard = self.inner.file.lock().await;
            match tokio::fs::read(&self.inner.path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
                Err(e) => return Err(StorageError::ReadFailed(e).into()),
            }
        };

        let token: OAuth2Token = serde_json::from_slice(&bytes).map_err(StorageError::Decode)?;
        self.store_in_memory(token.clone()).await;
        debug!(path = %self.inner.path.display(), "Restored token from file");
        Ok(Some(token))
    }

    /// Snapshot of the current token.
    pub async fn current_token(&self) -> Option<OAuth2Token> {
        self.inner.state.lock().await.current_token.clone()
    }

    /// True when no token is held or the access token has expired.
    pub async fn is_access_token_expired(&self) -> bool {
        self.inner
            .state
            .lock()
            .await
            .current_token
            .as_ref()
            .map(OAuth2Token::is_access_token_expired)
            .unwrap_or(true)
    }

    /// True when no token is held or the refresh token has expired.
    pub async fn is_refresh_token_expired(&self) -> bool {
        self.inner
            .state
            .lock()
            .await
            .current_token
            .as_ref()
            .map(OAuth2Token::is_refresh_token_expired)
            .unwrap_or(true)
    }

    /// Forget the token and pending verifier and delete the file.
    pub async fn clear(&self) -> FluentResult<()> {
        {
            let mut state = self.inner.state.lock().await;
            state.current_token = None;
            state.pending_code_verifier = None;
            state.persist_generation += 1;
        }

        let _guard = self.inner.file.lock().await;
        remove_if_exists(&self.inner.path).await
    }
}

async fn write_token_file(path: &Path, token: &OAuth2Token) -> FluentResult<()> {
    let json = serde_json::to_vec_pretty(token).map_err(StorageError::Encode)?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(StorageError::WriteFailed)?;
    }

    remove_if_exists(path).await?;
    tokio::fs::write(path, json)
        .await
        .map_err(StorageError::WriteFailed)?;

    debug!(path = %path.display(), "Persisted token");
    Ok(())
}

async fn remove_if_exists(path: &Path) -> FluentResult<()> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StorageError::DeleteFailed(e).into()),
    }
}
