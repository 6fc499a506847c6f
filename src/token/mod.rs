//! Token Management
//!
//! In-memory token state with file persistence.

pub mod store;

pub use store::{PersistHandle, TokenStore, TOKEN_FILE_NAME};
