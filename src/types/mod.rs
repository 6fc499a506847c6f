//! OAuth2 Types
//!
//! Type definitions for grants, tokens, configuration and callbacks.

pub mod auth;
pub mod callback;
pub mod config;
pub mod grant;
pub mod token;

pub use auth::*;
pub use callback::*;
pub use config::*;
pub use grant::*;
pub use token::*;
