//! Core Components
//!
//! HTTP transport and PKCE primitives shared by the request and OAuth2 layers.

pub mod transport;
pub mod pkce;

pub use transport::*;
pub use pkce::*;
