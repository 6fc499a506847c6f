//! Integration tests using WireMock
//!
//! These tests run the real reqwest transport against a mock HTTP server:
//! token endpoint exchanges, and multipart uploads streamed from temporary
//! files.

mod multipart_upload;
mod oauth2_flow;

use integrations_fluent_http::{ReqwestHttpTransport, TransportConfig};
use std::time::Duration;
use wiremock::MockServer;

/// Helper to create a mock server
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Transport with a short timeout for tests
pub fn test_transport() -> ReqwestHttpTransport {
    ReqwestHttpTransport::with_config(TransportConfig {
        timeout: Duration::from_secs(5),
        ..TransportConfig::default()
    })
    .expect("Failed to build transport")
}

/// Names of the entries in `dir`
pub fn dir_entries(dir: &std::path::Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}
