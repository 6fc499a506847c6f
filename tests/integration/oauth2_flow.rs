//! Integration tests for the OAuth2 token exchange

use super::*;
use integrations_fluent_http::{
    oauth2_config, FluentHttpError, MockPkceGenerator, NetworkError, OAuth2Client, OAuth2Token,
    TokenStore,
};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

const VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

fn create_client(
    server: &MockServer,
    dir: &tempfile::TempDir,
    timeout: Duration,
) -> OAuth2Client<ReqwestHttpTransport, MockPkceGenerator> {
    let config = oauth2_config()
        .client_id("test-client")
        .authorization_endpoint(format!("{}/authorize", server.uri()))
        .token_endpoint(format!("{}/token", server.uri()))
        .timeout(timeout)
        .build()
        .expect("Failed to build config");

    let pkce = MockPkceGenerator::new();
    pkce.set_next_verifier(VERIFIER);

    OAuth2Client::with_components(
        config,
        test_transport(),
        pkce,
        TokenStore::new(dir.path().join("token.json")),
    )
}

#[tokio::test]
async fn test_pkce_flow_end_to_end() {
    let server = setup_mock_server().await;
    let dir = tempfile::tempdir().unwrap();
    let client = create_client(&server, &dir, Duration::from_secs(5));

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(header("accept", "application/json"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .and(body_string_contains(format!("code_verifier={}", VERIFIER).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "token_type": "Bearer",
            "expires_in": 300,
            "refresh_token": "refresh-1",
            "refresh_expires_in": 1800,
            "session_state": "session-1",
            "scope": "openid profile email"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let redirect = Url::parse("myapp://callback").unwrap();
    let auth = client
        .create_authorization_url_with_pkce(&redirect, &[])
        .await
        .unwrap();
    assert!(auth
        .url
        .as_str()
        .contains("code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"));

    let callback = Url::parse(&format!(
        "myapp://callback?code=auth-code-1&state={}",
        auth.state
    ))
    .unwrap();
    let grant = client
        .create_authorization_code_with_pkce_grant(&callback, &redirect)
        .await
        .unwrap();
    let token = client.authenticate(&grant).await.unwrap();

    assert_eq!(token.access_token, "access-1");
    assert_eq!(token.session_state.as_deref(), Some("session-1"));
    assert!(!token.is_access_token_expired());

    let persisted: OAuth2Token =
        serde_json::from_slice(&std::fs::read(dir.path().join("token.json")).unwrap()).unwrap();
    assert_eq!(persisted, token);

    // the verifier was consumed by the first exchange
    let again = client
        .create_authorization_code_with_pkce_grant(&callback, &redirect)
        .await;
    assert!(again.is_err());
}

#[tokio::test]
async fn test_token_endpoint_error_body() {
    let server = setup_mock_server().await;
    let dir = tempfile::tempdir().unwrap();
    let client = create_client(&server, &dir, Duration::from_secs(5));

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Code not valid"
        })))
        .mount(&server)
        .await;

    let grant = client.create_password_grant("ada", "wrong", None);
    let error = client.authenticate(&grant).await.unwrap_err();

    match &error {
        FluentHttpError::Response(response) => {
            assert_eq!(response.status, 400);
            let body = response.oauth_error().unwrap();
            assert_eq!(body.error, "invalid_grant");
            assert_eq!(body.error_description.as_deref(), Some("Code not valid"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(error.needs_reauth());
    assert!(!dir.path().join("token.json").exists());
}

#[tokio::test]
async fn test_token_endpoint_timeout() {
    let server = setup_mock_server().await;
    let dir = tempfile::tempdir().unwrap();
    let client = create_client(&server, &dir, Duration::from_millis(200));

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "late"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let grant = client.create_password_grant("ada", "pw", None);
    let result = client.authenticate(&grant).await;

    assert!(matches!(
        result,
        Err(FluentHttpError::Network(NetworkError::Timeout { .. }))
    ));
}

#[tokio::test]
async fn test_refresh_and_authorized_request() {
    let server = setup_mock_server().await;
    let dir = tempfile::tempdir().unwrap();
    let client = create_client(&server, &dir, Duration::from_secs(5));

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-old"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-new",
            "expires_in": 300,
            "refresh_token": "refresh-new"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("authorization", "Bearer access-new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "Ada"})))
        .expect(1)
        .mount(&server)
        .await;

    let expired = OAuth2Token::bearer("access-old")
        .with_expires_in(1)
        .with_refresh_token("refresh-old", None)
        .with_created_at(chrono::Utc::now() - chrono::Duration::seconds(60));
    client.token_store().store_in_memory(expired).await;

    let request = client
        .authorize(
            integrations_fluent_http::RequestBuilder::get(&format!("{}/me", server.uri())).unwrap(),
        )
        .await
        .unwrap()
        .build();
    let response = integrations_fluent_http::dispatch(client.transport(), request)
        .await
        .unwrap();

    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["name"], "Ada");
    assert_eq!(
        client.token_store().current_token().await.unwrap().refresh_token.as_deref(),
        Some("refresh-new")
    );
}
