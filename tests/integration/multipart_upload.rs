//! Integration tests for streamed multipart uploads

use super::*;
use integrations_fluent_http::{
    dispatch, Boundary, FluentHttpError, FormPart, MultipartEncoder, ProtocolError, RequestBuilder,
};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn upload_parts(dir: &std::path::Path) -> Vec<FormPart> {
    let photo = dir.join("photo.png");
    let bytes: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    std::fs::write(&photo, bytes).unwrap();

    vec![
        FormPart::text("caption", "Sunset over the bay"),
        FormPart::json("metadata", json!({"album": "holiday", "tags": ["sea", "sky"]})),
        FormPart::image("photo", "photo.png", "image/png", photo),
        FormPart::other("notes", &b"plain bytes"[..], "application/octet-stream"),
    ]
}

#[tokio::test]
async fn test_upload_body_matches_encoder() {
    let server = setup_mock_server().await;
    let source_dir = tempfile::tempdir().unwrap();
    let temp_dir = tempfile::tempdir().unwrap();
    let boundary = Boundary::new("fixed-boundary");
    let parts = upload_parts(source_dir.path());

    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header(
            "content-type",
            "multipart/form-data; boundary=fixed-boundary",
        ))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let request = RequestBuilder::post(&format!("{}/upload", server.uri()))
        .unwrap()
        .temp_dir(temp_dir.path())
        .multipart(&parts, Some(boundary.clone()))
        .unwrap()
        .build();
    assert_eq!(dir_entries(temp_dir.path()).len(), 1);

    let response = dispatch(&test_transport(), request).await.unwrap();
    assert_eq!(response.status, 201);

    let expected = MultipartEncoder::default()
        .encode_to_buffer(&parts, &boundary)
        .unwrap();
    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].body, expected);
    assert_eq!(
        received[0]
            .headers
            .get("content-length")
            .unwrap()
            .to_str()
            .unwrap(),
        expected.len().to_string()
    );

    assert!(dir_entries(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_temp_file_removed_after_error_status() {
    let server = setup_mock_server().await;
    let source_dir = tempfile::tempdir().unwrap();
    let temp_dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_string("storage offline"))
        .mount(&server)
        .await;

    let request = RequestBuilder::post(&format!("{}/upload", server.uri()))
        .unwrap()
        .temp_dir(temp_dir.path())
        .multipart(&upload_parts(source_dir.path()), None)
        .unwrap()
        .build();

    let error = dispatch(&test_transport(), request).await.unwrap_err();
    match error {
        FluentHttpError::Response(response) => {
            assert_eq!(response.status, 500);
            assert_eq!(response.body_text(), "storage offline");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert!(dir_entries(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_temp_file_removed_after_connection_failure() {
    let temp_dir = tempfile::tempdir().unwrap();

    // nothing listens on the discard port
    let request = RequestBuilder::post("http://127.0.0.1:9/upload")
        .unwrap()
        .temp_dir(temp_dir.path())
        .multipart(&[FormPart::text("k", "v")], None)
        .unwrap()
        .build();

    let result = dispatch(&test_transport(), request).await;
    assert!(matches!(result, Err(FluentHttpError::Network(_))));
    assert!(dir_entries(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_async_encoding_upload() {
    let server = setup_mock_server().await;
    let source_dir = tempfile::tempdir().unwrap();
    let boundary = Boundary::new("async-boundary");
    let parts = upload_parts(source_dir.path());

    Mock::given(method("PUT"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let request = RequestBuilder::put(&format!("{}/upload", server.uri()))
        .unwrap()
        .multipart_async(parts.clone(), Some(boundary.clone()))
        .await
        .unwrap()
        .build();
    dispatch(&test_transport(), request).await.unwrap();

    let expected = MultipartEncoder::default()
        .encode_to_buffer(&parts, &boundary)
        .unwrap();
    let received = server.received_requests().await.unwrap();
    assert_eq!(received[0].body, expected);
}

#[tokio::test]
async fn test_oversized_response_rejected() {
    let server = setup_mock_server().await;

    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(64)))
        .mount(&server)
        .await;

    let transport = ReqwestHttpTransport::with_config(TransportConfig {
        max_response_size: 16,
        ..TransportConfig::default()
    })
    .unwrap();

    let request = RequestBuilder::post(&format!("{}/upload", server.uri()))
        .unwrap()
        .multipart_in_memory(&[FormPart::text("k", "v")], None)
        .unwrap()
        .build();

    match dispatch(&transport, request).await {
        Err(FluentHttpError::Protocol(ProtocolError::ResponseTooLarge { size })) => {
            assert_eq!(size, 64)
        }
        other => panic!("unexpected result: {:?}", other),
    }
}
