use serde_json::json;
use std::time::Duration;
use volley_http::{HttpConfig, HttpError, HttpManager, InvocationClient, InvocationRequest};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager() -> HttpManager {
    HttpManager::with_config(HttpConfig {
        timeout: Duration::from_secs(5),
        ..HttpConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_posts_json_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/function/distilbert-finetuned-inference"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"text": "an unexpectedly moving film"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"label": "POSITIVE", "score": 0.98})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = InvocationRequest::new(
        format!("{}/function/distilbert-finetuned-inference", mock_server.uri()),
        br#"{"text":"an unexpectedly moving film"}"#.to_vec(),
    );
    let response = manager().send(request).await.unwrap();

    assert_eq!(response.status, 200);
    assert!(response.is_success());
    let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
    assert_eq!(body["label"], "POSITIVE");
}

#[tokio::test]
async fn test_server_error_is_a_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/function/logreg-inference"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&mock_server)
        .await;

    let request = InvocationRequest::new(
        format!("{}/function/logreg-inference", mock_server.uri()),
        br#"{"features":[1,2,3,4,5,6,7,8]}"#.to_vec(),
    );
    let response = manager().send(request).await.unwrap();

    assert_eq!(response.status, 500);
    assert!(!response.is_success());
    assert_eq!(response.body, b"model not loaded");
}

#[tokio::test]
async fn test_request_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let request = InvocationRequest::new(format!("{}/function/slow", mock_server.uri()), b"{}".to_vec())
        .with_timeout(Some(Duration::from_millis(50)));
    let err = manager().send(request).await.unwrap_err();

    assert!(matches!(err, HttpError::Timeout(_)), "unexpected error: {:?}", err);
    assert_eq!(err.kind(), "timeout");
}

#[tokio::test]
async fn test_connection_refused() {
    // Reserve a port, then free it so nothing is listening there
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let request = InvocationRequest::new(
        format!("http://127.0.0.1:{}/function/yolov5s-inference", port),
        b"{}".to_vec(),
    );
    let err = manager().send(request).await.unwrap_err();

    assert_eq!(err.kind(), "connect", "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_invalid_url() {
    let request = InvocationRequest::new("not a url", b"{}".to_vec());
    let err = manager().send(request).await.unwrap_err();
    assert!(matches!(err, HttpError::InvalidUrl(_)));
}
