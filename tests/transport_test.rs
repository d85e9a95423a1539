use std::sync::Arc;

use parking_lot::Mutex;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use netqueue::{FetchError, HttpTransport, Method, ReqwestTransport, TransportRequest};

#[tokio::test]
async fn execute_returns_body_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("hello", "text/plain"))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::with_defaults().unwrap();
    let response = transport
        .execute(TransportRequest::get(format!("{}/doc", server.uri())))
        .await
        .expect("request ok");

    assert_eq!(response.status, 200);
    assert_eq!(&response.body[..], b"hello");
    assert_eq!(response.text().unwrap(), "hello");
}

#[tokio::test]
async fn non_success_status_classifies_as_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::with_defaults().unwrap();
    let err = transport
        .execute(TransportRequest::get(format!("{}/missing", server.uri())))
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::Protocol { status: 404 });
}

#[tokio::test]
async fn connection_failure_classifies_as_transport_error() {
    let transport = ReqwestTransport::with_defaults().unwrap();
    let err = transport
        .execute(TransportRequest::get("http://127.0.0.1:1/x"))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn post_form_data_is_sent_as_urlencoded_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_string("a=1"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::with_defaults().unwrap();
    let mut request = TransportRequest::get(format!("{}/submit", server.uri()));
    request.method = Method::Post;
    request.form.insert("a".to_string(), "1".to_string());

    let response = transport.execute(request).await.expect("post ok");
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn custom_headers_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth"))
        .and(wiremock::matchers::header("x-token", "secret"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::with_defaults().unwrap();
    let mut request = TransportRequest::get(format!("{}/auth", server.uri()));
    request
        .headers
        .insert("x-token".to_string(), "secret".to_string());

    assert!(transport.execute(request).await.is_ok());
}

#[tokio::test]
async fn streaming_reports_monotonic_progress_up_to_full_body() {
    let server = MockServer::start().await;
    let body = vec![0xABu8; 64 * 1024];
    Mock::given(method("GET"))
        .and(path("/blob"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.clone(), "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let transport = ReqwestTransport::with_defaults().unwrap();
    let seen: Arc<Mutex<Vec<(f32, u64)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let response = transport
        .execute_streaming(
            TransportRequest::get(format!("{}/blob", server.uri())),
            &move |fraction, bytes| sink.lock().push((fraction, bytes)),
        )
        .await
        .expect("stream ok");

    assert_eq!(response.body.len(), body.len());

    let events = seen.lock();
    assert!(!events.is_empty());
    for pair in events.windows(2) {
        assert!(pair[1].1 >= pair[0].1, "bytes must be non-decreasing");
        assert!(pair[1].0 >= pair[0].0, "fraction must be non-decreasing");
    }
    let (last_fraction, last_bytes) = *events.last().unwrap();
    assert_eq!(last_bytes, body.len() as u64);
    assert!((last_fraction - 1.0).abs() < f32::EPSILON);
}

#[tokio::test]
async fn head_content_length_parses_the_header() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/sized"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("12345", "text/plain"))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::with_defaults().unwrap();
    let length = transport
        .head_content_length(&format!("{}/sized", server.uri()))
        .await
        .expect("head ok");
    assert_eq!(length, 5);
}
