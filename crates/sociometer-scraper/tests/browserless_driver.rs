//! Integration tests for `BrowserlessDriver` against a local `wiremock`
//! server standing in for the rendering service.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sociometer_scraper::{BrowserlessDriver, DriverError, PageDriver};
use sociometer_store::Cookie;

const PAGE: &str = "<html><body><h1>Acme</h1><p>Fresh post about launch day</p></body></html>";

fn driver(server: &MockServer, token: Option<&str>) -> BrowserlessDriver {
    BrowserlessDriver::new(&server.uri(), token).expect("failed to build test driver")
}

#[tokio::test]
async fn navigate_forwards_identity_and_snapshots_markup() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/content"))
        .and(body_partial_json(json!({
            "url": "https://social.example/acme",
            "userAgent": "test-agent/1.0",
            "cookies": [{"name": "sid", "value": "abc", "url": "https://social.example/acme"}],
            "gotoOptions": {"timeout": 5000}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let mut d = driver(&server, None);
    d.set_user_agent("test-agent/1.0").await.unwrap();
    d.set_cookies(&[Cookie::new("sid", "abc")]).await.unwrap();
    d.navigate("https://social.example/acme", Duration::from_secs(5))
        .await
        .expect("navigation should succeed");

    let page = d.snapshot().await.unwrap();
    assert_eq!(page.url, "https://social.example/acme");
    assert!(page.text.contains("Fresh post about launch day"));
    assert_eq!(d.cookies().await.unwrap(), vec![Cookie::new("sid", "abc")]);
}

#[tokio::test]
async fn token_is_sent_as_query_parameter() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/content"))
        .and(query_param("token", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let mut d = driver(&server, Some("s3cret"));
    d.navigate("https://social.example/acme", Duration::from_secs(5))
        .await
        .unwrap();
}

#[tokio::test]
async fn server_error_maps_to_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/content"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut d = driver(&server, None);
    let err = d
        .navigate("https://social.example/acme", Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(
        matches!(err, DriverError::UnexpectedStatus { status: 503, .. }),
        "expected UnexpectedStatus(503), got: {err:?}"
    );
}

#[tokio::test]
async fn renderer_timeout_maps_to_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/content"))
        .respond_with(ResponseTemplate::new(408))
        .mount(&server)
        .await;

    let mut d = driver(&server, None);
    let err = d
        .navigate("https://social.example/slow", Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(
        matches!(err, DriverError::Timeout { timeout_secs: 2, ref url } if url.ends_with("/slow")),
        "expected Timeout, got: {err:?}"
    );
}

#[tokio::test]
async fn snapshot_before_navigation_is_an_error() {
    let server = MockServer::start().await;
    let mut d = driver(&server, None);
    assert!(matches!(d.snapshot().await, Err(DriverError::NoPage)));
}

#[tokio::test]
async fn interactions_are_accepted_without_effect() {
    let server = MockServer::start().await;
    let mut d = driver(&server, None);
    d.scroll_by(600).await.unwrap();
    d.move_pointer(10, 20).await.unwrap();
    assert!(!d.click("button.close").await.unwrap());
}

#[tokio::test]
async fn timed_out_navigation_drops_the_previous_page() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/content"))
        .and(body_partial_json(json!({"url": "https://social.example/alpha"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/content"))
        .and(body_partial_json(json!({"url": "https://social.example/bravo"})))
        .respond_with(ResponseTemplate::new(408))
        .expect(1)
        .mount(&server)
        .await;

    let mut d = driver(&server, None);
    d.navigate("https://social.example/alpha", Duration::from_secs(5))
        .await
        .unwrap();
    assert!(d.snapshot().await.is_ok());

    let err = d
        .navigate("https://social.example/bravo", Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, DriverError::Timeout { .. }));
    assert!(
        matches!(d.snapshot().await, Err(DriverError::NoPage)),
        "alpha's page must not survive bravo's timeout"
    );
}

#[tokio::test]
async fn failed_navigation_drops_the_previous_page() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/content"))
        .and(body_partial_json(json!({"url": "https://social.example/alpha"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/content"))
        .and(body_partial_json(json!({"url": "https://social.example/bravo"})))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let mut d = driver(&server, None);
    d.navigate("https://social.example/alpha", Duration::from_secs(5))
        .await
        .unwrap();
    d.navigate("https://social.example/bravo", Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(d.snapshot().await, Err(DriverError::NoPage)));
}
