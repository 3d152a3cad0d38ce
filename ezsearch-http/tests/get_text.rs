use ezsearch_http::{ClientOptions, HttpClient, HttpError, RequestOpts};
use reqwest::StatusCode;
use std::borrow::Cow;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, user_agent: Option<&str>) -> HttpClient {
    HttpClient::with_options(
        &server.uri(),
        ClientOptions {
            user_agent: user_agent.map(str::to_string),
            ..ClientOptions::default()
        },
    )
    .expect("client builds")
}

#[tokio::test]
async fn returns_body_and_sends_query_and_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .and(query_param("q", "rust lang"))
        .and(header("user-agent", "test-agent/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("test-agent/1.0"));
    let body = client
        .get_text(
            "/html/",
            RequestOpts {
                query: Some(vec![("q", Cow::Borrowed("rust lang"))]),
                ..Default::default()
            },
        )
        .await
        .expect("success");

    assert_eq!(body, "<html>ok</html>");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(500)
                .insert_header("x-request-id", "abc123")
                .set_body_string("upstream exploded"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .get_text("/html/", RequestOpts::default())
        .await
        .expect_err("500 must fail");

    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    match err {
        HttpError::Status {
            body_snippet,
            request_id,
            ..
        } => {
            assert_eq!(body_snippet, "upstream exploded");
            assert_eq!(request_id, "abc123");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn slow_response_hits_configured_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = client_for(&server, None).with_timeout(Duration::from_millis(200));
    let started = std::time::Instant::now();
    let err = client
        .get_text("/html/", RequestOpts::default())
        .await
        .expect_err("must time out");

    assert!(matches!(err, HttpError::Timeout(d) if d == Duration::from_millis(200)));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn per_request_timeout_overrides_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .get_text(
            "/html/",
            RequestOpts {
                timeout: Some(Duration::from_millis(150)),
                ..Default::default()
            },
        )
        .await
        .expect_err("must time out");

    assert!(matches!(err, HttpError::Timeout(_)));
}

#[tokio::test]
async fn connection_refused_is_a_network_error() {
    // Port 1 is reserved and nothing listens there.
    let client = HttpClient::new("http://127.0.0.1:1").unwrap();
    let err = client
        .get_text("/html/", RequestOpts::default())
        .await
        .expect_err("nothing is listening");

    assert!(matches!(err, HttpError::Network(_)), "got {err:?}");
}
