use email_hunter_core::crawl::fetcher::MAX_BODY_BYTES;
use email_hunter_core::{Config, FetchOutcome, HttpFetcher, PageFetcher};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_AGENT: &str = "email-hunter-tests/1.0";

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(&Config::default()).expect("client builds")
}

fn url(server: &MockServer, page: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), page)).unwrap()
}

#[tokio::test]
async fn ok_response_returns_body_and_sends_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/contact"))
        .and(header("user-agent", TEST_AGENT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<p>jane.doe@acme.test</p>")
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = fetcher()
        .fetch(&url(&server, "/contact"), TEST_AGENT, Duration::from_secs(5))
        .await;

    match outcome {
        FetchOutcome::Page { final_url, body } => {
            assert_eq!(final_url.path(), "/contact");
            assert!(body.contains("jane.doe@acme.test"));
        }
        other => panic!("expected a page, got {:?}", other),
    }
}

#[tokio::test]
async fn non_200_is_reported_as_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/team"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let outcome = fetcher()
        .fetch(&url(&server, "/team"), TEST_AGENT, Duration::from_secs(5))
        .await;

    assert_eq!(outcome, FetchOutcome::HttpStatus(404));
}

#[tokio::test]
async fn redirects_are_followed_to_final_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/about-us", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about-us"))
        .respond_with(ResponseTemplate::new(200).set_body_string("about"))
        .mount(&server)
        .await;

    let outcome = fetcher()
        .fetch(&url(&server, "/about"), TEST_AGENT, Duration::from_secs(5))
        .await;

    match outcome {
        FetchOutcome::Page { final_url, body } => {
            assert_eq!(final_url.path(), "/about-us");
            assert_eq!(body, "about");
        }
        other => panic!("expected a page, got {:?}", other),
    }
}

#[tokio::test]
async fn slow_response_times_out_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let outcome = fetcher()
        .fetch(&url(&server, "/slow"), TEST_AGENT, Duration::from_millis(200))
        .await;

    assert!(matches!(outcome, FetchOutcome::Failed(_)), "got {:?}", outcome);
}

#[tokio::test]
async fn oversized_body_is_abandoned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/huge"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a".repeat(MAX_BODY_BYTES + 1)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/limit"))
        .respond_with(ResponseTemplate::new(200).set_body_string("b".repeat(MAX_BODY_BYTES)))
        .mount(&server)
        .await;

    let outcome = fetcher()
        .fetch(&url(&server, "/huge"), TEST_AGENT, Duration::from_secs(10))
        .await;
    assert!(matches!(outcome, FetchOutcome::Failed(_)));

    let outcome = fetcher()
        .fetch(&url(&server, "/limit"), TEST_AGENT, Duration::from_secs(10))
        .await;
    match outcome {
        FetchOutcome::Page { body, .. } => assert_eq!(body.len(), MAX_BODY_BYTES),
        other => panic!("expected a page, got {:?}", other),
    }
}
