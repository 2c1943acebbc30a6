use std::time::Duration;

use readalong::application::segments::{FetchError, SegmentSource, load_segments};
use readalong::application::view::ReadAlongView;
use readalong::config::FetchSettings;
use readalong::infra::segments::{HttpSegmentSource, RoutedSegmentSource};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEGMENTS_JSON: &str = r#"[
    {"id": 1, "text": "Hello world", "start": 0.0, "end": 2.0},
    {"id": 2, "text": "Goodbye moon", "start": 2.0, "end": 4.5}
]"#;

fn settings() -> FetchSettings {
    FetchSettings {
        timeout: Duration::from_secs(5),
        user_agent: "readalong-tests".to_string(),
    }
}

async fn serve(route: &str, response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn successful_fetch_decodes_segments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/audio/episode-1.json"))
        .and(header("user-agent", "readalong-tests"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEGMENTS_JSON))
        .mount(&server)
        .await;

    let source = HttpSegmentSource::new(&settings()).expect("client");
    let location = format!("{}/audio/episode-1.json", server.uri());

    let segments = source.fetch(&location).await.expect("segments");
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[1].text, "Goodbye moon");

    let set = load_segments(&source, &location).await;
    assert_eq!(set.len(), 2);
}

#[tokio::test]
async fn not_found_maps_to_status_error_and_degrades() {
    let server = serve("/audio/missing.json", ResponseTemplate::new(404)).await;
    let source = HttpSegmentSource::new(&settings()).expect("client");
    let location = format!("{}/audio/missing.json", server.uri());

    let err = source.fetch(&location).await.expect_err("404");
    assert!(matches!(err, FetchError::Status { status: 404, .. }));

    assert!(load_segments(&source, &location).await.is_empty());
}

#[tokio::test]
async fn malformed_json_maps_to_decode_error_and_degrades() {
    let server = serve(
        "/audio/broken.json",
        ResponseTemplate::new(200).set_body_string("[{\"id\": 1, \"text\": "),
    )
    .await;
    let source = HttpSegmentSource::new(&settings()).expect("client");
    let location = format!("{}/audio/broken.json", server.uri());

    let err = source.fetch(&location).await.expect_err("malformed");
    assert!(matches!(err, FetchError::Decode(_)));

    assert!(load_segments(&source, &location).await.is_empty());
}

#[tokio::test]
async fn invalid_entries_are_dropped_individually() {
    let body = r#"[
        {"id": 1, "text": "Fine", "start": 0.0, "end": 1.0},
        {"id": 2, "text": "Backwards", "start": 3.0, "end": 2.0}
    ]"#;
    let server = serve(
        "/audio/mixed.json",
        ResponseTemplate::new(200).set_body_string(body),
    )
    .await;
    let source = RoutedSegmentSource::new(&settings()).expect("client");

    let set = load_segments(&source, &format!("{}/audio/mixed.json", server.uri())).await;
    assert_eq!(set.len(), 1);
    assert!(set.get(1).is_some());
    assert!(set.get(2).is_none());
}

#[tokio::test]
async fn unparseable_location_is_rejected() {
    let source = HttpSegmentSource::new(&settings()).expect("client");

    let err = source.fetch("not a url").await.expect_err("bad location");
    assert!(matches!(err, FetchError::Location(_)));
}

#[tokio::test]
async fn view_loads_segments_through_http_source() {
    let server = serve(
        "/audio/episode-2.json",
        ResponseTemplate::new(200).set_body_string(SEGMENTS_JSON),
    )
    .await;
    let source = RoutedSegmentSource::new(&settings()).expect("client");
    let mut view = ReadAlongView::new("episode-2");

    let location = format!("{}/audio/episode-2.json", server.uri());
    assert!(view.load_from(&source, &location).await);
    assert!(view.is_loaded());
    assert_eq!(view.segments().len(), 2);

    // A second load for the same mount is ignored.
    assert!(!view.load_from(&source, &location).await);
}
