use std::time::Duration;

use pretty_assertions::assert_eq;
use timeline_core::{
    transition, Cursor, FailureKind, ItemId, PageRequest, Pagination, PaginationEffect,
    PaginationEvent, QueryFilter,
};
use timeline_engine::{FetchSettings, MastodonFetcher, MemoryStore, PageFetcher};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STATUSES: &str = r#"[
    {"id": "109", "created_at": "2024-05-01T10:00:00.000Z", "content": "<p>hello</p>",
     "in_reply_to_id": null, "reblog": null, "media_attachments": [], "account": {"id": "42"}},
    {"id": "105", "created_at": "2024-04-30T10:00:00.000Z", "content": "<p>reply</p>",
     "in_reply_to_id": "99", "reblog": null, "media_attachments": [{"id": "m1"}], "account": {"id": "42"}}
]"#;

/// Obtains a real ticket by driving the pagination machine once.
fn first_request(cursor: Option<&str>, filter: QueryFilter) -> PageRequest {
    let (_, effect) = transition(Pagination::new(), PaginationEvent::Begin);
    let Some(PaginationEffect::Request(request)) = effect else {
        panic!("begin must request a page");
    };
    PageRequest {
        cursor: cursor.map(Cursor::new),
        filter,
        ..request
    }
}

fn newest_page() -> PageRequest {
    first_request(None, QueryFilter::default())
}

fn settings(server: &MockServer) -> FetchSettings {
    FetchSettings {
        base_url: server.uri(),
        account_id: "42".to_string(),
        page_limit: 2,
        ..FetchSettings::default()
    }
}

#[tokio::test]
async fn fetcher_materializes_statuses_and_returns_ids_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/42/statuses"))
        .and(query_param("limit", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(STATUSES, "application/json; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let fetcher = MastodonFetcher::new(settings(&server), store.clone()).unwrap();
    let page = fetcher.fetch_page(&newest_page()).await.expect("fetch ok");

    assert_eq!(page.ids, vec![ItemId::from("109"), ItemId::from("105")]);
    assert_eq!(page.next_cursor, Some(Cursor::new("105")));
    assert_eq!(store.len().unwrap(), 2);
    assert_eq!(fetcher.domain(), "127.0.0.1");
}

#[tokio::test]
async fn cursor_and_filter_are_sent_as_query_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/accounts/42/statuses"))
        .and(query_param("max_id", "105"))
        .and(query_param("exclude_replies", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("[]", "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = MastodonFetcher::new(settings(&server), MemoryStore::new()).unwrap();
    let filter = QueryFilter {
        exclude_replies: true,
        exclude_deleted: true,
        ..QueryFilter::default()
    };
    let page = fetcher
        .fetch_page(&first_request(Some("105"), filter))
        .await
        .expect("fetch ok");

    assert!(page.ids.is_empty());
    assert_eq!(page.next_cursor, None);
    let received = server.received_requests().await.unwrap();
    let sent: Vec<String> = received[0]
        .url
        .query_pairs()
        .map(|(key, _)| key.into_owned())
        .collect();
    assert!(!sent.contains(&"exclude_deleted".to_string()), "sent {sent:?}");
}

#[tokio::test]
async fn fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let fetcher = MastodonFetcher::new(settings(&server), MemoryStore::new()).unwrap();
    let err = fetcher.fetch_page(&newest_page()).await.unwrap_err();

    assert_eq!(err.kind, FailureKind::HttpStatus(503));
}

#[tokio::test]
async fn fetcher_rejects_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{\"error\":1}", "application/json"))
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let fetcher = MastodonFetcher::new(settings(&server), store.clone()).unwrap();
    let err = fetcher.fetch_page(&newest_page()).await.unwrap_err();

    assert_eq!(err.kind, FailureKind::Decode);
    assert!(store.is_empty().unwrap());
}

#[tokio::test]
async fn fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_raw("[]", "application/json"),
        )
        .mount(&server)
        .await;

    let fetcher = MastodonFetcher::new(
        FetchSettings {
            request_timeout: Duration::from_millis(50),
            ..settings(&server)
        },
        MemoryStore::new(),
    )
    .unwrap();
    let err = fetcher.fetch_page(&newest_page()).await.unwrap_err();

    assert_eq!(err.kind, FailureKind::Timeout);
}

#[test]
fn invalid_base_url_is_reported() {
    let err = MastodonFetcher::new(
        FetchSettings {
            base_url: "not a url".to_string(),
            ..FetchSettings::default()
        },
        MemoryStore::new(),
    )
    .unwrap_err();

    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
