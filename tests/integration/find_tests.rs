//! Integration tests for multi-page searches
//!
//! These tests use wiremock to stand in for the token and search endpoints
//! and exercise `find` end-to-end over real HTTP.

mod common;

use blocket_client::config::{parse_config, PageStrategyKind};
use blocket_client::{BlocketClient, BlocketError, PageStrategy, QueryConfig, ResponseShape};
use common::{ad, ad_ids, create_test_config, mount_token, FirstPage, SEARCH_PATH};
use serde_json::json;
use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use std::num::NonZeroUsize;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts the three-page scenario: [a, b], [c, d], [e]
async fn mount_three_pages(server: &MockServer, page_three: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(FirstPage)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ad("a"), ad("b")],
            "total_page_count": 3
        })))
        .expect(1)
        .mount(server)
        .await;

    // Page 2 answers slowest so concurrent completion order differs from page order
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "data": [ad("c"), ad("d")], "total_page_count": 3 }))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_three))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_page_search() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "token-1", 1).await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [ad("1"), ad("2")] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = BlocketClient::new(create_test_config(&mock_server)).expect("Failed to build client");
    let ads = client
        .find(&QueryConfig::new("macbook air"))
        .await
        .expect("Search failed");

    assert_eq!(ad_ids(&ads), vec!["1", "2"]);
}

#[tokio::test]
async fn test_default_query_parameters_and_headers() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "token-1", 1).await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("q", "macbook air"))
        .and(query_param("lim", "20"))
        .and(query_param("sort", "rel"))
        .and(query_param("st", "s"))
        .and(query_param("status", "active"))
        .and(query_param("gl", "3"))
        .and(query_param("include", "extend_with_shipping"))
        .and(header("accept", "application/json"))
        .and(header("referer", "https://www.blocket.se/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [ad("1")] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = BlocketClient::new(create_test_config(&mock_server)).expect("Failed to build client");
    let ads = client
        .find(&QueryConfig::new("macbook air").limit(20))
        .await
        .expect("Search failed");

    assert_eq!(ads.len(), 1);
}

#[tokio::test]
async fn test_sequential_three_page_search() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "token-1", 1).await;
    mount_three_pages(&mock_server, json!({ "data": [ad("e")], "total_page_count": 3 })).await;

    let client = BlocketClient::new(create_test_config(&mock_server))
        .expect("Failed to build client")
        .with_page_strategy(PageStrategy::Sequential);
    let ads = client.find(&QueryConfig::new("cykel")).await.expect("Search failed");

    assert_eq!(ad_ids(&ads), vec!["a", "b", "c", "d", "e"]);
}

#[tokio::test]
async fn test_concurrent_three_page_search() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "token-1", 1).await;
    mount_three_pages(&mock_server, json!({ "data": [ad("e")], "total_page_count": 3 })).await;

    let mut config = create_test_config(&mock_server);
    config.page_strategy = PageStrategyKind::Concurrent;
    let client = BlocketClient::new(config).expect("Failed to build client");
    let ads = client.find(&QueryConfig::new("cykel")).await.expect("Search failed");

    assert_eq!(ad_ids(&ads), vec!["a", "b", "c", "d", "e"]);
}

#[tokio::test]
async fn test_concurrent_search_with_in_flight_cap() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "token-1", 1).await;
    mount_three_pages(&mock_server, json!({ "data": [ad("e")], "total_page_count": 3 })).await;

    let client = BlocketClient::new(create_test_config(&mock_server))
        .expect("Failed to build client")
        .with_page_strategy(PageStrategy::Concurrent {
            max_in_flight: NonZeroUsize::new(1),
        });
    let ads = client.find(&QueryConfig::new("cykel")).await.expect("Search failed");

    assert_eq!(ad_ids(&ads), vec!["a", "b", "c", "d", "e"]);
}

#[tokio::test]
async fn test_malformed_page_fails_without_partial_result() {
    for strategy in [
        PageStrategy::Sequential,
        PageStrategy::Concurrent { max_in_flight: None },
    ] {
        let mock_server = MockServer::start().await;
        mount_token(&mock_server, "token-1", 1).await;
        mount_three_pages(&mock_server, json!({ "data": { "unexpected": true } })).await;

        let client = BlocketClient::new(create_test_config(&mock_server))
            .expect("Failed to build client")
            .with_page_strategy(strategy);
        let result = client.find(&QueryConfig::new("cykel")).await;

        assert!(
            matches!(result, Err(BlocketError::MalformedResponse { page: 3, .. })),
            "Expected malformed page 3 with {:?}, got {:?}",
            strategy,
            result
        );
    }
}

#[tokio::test]
async fn test_failed_page_reports_page_index() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "token-1", 1).await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(FirstPage)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ad("a")],
            "total_page_count": 2
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = BlocketClient::new(create_test_config(&mock_server)).expect("Failed to build client");
    let err = client.find(&QueryConfig::new("cykel")).await.unwrap_err();

    assert!(matches!(err, BlocketError::Page { page: 2, .. }));
    assert_eq!(err.transport_error().and_then(|e| e.status), Some(502));
}

#[tokio::test]
async fn test_paged_envelope_search() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "token-1", 1).await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(FirstPage)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [ad("a"), ad("b")],
            "metadata": { "paging": { "current": 1, "last": 2 } }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [ad("c")],
            "metadata": { "paging": { "current": 2, "last": 2 } }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server);
    config.response_shape = ResponseShape::PagedEnvelope;
    let client = BlocketClient::new(config).expect("Failed to build client");
    let ads = client.find(&QueryConfig::new("soffa")).await.expect("Search failed");

    assert_eq!(ad_ids(&ads), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_flat_shape_never_paginates() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "token-1", 1).await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ad("a")],
            "total_page_count": 5
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server);
    config.response_shape = ResponseShape::Flat;
    let client = BlocketClient::new(config).expect("Failed to build client");
    let ads = client.find(&QueryConfig::new("soffa")).await.expect("Search failed");

    assert_eq!(ad_ids(&ads), vec!["a"]);
}

#[tokio::test]
async fn test_empty_query_makes_no_network_calls() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "token-1", 0).await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = BlocketClient::new(create_test_config(&mock_server)).expect("Failed to build client");
    let result = client.find(&QueryConfig::new("")).await;

    assert!(matches!(result, Err(BlocketError::InvalidQuery(_))));
}

#[tokio::test]
async fn test_empty_result_is_not_an_error() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "token-1", 1).await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = BlocketClient::new(create_test_config(&mock_server)).expect("Failed to build client");
    let ads = client
        .find(&QueryConfig::new("nothing matches this"))
        .await
        .expect("Search failed");

    assert!(ads.is_empty());
}

#[tokio::test]
async fn test_per_call_headers_sent_on_every_page() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "token-1", 1).await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(FirstPage)
        .and(header("referer", "https://www.blocket.se/annonser/hela_sverige"))
        .and(header("accept", "application/json"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ad("a")],
            "total_page_count": 2
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", "2"))
        .and(header("referer", "https://www.blocket.se/annonser/hela_sverige"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [ad("b")],
            "total_page_count": 2
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut headers = HeaderMap::new();
    headers.insert(
        REFERER,
        HeaderValue::from_static("https://www.blocket.se/annonser/hela_sverige"),
    );

    let client = BlocketClient::new(create_test_config(&mock_server)).expect("Failed to build client");
    let ads = client
        .find_with_headers(&QueryConfig::new("cykel"), &headers)
        .await
        .expect("Search failed");

    assert_eq!(ad_ids(&ads), vec!["a", "b"]);
}

#[tokio::test]
async fn test_configured_headers_keep_protocol_defaults() {
    let mock_server = MockServer::start().await;
    mount_token(&mock_server, "token-1", 1).await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(header("referer", "https://www.example.com/"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": [ad("1")] })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let configured = parse_config(
        r#"
[headers]
Referer = "https://www.example.com/"
"#,
    )
    .expect("Failed to parse config");
    let config = blocket_client::ClientConfig {
        headers: configured.headers,
        ..create_test_config(&mock_server)
    };

    let client = BlocketClient::new(config).expect("Failed to build client");
    let ads = client.find(&QueryConfig::new("lampa")).await.expect("Search failed");

    assert_eq!(ad_ids(&ads), vec!["1"]);
}
