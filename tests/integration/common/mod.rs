//! Shared fixtures for the integration tests

#![allow(dead_code)]

use blocket_client::ClientConfig;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

pub const SEARCH_PATH: &str = "/search";
pub const TOKEN_PATH: &str = "/token";

/// Matches requests that carry no page index (first page of a search)
pub struct FirstPage;

impl Match for FirstPage {
    fn matches(&self, request: &Request) -> bool {
        !request.url.query_pairs().any(|(k, _)| k == "page")
    }
}

/// Creates a client configuration pointing at the mock server
pub fn create_test_config(server: &MockServer) -> ClientConfig {
    ClientConfig {
        api_base_url: format!("{}{}", server.uri(), SEARCH_PATH),
        token_endpoint: format!("{}{}", server.uri(), TOKEN_PATH),
        request_timeout_secs: 5,
        connect_timeout_secs: 5,
        ..ClientConfig::default()
    }
}

pub fn token_body(token: &str) -> Value {
    json!({ "user": null, "isLoggedIn": false, "bearerToken": token })
}

/// Mounts a token endpoint that always hands out `token`, expecting `calls` fetches
pub async fn mount_token(server: &MockServer, token: &str, calls: u64) {
    Mock::given(method("GET"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(token)))
        .expect(calls)
        .mount(server)
        .await;
}

/// A minimal ad record
pub fn ad(id: &str) -> Value {
    json!({ "ad_id": id, "subject": format!("Ad {}", id), "price": { "value": 100, "suffix": "kr" } })
}

pub fn ad_ids(ads: &[blocket_client::Ad]) -> Vec<String> {
    ads.iter()
        .map(|ad| ad.as_value()["ad_id"].as_str().unwrap_or_default().to_string())
        .collect()
}
