//! Common fixtures for list page integration tests

#![allow(dead_code, clippy::unwrap_used)]

use aimart_client::{ApiClient, ListPage, Resource};
use aimart_core::Config;
use serde_json::{Value, json};
use std::sync::Once;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT_LOGGER: Once = Once::new();

/// Initialize test logging once per test binary
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();
    });
}

/// Configuration pointing at the mock server
pub fn config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.api_token = Some("test-token".to_string());
    config.api.request_timeout_secs = 5;
    config
}

/// List page for `R` backed by the mock server
pub fn page<R: Resource>(server: &MockServer) -> ListPage<R> {
    page_with::<R>(server, |_| {})
}

/// List page for `R` with `configure` applied to the test configuration
pub fn page_with<R: Resource>(
    server: &MockServer,
    configure: impl FnOnce(&mut Config),
) -> ListPage<R> {
    init_test_logging();
    let mut config = config(server);
    configure(&mut config);
    let client = ApiClient::from_config(&config.api).unwrap();
    ListPage::new(client, &config)
}

/// A promocode as the API sends it; `p{i}` ids, created one minute apart
pub fn promocode(i: usize) -> Value {
    json!({
        "_id": format!("p{i}"),
        "code": format!("CODE{i:02}"),
        "discountType": if i % 5 == 0 { "fixed" } else { "percentage" },
        "discountValue": 10,
        "isActive": i % 2 == 0,
        "usageCount": i,
        "createdAt": format!("2024-01-01T00:{:02}:00Z", i % 60),
    })
}

/// `count` promocodes wrapped in the nested envelope
pub fn promocodes(count: usize) -> Value {
    let items: Vec<Value> = (0..count).map(promocode).collect();
    json!({ "success": true, "data": { "items": items, "total": count } })
}

/// Promocodes `range` of a collection of `total`, as one server page
pub fn promocode_page(range: std::ops::Range<usize>, total: usize) -> Value {
    let items: Vec<Value> = range.map(promocode).collect();
    json!({ "success": true, "data": { "items": items, "total": total } })
}

/// Mount a `GET /v1/{resource}` answering `body`
pub async fn mount_list(server: &MockServer, resource: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/{resource}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Ids on the current page, in display order
pub fn ids<T: aimart_list::ListRecord>(records: &[T]) -> Vec<String> {
    records.iter().map(|r| r.id().to_string()).collect()
}
