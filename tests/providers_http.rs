//! Adapter behaviour against mocked vendor endpoints

use aiseo_rs::config::ProviderConfig;
use aiseo_rs::network::HttpClient;
use aiseo_rs::providers::{invoke, Provider, ProviderLoader, RequestParams};
use aiseo_rs::results::ProviderError;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn provider(adapter: &str, server: &MockServer) -> Arc<dyn Provider> {
    let mut config = ProviderConfig::new(adapter)
        .with_api_key("test-key")
        .with_base_url(server.uri());
    if adapter == "google_search" {
        config.cx = Some("engine-1".to_string());
    }
    ProviderLoader::create_provider(&config).unwrap()
}

fn client() -> HttpClient {
    HttpClient::new().unwrap()
}

fn chat_completion(content: &str) -> serde_json::Value {
    json!({
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

#[tokio::test]
async fn test_openai_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion("ETFs are...")))
        .expect(1)
        .mount(&server)
        .await;

    let openai = provider("openai", &server);
    let result = invoke(
        openai.as_ref(),
        &client(),
        &RequestParams::new("What are the best ETFs?"),
        TIMEOUT,
    )
    .await;

    assert!(result.success);
    assert_eq!(result.provider, "openai");
    assert_eq!(result.text(), Some("ETFs are..."));
    assert_eq!(result.model.as_deref(), Some("gpt-4o-mini-2024-07-18"));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn test_unauthorized_is_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "bad key"}})),
        )
        .mount(&server)
        .await;

    let result = invoke(
        provider("openai", &server).as_ref(),
        &client(),
        &RequestParams::new("q"),
        TIMEOUT,
    )
    .await;

    assert!(!result.success);
    assert_eq!(result.error, Some(ProviderError::Auth));
    assert!(result.response.is_none());
    assert!(result.error_message.is_some());
}

#[tokio::test]
async fn test_too_many_requests_is_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let result = invoke(
        provider("anthropic", &server).as_ref(),
        &client(),
        &RequestParams::new("q"),
        TIMEOUT,
    )
    .await;

    assert_eq!(result.error, Some(ProviderError::RateLimit));
}

#[tokio::test]
async fn test_server_error_is_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let result = invoke(
        provider("openai", &server).as_ref(),
        &client(),
        &RequestParams::new("q"),
        TIMEOUT,
    )
    .await;

    assert_eq!(result.error, Some(ProviderError::Network));
}

#[tokio::test]
async fn test_slow_vendor_is_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let result = invoke(
        provider("openai", &server).as_ref(),
        &client(),
        &RequestParams::new("q"),
        Duration::from_millis(200),
    )
    .await;

    assert!(!result.success);
    assert_eq!(result.error, Some(ProviderError::Timeout));
    assert!(result.latency_ms < 2000);
}

#[tokio::test]
async fn test_unexpected_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let result = invoke(
        provider("openai", &server).as_ref(),
        &client(),
        &RequestParams::new("q"),
        TIMEOUT,
    )
    .await;
    assert_eq!(result.error, Some(ProviderError::MalformedResponse));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let result = invoke(
        provider("openai", &server).as_ref(),
        &client(),
        &RequestParams::new("q"),
        TIMEOUT,
    )
    .await;
    assert_eq!(result.error, Some(ProviderError::MalformedResponse));
}

#[tokio::test]
async fn test_anthropic_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "claude-3-5-sonnet-20241022",
            "content": [{"type": "text", "text": "Vanguard leads."}]
        })))
        .mount(&server)
        .await;

    let result = invoke(
        provider("anthropic", &server).as_ref(),
        &client(),
        &RequestParams::new("best etfs"),
        TIMEOUT,
    )
    .await;

    assert!(result.success);
    assert_eq!(result.text(), Some("Vanguard leads."));
    assert_eq!(result.model.as_deref(), Some("claude-3-5-sonnet-20241022"));
}

#[tokio::test]
async fn test_gemini_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "modelVersion": "gemini-2.5-flash",
            "candidates": [{"content": {"parts": [{"text": "Index "}, {"text": "funds."}]}}]
        })))
        .mount(&server)
        .await;

    let result = invoke(
        provider("gemini", &server).as_ref(),
        &client(),
        &RequestParams::new("best etfs"),
        TIMEOUT,
    )
    .await;

    assert!(result.success);
    assert_eq!(result.text(), Some("Index funds."));
    assert_eq!(result.model.as_deref(), Some("gemini-2.5-flash"));
}

#[tokio::test]
async fn test_google_search_hits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("cx", "engine-1"))
        .and(query_param("q", "best etfs"))
        .and(query_param("num", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "searchInformation": {"totalResults": "1230"},
            "items": [
                {"title": "Vanguard", "link": "https://vanguard.com", "snippet": "Low cost"},
                {"title": "iShares", "link": "https://ishares.com", "snippet": "Broad range"},
                {"title": "SPDR", "link": "https://spdrs.com"}
            ]
        })))
        .mount(&server)
        .await;

    let result = invoke(
        provider("google_search", &server).as_ref(),
        &client(),
        &RequestParams::new("best etfs"),
        TIMEOUT,
    )
    .await;

    assert!(result.success);
    let hits = result.response.as_ref().unwrap().hits().unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].url, "https://vanguard.com");
    assert_eq!(hits[2].snippet, "");
    assert_eq!(result.total_results, Some(1230));
    assert_eq!(result.model.as_deref(), Some("Custom Search API"));
    assert!(!result.is_analyzable());
}

#[tokio::test]
async fn test_google_search_without_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "searchInformation": {"totalResults": "0"}
        })))
        .mount(&server)
        .await;

    let result = invoke(
        provider("google_search", &server).as_ref(),
        &client(),
        &RequestParams::new("zxqv"),
        TIMEOUT,
    )
    .await;

    assert!(result.success);
    assert!(result.response.unwrap().hits().unwrap().is_empty());
}
