//! Shared reqwest client for vendor APIs

use crate::config::{OutgoingSettings, ProxySettings};
use crate::providers::{HttpMethod, ProviderRequest, ProviderResponse};
use anyhow::{Context, Result};
use reqwest::{Client, ClientBuilder, Proxy, RequestBuilder};
use std::time::Duration;

/// Connection pool shared by every provider call
///
/// Cloning is cheap; all clones reuse the same pool.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    pub fn new() -> Result<Self> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Build the pool from the `outgoing` settings section
    ///
    /// Per-call deadlines are applied by the invoker; the client timeout is
    /// only a backstop at the configured maximum.
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self> {
        let backstop = settings.max_request_timeout.max(settings.request_timeout);
        let builder = Client::builder()
            .timeout(Duration::from_secs_f64(backstop.max(0.0)))
            .pool_max_idle_per_host(settings.pool_maxsize)
            .danger_accept_invalid_certs(!settings.verify_ssl)
            .gzip(true)
            .brotli(true);

        let client = with_proxies(builder, &settings.proxies)?
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            client,
            user_agent: format!("aiseo-rs/{}", crate::VERSION),
        })
    }

    /// Send a provider request and buffer the whole reply
    ///
    /// Any HTTP status comes back as a response; only transport failures
    /// are errors.
    pub async fn execute(&self, request: ProviderRequest) -> Result<ProviderResponse> {
        let response = self.prepare(request).send().await?;

        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(key, value)| Some((key.to_string(), value.to_str().ok()?.to_string())))
            .collect();
        let text = response.text().await?;

        Ok(ProviderResponse {
            status,
            headers,
            text,
            url,
        })
    }

    fn prepare(&self, request: ProviderRequest) -> RequestBuilder {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        }
        .header(reqwest::header::USER_AGENT, &self.user_agent)
        .header(reqwest::header::ACCEPT, "application/json");

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if !request.params.is_empty() {
            builder = builder.query(&request.params);
        }
        match request.body {
            Some(body) => builder.json(&body),
            None => builder,
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

fn with_proxies(builder: ClientBuilder, proxies: &ProxySettings) -> Result<ClientBuilder> {
    if let Some(ref all) = proxies.all {
        return Ok(builder.proxy(Proxy::all(all).context("invalid proxy")?));
    }

    let mut builder = builder;
    if let Some(ref http) = proxies.http {
        builder = builder.proxy(Proxy::http(http).context("invalid http proxy")?);
    }
    if let Some(ref https) = proxies.https {
        builder = builder.proxy(Proxy::https(https).context("invalid https proxy")?);
    }
    Ok(builder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new().unwrap();
        assert!(client.user_agent().starts_with("aiseo-rs/"));
    }

    #[test]
    fn test_rejects_bad_proxy() {
        let mut settings = OutgoingSettings::default();
        settings.proxies.all = Some("not a url".to_string());
        assert!(HttpClient::with_settings(&settings).is_err());
    }

    #[test]
    fn test_prepare_sets_query_and_body() {
        let client = HttpClient::new().unwrap();
        let request = client
            .prepare(
                ProviderRequest::post("http://localhost/v1/messages")
                    .header("x-api-key", "k")
                    .param("key", "abc")
                    .json(serde_json::json!({"max_tokens": 10})),
            )
            .build()
            .unwrap();

        assert_eq!(request.url().query(), Some("key=abc"));
        assert_eq!(request.headers()["x-api-key"], "k");
        assert_eq!(request.headers()["content-type"], "application/json");
        assert!(request.body().is_some());
    }
}
