//! Extraction call and reply handling

use super::extract::parse_insights;
use super::{AnalysisError, AnalysisResult, Ledger};
use crate::config::AnalysisSettings;
use crate::network::HttpClient;
use crate::providers::{invoke, Provider, RequestParams};
use crate::results::{ProviderError, ProviderResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

const SYSTEM_PROMPT: &str = "You are an AI optimization expert analyzing responses for AISEO insights. Always return valid JSON.";

const TRUNCATION_MARKER: &str = "... [truncated for analysis]";

/// Runs the secondary extraction pass over provider answers
pub struct AnalysisPipeline {
    client: HttpClient,
    provider: Arc<dyn Provider>,
    settings: AnalysisSettings,
    timeout: Duration,
    ledger: Option<Ledger>,
}

impl AnalysisPipeline {
    /// Create a pipeline calling `provider`, with the ledger taken from settings
    pub fn new(
        client: HttpClient,
        provider: Arc<dyn Provider>,
        settings: AnalysisSettings,
        timeout: Duration,
    ) -> Self {
        let ledger = settings.csv_path.clone().map(Ledger::new);
        Self {
            client,
            provider,
            settings,
            timeout,
            ledger,
        }
    }

    pub fn with_ledger(mut self, ledger: Option<Ledger>) -> Self {
        self.ledger = ledger;
        self
    }

    /// Identifier of the provider performing extraction
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn ledger(&self) -> Option<&Ledger> {
        self.ledger.as_ref()
    }

    /// Only successful text answers are analysed; search hits never are
    pub fn is_eligible(result: &ProviderResult) -> bool {
        result.is_analyzable()
    }

    /// Extract insights from one provider answer
    pub async fn analyze(
        &self,
        query: &str,
        result: &ProviderResult,
    ) -> Result<AnalysisResult, AnalysisError> {
        let text = result
            .text()
            .ok_or_else(|| AnalysisError::Ineligible(result.provider.clone()))?;

        let prompt = build_prompt(
            query,
            &result.provider,
            &truncate(text, self.settings.max_input_chars),
        );
        let params = RequestParams::new(prompt)
            .system(SYSTEM_PROMPT)
            .max_tokens(self.settings.max_tokens)
            .temperature(self.settings.temperature)
            .json_mode(true)
            .model(self.settings.model.clone());

        let reply = invoke(self.provider.as_ref(), &self.client, &params, self.timeout).await;
        if !reply.success {
            return Err(AnalysisError::Extraction {
                kind: reply.error.unwrap_or(ProviderError::Unknown),
                message: reply.error_message.unwrap_or_default(),
            });
        }
        let raw = reply.text().ok_or(AnalysisError::Unparseable)?;

        match parse_insights(raw) {
            Some((fields, mode)) => {
                debug!("Analysed {} ({:?} extraction)", result.provider, mode);
                Ok(AnalysisResult::from_fields(&result.provider, fields, mode))
            }
            None => {
                warn!("Unparseable analysis reply for {}", result.provider);
                Err(AnalysisError::Unparseable)
            }
        }
    }

    /// Append an analysis to the ledger; failures are only logged
    pub async fn record(&self, query: &str, analysis: &AnalysisResult) {
        let Some(ref ledger) = self.ledger else {
            return;
        };
        if let Err(e) = ledger.append(query, analysis).await {
            error!("Failed to append analysis to {:?}: {:#}", ledger.path(), e);
        }
    }
}

/// Cut `text` to `max_chars` characters, marking the cut
fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}{}", &text[..byte_index], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

fn build_prompt(query: &str, provider: &str, response: &str) -> String {
    format!(
        r#"Analyze this AI response for SEO/AISEO optimization insights.

Extract the following information in JSON format:

1. companies_mentioned: List all companies/brands/products mentioned
2. mention_reasons: For each company, why was it mentioned? (features, authority, popularity, etc.)
3. authority_signals: Authority phrases used (e.g., "leading", "popular", "trusted", "industry standard")
4. key_features: What features/benefits were highlighted as important?
5. sources_cited: Any sources, websites, or references mentioned
6. ranking_factors: What seems to determine the order/prominence of mentions?
7. sentiment: Overall sentiment toward mentioned entities (positive/neutral/negative/mixed)
8. optimization_insights: Specific actionable tips for AISEO based on this response

Original Query: {query}
Provider: {provider}

Response to analyze:
{response}

Return ONLY valid JSON with these exact keys. Be specific and actionable in optimization_insights."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{
        ProviderFailure, ProviderOutput, ProviderRequest, ProviderResponse,
    };
    use crate::results::{ProviderPayload, SearchHit};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Extraction provider replaying a canned reply and capturing the prompt
    struct Canned {
        reply: Result<String, ProviderError>,
        seen: Mutex<Vec<RequestParams>>,
    }

    impl Canned {
        fn new(reply: Result<&str, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(|r| r.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Provider for Canned {
        fn name(&self) -> &str {
            "analyst"
        }

        fn request(&self, _params: &RequestParams) -> anyhow::Result<ProviderRequest> {
            Ok(ProviderRequest::post("http://unused"))
        }

        fn response(&self, _response: ProviderResponse) -> Result<ProviderOutput, ProviderFailure> {
            Err(ProviderFailure::malformed("unused"))
        }

        async fn call(
            &self,
            _client: &HttpClient,
            params: &RequestParams,
        ) -> Result<ProviderOutput, ProviderFailure> {
            self.seen.lock().push(params.clone());
            match &self.reply {
                Ok(text) => Ok(ProviderOutput::text(text.clone())),
                Err(kind) => Err(ProviderFailure::new(*kind, "rejected")),
            }
        }
    }

    fn pipeline(provider: Arc<Canned>) -> AnalysisPipeline {
        AnalysisPipeline::new(
            HttpClient::new().unwrap(),
            provider,
            AnalysisSettings::default(),
            Duration::from_secs(2),
        )
        .with_ledger(None)
    }

    fn answer(text: &str) -> ProviderResult {
        ProviderResult::success("openai", ProviderPayload::Text(text.to_string()))
    }

    #[tokio::test]
    async fn test_analyze_structured_reply() {
        let canned = Canned::new(Ok(r#"{"companies_mentioned": ["Vanguard"], "sentiment": "positive"}"#));
        let analysis = pipeline(canned.clone())
            .analyze("best etfs", &answer("Vanguard is a leading provider"))
            .await
            .unwrap();

        assert_eq!(analysis.provider, "openai");
        assert_eq!(analysis.companies_mentioned, vec!["Vanguard"]);

        let seen = canned.seen.lock();
        assert!(seen[0].json_mode);
        assert_eq!(seen[0].max_tokens, 4000);
        assert_eq!(seen[0].temperature, Some(0.3));
        assert!(seen[0].query.contains("Original Query: best etfs"));
        assert!(seen[0].query.contains("Vanguard is a leading provider"));
    }

    #[tokio::test]
    async fn test_unparseable_reply() {
        let canned = Canned::new(Ok("Sorry, I can't do that."));
        let err = pipeline(canned)
            .analyze("q", &answer("text"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Unparseable));
    }

    #[tokio::test]
    async fn test_extraction_failure() {
        let canned = Canned::new(Err(ProviderError::RateLimit));
        let err = pipeline(canned)
            .analyze("q", &answer("text"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Extraction {
                kind: ProviderError::RateLimit,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_search_results_are_ineligible() {
        let canned = Canned::new(Ok("{}"));
        let search = ProviderResult::success(
            "google_search",
            ProviderPayload::Search(vec![SearchHit::new("a", "https://a.com", "")]),
        );
        assert!(!AnalysisPipeline::is_eligible(&search));
        let err = pipeline(canned.clone())
            .analyze("q", &search)
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Ineligible(_)));
        assert!(canned.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_long_answers_are_truncated() {
        let canned = Canned::new(Ok("{}"));
        let long = "é".repeat(6000);
        pipeline(canned.clone())
            .analyze("q", &answer(&long))
            .await
            .unwrap();
        let prompt = &canned.seen.lock()[0].query;
        assert!(prompt.contains(TRUNCATION_MARKER));
        assert_eq!(prompt.matches('é').count(), 5000);
    }

    #[test]
    fn test_truncate_short_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), format!("abc{}", TRUNCATION_MARKER));
    }

    #[tokio::test]
    async fn test_record_appends_to_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.csv");
        let pipeline = pipeline(Canned::new(Ok("{}"))).with_ledger(Some(Ledger::new(&path)));

        pipeline
            .record("q", &AnalysisResult::empty("openai"))
            .await;
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
