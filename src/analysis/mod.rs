//! Secondary analysis of provider answers
//!
//! Runs an extraction call over successful textual answers and turns the
//! reply into structured AISEO insights, tolerating sloppy JSON.

mod extract;
mod ledger;
mod pipeline;

pub use extract::{parse_insights, InsightFields};
pub use ledger::{Ledger, LEDGER_HEADER};
pub use pipeline::AnalysisPipeline;

use crate::results::ProviderError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall tone toward the mentioned entities
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
    Mixed,
}

impl Sentiment {
    /// Lenient parse of a free-form label
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        if label.contains("mixed") {
            Some(Self::Mixed)
        } else if label.contains("positive") {
            Some(Self::Positive)
        } else if label.contains("negative") {
            Some(Self::Negative)
        } else if label.contains("neutral") {
            Some(Self::Neutral)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
            Self::Mixed => "mixed",
        }
    }
}

/// Which parsing pass recovered the insights
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    #[default]
    Structured,
    Relaxed,
}

/// Insights extracted from one provider's answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    /// Provider the analysed answer came from
    pub provider: String,
    pub companies_mentioned: Vec<String>,
    /// One justification per entry of `companies_mentioned`
    pub mention_reasons: Vec<String>,
    pub authority_signals: Vec<String>,
    pub key_features: Vec<String>,
    pub sources_cited: Vec<String>,
    pub ranking_factors: Vec<String>,
    pub sentiment: Sentiment,
    pub optimization_insights: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub extraction: ExtractionMode,
}

impl AnalysisResult {
    /// An analysis with no findings
    pub fn empty(provider: impl Into<String>) -> Self {
        Self::from_fields(provider, InsightFields::default(), ExtractionMode::Structured)
    }

    pub fn from_fields(
        provider: impl Into<String>,
        fields: InsightFields,
        extraction: ExtractionMode,
    ) -> Self {
        Self {
            provider: provider.into(),
            companies_mentioned: fields.companies_mentioned,
            mention_reasons: fields.mention_reasons,
            authority_signals: fields.authority_signals,
            key_features: fields.key_features,
            sources_cited: fields.sources_cited,
            ranking_factors: fields.ranking_factors,
            sentiment: fields.sentiment,
            optimization_insights: fields.optimization_insights,
            timestamp: Utc::now(),
            extraction,
        }
    }
}

/// Why an analysis could not be produced
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("result from {0} is not a successful text answer")]
    Ineligible(String),

    #[error("extraction call failed ({kind}): {message}")]
    Extraction { kind: ProviderError, message: String },

    #[error("extraction reply could not be parsed")]
    Unparseable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_labels() {
        assert_eq!(Sentiment::from_label("Positive"), Some(Sentiment::Positive));
        assert_eq!(
            Sentiment::from_label("mixed, mostly positive"),
            Some(Sentiment::Mixed)
        );
        assert_eq!(Sentiment::from_label("unclear"), None);
        assert_eq!(
            serde_json::to_string(&Sentiment::Negative).unwrap(),
            "\"negative\""
        );
    }

    #[test]
    fn test_empty_analysis() {
        let analysis = AnalysisResult::empty("openai");
        assert_eq!(analysis.provider, "openai");
        assert!(analysis.companies_mentioned.is_empty());
        assert_eq!(analysis.sentiment, Sentiment::Neutral);
    }
}
