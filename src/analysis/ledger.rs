//! Append-only CSV ledger of analyses

use super::AnalysisResult;
use crate::store::csv_row;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Column names, written once when the ledger file is created
pub const LEDGER_HEADER: [&str; 11] = [
    "timestamp",
    "query",
    "provider",
    "companies_mentioned",
    "mention_reasons",
    "authority_signals",
    "key_features",
    "sources_cited",
    "ranking_factors",
    "sentiment",
    "optimization_insights",
];

/// One CSV row per (query, provider, timestamp)
pub struct Ledger {
    path: PathBuf,
    // Serializes header creation and appends within this process
    write_lock: Mutex<()>,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file with its header if it does not exist yet
    pub async fn initialize(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.ensure_header().await
    }

    /// Append one analysis row
    pub async fn append(&self, query: &str, analysis: &AnalysisResult) -> Result<()> {
        let row = Self::row(query, analysis)?;
        let _guard = self.write_lock.lock().await;
        self.ensure_header().await?;

        let mut file = tokio::fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening ledger {:?}", self.path))?;
        file.write_all(row.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn ensure_header(&self) -> Result<()> {
        let empty = match tokio::fs::metadata(&self.path).await {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };
        if !empty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, csv_row(&LEDGER_HEADER))
            .await
            .with_context(|| format!("creating ledger {:?}", self.path))?;
        tracing::info!("Created analysis ledger: {:?}", self.path);
        Ok(())
    }

    fn row(query: &str, analysis: &AnalysisResult) -> Result<String> {
        let reasons: serde_json::Map<String, serde_json::Value> = analysis
            .companies_mentioned
            .iter()
            .zip(&analysis.mention_reasons)
            .map(|(company, reason)| (company.clone(), serde_json::Value::from(reason.as_str())))
            .collect();

        let timestamp = analysis.timestamp.to_rfc3339();
        let companies = serde_json::to_string(&analysis.companies_mentioned)?;
        let reasons = serde_json::to_string(&reasons)?;
        let signals = serde_json::to_string(&analysis.authority_signals)?;
        let features = serde_json::to_string(&analysis.key_features)?;
        let sources = serde_json::to_string(&analysis.sources_cited)?;
        let factors = analysis.ranking_factors.join("; ");
        let insights = analysis.optimization_insights.join("; ");

        Ok(csv_row(&[
            timestamp.as_str(),
            query,
            analysis.provider.as_str(),
            companies.as_str(),
            reasons.as_str(),
            signals.as_str(),
            features.as_str(),
            sources.as_str(),
            factors.as_str(),
            analysis.sentiment.as_str(),
            insights.as_str(),
        ]))
    }
}
