//! Record export formats

use super::StoreError;
use crate::results::{ProviderPayload, QueryRecord};
use std::str::FromStr;

/// Supported export encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(StoreError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// One CSV line with every field quoted
pub fn csv_row(fields: &[&str]) -> String {
    let mut line = fields
        .iter()
        .map(|field| format!("\"{}\"", field.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Serialize a record in the requested format
pub fn render(record: &QueryRecord, format: ExportFormat) -> Result<String, StoreError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        ExportFormat::Csv => render_csv(record),
    }
}

fn render_csv(record: &QueryRecord) -> Result<String, StoreError> {
    let mut csv = csv_row(&["provider", "model", "success", "error", "response"]);

    let mut results: Vec<_> = record.results.values().collect();
    results.sort_by(|a, b| a.provider.cmp(&b.provider));

    for result in results {
        let response = match &result.response {
            Some(ProviderPayload::Text(text)) => text.clone(),
            Some(ProviderPayload::Search(hits)) => serde_json::to_string(hits)?,
            None => String::new(),
        };
        let error = match (&result.error, &result.error_message) {
            (Some(kind), Some(message)) => format!("{}: {}", kind, message),
            (Some(kind), None) => kind.to_string(),
            _ => String::new(),
        };
        csv.push_str(&csv_row(&[
            result.provider.as_str(),
            result.model.as_deref().unwrap_or(""),
            if result.success { "true" } else { "false" },
            error.as_str(),
            response.as_str(),
        ]));
    }

    Ok(csv)
}
