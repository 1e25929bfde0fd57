//! JSON archive of completed records

use super::StoreError;
use crate::results::QueryRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").unwrap());

const SLUG_MAX_CHARS: usize = 50;

/// File-name friendly form of a query
pub fn slug(query: &str) -> String {
    let lowered = query.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    let joined = SEPARATORS.replace_all(stripped.trim(), "_");
    joined.chars().take(SLUG_MAX_CHARS).collect()
}

/// Archive file name for a record
pub fn file_name(record: &QueryRecord) -> String {
    format!(
        "llm_results_{}_{}.json",
        slug(&record.query),
        record.timestamp.format("%Y%m%d_%H%M%S")
    )
}

/// Write `record` as pretty JSON under `dir`, returning the file path
pub async fn write(dir: &Path, record: &QueryRecord) -> Result<PathBuf, StoreError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name(record));
    let json = serde_json::to_string_pretty(record)?;
    tokio::fs::write(&path, json).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug() {
        assert_eq!(slug("What are the best ETFs?"), "what_are_the_best_etfs");
        assert_eq!(slug("  low-cost -- index   funds! "), "low_cost_index_funds");
        assert_eq!(slug(&"a".repeat(80)).len(), 50);
    }

    #[tokio::test]
    async fn test_write_archive() {
        let dir = tempfile::tempdir().unwrap();
        let record = QueryRecord::new("q1", "Best ETFs?");
        let path = write(&dir.path().join("results"), &record).await.unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("llm_results_best_etfs_"));
        assert!(name.ends_with(".json"));

        let parsed: QueryRecord =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.id, "q1");
    }
}
