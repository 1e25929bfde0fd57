//! Parsing of extraction replies
//!
//! Models asked for JSON still wrap it in code fences, leave trailing commas,
//! or answer in loose `key: value` prose. Two passes cope with that: a
//! structured pass over (repaired) JSON and a relaxed pass that recovers what
//! it can.

use super::{ExtractionMode, Sentiment};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)```").unwrap());
static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*([}\]])").unwrap());
static FIELD_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[\s\-*#>"'\d.]*([A-Za-z][A-Za-z _]*?)["'*]*\s*[:=]\s*(.*)$"#).unwrap()
});

const KNOWN_FIELDS: [&str; 8] = [
    "companies_mentioned",
    "mention_reasons",
    "authority_signals",
    "key_features",
    "sources_cited",
    "ranking_factors",
    "sentiment",
    "optimization_insights",
];

/// Insight fields recovered from a reply, before provider metadata is attached
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsightFields {
    pub companies_mentioned: Vec<String>,
    pub mention_reasons: Vec<String>,
    pub authority_signals: Vec<String>,
    pub key_features: Vec<String>,
    pub sources_cited: Vec<String>,
    pub ranking_factors: Vec<String>,
    pub sentiment: Sentiment,
    pub optimization_insights: Vec<String>,
}

/// Parse an extraction reply, structured pass first, relaxed pass second
pub fn parse_insights(raw: &str) -> Option<(InsightFields, ExtractionMode)> {
    if let Some(object) = parse_strict(raw) {
        return Some((fields_from_object(&object), ExtractionMode::Structured));
    }
    parse_relaxed(raw).map(|fields| (fields, ExtractionMode::Relaxed))
}

fn parse_strict(raw: &str) -> Option<Map<String, Value>> {
    let body = match FENCE.captures(raw) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => raw,
    };
    parse_object(body.trim())
}

/// Parse a JSON object, retrying once with trailing commas removed
fn parse_object(text: &str) -> Option<Map<String, Value>> {
    let value = serde_json::from_str::<Value>(text).ok().or_else(|| {
        let repaired = TRAILING_COMMA.replace_all(text, "$1");
        serde_json::from_str::<Value>(&repaired).ok()
    })?;
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn parse_relaxed(raw: &str) -> Option<InsightFields> {
    // Outermost brace block, e.g. JSON surrounded by prose
    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            if let Some(object) = parse_object(&raw[start..=end]) {
                return Some(fields_from_object(&object));
            }
        }
    }

    let mut object = Map::new();
    for line in raw.lines() {
        let Some(caps) = FIELD_LINE.captures(line) else {
            continue;
        };
        let key = normalize_key(&caps[1]);
        if !KNOWN_FIELDS.contains(&key.as_str()) || object.contains_key(&key) {
            continue;
        }
        let value = caps[2].trim().trim_end_matches(',');
        object.insert(key, loose_value(value));
    }

    if object.is_empty() {
        None
    } else {
        Some(fields_from_object(&object))
    }
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .split(|c: char| c == ' ' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Interpret the right-hand side of a `key: value` line
fn loose_value(value: &str) -> Value {
    if let Ok(parsed) = serde_json::from_str::<Value>(value) {
        return parsed;
    }
    let items: Vec<Value> = value
        .split([',', ';'])
        .map(|item| item.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|item| !item.is_empty())
        .map(|item| Value::String(item.to_string()))
        .collect();
    Value::Array(items)
}

fn fields_from_object(object: &Map<String, Value>) -> InsightFields {
    let list = |key: &str| object.get(key).map(string_list).unwrap_or_default();

    let companies_mentioned = list("companies_mentioned");
    let mention_reasons = object
        .get("mention_reasons")
        .map(|value| align_reasons(value, &companies_mentioned))
        .unwrap_or_else(|| vec![String::new(); companies_mentioned.len()]);
    let sentiment = object
        .get("sentiment")
        .map(sentiment_of)
        .unwrap_or_default();

    InsightFields {
        mention_reasons,
        authority_signals: list("authority_signals"),
        key_features: list("key_features"),
        sources_cited: list("sources_cited"),
        ranking_factors: list("ranking_factors"),
        sentiment,
        optimization_insights: list("optimization_insights"),
        companies_mentioned,
    }
}

/// Flatten any JSON shape into a list of non-empty strings
fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().filter_map(item_text).collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(key, value)| {
                item_text(value).map(|text| format!("{}: {}", key, text))
            })
            .collect(),
        other => item_text(other).into_iter().collect(),
    }
}

fn item_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Object(map) => ["name", "company", "title", "source", "url"]
            .iter()
            .find_map(|key| map.get(*key).and_then(|v| v.as_str()))
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Produce exactly one reason per company
fn align_reasons(value: &Value, companies: &[String]) -> Vec<String> {
    match value {
        Value::Object(map) => companies
            .iter()
            .map(|company| {
                map.iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(company))
                    .and_then(|(_, reason)| item_text(reason))
                    .unwrap_or_default()
            })
            .collect(),
        other => {
            let mut reasons = string_list(other);
            reasons.resize(companies.len(), String::new());
            reasons
        }
    }
}

fn sentiment_of(value: &Value) -> Sentiment {
    match value {
        Value::String(label) => Sentiment::from_label(label).unwrap_or_default(),
        // Per-entity labels collapse to one overall tone
        Value::Object(map) => combine(map.values().filter_map(|v| v.as_str())),
        Value::Array(items) => combine(items.iter().filter_map(|v| v.as_str())),
        _ => Sentiment::Neutral,
    }
}

fn combine<'a>(labels: impl Iterator<Item = &'a str>) -> Sentiment {
    let mut found: Option<Sentiment> = None;
    for sentiment in labels.filter_map(Sentiment::from_label) {
        found = match found {
            None => Some(sentiment),
            Some(prev) if prev == sentiment => Some(prev),
            Some(_) => return Sentiment::Mixed,
        };
    }
    found.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let raw = r#"{"companies_mentioned": ["Vanguard", "iShares"],
            "mention_reasons": {"Vanguard": "low fees", "iShares": "liquidity"},
            "authority_signals": ["leading"], "sentiment": "positive",
            "ranking_factors": "expense ratio", "optimization_insights": "publish fee tables"}"#;
        let (fields, mode) = parse_insights(raw).unwrap();
        assert_eq!(mode, ExtractionMode::Structured);
        assert_eq!(fields.companies_mentioned, vec!["Vanguard", "iShares"]);
        assert_eq!(fields.mention_reasons, vec!["low fees", "liquidity"]);
        assert_eq!(fields.sentiment, Sentiment::Positive);
        assert_eq!(fields.ranking_factors, vec!["expense ratio"]);
        assert_eq!(fields.optimization_insights, vec!["publish fee tables"]);
    }

    #[test]
    fn test_fenced_json_with_trailing_commas() {
        let raw = "Here you go:\n```json\n{\"companies_mentioned\": [\"Schwab\",],\n\"sentiment\": \"neutral\",}\n```";
        let (fields, mode) = parse_insights(raw).unwrap();
        assert_eq!(mode, ExtractionMode::Structured);
        assert_eq!(fields.companies_mentioned, vec!["Schwab"]);
        assert_eq!(fields.mention_reasons, vec![String::new()]);
    }

    #[test]
    fn test_json_inside_prose_is_relaxed() {
        let raw = "Sure! {\"key_features\": [\"low cost\"]} Hope that helps.";
        let (fields, mode) = parse_insights(raw).unwrap();
        assert_eq!(mode, ExtractionMode::Relaxed);
        assert_eq!(fields.key_features, vec!["low cost"]);
    }

    #[test]
    fn test_key_value_lines() {
        let raw = "Companies mentioned: Vanguard, Fidelity\n- Sentiment: mostly positive\nnoise line";
        let (fields, mode) = parse_insights(raw).unwrap();
        assert_eq!(mode, ExtractionMode::Relaxed);
        assert_eq!(fields.companies_mentioned, vec!["Vanguard", "Fidelity"]);
        assert_eq!(fields.mention_reasons.len(), 2);
        assert_eq!(fields.sentiment, Sentiment::Positive);
    }

    #[test]
    fn test_unparseable() {
        assert!(parse_insights("I cannot help with that request.").is_none());
        assert!(parse_insights("[1, 2, 3]").is_none());
        assert!(parse_insights("").is_none());
    }

    #[test]
    fn test_reasons_are_aligned() {
        let raw = r#"{"companies_mentioned": ["A", "B", "C"], "mention_reasons": ["one", "two", "three", "four"]}"#;
        let (fields, _) = parse_insights(raw).unwrap();
        assert_eq!(fields.mention_reasons, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_per_entity_sentiment() {
        let raw = r#"{"sentiment": {"Vanguard": "positive", "Robinhood": "negative"}}"#;
        let (fields, _) = parse_insights(raw).unwrap();
        assert_eq!(fields.sentiment, Sentiment::Mixed);
    }

    #[test]
    fn test_object_items() {
        let raw = r#"{"companies_mentioned": [{"name": "Vanguard"}, {"company": "Schwab"}]}"#;
        let (fields, _) = parse_insights(raw).unwrap();
        assert_eq!(fields.companies_mentioned, vec!["Vanguard", "Schwab"]);
    }
}
