//! Turns a completion payload into candidate records.
//!
//! The backend is asked for raw JSON but routinely wraps it in code fences,
//! adds prose around it, or nests the list under an object key.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{error::NormalizeError, models::Candidate};

/// Most candidates ever taken from one response
pub const MAX_CANDIDATES: usize = 5;

const FENCE: &str = "```";

/// Accepted top-level shapes, tried in declaration order
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CandidatePayload {
    Wrapped { recommendations: Vec<Value> },
    Bare(Vec<Value>),
    Keyed(Map<String, Value>),
}

impl CandidatePayload {
    fn into_entries(self) -> Result<Vec<Value>, NormalizeError> {
        match self {
            CandidatePayload::Wrapped { recommendations } => Ok(recommendations),
            CandidatePayload::Bare(entries) => Ok(entries),
            CandidatePayload::Keyed(object) => {
                let mut lists: Vec<(String, Vec<Value>)> = object
                    .into_iter()
                    .filter_map(|(key, value)| match value {
                        Value::Array(entries) => Some((key, entries)),
                        _ => None,
                    })
                    .collect();

                match lists.len() {
                    0 => Err(NormalizeError::Validation("expected array".to_string())),
                    1 => {
                        let (key, entries) = lists.remove(0);
                        tracing::debug!(key = %key, "Using sole list-valued property");
                        Ok(entries)
                    }
                    _ => {
                        let keys: Vec<&str> = lists.iter().map(|(key, _)| key.as_str()).collect();
                        tracing::warn!(
                            keys = ?keys,
                            "Rejecting response with several list properties"
                        );
                        Err(NormalizeError::Validation(
                            "expected array, found several list properties".to_string(),
                        ))
                    }
                }
            }
        }
    }
}

/// Extracts at most [`MAX_CANDIDATES`] candidates from `raw`, in order.
pub fn normalize(raw: &str) -> Result<Vec<Candidate>, NormalizeError> {
    tracing::debug!(raw = %raw, "Raw completion content");

    let content = strip_code_fence(raw);

    let mut entries = match serde_json::from_str::<Value>(content) {
        Ok(value) => decode_payload(value)?,
        Err(parse_error) => {
            tracing::debug!(
                error = %parse_error,
                "Direct JSON parse failed, scanning for an array"
            );
            extract_embedded_array(content)?
        }
    };

    if entries.len() > MAX_CANDIDATES {
        tracing::debug!(
            received = entries.len(),
            kept = MAX_CANDIDATES,
            "Discarding surplus candidates"
        );
        entries.truncate(MAX_CANDIDATES);
    }

    let candidates: Vec<Candidate> = entries.iter().map(Candidate::from_value).collect();

    tracing::info!(count = candidates.len(), "Parsed recommendation candidates");

    Ok(candidates)
}

/// Drops a leading ```` ```lang ```` line and a trailing ```` ``` ```` line.
fn strip_code_fence(raw: &str) -> &str {
    let mut content = raw.trim();

    if content.starts_with(FENCE) {
        content = match content.find('\n') {
            Some(newline) => &content[newline + 1..],
            None => content.trim_start_matches('`'),
        };
    }

    if let Some(stripped) = content.trim_end().strip_suffix(FENCE) {
        content = stripped;
    }

    content.trim()
}

fn decode_payload(value: Value) -> Result<Vec<Value>, NormalizeError> {
    serde_json::from_value::<CandidatePayload>(value)
        .map_err(|_| NormalizeError::Validation("expected array".to_string()))?
        .into_entries()
}

fn array_pattern() -> &'static Regex {
    static ARRAY_RE: OnceLock<Regex> = OnceLock::new();
    ARRAY_RE.get_or_init(|| Regex::new(r"\[\s*\{[\s\S]*\}\s*\]").unwrap())
}

fn extract_embedded_array(content: &str) -> Result<Vec<Value>, NormalizeError> {
    let found = array_pattern()
        .find(content)
        .ok_or_else(|| NormalizeError::Parse("no JSON array found in response".to_string()))?;

    serde_json::from_str::<Vec<Value>>(found.as_str())
        .map_err(|e| NormalizeError::Parse(e.to_string()))
}
