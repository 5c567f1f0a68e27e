use crate::{
    schema::{is_supported_version, CritiqueResult},
    ResponseShape,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// What a generation turned into: a validated critique or plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritiqueOutcome {
    Critique(Box<CritiqueResult>),
    Text(String),
}

impl CritiqueOutcome {
    #[must_use]
    pub fn as_critique(&self) -> Option<&CritiqueResult> {
        match self {
            Self::Critique(critique) => Some(critique),
            Self::Text(_) => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Critique(_) => None,
            Self::Text(text) => Some(text),
        }
    }
}

/// Why a structured candidate was read as plain text instead.
#[derive(Debug, Error)]
enum SchemaMismatch {
    #[error("no JSON object found")]
    NoJson,
    #[error("missing schema_version marker")]
    MissingMarker,
    #[error("unsupported schema_version {0}")]
    UnsupportedVersion(String),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid critique: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Turn raw model text into an outcome. Never fails: anything that is not a
/// valid critique is plain text.
#[must_use]
pub fn parse(raw: &str, shape: ResponseShape) -> CritiqueOutcome {
    if !shape.is_structured() {
        return CritiqueOutcome::Text(raw.trim().to_string());
    }

    match parse_critique(raw) {
        Ok(mut critique) => {
            normalize_critique(&mut critique);
            CritiqueOutcome::Critique(Box::new(critique))
        }
        Err(mismatch) => {
            tracing::debug!(reason = %mismatch, "model output is not a critique, treating as text");
            CritiqueOutcome::Text(raw.trim().to_string())
        }
    }
}

fn parse_critique(raw: &str) -> Result<CritiqueResult, SchemaMismatch> {
    let object = first_json_object(raw).ok_or(SchemaMismatch::NoJson)?;
    validate_required(&object)?;
    Ok(serde_json::from_value(Value::Object(object))?)
}

fn validate_required(object: &Map<String, Value>) -> Result<(), SchemaMismatch> {
    let version = object
        .get("schema_version")
        .and_then(Value::as_str)
        .ok_or(SchemaMismatch::MissingMarker)?;
    if !is_supported_version(version) {
        return Err(SchemaMismatch::UnsupportedVersion(version.to_string()));
    }
    if !object.get("scores").is_some_and(Value::is_object) {
        return Err(SchemaMismatch::MissingField("scores"));
    }
    if !object.get("issues").is_some_and(Value::is_array) {
        return Err(SchemaMismatch::MissingField("issues"));
    }
    if !object.get("roast").is_some_and(Value::is_object) {
        return Err(SchemaMismatch::MissingField("roast"));
    }
    Ok(())
}

/// Enforce the invariants callers rely on: every priority references an
/// existing issue, priorities are ordered by severity, scores are in range.
pub(crate) fn normalize_critique(critique: &mut CritiqueResult) {
    let before = critique.top_priorities.len();
    let issues = &critique.issues;
    critique
        .top_priorities
        .retain(|priority| issues.iter().any(|issue| issue.id == priority.issue_id));
    let dropped = before - critique.top_priorities.len();
    if dropped > 0 {
        tracing::warn!(dropped, "dropped priorities referencing unknown issues");
    }

    critique.top_priorities.sort_by_key(|priority| {
        let severity = issues
            .iter()
            .find(|issue| issue.id == priority.issue_id)
            .map(|issue| issue.severity);
        (severity, priority.rank)
    });
    for (rank, priority) in (1..).zip(critique.top_priorities.iter_mut()) {
        priority.rank = rank;
    }

    if critique.scores.clamp() {
        tracing::debug!("clamped out-of-range scores");
    }
}

/// The first balanced `{...}` span that parses as a JSON object. Wrapper
/// fences and surrounding prose are skipped by the scan itself, so fences
/// inside string values are left intact.
fn first_json_object(text: &str) -> Option<Map<String, Value>> {
    text.char_indices()
        .filter(|(_, c)| *c == '{')
        .filter_map(|(start, _)| balanced_span(&text[start..]))
        .find_map(|span| match serde_json::from_str::<Value>(span) {
            Ok(Value::Object(object)) => Some(object),
            _ => None,
        })
}

/// Length-delimited span from an opening brace to its matching close,
/// ignoring braces inside JSON strings.
fn balanced_span(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (index, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=index]);
                }
            }
            _ => {}
        }
    }
    None
}
