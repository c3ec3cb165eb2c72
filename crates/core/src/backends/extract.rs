//! # Response Extraction
//!
//! Some backends answer with a structured object instead of plain text.
//! The text is pulled out with one fixed, ordered strategy:
//!
//! 1. a JSON string is the text itself ([`ExtractedText::PlainText`])
//! 2. an object with a `content` (or `raw`) field
//!    ([`ExtractedText::StructuredWithContent`]). Once either key is present
//!    this rule owns the value: a `null`, empty or text-less field is
//!    malformed, never serialized.
//! 3. an object with a non-empty `tasks_output` list: the final entry
//!    ([`ExtractedText::StructuredTaskList`])
//! 4. anything else: the value's compact JSON form ([`ExtractedText::PlainText`])
//!
//! `null` and empty text are malformed.

use serde_json::Value;

use crate::error::BackendError;

/// Text pulled out of a backend response, tagged with the rule that matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedText {
    PlainText(String),
    StructuredWithContent(String),
    StructuredTaskList(String),
}

impl ExtractedText {
    pub fn as_str(&self) -> &str {
        match self {
            ExtractedText::PlainText(text)
            | ExtractedText::StructuredWithContent(text)
            | ExtractedText::StructuredTaskList(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ExtractedText::PlainText(text)
            | ExtractedText::StructuredWithContent(text)
            | ExtractedText::StructuredTaskList(text) => text,
        }
    }
}

/// Resolve the text of a backend response
pub fn extract_text(value: &Value) -> Result<ExtractedText, BackendError> {
    let extracted = match value {
        Value::Null => {
            return Err(BackendError::MalformedResponse(
                "backend returned null".to_string(),
            ))
        }
        Value::String(text) => ExtractedText::PlainText(text.clone()),
        Value::Object(map) => {
            if let Some(text) = content_field(value) {
                ExtractedText::StructuredWithContent(text?)
            } else if let Some(last) = map
                .get("tasks_output")
                .and_then(Value::as_array)
                .and_then(|tasks| tasks.last())
            {
                let text = match last {
                    Value::String(text) => text.clone(),
                    other => match content_field(other) {
                        Some(text) => text?,
                        None => other.to_string(),
                    },
                };
                ExtractedText::StructuredTaskList(text)
            } else {
                ExtractedText::PlainText(value.to_string())
            }
        }
        other => ExtractedText::PlainText(other.to_string()),
    };

    if extracted.as_str().trim().is_empty() {
        return Err(BackendError::MalformedResponse(
            "backend returned empty text".to_string(),
        ));
    }
    Ok(extracted)
}

/// `content` as a string or a list of text parts, else `raw`.
///
/// `None` when the value has neither key.
fn content_field(value: &Value) -> Option<Result<String, BackendError>> {
    let content = value.get("content");
    let raw = value.get("raw");
    if content.is_none() && raw.is_none() {
        return None;
    }

    let text = content
        .and_then(text_of)
        .or_else(|| raw.and_then(Value::as_str).map(str::to_string))
        .filter(|text| !text.trim().is_empty());

    Some(text.ok_or_else(|| {
        BackendError::MalformedResponse(format!(
            "message has no usable text (content: {}, raw: {})",
            content.map_or("absent".to_string(), Value::to_string),
            raw.map_or("absent".to_string(), Value::to_string),
        ))
    }))
}

fn text_of(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(parts) => {
            let joined: Vec<&str> = parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect();
            (!joined.is_empty()).then(|| joined.concat())
        }
        _ => None,
    }
}
