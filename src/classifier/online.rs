//! LLM-backed classification.
//!
//! One prompt, one call, no retry. The response is parsed against a fixed
//! four-field schema; each field is coerced on its own, so a malformed field
//! never discards the rest of the answer.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::{ClassificationStrategy, DOCUMENT_TYPES};
use crate::config::LLMConfig;
use crate::llm::LLM;
use crate::models::{ClassificationResult, Metadata, NormalizedDocument};
use crate::types::{AppResult, ConfigError, LLMMessage, LLMRequest};

/// Approximate token budget for the document body, in characters.
pub const MAX_CONTENT_CHARS: usize = 15_000;
const TRUNCATION_MARKER: &str = "...";

/// Human-readable expansions shown to the model next to the bare labels.
const CATEGORY_HINTS: [(&str, &str); 5] = [
    ("I-9", "Employment Eligibility Verification"),
    ("W-4", "Employee's Withholding Certificate"),
    ("W-2", "Wage and Tax Statement"),
    ("1099", "Independent Contractor Income"),
    ("NDA", "Non-Disclosure Agreement"),
];

const RESPONSE_SCHEMA: [(&str, &str, &str); 4] = [
    ("document_type", "string", "The classified document type"),
    ("confidence_score", "number", "Confidence score for the classification (0.0 to 1.0)"),
    ("metadata", "object", "Additional metadata extracted from the document"),
    ("reasoning", "string", "Reasoning behind the classification decision"),
];

pub struct OnlineClassifier {
    llm: LLM,
}

impl OnlineClassifier {
    pub fn new(config: &LLMConfig) -> Result<Self, ConfigError> {
        if config.openai_api_key.is_empty() {
            return Err(ConfigError::MissingCredential("OPENAI_API_KEY".to_string()));
        }
        Ok(Self::with_llm(LLM::openai(config)))
    }

    pub fn with_llm(llm: LLM) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl ClassificationStrategy for OnlineClassifier {
    async fn classify(&self, doc: &NormalizedDocument) -> AppResult<ClassificationResult> {
        let prompt = build_prompt(&doc.text_content);
        debug!(filename = %doc.filename, prompt_chars = prompt.chars().count(), "Requesting LLM classification");

        let request = LLMRequest {
            model: self.llm.model().to_string(),
            messages: vec![LLMMessage::user(prompt)],
            max_tokens: None,
            temperature: Some(self.llm.temperature()),
        };

        let response = self.llm.create_chat_completion(&request).await?;
        Ok(parse_response(&response.content))
    }

    fn mode(&self) -> &'static str {
        "online"
    }
}

/// Hard cut at [`MAX_CONTENT_CHARS`] characters, marked with `...`.
pub fn truncate_content(text: &str) -> String {
    match text.char_indices().nth(MAX_CONTENT_CHARS) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

pub fn format_instructions() -> String {
    let fields = RESPONSE_SCHEMA
        .iter()
        .map(|(name, kind, description)| format!("\t\"{}\": {}  // {}", name, kind, description))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "The output should be a markdown code snippet formatted in the following schema, \
         including the leading and trailing \"```json\" and \"```\":\n\n```json\n{{\n{}\n}}\n```",
        fields
    )
}

pub fn build_prompt(text_content: &str) -> String {
    let categories = DOCUMENT_TYPES
        .iter()
        .map(|label| {
            let hint = CATEGORY_HINTS
                .iter()
                .find(|(l, _)| l == label)
                .map(|(_, hint)| format!(" ({})", hint));
            match (*label, hint) {
                ("Other", _) => "- Other (if none of the above)".to_string(),
                (label, Some(hint)) => format!("- {}{}", label, hint),
                (label, None) => format!("- {}", label),
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an expert document classifier for the BU DocCloud Platform.

Your task is to analyze document content and classify it into one of the following categories:
{categories}

Below is the text content extracted from a document. Analyze it carefully and determine which category it belongs to.

DOCUMENT CONTENT:
{content}

{instructions}

Be sure to include any relevant extracted information in the metadata (such as dates, names, ID numbers, etc.)"#,
        categories = categories,
        content = truncate_content(text_content),
        instructions = format_instructions(),
    )
}

/// Parse the model output into a result, coercing each field independently.
pub fn parse_response(content: &str) -> ClassificationResult {
    let fields = match extract_json_object(content) {
        Some(fields) => fields,
        None => {
            warn!(response_len = content.len(), "LLM response contained no JSON object, using defaults");
            serde_json::Map::new()
        }
    };

    ClassificationResult {
        document_type: coerce_document_type(fields.get("document_type")),
        confidence_score: coerce_confidence(fields.get("confidence_score")),
        metadata: coerce_metadata(fields.get("metadata")),
        reasoning: coerce_text(fields.get("reasoning")),
    }
}

/// The fenced ```json block if present, otherwise the outermost braces.
fn extract_json_object(content: &str) -> Option<serde_json::Map<String, Value>> {
    let candidate = match content.find("```json") {
        Some(start) => {
            let body = &content[start + "```json".len()..];
            match body.find("```") {
                Some(end) => &body[..end],
                None => body,
            }
        }
        None => {
            let start = content.find('{')?;
            let end = content.rfind('}')?;
            if end < start {
                return None;
            }
            &content[start..=end]
        }
    };

    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn coerce_document_type(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Null) | Some(Value::String(_)) | None => "Other".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Numbers and numeric strings, clamped to [0, 1]; anything else is 0.0.
pub fn coerce_confidence(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match raw {
        Some(score) if score.is_finite() => score.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Objects pass through, JSON-object strings are parsed, anything else is empty.
pub fn coerce_metadata(value: Option<&Value>) -> Metadata {
    match value {
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => map,
            _ => Metadata::new(),
        },
        _ => Metadata::new(),
    }
}

fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
