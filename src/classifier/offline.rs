// Deterministic filename-based classification for debug and demo runs

use async_trait::async_trait;
use serde_json::json;

use super::ClassificationStrategy;
use crate::models::{ClassificationResult, Metadata, NormalizedDocument};
use crate::types::AppResult;

pub const OFFLINE_REASONING: &str = "This is a mock classification in debug mode.";

const MATCH_CONFIDENCE: f64 = 0.95;
const IMAGE_CONFIDENCE: f64 = 0.75;
const IMAGE_EXTENSIONS: [&str; 3] = [".jpg", ".jpeg", ".png"];

struct KeywordRule {
    keywords: &'static [&'static str],
    document_type: &'static str,
    sample_metadata: Metadata,
}

impl KeywordRule {
    fn new(keywords: &'static [&'static str], document_type: &'static str, sample: serde_json::Value) -> Self {
        let sample_metadata = match sample {
            serde_json::Value::Object(map) => map,
            _ => Metadata::new(),
        };
        Self {
            keywords,
            document_type,
            sample_metadata,
        }
    }

    fn matches(&self, filename: &str) -> bool {
        self.keywords.iter().any(|k| filename.contains(k))
    }
}

pub struct OfflineClassifier {
    rules: Vec<KeywordRule>,
}

impl OfflineClassifier {
    pub fn new() -> Self {
        // Order matters: the first matching rule wins.
        let rules = vec![
            KeywordRule::new(&["w4", "w-4"], "W-4", json!({"form_year": "2023", "employee_name": "Sample Employee"})),
            KeywordRule::new(&["w2", "w-2"], "W-2", json!({"tax_year": "2023", "employer_id": "12-3456789"})),
            KeywordRule::new(&["i9", "i-9"], "I-9", json!({"form_version": "10/21/2019"})),
            KeywordRule::new(&["passport"], "Passport", json!({"issue_date": "2020-01-01", "expiry_date": "2030-01-01"})),
            KeywordRule::new(&["license", "dl"], "Driver License", json!({"state": "California", "issue_date": "2021-05-15"})),
            KeywordRule::new(&["contract"], "Legal Contract", json!({"parties": ["Company A", "Company B"], "date": "2023-09-01"})),
            KeywordRule::new(&["bank", "statement"], "Bank Statement", json!({"bank_name": "Sample Bank", "account_type": "Checking"})),
            KeywordRule::new(&["pay", "stub"], "Pay Stub", json!({"pay_period": "Jan 1-15, 2023"})),
        ];
        Self { rules }
    }

    fn classify_filename(&self, filename: &str, file_extension: &str) -> ClassificationResult {
        let filename = filename.to_lowercase();
        let file_extension = file_extension.to_lowercase();

        let (document_type, confidence_score, metadata) =
            match self.rules.iter().find(|rule| rule.matches(&filename)) {
                Some(rule) => (rule.document_type, MATCH_CONFIDENCE, rule.sample_metadata.clone()),
                None if IMAGE_EXTENSIONS.contains(&file_extension.as_str()) => {
                    ("ID Document", IMAGE_CONFIDENCE, Metadata::new())
                }
                None => ("Other", MATCH_CONFIDENCE, Metadata::new()),
            };

        ClassificationResult {
            document_type: document_type.to_string(),
            confidence_score,
            metadata,
            reasoning: OFFLINE_REASONING.to_string(),
        }
    }
}

impl Default for OfflineClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClassificationStrategy for OfflineClassifier {
    async fn classify(&self, doc: &NormalizedDocument) -> AppResult<ClassificationResult> {
        Ok(self.classify_filename(&doc.filename, &doc.file_extension))
    }

    fn mode(&self) -> &'static str {
        "offline"
    }
}
