//! Keyword-rule classifier.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::classifier::Classifier;
use crate::dispatch::types::{Analysis, JsonMap};

const PAYMENT_KEYWORDS: &[&str] = &["pay", "payment", "charge", "bill", "invoice"];
const SEARCH_KEYWORDS: &[&str] = &["search", "find", "look for", "query"];

/// Case-insensitive substring rules: payment words are urgent, search
/// words are not, anything else is general.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn analyze(&self, message: &str) -> Analysis {
        let lower = message.to_lowercase();
        let mentions = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

        if mentions(PAYMENT_KEYWORDS) {
            Analysis {
                intent: Some("payment".into()),
                urgency: Some("urgent".into()),
                urgent: true,
                parameters: object(json!({ "amount": null, "currency": "USD" })),
                confidence: 0.8,
                reasoning: "Contains payment-related keywords".into(),
            }
        } else if mentions(SEARCH_KEYWORDS) {
            Analysis {
                intent: Some("search".into()),
                urgency: Some("normal".into()),
                urgent: false,
                parameters: object(json!({ "query": message })),
                confidence: 0.7,
                reasoning: "Contains search-related keywords".into(),
            }
        } else {
            Analysis {
                intent: Some("general".into()),
                urgency: Some("normal".into()),
                urgent: false,
                parameters: JsonMap::new(),
                confidence: 0.5,
                reasoning: "No specific intent detected".into(),
            }
        }
    }
}

fn object(value: Value) -> JsonMap {
    match value {
        Value::Object(map) => map,
        _ => JsonMap::new(),
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, message: &str, _context: &JsonMap) -> Analysis {
        let analysis = self.analyze(message);
        tracing::debug!(
            intent = ?analysis.intent,
            urgent = analysis.urgent,
            confidence = analysis.confidence,
            "Classified message"
        );
        analysis
    }
}
