//! Request classification.
//!
//! # Responsibilities
//! - Turn a raw message (plus context) into an `Analysis`
//! - Provide the keyword-rule classifier used when no model is configured
//!
//! # Design Decisions
//! - The dispatcher only reads `intent` and `urgent`; everything else is
//!   passed through to workers untouched
//! - Classification never fails: unknown messages become "general"

pub mod keyword;

use async_trait::async_trait;

use crate::dispatch::types::{Analysis, JsonMap};

pub use keyword::KeywordClassifier;

/// Produces an `Analysis` for a message.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, message: &str, context: &JsonMap) -> Analysis;
}
