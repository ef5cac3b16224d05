//! Intent → target lookup.
//!
//! # Responsibilities
//! - Store the intent routing table
//! - Resolve a classification to a target name
//! - Fall back to the default target for unknown or missing intents
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Total: every analysis resolves to some target, there is no NoMatch
//! - A missing intent is treated as "general"

use std::collections::BTreeMap;

use crate::config::RoutingConfig;
use crate::dispatch::types::Analysis;

/// Intent assumed when the classifier did not provide one.
pub const DEFAULT_INTENT: &str = "general";

/// Immutable routing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    routes: BTreeMap<String, String>,
    default_target: String,
}

impl Router {
    pub fn new<I, K, V>(routes: I, default_target: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            routes: routes.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            default_target: default_target.into(),
        }
    }

    pub fn from_config(config: &RoutingConfig) -> Self {
        Self::new(config.routes.clone(), config.default_target.clone())
    }

    /// Target name for `analysis`.
    pub fn resolve(&self, analysis: &Analysis) -> &str {
        let intent = analysis.intent.as_deref().unwrap_or(DEFAULT_INTENT);
        let target = self
            .routes
            .get(intent)
            .map(String::as_str)
            .unwrap_or(&self.default_target);

        tracing::debug!(intent = %intent, target_service = %target, "Resolved route");
        target
    }

    pub fn routes(&self) -> &BTreeMap<String, String> {
        &self.routes
    }

    pub fn default_target(&self) -> &str {
        &self.default_target
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::from_config(&RoutingConfig::default())
    }
}
