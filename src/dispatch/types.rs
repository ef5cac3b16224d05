//! Request, classification and outcome types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Free-form JSON object used for context, parameters and payloads.
pub type JsonMap = serde_json::Map<String, Value>;

/// Result of classifying a message.
///
/// Only `intent` and `urgent` drive dispatch; the rest travels with the
/// request for the worker's benefit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Analysis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<String>,
    pub urgent: bool,
    pub parameters: JsonMap,
    pub confidence: f64,
    pub reasoning: String,
}

impl Analysis {
    /// Analysis with only an intent and urgency flag set.
    pub fn with_intent(intent: impl Into<String>, urgent: bool) -> Self {
        Self {
            intent: Some(intent.into()),
            urgent,
            ..Self::default()
        }
    }
}

/// A classified request ready to be sent to a worker. This is the JSON
/// body both transports deliver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub context: JsonMap,
    #[serde(default)]
    pub analysis: Analysis,
    /// Creation time, Unix seconds.
    pub timestamp: u64,
}

impl AgentRequest {
    pub fn new(
        id: impl Into<String>,
        message: impl Into<String>,
        user_id: Option<String>,
        context: JsonMap,
        analysis: Analysis,
    ) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            user_id,
            context,
            analysis,
            timestamp: unix_now(),
        }
    }
}

/// Successful delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchPayload {
    /// The worker's response body (synchronous transport).
    Completed(JsonMap),
    /// The request was durably accepted on `queue`; not yet processed.
    Queued { queue: String },
}

impl DispatchPayload {
    pub fn into_data(self) -> JsonMap {
        match self {
            DispatchPayload::Completed(data) => data,
            DispatchPayload::Queued { queue } => {
                let mut data = JsonMap::new();
                data.insert("status".into(), Value::from("queued"));
                data.insert("queue".into(), Value::from(queue));
                data
            }
        }
    }
}

/// Failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The breaker rejected the call without attempting it.
    CircuitOpen,
    /// The synchronous call failed.
    DownstreamFailure,
    /// The synchronous call missed its deadline.
    DownstreamTimeout,
    /// The queue did not accept the message.
    EnqueueFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::CircuitOpen => "circuit_open",
            ErrorKind::DownstreamFailure => "downstream_failure",
            ErrorKind::DownstreamTimeout => "downstream_timeout",
            ErrorKind::EnqueueFailure => "enqueue_failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchFailure {
    pub kind: ErrorKind,
    pub message: String,
}

/// Normalized result of one dispatch: exactly one of payload or failure.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Success(DispatchPayload),
    Failure(DispatchFailure),
}

impl DispatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DispatchOutcome::Success(_))
    }

    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Success(DispatchPayload::Completed(_)) => "completed",
            DispatchOutcome::Success(DispatchPayload::Queued { .. }) => "queued",
            DispatchOutcome::Failure(failure) => failure.kind.as_str(),
        }
    }

    /// Render as the response surfaced to callers.
    pub fn into_response(self, request_id: &str, agent_id: &str) -> AgentResponse {
        let (status, data, error, error_kind) = match self {
            DispatchOutcome::Success(payload) => (ResponseStatus::Success, payload.into_data(), None, None),
            DispatchOutcome::Failure(failure) => (
                ResponseStatus::Error,
                JsonMap::new(),
                Some(failure.message),
                Some(failure.kind),
            ),
        };

        AgentResponse {
            request_id: request_id.to_string(),
            agent_id: agent_id.to_string(),
            status,
            data,
            error,
            error_kind,
            timestamp: unix_now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Response body returned to the caller of `/process`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub request_id: String,
    pub agent_id: String,
    pub status: ResponseStatus,
    #[serde(default)]
    pub data: JsonMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub timestamp: u64,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
