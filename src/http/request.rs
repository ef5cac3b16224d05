//! Inbound request shapes.
//!
//! # Responsibilities
//! - Define the `/process` request body
//! - Name the request ID header echoed back to callers
//!
//! # Design Decisions
//! - Request ID generated server-side (UUID v4) as early as possible
//! - `user_id` and `context` are optional; `message` is required

use serde::{Deserialize, Serialize};

use crate::dispatch::types::JsonMap;

/// Header carrying the generated request ID on every `/process` response.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Body of `POST /process`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub context: JsonMap,
}
