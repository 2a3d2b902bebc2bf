use serde::{Deserialize, Serialize};

use crate::types::Subject;

/// The body of a chat request, sent to both the single-response and the
/// streaming endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message, already trimmed.
    pub message: String,

    /// The subject whose tutor should answer.
    #[serde(default)]
    pub subject: Subject,
}

impl ChatRequest {
    /// Create a new `ChatRequest`.
    pub fn new(message: impl Into<String>, subject: Subject) -> Self {
        Self {
            message: message.into(),
            subject,
        }
    }
}
