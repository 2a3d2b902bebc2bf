use serde::{Deserialize, Serialize};

/// The body returned by the single-response chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The tutor's complete reply.
    pub response: String,

    /// Outcome reported by the service, usually `"success"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ChatResponse {
    /// Create a new `ChatResponse` with no status.
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            status: None,
        }
    }

    /// Set the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chat_response_deserialization() {
        let json = json!({
            "response": "<p>Answer</p>",
            "status": "success"
        });

        let response: ChatResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.response, "<p>Answer</p>");
        assert_eq!(response.status.as_deref(), Some("success"));
    }

    #[test]
    fn chat_response_without_status() {
        let response: ChatResponse = serde_json::from_str(r#"{"response":"Hi"}"#).unwrap();
        assert_eq!(response, ChatResponse::new("Hi"));
    }
}
