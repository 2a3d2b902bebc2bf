use serde::{Deserialize, Serialize};

/// The body returned by the service's health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `"healthy"` when the service is up.
    pub status: String,

    /// Free-form detail.
    #[serde(default)]
    pub message: String,
}

impl HealthStatus {
    /// Returns true if the service reported itself healthy.
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_deserialization() {
        let status: HealthStatus = serde_json::from_str(
            r#"{"status":"healthy","message":"AI Tutor API is running"}"#,
        )
        .unwrap();
        assert!(status.is_healthy());
        assert_eq!(status.message, "AI Tutor API is running");
    }
}
