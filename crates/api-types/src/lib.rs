//! Shared request/response types used by API-facing crates.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub backend: String,
}

impl HealthCheckResponse {
    #[must_use]
    pub fn ok(backend: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            backend: backend.into(),
        }
    }
}

/// Error body returned by every failing filesystem route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    /// What the user can do about it, e.g. which permission to grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remedy: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            remedy: None,
        }
    }

    #[must_use]
    pub fn with_remedy(mut self, remedy: Option<String>) -> Self {
        self.remedy = remedy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_check_ok_payload() {
        let response = HealthCheckResponse::ok("host");
        assert_eq!(response.status, "ok");
        assert_eq!(response.backend, "host");
    }

    #[test]
    fn error_response_omits_missing_remedy() {
        let response = ErrorResponse::new("NOT_FOUND", "not found: a.md");
        let json = serde_json::to_value(&response).expect("serialize error response");
        assert!(json.get("remedy").is_none());

        let decoded: ErrorResponse =
            serde_json::from_value(json).expect("deserialize error response");
        assert_eq!(decoded, response);
    }

    #[test]
    fn error_response_keeps_remedy() {
        let response = ErrorResponse::new("PERMISSION_DENIED", "denied")
            .with_remedy(Some("grant access".to_string()));
        let json = serde_json::to_value(&response).expect("serialize error response");
        assert_eq!(json["remedy"], "grant access");
    }
}
