//! Bundle client errors

use thiserror::Error;

/// Errors that can occur when talking to the Kubernetes API
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The API server rejected the request
    #[error("Kubernetes API error ({code} {reason}): {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Machine-readable reason, e.g. `AlreadyExists`
        reason: String,
        /// Message from the API server
        message: String,
    },

    /// Transport, authentication or client-side failure
    #[error("Kubernetes client error: {0}")]
    Client(#[source] kube::Error),
}

impl ResourceError {
    /// Convenience constructor for an API rejection
    pub fn api(code: u16, reason: impl Into<String>, message: impl Into<String>) -> Self {
        ResourceError::Api {
            code,
            reason: reason.into(),
            message: message.into(),
        }
    }

    /// HTTP status code, when the API server answered
    pub fn code(&self) -> Option<u16> {
        match self {
            ResourceError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// `409 Conflict` (covers both AlreadyExists and stale resourceVersion)
    pub fn is_conflict(&self) -> bool {
        self.code() == Some(409)
    }
}

impl From<kube::Error> for ResourceError {
    fn from(error: kube::Error) -> Self {
        match error {
            kube::Error::Api(response) => ResourceError::Api {
                code: response.code,
                reason: response.reason,
                message: response.message,
            },
            other => ResourceError::Client(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(ResourceError::api(409, "AlreadyExists", "dup").is_conflict());
        assert!(!ResourceError::api(500, "InternalError", "boom").is_conflict());
        assert_eq!(ResourceError::api(403, "Forbidden", "no").code(), Some(403));
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let err = ResourceError::api(422, "Invalid", "spec.replicas: must be >= 0");
        assert_eq!(
            err.to_string(),
            "Kubernetes API error (422 Invalid): spec.replicas: must be >= 0"
        );
    }
}
