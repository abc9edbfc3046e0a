use thiserror::Error;

/// Errors surfaced by the completion relay.
///
/// This is the full vocabulary a caller of the relay can observe. Upstream
/// failure detail never crosses this boundary: the raw gateway error body is
/// logged server-side and collapsed into `UpstreamUnavailable`.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("Subscription inactive or expired.")]
    EntitlementDenied,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("AI service temporarily unavailable")]
    UpstreamUnavailable,

    #[error("stream error: {0}")]
    Stream(String),
}

/// Errors from repository operations (used by trait definitions in botdesk-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Fatal configuration errors detected at startup, never per-request.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required credential '{0}' is not configured")]
    MissingCredential(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relay_error_user_facing_messages() {
        assert_eq!(
            RelayError::EntitlementDenied.to_string(),
            "Subscription inactive or expired."
        );
        assert_eq!(
            RelayError::RateLimited.to_string(),
            "Rate limit exceeded. Please try again later."
        );
        assert_eq!(
            RelayError::UpstreamUnavailable.to_string(),
            "AI service temporarily unavailable"
        );
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingCredential("BOTDESK_GATEWAY_KEY".to_string());
        assert!(err.to_string().contains("BOTDESK_GATEWAY_KEY"));
    }
}
