//! Error types for the download proxy

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Download proxy error type
///
/// Every variant is terminal for the request that produced it and maps to a
/// plain-text HTTP response.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The caller sent a missing or malformed `url` parameter
    #[error("{0}")]
    InvalidInput(&'static str),

    /// The target host is outside the configured allowlist
    #[error("Domain not allowed")]
    Forbidden,

    /// The upstream answered with a non-success status
    #[error("Upstream {0}")]
    Upstream(u16),

    /// The upstream announced a body larger than the configured cap
    #[error("Upstream body too large")]
    UpstreamTooLarge,

    /// Anything else that went wrong while proxying
    #[error("Proxy error: {0}")]
    Internal(String),
}

/// Result type for proxy operations
pub type ProxyResult<T> = Result<T, ProxyError>;

impl ProxyError {
    pub const MISSING_URL: Self = Self::InvalidInput("Missing url");
    pub const INVALID_URL: Self = Self::InvalidInput("Invalid url");

    /// HTTP status reported to the caller
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Upstream(_) | Self::UpstreamTooLarge => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::MISSING_URL.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProxyError::INVALID_URL.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProxyError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ProxyError::Upstream(404).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ProxyError::UpstreamTooLarge.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ProxyError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(ProxyError::MISSING_URL.to_string(), "Missing url");
        assert_eq!(ProxyError::INVALID_URL.to_string(), "Invalid url");
        assert_eq!(ProxyError::Forbidden.to_string(), "Domain not allowed");
        assert_eq!(ProxyError::Upstream(404).to_string(), "Upstream 404");
        assert_eq!(
            ProxyError::Internal("connection refused".into()).to_string(),
            "Proxy error: connection refused"
        );
    }
}
