//! Error types for Trello operations.
//!
//! Errors are categorized so callers can give appropriate user feedback.
//! Each variant carries enough context to tell the user what went wrong
//! and how to fix it.

use std::fmt;

/// Result type alias for Trello operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of Trello errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connectivity problems or unexpected HTTP failures.
    Network,
    /// Missing or rejected credentials.
    Auth,
    /// A board, list, card or label does not exist.
    NotFound,
    /// Caller supplied a value Trello cannot accept.
    Input,
    /// Trello answered with a payload we could not decode.
    Format,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Auth => "Authentication failed",
            Self::NotFound => "Not found",
            Self::Input => "Invalid input",
            Self::Format => "Unexpected response format",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check your internet connection and try again",
            Self::Auth => "Check the API key and token (https://trello.com/app-key)",
            Self::NotFound => "Verify the name or id exists and the token can see it",
            Self::Input => "Fix the value in the orders file and run again",
            Self::Format => "The Trello API may have changed, check for a newer release",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to Trello.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Trello rejected the credentials (HTTP 401).
    #[error("unauthorized: Trello rejected the API key or token")]
    Unauthorized,

    /// The requested resource does not exist (HTTP 404 or a failed lookup).
    #[error("not found: {what}")]
    NotFound {
        /// What was being looked up.
        what: String,
    },

    /// Too many requests (HTTP 429).
    #[error("rate limited by Trello")]
    RateLimited,

    /// Any other HTTP or transport failure.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
        /// HTTP status code if available.
        status: Option<u16>,
    },

    /// Response body could not be decoded.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// A card reference did not contain a usable short id.
    #[error("invalid card short id: '{0}'")]
    InvalidShortId(String),

    /// A label colour Trello does not know.
    #[error("invalid label color: '{0}'")]
    InvalidColor(String),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create an HTTP error.
    pub fn http(message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Http {
            message: message.into(),
            status,
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Unauthorized => ErrorCategory::Auth,
            Error::NotFound { .. } => ErrorCategory::NotFound,
            Error::RateLimited | Error::Http { .. } => ErrorCategory::Network,
            Error::InvalidResponse(_) => ErrorCategory::Format,
            Error::InvalidShortId(_) | Error::InvalidColor(_) => ErrorCategory::Input,
            Error::Other(_) => ErrorCategory::Other,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(401) => Self::Unauthorized,
            ureq::Error::StatusCode(404) => Self::not_found("Trello resource (HTTP 404)"),
            ureq::Error::StatusCode(429) => Self::RateLimited,
            ureq::Error::Json(err) => Self::InvalidResponse(err.to_string()),
            ureq::Error::StatusCode(code) => Self::Http {
                message: format!("HTTP {code}"),
                status: Some(code),
            },
            other => Self::Http {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert!(matches!(
            Error::from(ureq::Error::StatusCode(401)),
            Error::Unauthorized
        ));
        assert!(matches!(
            Error::from(ureq::Error::StatusCode(429)),
            Error::RateLimited
        ));
        assert_eq!(
            Error::from(ureq::Error::StatusCode(404)).category(),
            ErrorCategory::NotFound
        );

        match Error::from(ureq::Error::StatusCode(500)) {
            Error::Http { status, .. } => assert_eq!(status, Some(500)),
            other => panic!("Expected Error::Http, got {other:?}"),
        }
    }

    #[test]
    fn test_categories() {
        assert_eq!(Error::Unauthorized.category(), ErrorCategory::Auth);
        assert_eq!(Error::http("reset", None).category(), ErrorCategory::Network);
        assert_eq!(
            Error::InvalidShortId("abc".into()).category(),
            ErrorCategory::Input
        );
        assert_eq!(
            Error::InvalidResponse("eof".into()).category(),
            ErrorCategory::Format
        );
    }

    #[test]
    fn test_every_category_has_advice() {
        for category in [
            ErrorCategory::Network,
            ErrorCategory::Auth,
            ErrorCategory::NotFound,
            ErrorCategory::Input,
            ErrorCategory::Format,
            ErrorCategory::Other,
        ] {
            assert!(!category.description().is_empty());
            assert!(!category.advice().is_empty());
        }
    }

    #[test]
    fn test_error_display() {
        let err = Error::not_found("board 'Roadmap'");
        assert_eq!(err.to_string(), "not found: board 'Roadmap'");

        let err = Error::InvalidShortId("T".into());
        assert!(err.to_string().contains("'T'"));
    }

    #[test]
    fn test_from_serde_error() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: Error = json_err.into();
        assert_eq!(err.category(), ErrorCategory::Format);
    }
}
