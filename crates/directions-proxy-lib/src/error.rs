use std::time::Duration;

use thiserror::Error;

/// Convenient result alias for the directions proxy library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A required configuration value was not provided.
    #[error("missing required configuration value {name}")]
    MissingConfig { name: &'static str },

    /// A configuration value was present but could not be used.
    #[error("invalid value {value:?} for {name}: {reason}")]
    InvalidConfig {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A query parameter held a value outside its accepted set.
    #[error("invalid {name} {value:?}; expected one of {expected}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    /// The upstream call did not complete within the configured timeout.
    #[error("upstream request timed out after {}ms", .0.as_millis())]
    UpstreamTimeout(Duration),

    /// The upstream call failed before a response was received.
    #[error("upstream request failed: {0}")]
    UpstreamTransport(#[source] reqwest::Error),

    /// The upstream answered with a non-success HTTP status.
    #[error("upstream returned HTTP {status}")]
    UpstreamStatus { status: u16 },

    /// The upstream body was not valid JSON.
    #[error("upstream returned invalid JSON: {0}")]
    UpstreamBody(#[from] serde_json::Error),

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// Wrapper for IO errors (reading secret files).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures that happened while talking to the upstream API.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::UpstreamTimeout(_)
                | Error::UpstreamTransport(_)
                | Error::UpstreamStatus { .. }
                | Error::UpstreamBody(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display_uses_millis() {
        let err = Error::UpstreamTimeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "upstream request timed out after 1500ms");
        assert!(err.is_upstream());
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = Error::InvalidParameter {
            name: "mode",
            value: "flying".to_string(),
            expected: "driving, walking",
        };
        let msg = err.to_string();
        assert!(msg.contains("mode"));
        assert!(msg.contains("\"flying\""));
        assert!(msg.contains("driving, walking"));
        assert!(!err.is_upstream());
    }

    #[test]
    fn test_missing_config_is_not_upstream() {
        let err = Error::MissingConfig {
            name: "GOOGLE_MAPS_API_KEY",
        };
        assert!(err.to_string().contains("GOOGLE_MAPS_API_KEY"));
        assert!(!err.is_upstream());
    }
}
