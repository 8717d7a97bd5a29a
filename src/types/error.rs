use thiserror::Error;

/// Fragments of the upstream error schema that mark a request-parameter
/// rejection (as opposed to an auth or availability failure).
const VALIDATION_FRAGMENTS: [&str; 3] = [
    r#"loc":["index"]"#,
    r#"loc":["date_period"]"#,
    "validation_error",
];

/// spendstack error types
#[derive(Error, Debug)]
pub enum SpendError {
    /// Endpoint returned HTML or an unparsable body where data was expected
    #[error("malformed upstream response: {0}")]
    MalformedUpstream(String),

    /// Endpoint answered with a non-success status
    #[error("upstream http error {status}: {body}")]
    UpstreamHttp { status: u16, body: String },

    /// Transport-level HTTP failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to parse JSON/JSONL or a date field
    #[error("parse error: {0}")]
    Parse(String),

    /// File I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),
}

impl SpendError {
    /// Whether this error is the endpoint rejecting request parameters.
    ///
    /// The upstream embeds its validation schema in the error body, so
    /// detection is a string match on known fragments. A validation error
    /// is the trigger for the POST payload fallback chain; anything else
    /// propagates as-is.
    pub fn is_validation_error(&self) -> bool {
        let message = self.to_string();
        VALIDATION_FRAGMENTS.iter().any(|f| message.contains(f))
    }
}

/// Result type alias for spendstack
pub type Result<T> = std::result::Result<T, SpendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SpendError::Parse("invalid json".into());
        assert_eq!(err.to_string(), "parse error: invalid json");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SpendError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }

    #[test]
    fn test_validation_error_index_fragment() {
        let err = SpendError::UpstreamHttp {
            status: 422,
            body: r#"{"detail":[{"loc":["index"],"msg":"field required"}]}"#.into(),
        };
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_validation_error_date_period_fragment() {
        let err = SpendError::UpstreamHttp {
            status: 400,
            body: r#"{"detail":[{"loc":["date_period"],"msg":"invalid"}]}"#.into(),
        };
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_validation_error_type_fragment() {
        let err = SpendError::UpstreamHttp {
            status: 422,
            body: r#"{"error":"validation_error"}"#.into(),
        };
        assert!(err.is_validation_error());
    }

    #[test]
    fn test_auth_failure_is_not_validation_error() {
        let err = SpendError::UpstreamHttp {
            status: 401,
            body: r#"{"error":"unauthorized"}"#.into(),
        };
        assert!(!err.is_validation_error());
    }

    #[test]
    fn test_malformed_is_not_validation_error() {
        let err = SpendError::MalformedUpstream("HTML response, not data".into());
        assert!(!err.is_validation_error());
    }
}
