use thiserror::Error;

/// Errors related to the price feed and the bars it returns
#[derive(Debug, Clone, Error, PartialEq)]
pub enum MarketDataError {
    #[error("Connection lost: {reason}")]
    ConnectionLost { reason: String },

    #[error("Service timeout after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("Rate limit exceeded: retry after {retry_after_secs}s")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("Feed returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Malformed bar: missing field '{field}'")]
    MalformedBar { field: &'static str },

    #[error("Invalid bar at {timestamp}: {reason}")]
    InvalidBar { timestamp: i64, reason: String },

    #[error("Malformed feed response: {reason}")]
    MalformedResponse { reason: String },

    #[error("Feed still failing after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl MarketDataError {
    /// Whether the distributor should schedule another attempt after this error.
    ///
    /// Malformed data is retried like a network failure: the next poll may well
    /// return a complete bar.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, MarketDataError::RetriesExhausted { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            MarketDataError::MalformedBar { .. }
                | MarketDataError::InvalidBar { .. }
                | MarketDataError::MalformedResponse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_errors_are_retryable() {
        let err = MarketDataError::MalformedBar { field: "h" };
        assert!(err.is_malformed());
        assert!(err.is_retryable());
        assert!(err.to_string().contains("'h'"));
    }

    #[test]
    fn test_exhausted_is_terminal() {
        let err = MarketDataError::RetriesExhausted {
            attempts: 3,
            last_error: "Service timeout after 10000ms".to_string(),
        };
        assert!(!err.is_retryable());
        assert!(!err.is_malformed());

        let msg = err.to_string();
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("10000ms"));
    }
}
