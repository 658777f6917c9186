use thiserror::Error;

/// Error type for the analytics core
#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Record store unavailable for '{collection}': {reason}")]
    StoreUnavailable { collection: String, reason: String },

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Aggregation failed: {0}")]
    AggregationFailed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AnalyticsError {
    /// Create a store unavailable error for a collection
    pub fn store_unavailable<C: Into<String>, S: Into<String>>(collection: C, reason: S) -> Self {
        Self::StoreUnavailable {
            collection: collection.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid timeframe error
    pub fn invalid_timeframe<S: Into<String>>(name: S) -> Self {
        Self::InvalidTimeframe(name.into())
    }

    /// Create an aggregation failure
    pub fn aggregation_failed<S: Into<String>>(msg: S) -> Self {
        Self::AggregationFailed(msg.into())
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Check if this error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. } | Self::Io(_))
    }

    /// Get user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            Self::StoreUnavailable { collection, .. } => {
                format!(
                    "Analytics data unavailable: could not reach the '{}' collection. Check your connection and try again.",
                    collection
                )
            }
            Self::InvalidTimeframe(name) => {
                format!(
                    "Unknown timeframe '{}'. Use one of: week, month, quarter, year.",
                    name
                )
            }
            Self::AggregationFailed(_) => {
                "Analytics data unavailable: some records could not be aggregated.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Convenient result type for the analytics core
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Trait for converting errors to user-friendly messages
pub trait UserFriendlyError {
    fn user_message(&self) -> String;
}

impl UserFriendlyError for AnalyticsError {
    fn user_message(&self) -> String {
        self.user_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_creation_helpers() {
        match AnalyticsError::store_unavailable("logs", "connection refused") {
            AnalyticsError::StoreUnavailable { collection, reason } => {
                assert_eq!(collection, "logs");
                assert_eq!(reason, "connection refused");
            }
            _ => panic!("Expected StoreUnavailable error"),
        }

        match AnalyticsError::invalid_timeframe("fortnight") {
            AnalyticsError::InvalidTimeframe(name) => assert_eq!(name, "fortnight"),
            _ => panic!("Expected InvalidTimeframe error"),
        }

        match AnalyticsError::aggregation_failed("amount is NaN") {
            AnalyticsError::AggregationFailed(msg) => assert_eq!(msg, "amount is NaN"),
            _ => panic!("Expected AggregationFailed error"),
        }

        match AnalyticsError::configuration("ttl must be positive") {
            AnalyticsError::Configuration(msg) => assert_eq!(msg, "ttl must be positive"),
            _ => panic!("Expected Configuration error"),
        }
    }

    #[test]
    fn test_error_retry_logic() {
        assert!(AnalyticsError::store_unavailable("users", "timeout").is_retryable());
        assert!(
            AnalyticsError::Io(io::Error::new(io::ErrorKind::TimedOut, "slow disk")).is_retryable()
        );

        assert!(!AnalyticsError::invalid_timeframe("decade").is_retryable());
        assert!(!AnalyticsError::aggregation_failed("bad amount").is_retryable());
        assert!(!AnalyticsError::configuration("bad").is_retryable());
    }

    #[test]
    fn test_user_friendly_error_messages() {
        let message = AnalyticsError::store_unavailable("events", "offline").user_message();
        assert!(message.contains("data unavailable"));
        assert!(message.contains("events"));

        let message = AnalyticsError::invalid_timeframe("decade").user_message();
        assert!(message.contains("decade"));
        assert!(message.contains("week, month, quarter, year"));

        let message = AnalyticsError::aggregation_failed("NaN amount").user_message();
        assert!(message.contains("data unavailable"));

        // Generic error should fall back to Display
        let message = AnalyticsError::configuration("Invalid config").user_message();
        assert_eq!(message, "Configuration error: Invalid config");
    }

    #[test]
    fn test_error_type_conversions() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error: AnalyticsError = io_error.into();
        assert!(matches!(error, AnalyticsError::Io(_)));

        let json_error = serde_json::from_str::<i32>("invalid json").unwrap_err();
        let error: AnalyticsError = json_error.into();
        assert!(matches!(error, AnalyticsError::Serialization(_)));
    }

    #[test]
    fn test_error_display_messages() {
        let errors = vec![
            (
                AnalyticsError::store_unavailable("logs", "refused"),
                "Record store unavailable for 'logs': refused",
            ),
            (
                AnalyticsError::InvalidTimeframe("decade".to_string()),
                "Invalid timeframe: decade",
            ),
            (
                AnalyticsError::AggregationFailed("bad".to_string()),
                "Aggregation failed: bad",
            ),
            (
                AnalyticsError::Configuration("Config error".to_string()),
                "Configuration error: Config error",
            ),
        ];

        for (error, expected_message) in errors {
            assert_eq!(error.to_string(), expected_message);
        }
    }

    #[test]
    fn test_user_friendly_error_trait() {
        let error = AnalyticsError::invalid_timeframe("century");
        let user_friendly: &dyn UserFriendlyError = &error;
        assert_eq!(error.user_message(), user_friendly.user_message());
    }
}
