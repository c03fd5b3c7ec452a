//! FAM core error types.

/// Core error type for FAM.
#[derive(Debug, thiserror::Error)]
pub enum FamError {
    /// Expected time could not be parsed as HH:MM.
    #[error("invalid expected time '{value}': {message}")]
    InvalidTime { value: String, message: String },

    /// Weekday name in an exclusion list could not be parsed.
    #[error("invalid weekday '{value}'")]
    InvalidWeekday { value: String },

    /// Expected-file spec is malformed (empty pattern, zero occurrences).
    #[error("invalid expected-file spec '{pattern}': {message}")]
    InvalidSpec { pattern: String, message: String },

    /// Catalog is unreadable or malformed. Fatal at startup.
    #[error("catalog error: {message}")]
    Catalog { message: String },
}

impl FamError {
    /// Create an "invalid time" error.
    pub fn invalid_time(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidTime {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create an "invalid weekday" error.
    pub fn invalid_weekday(value: impl Into<String>) -> Self {
        Self::InvalidWeekday {
            value: value.into(),
        }
    }

    /// Create an "invalid spec" error.
    pub fn invalid_spec(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSpec {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create a "catalog" error.
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }
}
