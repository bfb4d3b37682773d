//! Structured error types for vigil
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! None of these cross the sampler boundary: the sampler degrades to an
//! empty snapshot or an undefined reading instead of propagating.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("malformed field in {path}: {field}")]
    Malformed { path: String, field: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum CounterError {
    #[error("no aggregate cpu line in counter source")]
    MissingAggregate,

    #[error("unparseable counter line: {0}")]
    Malformed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("recommendation unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_error_display() {
        let err = CounterError::MissingAggregate;
        assert_eq!(err.to_string(), "no aggregate cpu line in counter source");
    }

    #[test]
    fn test_provider_error_names_path_and_field() {
        let err = ProviderError::Malformed { path: "/proc/42/stat".to_string(), field: "utime" };
        assert!(err.to_string().contains("/proc/42/stat"));
        assert!(err.to_string().contains("utime"));
    }
}
