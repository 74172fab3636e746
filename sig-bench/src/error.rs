//! Unified error type of the benchmark harness
//!
//! Only configuration, provider availability and I/O problems surface as
//! errors. Per-trial cryptographic failures are absorbed by the trial loop
//! and never reach this type.

use thiserror::Error;

/// Benchmark harness error type
#[derive(Error, Debug)]
pub enum BenchError {
    /// Configuration error
    ///
    /// Returned when the configuration file is malformed or a value is out of range
    #[error("Configuration error: {0}")]
    Config(String),

    /// Signature provider error
    ///
    /// Construction-time availability failures are fatal for the run
    #[error("Signature provider error: {0}")]
    Provider(#[from] sig_provider::ProviderError),

    /// Serialization error (JSON report)
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Chart rendering error
    #[error("Chart rendering error: {0}")]
    Chart(String),

    /// I/O error
    ///
    /// Reading the message file or writing result artifacts failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    /// Whether the error happened before any measurement could start
    pub fn is_startup_failure(&self) -> bool {
        match self {
            BenchError::Config(_) => true,
            BenchError::Provider(e) => e.is_fatal(),
            _ => false,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, BenchError>;

impl From<serde_json::Error> for BenchError {
    fn from(err: serde_json::Error) -> Self {
        BenchError::Serialization(err.to_string())
    }
}

impl From<std::fmt::Error> for BenchError {
    fn from(err: std::fmt::Error) -> Self {
        BenchError::Chart(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sig_provider::ProviderError;

    #[test]
    fn test_startup_failures() {
        assert!(BenchError::Config("num_runs must be greater than 0".into()).is_startup_failure());

        let unsupported = ProviderError::UnsupportedAlgorithm {
            requested: "Dilithium4".into(),
            supported: vec!["Dilithium3".into()],
        };
        assert!(BenchError::from(unsupported).is_startup_failure());

        let signing = ProviderError::SigningError("bad key".into());
        assert!(!BenchError::from(signing).is_startup_failure());

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "message.txt");
        assert!(!BenchError::from(io).is_startup_failure());
    }

    #[test]
    fn test_conversions() {
        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(BenchError::from(json), BenchError::Serialization(_)));
        assert!(matches!(BenchError::from(std::fmt::Error), BenchError::Chart(_)));
    }
}
