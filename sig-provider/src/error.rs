/// Error type definitions
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Signing failed: {0}")]
    SigningError(String),

    #[error("Verification failed: {0}")]
    VerificationError(String),

    #[error("Key generation failed: {0}")]
    KeyGenerationError(String),

    /// The backend reported its enabled set and the requested identifier is not in it.
    #[error("Unsupported algorithm: {requested} (supported: {})", supported.join(", "))]
    UnsupportedAlgorithm {
        requested: String,
        supported: Vec<String>,
    },

    /// The capability query itself failed.
    #[error("Algorithm capability query failed: {0}")]
    CapabilityQuery(String),
}

impl ProviderError {
    /// Whether this error must abort the process before any measurement starts.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProviderError::UnsupportedAlgorithm { .. } | ProviderError::CapabilityQuery(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
