//! Unified interface for signature providers
//!
//! Every scheme benchmarked by `sig-bench` is driven through [`SignatureProvider`].
//! Keys and signatures are carried as opaque byte containers so that the
//! harness can hold both providers as `&dyn SignatureProvider` and never needs
//! to know the concrete key types of the backing crate.

use crate::error::{ProviderError, Result};
use std::fmt;
use zeroize::Zeroize;

/// Private key bytes
///
/// # Security Warning
/// The `Debug` implementation never prints key material and the bytes are
/// zeroized when the key is dropped.
#[derive(Clone, Default)]
pub struct PrivateKey(Vec<u8>);

impl PrivateKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// An empty key stands for "not initialized".
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey([REDACTED; {} bytes])", self.0.len())
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Public key bytes (encoding is provider specific)
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Short hex prefix, safe for logs
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.0[..self.0.len().min(8)])
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({}.., {} bytes)", self.fingerprint(), self.0.len())
    }
}

/// Detached signature bytes
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Signature(Vec<u8>);

impl Signature {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({} bytes)", self.0.len())
    }
}

/// A freshly generated key pair
///
/// Both halves are always populated: providers return `Err` instead of a
/// partially filled pair.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
}

/// Signature provider trait
pub trait SignatureProvider {
    /// Exact algorithm identifier, e.g. `Dilithium3` or `ECDSA-secp256k1`
    fn algorithm_name(&self) -> &str;

    /// Generate a new key pair
    fn generate_keypair(&self) -> Result<KeyPair>;

    /// Sign message
    ///
    /// # Errors
    /// - `SigningError` if the private key is empty, malformed, or the backend fails
    fn sign(&self, message: &[u8], private_key: &PrivateKey) -> Result<Signature>;

    /// Verify signature
    ///
    /// Returns `false` for empty inputs, malformed keys or signatures, invalid
    /// signatures and backend failures. Never returns an error.
    fn verify(&self, message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool;

    /// Sign a text message (UTF-8 encoded before signing)
    fn sign_text(&self, message: &str, private_key: &PrivateKey) -> Result<Signature> {
        self.sign(message.as_bytes(), private_key)
    }

    /// Verify a text message (UTF-8 encoded before verification)
    fn verify_text(&self, message: &str, signature: &Signature, public_key: &PublicKey) -> bool {
        self.verify(message.as_bytes(), signature, public_key)
    }
}

/// Capability query of a signature backend
pub trait AlgorithmCatalog {
    /// Enabled algorithm identifiers
    ///
    /// # Returns
    /// - `Ok(Some(list))`: the backend enumerated its enabled set
    /// - `Ok(None)`: the backend cannot enumerate its algorithms
    /// - `Err`: the query itself failed
    fn supported_algorithms(&self) -> Result<Option<Vec<String>>>;
}

/// Check that `requested` is available from `catalog`
///
/// An unavailable enabled-set query only produces a warning: the first real
/// operation will surface any incompatibility.
pub fn ensure_supported(catalog: &dyn AlgorithmCatalog, requested: &str) -> Result<()> {
    match catalog.supported_algorithms()? {
        Some(supported) if supported.iter().any(|name| name == requested) => {
            tracing::debug!(algorithm = requested, "Algorithm is enabled in backend");
            Ok(())
        }
        Some(supported) => {
            tracing::error!(
                algorithm = requested,
                supported = ?supported,
                "Requested algorithm is not enabled in this build"
            );
            Err(ProviderError::UnsupportedAlgorithm {
                requested: requested.to_string(),
                supported,
            })
        }
        None => {
            tracing::warn!(
                algorithm = requested,
                "Could not verify supported algorithms, proceeding with caution"
            );
            Ok(())
        }
    }
}
