//! ECDSA classical signature provider
//!
//! Baseline scheme of the benchmark. The message is first hashed with SHA-256
//! and the digest is then signed with ECDSA over the selected curve. The ECDSA
//! step applies its own SHA-256 to that digest, so the signed value is
//! `ECDSA(SHA256(SHA256(message)))`.
//!
//! Signatures are fixed-size `r || s` encodings (64 bytes), public keys are
//! uncompressed SEC1 points (65 bytes).

use crate::error::{ProviderError, Result};
use crate::traits::{
    ensure_supported, AlgorithmCatalog, KeyPair, PrivateKey, PublicKey, Signature,
    SignatureProvider,
};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Default curve (Bitcoin/Ethereum curve)
pub const DEFAULT_CURVE: &str = "secp256k1";

/// Supported named curves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    Secp256k1,
    P256,
}

impl EcCurve {
    pub const ALL: [EcCurve; 2] = [EcCurve::Secp256k1, EcCurve::P256];

    pub fn name(self) -> &'static str {
        match self {
            EcCurve::Secp256k1 => "secp256k1",
            EcCurve::P256 => "P-256",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|curve| curve.name() == name)
    }
}

// Runs `$body` with `$c` bound to the RustCrypto crate of `$curve`.
macro_rules! with_curve {
    ($curve:expr, $c:ident => $body:expr) => {
        match $curve {
            EcCurve::Secp256k1 => {
                use k256 as $c;
                $body
            }
            EcCurve::P256 => {
                use p256 as $c;
                $body
            }
        }
    };
}

/// Enabled-set query for the RustCrypto curve crates
#[derive(Debug, Clone, Copy, Default)]
pub struct RustCryptoCatalog;

impl AlgorithmCatalog for RustCryptoCatalog {
    fn supported_algorithms(&self) -> Result<Option<Vec<String>>> {
        Ok(Some(
            EcCurve::ALL
                .iter()
                .map(|curve| curve.name().to_string())
                .collect(),
        ))
    }
}

/// ECDSA signature provider
#[derive(Debug, Clone)]
pub struct EcdsaProvider {
    /// `None` only in degraded mode, when the catalog could not enumerate
    /// and the curve name is unknown to this build.
    curve: Option<EcCurve>,
    algorithm_name: String,
}

impl EcdsaProvider {
    /// Create a provider for the named curve (`secp256k1` or `P-256`)
    ///
    /// # Errors
    /// - `UnsupportedAlgorithm` if the curve is not available
    pub fn new(curve_name: &str) -> Result<Self> {
        Self::with_catalog(curve_name, &RustCryptoCatalog)
    }

    /// Create a provider, validating availability against `catalog`
    pub fn with_catalog(curve_name: &str, catalog: &dyn AlgorithmCatalog) -> Result<Self> {
        ensure_supported(catalog, curve_name)?;

        let curve = EcCurve::from_name(curve_name);
        if curve.is_none() {
            tracing::warn!(
                curve = curve_name,
                "Curve accepted without verification; operations will fail if it is missing"
            );
        }

        let algorithm_name = format!("ECDSA-{}", curve_name);
        tracing::info!(algorithm = %algorithm_name, "Created ECDSA provider");

        Ok(Self {
            curve,
            algorithm_name,
        })
    }

    pub fn curve(&self) -> Option<EcCurve> {
        self.curve
    }

    fn require_curve(&self) -> std::result::Result<EcCurve, String> {
        self.curve
            .ok_or_else(|| format!("{} is not available in this build", self.algorithm_name))
    }

    fn digest(message: &[u8]) -> Vec<u8> {
        Sha256::digest(message).to_vec()
    }

    fn try_sign(&self, message: &[u8], private_key: &PrivateKey) -> Result<Vec<u8>> {
        use k256::ecdsa::signature::Signer as _;

        let ec = self.require_curve().map_err(ProviderError::SigningError)?;
        let digest = Self::digest(message);

        with_curve!(ec, curve => {
            let signing_key = curve::ecdsa::SigningKey::from_slice(private_key.as_bytes())
                .map_err(|e| ProviderError::SigningError(format!("Invalid private key: {}", e)))?;
            let signature: curve::ecdsa::Signature = signing_key
                .try_sign(digest.as_slice())
                .map_err(|e| ProviderError::SigningError(e.to_string()))?;
            Ok(signature.to_bytes().to_vec())
        })
    }

    fn try_verify(
        &self,
        message: &[u8],
        signature: &Signature,
        public_key: &PublicKey,
    ) -> Result<bool> {
        use k256::ecdsa::signature::Verifier as _;

        let ec = self.require_curve().map_err(ProviderError::VerificationError)?;
        let digest = Self::digest(message);

        with_curve!(ec, curve => {
            let verifying_key = curve::ecdsa::VerifyingKey::from_sec1_bytes(public_key.as_bytes())
                .map_err(|e| ProviderError::VerificationError(format!("Invalid public key: {}", e)))?;
            let signature = curve::ecdsa::Signature::from_slice(signature.as_bytes())
                .map_err(|e| ProviderError::VerificationError(format!("Invalid signature: {}", e)))?;
            Ok(verifying_key.verify(digest.as_slice(), &signature).is_ok())
        })
    }
}

impl Default for EcdsaProvider {
    fn default() -> Self {
        Self {
            curve: Some(EcCurve::Secp256k1),
            algorithm_name: format!("ECDSA-{}", EcCurve::Secp256k1.name()),
        }
    }
}

impl SignatureProvider for EcdsaProvider {
    fn algorithm_name(&self) -> &str {
        &self.algorithm_name
    }

    fn generate_keypair(&self) -> Result<KeyPair> {
        let ec = self.require_curve().map_err(|e| {
            tracing::error!("ECDSA key generation failed: {}", e);
            ProviderError::KeyGenerationError(e)
        })?;

        let (secret_key, public_key) = with_curve!(ec, curve => {
            let signing_key = curve::ecdsa::SigningKey::random(&mut OsRng);
            let verifying_key = curve::ecdsa::VerifyingKey::from(&signing_key);
            (
                signing_key.to_bytes().to_vec(),
                verifying_key.to_encoded_point(false).as_bytes().to_vec(),
            )
        });

        if secret_key.is_empty() || public_key.is_empty() {
            tracing::error!("ECDSA key generation failed: backend returned an empty key");
            return Err(ProviderError::KeyGenerationError(
                "Backend returned an empty key".to_string(),
            ));
        }

        let public_key = PublicKey::from_bytes(public_key);
        tracing::debug!(
            "Generated {} keypair: pk={}..",
            self.algorithm_name,
            public_key.fingerprint()
        );

        Ok(KeyPair {
            private_key: PrivateKey::from_bytes(secret_key),
            public_key,
        })
    }

    fn sign(&self, message: &[u8], private_key: &PrivateKey) -> Result<Signature> {
        if private_key.is_empty() {
            tracing::error!("Cannot sign with an empty private key ({})", self.algorithm_name);
            return Err(ProviderError::SigningError(
                "Private key not initialized".to_string(),
            ));
        }

        self.try_sign(message, private_key)
            .map(Signature::from_bytes)
            .map_err(|e| {
                tracing::error!("Error during ECDSA signing: {}", e);
                e
            })
    }

    fn verify(&self, message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
        if signature.is_empty() {
            return false;
        }
        if public_key.is_empty() {
            tracing::error!("Cannot verify with an empty public key ({})", self.algorithm_name);
            return false;
        }

        match self.try_verify(message, signature, public_key) {
            Ok(is_valid) => is_valid,
            Err(e) => {
                tracing::error!("Error during ECDSA verification: {}", e);
                false
            }
        }
    }
}
