//! Dilithium post-quantum signature provider
//!
//! # About Dilithium
//!
//! Dilithium is the lattice-based digital signature scheme selected in the NIST
//! post-quantum cryptography standardization competition (FIPS 204). Its
//! security rests on the Module-LWE and Module-SIS problems.
//!
//! | Algorithm | NIST Level | Public Key Size | Signature Size |
//! |-----------|------------|-----------------|----------------|
//! | Dilithium2 | 2 | 1,312 bytes | ~2,420 bytes |
//! | **Dilithium3** | **3** | **1,952 bytes** | **~3,300 bytes** |
//! | Dilithium5 | 5 | 2,592 bytes | ~4,600 bytes |
//!
//! Level 3 is the default benchmark target. The message is signed directly,
//! there is no pre-hashing step on this side (unlike ECDSA).

use crate::error::{ProviderError, Result};
use crate::traits::{
    ensure_supported, AlgorithmCatalog, KeyPair, PrivateKey, PublicKey, Signature,
    SignatureProvider,
};
use pqcrypto_dilithium::{dilithium2, dilithium3, dilithium5};
use pqcrypto_traits::sign::{DetachedSignature as _, PublicKey as _, SecretKey as _};

/// Default NIST security level
pub const DEFAULT_SECURITY_LEVEL: u8 = 3;

/// Parameter sets compiled into `pqcrypto-dilithium`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DilithiumVariant {
    Dilithium2,
    Dilithium3,
    Dilithium5,
}

impl DilithiumVariant {
    pub const ALL: [DilithiumVariant; 3] = [
        DilithiumVariant::Dilithium2,
        DilithiumVariant::Dilithium3,
        DilithiumVariant::Dilithium5,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DilithiumVariant::Dilithium2 => "Dilithium2",
            DilithiumVariant::Dilithium3 => "Dilithium3",
            DilithiumVariant::Dilithium5 => "Dilithium5",
        }
    }

    pub fn nist_level(self) -> u8 {
        match self {
            DilithiumVariant::Dilithium2 => 2,
            DilithiumVariant::Dilithium3 => 3,
            DilithiumVariant::Dilithium5 => 5,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|variant| variant.name() == name)
    }
}

// Runs `$body` with `$m` bound to the pqcrypto module of `$variant`.
macro_rules! with_params {
    ($variant:expr, $m:ident => $body:expr) => {
        match $variant {
            DilithiumVariant::Dilithium2 => {
                use dilithium2 as $m;
                $body
            }
            DilithiumVariant::Dilithium3 => {
                use dilithium3 as $m;
                $body
            }
            DilithiumVariant::Dilithium5 => {
                use dilithium5 as $m;
                $body
            }
        }
    };
}

/// Enabled-set query for the `pqcrypto-dilithium` backend
#[derive(Debug, Clone, Copy, Default)]
pub struct PqcryptoCatalog;

impl AlgorithmCatalog for PqcryptoCatalog {
    fn supported_algorithms(&self) -> Result<Option<Vec<String>>> {
        Ok(Some(
            DilithiumVariant::ALL
                .iter()
                .map(|variant| variant.name().to_string())
                .collect(),
        ))
    }
}

/// Dilithium signature provider
///
/// # Example
///
/// ```rust
/// use sig_provider::dilithium::DilithiumProvider;
/// use sig_provider::traits::SignatureProvider;
///
/// let provider = DilithiumProvider::new(3).unwrap();
/// let keys = provider.generate_keypair().unwrap();
///
/// let message = b"benchmark message";
/// let signature = provider.sign(message, &keys.private_key).unwrap();
/// assert!(provider.verify(message, &signature, &keys.public_key));
/// ```
#[derive(Debug, Clone)]
pub struct DilithiumProvider {
    algorithm_name: String,
    /// `None` only in degraded mode, when the catalog could not enumerate
    /// and the identifier is unknown to this build.
    variant: Option<DilithiumVariant>,
}

impl DilithiumProvider {
    /// Create a provider for `Dilithium{security_level}`
    ///
    /// # Errors
    /// - `UnsupportedAlgorithm` if the level is not enabled in the backend
    pub fn new(security_level: u8) -> Result<Self> {
        Self::with_catalog(security_level, &PqcryptoCatalog)
    }

    /// Create a provider, validating availability against `catalog`
    pub fn with_catalog(security_level: u8, catalog: &dyn AlgorithmCatalog) -> Result<Self> {
        let algorithm_name = format!("Dilithium{}", security_level);
        ensure_supported(catalog, &algorithm_name)?;

        let variant = DilithiumVariant::from_name(&algorithm_name);
        if variant.is_none() {
            tracing::warn!(
                algorithm = %algorithm_name,
                "Algorithm accepted without verification; operations will fail if it is missing"
            );
        }

        tracing::info!(algorithm = %algorithm_name, "Created Dilithium provider");

        Ok(Self {
            algorithm_name,
            variant,
        })
    }

    pub fn variant(&self) -> Option<DilithiumVariant> {
        self.variant
    }

    fn require_variant(&self) -> std::result::Result<DilithiumVariant, String> {
        self.variant
            .ok_or_else(|| format!("{} is not available in this build", self.algorithm_name))
    }

    /// Return algorithm information
    pub fn algorithm_info(variant: DilithiumVariant) -> AlgorithmInfo {
        with_params!(variant, params => AlgorithmInfo {
            name: variant.name(),
            nist_level: variant.nist_level(),
            public_key_size: params::public_key_bytes(),
            secret_key_size: params::secret_key_bytes(),
            signature_size: params::signature_bytes(),
        })
    }

    fn try_verify(
        &self,
        message: &[u8],
        signature: &Signature,
        public_key: &PublicKey,
    ) -> Result<bool> {
        let variant = self.require_variant().map_err(ProviderError::VerificationError)?;

        with_params!(variant, params => {
            let pk = params::PublicKey::from_bytes(public_key.as_bytes()).map_err(|e| {
                ProviderError::VerificationError(format!("Failed to parse public key: {:?}", e))
            })?;
            let sig = params::DetachedSignature::from_bytes(signature.as_bytes()).map_err(|e| {
                ProviderError::VerificationError(format!("Failed to parse signature: {:?}", e))
            })?;

            Ok(params::verify_detached_signature(&sig, message, &pk).is_ok())
        })
    }
}

impl SignatureProvider for DilithiumProvider {
    fn algorithm_name(&self) -> &str {
        &self.algorithm_name
    }

    /// Generate new Dilithium keypair
    ///
    /// # Errors
    /// - Returns `KeyGenerationError` if the backend returns keys of the wrong size
    fn generate_keypair(&self) -> Result<KeyPair> {
        let variant = self.require_variant().map_err(|e| {
            tracing::error!("Dilithium key generation failed: {}", e);
            ProviderError::KeyGenerationError(e)
        })?;

        let (public_key, secret_key, expected_pk, expected_sk) = with_params!(variant, params => {
            let (pk, sk) = params::keypair();
            (
                pk.as_bytes().to_vec(),
                sk.as_bytes().to_vec(),
                params::public_key_bytes(),
                params::secret_key_bytes(),
            )
        });

        if public_key.len() != expected_pk || secret_key.len() != expected_sk {
            let msg = format!(
                "{} backend returned pk_len={}, sk_len={} (expected {}, {})",
                self.algorithm_name,
                public_key.len(),
                secret_key.len(),
                expected_pk,
                expected_sk
            );
            tracing::error!("Dilithium key generation failed: {}", msg);
            return Err(ProviderError::KeyGenerationError(msg));
        }

        tracing::debug!(
            "Generated {} keypair: pk_len={} bytes, sk_len={} bytes",
            self.algorithm_name,
            public_key.len(),
            secret_key.len()
        );

        Ok(KeyPair {
            private_key: PrivateKey::from_bytes(secret_key),
            public_key: PublicKey::from_bytes(public_key),
        })
    }

    /// Sign message with Dilithium (detached signature)
    ///
    /// # Errors
    /// - Returns `SigningError` if the private key is empty or cannot be parsed
    fn sign(&self, message: &[u8], private_key: &PrivateKey) -> Result<Signature> {
        if private_key.is_empty() {
            tracing::error!("Cannot sign with an empty private key ({})", self.algorithm_name);
            return Err(ProviderError::SigningError(
                "Secret key not initialized. Call generate_keypair() first.".to_string(),
            ));
        }

        let variant = self.require_variant().map_err(ProviderError::SigningError)?;

        let signature = with_params!(variant, params => {
            let sk = params::SecretKey::from_bytes(private_key.as_bytes()).map_err(|e| {
                tracing::error!("Error during Dilithium signing: {:?}", e);
                ProviderError::SigningError(format!("Failed to parse secret key: {:?}", e))
            })?;
            params::detached_sign(message, &sk).as_bytes().to_vec()
        });

        tracing::trace!(
            "Signed message: msg_len={} bytes, sig_len={} bytes",
            message.len(),
            signature.len()
        );

        Ok(Signature::from_bytes(signature))
    }

    /// Verify Dilithium signature
    ///
    /// Only requires the public key. Any parsing or backend failure is
    /// reported as an invalid signature.
    fn verify(&self, message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
        if signature.is_empty() {
            return false;
        }
        if public_key.is_empty() {
            tracing::error!("Cannot verify with an empty public key ({})", self.algorithm_name);
            return false;
        }

        match self.try_verify(message, signature, public_key) {
            Ok(is_valid) => {
                tracing::trace!("Signature verification: valid={}", is_valid);
                is_valid
            }
            Err(e) => {
                tracing::error!("Error during Dilithium verification: {}", e);
                false
            }
        }
    }
}

/// Algorithm information structure
#[derive(Debug, Clone, Copy)]
pub struct AlgorithmInfo {
    /// Algorithm name
    pub name: &'static str,
    /// NIST security level
    pub nist_level: u8,
    /// Public key size (bytes)
    pub public_key_size: usize,
    /// Secret key size (bytes)
    pub secret_key_size: usize,
    /// Signature size (bytes)
    pub signature_size: usize,
}
