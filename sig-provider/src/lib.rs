//! Signature providers for the ECDSA vs Dilithium benchmark
//!
//! Provides one classical scheme (ECDSA over secp256k1 or P-256) and one
//! post-quantum scheme (Dilithium, NIST levels 2, 3 and 5) behind the same
//! [`SignatureProvider`] interface. Each provider checks at construction time
//! that its requested algorithm is enabled in the backing crate.
//!
//! # Quick Start
//!
//! ```rust
//! use sig_provider::{DilithiumProvider, EcdsaProvider, SignatureProvider};
//!
//! let providers: Vec<Box<dyn SignatureProvider>> = vec![
//!     Box::new(EcdsaProvider::new("secp256k1").unwrap()),
//!     Box::new(DilithiumProvider::new(3).unwrap()),
//! ];
//!
//! let message = b"Benchmark payload";
//! for provider in &providers {
//!     let keys = provider.generate_keypair().unwrap();
//!     let signature = provider.sign(message, &keys.private_key).unwrap();
//!     assert!(provider.verify(message, &signature, &keys.public_key));
//! }
//! ```

pub mod dilithium;
pub mod ecdsa;
pub mod error;
pub mod traits;

// Re-export commonly used types
pub use dilithium::DilithiumProvider;
pub use ecdsa::EcdsaProvider;
pub use error::{ProviderError, Result};
pub use traits::{AlgorithmCatalog, KeyPair, PrivateKey, PublicKey, Signature, SignatureProvider};
