//! Signature provider integration tests

use sig_provider::dilithium::DilithiumVariant;
use sig_provider::ecdsa::EcCurve;
use sig_provider::{
    AlgorithmCatalog, DilithiumProvider, EcdsaProvider, ProviderError, PublicKey, Signature,
    SignatureProvider,
};

fn all_providers() -> Vec<Box<dyn SignatureProvider>> {
    let mut providers: Vec<Box<dyn SignatureProvider>> = Vec::new();
    for curve in EcCurve::ALL {
        providers.push(Box::new(EcdsaProvider::new(curve.name()).unwrap()));
    }
    for variant in DilithiumVariant::ALL {
        providers.push(Box::new(DilithiumProvider::new(variant.nist_level()).unwrap()));
    }
    providers
}

#[test]
fn test_full_sign_verify_workflow() {
    let message = br#"{"num_runs": 100, "message_size": 4096}"#;

    for provider in all_providers() {
        let keys = provider.generate_keypair().unwrap();
        let signature = provider.sign(message, &keys.private_key).unwrap();

        assert!(
            provider.verify(message, &signature, &keys.public_key),
            "{} should verify its own signature",
            provider.algorithm_name()
        );
    }
}

#[test]
fn test_single_byte_message_tamper_is_detected() {
    let message = b"The quick brown fox jumps over the lazy dog".to_vec();

    for provider in all_providers() {
        let keys = provider.generate_keypair().unwrap();
        let signature = provider.sign(&message, &keys.private_key).unwrap();

        for index in [0, message.len() / 2, message.len() - 1] {
            let mut tampered = message.clone();
            tampered[index] ^= 0x01;
            assert!(
                !provider.verify(&tampered, &signature, &keys.public_key),
                "{}: tampered message byte {} accepted",
                provider.algorithm_name(),
                index
            );
        }
    }
}

#[test]
fn test_single_byte_signature_tamper_is_detected() {
    let message = b"signature tamper test";

    for provider in all_providers() {
        let keys = provider.generate_keypair().unwrap();
        let signature = provider.sign(message, &keys.private_key).unwrap();

        for index in [0, signature.len() / 2, signature.len() - 1] {
            let mut bytes = signature.as_bytes().to_vec();
            bytes[index] ^= 0x01;
            let tampered = Signature::from_bytes(bytes);
            assert!(
                !provider.verify(message, &tampered, &keys.public_key),
                "{}: tampered signature byte {} accepted",
                provider.algorithm_name(),
                index
            );
        }
    }
}

#[test]
fn test_single_byte_public_key_tamper_is_detected() {
    let message = b"public key tamper test";

    for provider in all_providers() {
        let keys = provider.generate_keypair().unwrap();
        let signature = provider.sign(message, &keys.private_key).unwrap();

        for index in [1, keys.public_key.len() / 2, keys.public_key.len() - 1] {
            let mut bytes = keys.public_key.as_bytes().to_vec();
            bytes[index] ^= 0x01;
            let tampered = PublicKey::from_bytes(bytes);
            assert!(
                !provider.verify(message, &signature, &tampered),
                "{}: tampered public key byte {} accepted",
                provider.algorithm_name(),
                index
            );
        }
    }
}

#[test]
fn test_fresh_keypairs_differ() {
    for provider in all_providers() {
        let first = provider.generate_keypair().unwrap();
        let second = provider.generate_keypair().unwrap();

        assert_ne!(first.public_key, second.public_key);
        assert_ne!(first.private_key.as_bytes(), second.private_key.as_bytes());
    }
}

#[test]
fn test_cross_key_verification_fails() {
    let message = b"cross key";

    for provider in all_providers() {
        let signer = provider.generate_keypair().unwrap();
        let other = provider.generate_keypair().unwrap();
        let signature = provider.sign(message, &signer.private_key).unwrap();

        assert!(!provider.verify(message, &signature, &other.public_key));
    }
}

#[test]
fn test_multiple_messages() {
    let long_message = "Very long message ".repeat(1000);
    let messages = vec![
        b"Message 1".as_slice(),
        b"".as_slice(),
        long_message.as_bytes(),
    ];

    for provider in all_providers() {
        let keys = provider.generate_keypair().unwrap();
        for (i, message) in messages.iter().enumerate() {
            let signature = provider.sign(message, &keys.private_key).unwrap();
            assert!(
                provider.verify(message, &signature, &keys.public_key),
                "{}: message {} should verify",
                provider.algorithm_name(),
                i
            );
        }
    }
}

#[test]
fn test_verify_never_errors_on_garbage() {
    let message = b"garbage";

    for provider in all_providers() {
        let garbage_sig = Signature::from_bytes(vec![0xFF; 7]);
        let garbage_pk = PublicKey::from_bytes(vec![0x42; 3]);
        assert!(!provider.verify(message, &garbage_sig, &garbage_pk));
    }
}

#[test]
fn test_capability_query_failure_is_fatal() {
    struct Unreachable;

    impl AlgorithmCatalog for Unreachable {
        fn supported_algorithms(&self) -> sig_provider::Result<Option<Vec<String>>> {
            Err(ProviderError::CapabilityQuery(
                "shared library not found".to_string(),
            ))
        }
    }

    let dilithium = DilithiumProvider::with_catalog(3, &Unreachable).unwrap_err();
    assert!(dilithium.is_fatal());

    let ecdsa = EcdsaProvider::with_catalog("secp256k1", &Unreachable).unwrap_err();
    assert!(ecdsa.is_fatal());
}

#[test]
fn test_restricted_catalog_rejects_default_level() {
    struct OnlyLevelTwo;

    impl AlgorithmCatalog for OnlyLevelTwo {
        fn supported_algorithms(&self) -> sig_provider::Result<Option<Vec<String>>> {
            Ok(Some(vec!["Dilithium2".to_string()]))
        }
    }

    let err = DilithiumProvider::with_catalog(3, &OnlyLevelTwo).unwrap_err();
    assert!(err.to_string().contains("Dilithium3"));
    assert!(err.to_string().contains("Dilithium2"));
}
