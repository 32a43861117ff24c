// ============================
// tests/unit/password_tests.rs
// ============================
//! Credential hashing through the public API
use backend_lib::auth::{CredentialVerifier, HashCost};

fn verifier() -> CredentialVerifier {
    CredentialVerifier::new(HashCost { log_n: 4, r: 8, p: 1 }).unwrap()
}

#[test]
fn test_password_hashing_and_verification() {
    let verifier = verifier();
    let password = "SecureP@ssw0rd";
    let hash = verifier.hash(password).unwrap();

    assert_ne!(password, hash);
    assert!(hash.starts_with("$scrypt$"));
    assert!(verifier.verify(&hash, password));
    assert!(!verifier.verify(&hash, "SecureP@ssw0rD"));
}

#[test]
fn test_hashes_are_salted() {
    let verifier = verifier();
    let first = verifier.hash("password").unwrap();
    let second = verifier.hash("password").unwrap();

    assert_ne!(first, second);
    assert!(verifier.verify(&first, "password"));
    assert!(verifier.verify(&second, "password"));
}

#[test]
fn test_hash_secure_wipes_plaintext() {
    let verifier = verifier();
    let mut plain = "wipe-me".to_string();
    let hash = verifier.hash_secure(&mut plain).unwrap();

    assert!(plain.is_empty());
    assert!(verifier.verify(&hash, "wipe-me"));
}

#[test]
fn test_verify_rejects_garbage_hash() {
    let verifier = verifier();
    assert!(!verifier.verify("", "password"));
    assert!(!verifier.verify("plaintext-password", "plaintext-password"));
}

#[test]
fn test_hash_from_other_cost_still_verifies() {
    let cheap = verifier();
    let other = CredentialVerifier::new(HashCost { log_n: 5, r: 8, p: 1 }).unwrap();
    let hash = other.hash("password").unwrap();

    assert!(cheap.verify(&hash, "password"));
}
