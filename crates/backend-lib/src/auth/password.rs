// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use scrypt::{
    password_hash::{
        rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher,
        PasswordVerifier, SaltString,
    },
    Params, Scrypt,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroize;

/// Derived key length stored in the PHC string
const HASH_LEN: usize = 32;

const DECOY_PASSWORD: &str = "usergate-decoy-credential";

/// Errors raised while producing a credential
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("invalid hash cost: {0}")]
    InvalidCost(String),

    #[error("hashing failed: {0}")]
    Hashing(#[from] PasswordHashError),
}

/// scrypt cost parameters.
///
/// `log_n = 15, r = 8, p = 1` keeps a single hash well under half a second on
/// commodity hardware while staying expensive for offline guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashCost {
    pub log_n: u8,
    pub r: u32,
    pub p: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            log_n: 15,
            r: 8,
            p: 1,
        }
    }
}

impl HashCost {
    pub fn params(&self) -> Result<Params, CredentialError> {
        Params::new(self.log_n, self.r, self.p, HASH_LEN)
            .map_err(|e| CredentialError::InvalidCost(e.to_string()))
    }
}

/// Hashes and checks passwords with salted scrypt.
///
/// Each hash embeds its own salt and cost, so two hashes of the same password
/// differ and must never be compared with `==`; use [`CredentialVerifier::verify`].
#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    params: Params,
    /// Hash checked when there is no stored credential, so a miss costs a full verify
    decoy: String,
}

impl CredentialVerifier {
    pub fn new(cost: HashCost) -> Result<Self, CredentialError> {
        let mut verifier = Self {
            params: cost.params()?,
            decoy: String::new(),
        };
        verifier.decoy = verifier.hash(DECOY_PASSWORD)?;
        Ok(verifier)
    }

    /// A valid hash at the configured cost that matches no real account
    pub fn decoy_hash(&self) -> &str {
        &self.decoy
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, plain: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Scrypt
            .hash_password_customized(plain.as_bytes(), None, None, self.params.clone(), &salt)?
            .to_string();
        Ok(hash)
    }

    /// Hash a password and wipe the plaintext buffer
    pub fn hash_secure(&self, plain: &mut String) -> Result<String, CredentialError> {
        let hash = self.hash(plain);
        plain.zeroize();
        hash
    }

    /// Check a password against a stored hash.
    ///
    /// The cost is read from the hash itself. A malformed hash is a mismatch,
    /// not an error.
    pub fn verify(&self, hashed: &str, plain: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hashed) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
    }
}
