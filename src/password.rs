//! Salted PBKDF2-SHA256 password hashing for admin credentials.

use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use rand_core::OsRng;
use tokio::task;

use crate::err::Error;

/// Work factor comparable to bcrypt cost 10.
pub const DEFAULT_ROUNDS: u32 = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hasher {
    rounds: u32,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new(DEFAULT_ROUNDS)
    }
}

impl Hasher {
    pub const fn new(rounds: u32) -> Self {
        Self { rounds }
    }

    /// Produces a PHC string; the rounds and salt travel inside it.
    pub fn hash_blocking(&self, plaintext: &str) -> Result<String, Error> {
        let salt = SaltString::generate(&mut OsRng);
        let params = Params {
            rounds: self.rounds,
            output_length: 32,
        };
        let hash = Pbkdf2.hash_password_customized(plaintext.as_bytes(), None, None, params, &salt)?;
        Ok(hash.to_string())
    }

    /// A digest that does not parse counts as a mismatch.
    pub fn verify_blocking(&self, plaintext: &str, digest: &str) -> bool {
        let hash = match PasswordHash::new(digest) {
            Ok(hash) => hash,
            Err(_) => return false,
        };
        Pbkdf2.verify_password(plaintext.as_bytes(), &hash).is_ok()
    }

    pub async fn hash(&self, plaintext: &str) -> Result<String, Error> {
        let hasher = *self;
        let plaintext = plaintext.to_owned();
        task::spawn_blocking(move || hasher.hash_blocking(&plaintext)).await?
    }

    pub async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, Error> {
        let hasher = *self;
        let plaintext = plaintext.to_owned();
        let digest = digest.to_owned();
        Ok(task::spawn_blocking(move || hasher.verify_blocking(&plaintext, &digest)).await?)
    }
}
