//! Argon2id password hashes in PHC string form

use argon2::{
    password_hash::{
        rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher,
        PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use store_object::StoreError;

/// Hashes new passwords and checks submitted ones
///
/// Verification reads the cost parameters back out of the stored hash, so
/// changing the cost only affects passwords hashed afterwards.
#[derive(Debug, Clone, Default)]
pub struct PasswordHashing {
    params: Params,
}

impl PasswordHashing {
    /// Custom memory (KiB) and iteration cost
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, StoreError> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| StoreError::invalid_configuration(format!("argon2 parameters: {}", e)))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &str) -> Result<String, StoreError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| StoreError::storage("users", "hash_password", e.to_string()))
    }

    /// `Ok(false)` for a wrong password; `Err` only when `stored` is not a valid hash
    pub fn verify(&self, password: &str, stored: &str) -> Result<bool, StoreError> {
        let parsed = PasswordHash::new(stored)
            .map_err(|e| StoreError::storage("users", "verify_password", e.to_string()))?;
        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(e) => Err(StoreError::storage("users", "verify_password", e.to_string())),
        }
    }
}
