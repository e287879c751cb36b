//! Password to user-seed derivation
//!
//! The firmware expects the 32-byte Argon2id hash of the user's password.
//! Salt and cost parameters are part of that contract: changing them
//! yields a different seed and therefore different keys.

use zeroize::Zeroizing;

use crate::error::ValidationError;
use crate::model::PasswordHash;

/// Shortest password accepted for seed provisioning, in bytes.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Argon2id parameters for [`derive_password_hash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedKdfParams {
    pub salt: &'static [u8],
    pub iterations: u32,
    pub memory_kib: u32,
    pub parallelism: u32,
}

impl Default for SeedKdfParams {
    fn default() -> Self {
        Self {
            salt: b"44KeyGenerateUserPasswordHash!",
            iterations: 50,
            memory_kib: 512 * 1024,
            parallelism: 4,
        }
    }
}

/// Hash `password` into the value stored as the token's user seed.
pub fn derive_password_hash(
    password: &[u8],
    params: &SeedKdfParams,
) -> Result<PasswordHash, ValidationError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }

    let argon_params = argon2::Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(32),
    )
    .map_err(|e| ValidationError::KeyDerivation {
        reason: format!("argon2 params: {e}"),
    })?;
    let argon = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon_params,
    );

    let mut hash = Zeroizing::new([0u8; 32]);
    argon
        .hash_password_into(password, params.salt, &mut hash[..])
        .map_err(|e| ValidationError::KeyDerivation {
            reason: format!("argon2: {e}"),
        })?;

    PasswordHash::from_slice(&hash[..])
}

#[cfg(test)]
pub(crate) fn test_params() -> SeedKdfParams {
    SeedKdfParams {
        iterations: 1,
        memory_kib: 64,
        parallelism: 1,
        ..SeedKdfParams::default()
    }
}
