use std::fmt;

use ed25519_dalek::{Signature, VerifyingKey};
use ssh_key::public::{Ed25519PublicKey as SshEd25519PublicKey, KeyData};
use ssh_key::PublicKey;
use thiserror::Error;
use zeroize::Zeroize;

use crate::error::ValidationError;

fn fixed<const N: usize>(what: &'static str, bytes: &[u8]) -> Result<[u8; N], ValidationError> {
    bytes.try_into().map_err(|_| ValidationError::InvalidLength {
        what,
        expected: N,
        actual: bytes.len(),
    })
}

/// Raw ed25519 public key as reported by the token.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519PublicKey([u8; 32]);

impl Ed25519PublicKey {
    pub const LENGTH: usize = 32;

    pub fn from_slice(key: &[u8]) -> Result<Self, ValidationError> {
        Ok(Self(fixed("public key", key)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check the bytes form a valid curve point.
    pub fn to_verifying_key(&self) -> Result<VerifyingKey, KeyMaterialError> {
        VerifyingKey::from_bytes(&self.0).map_err(|e| KeyMaterialError::InvalidPoint {
            reason: e.to_string(),
        })
    }

    pub fn to_key_data(&self) -> KeyData {
        KeyData::Ed25519(SshEd25519PublicKey(self.0))
    }

    /// `authorized_keys` line for this key.
    pub fn to_openssh(&self, comment: &str) -> Result<String, KeyMaterialError> {
        PublicKey::new(self.to_key_data(), comment)
            .to_openssh()
            .map_err(|e| KeyMaterialError::Encoding {
                reason: e.to_string(),
            })
    }
}

impl fmt::Debug for Ed25519PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0[..8]))
    }
}

impl From<VerifyingKey> for Ed25519PublicKey {
    fn from(key: VerifyingKey) -> Self {
        Self(*key.as_bytes())
    }
}

/// ed25519 signature produced on the token.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Ed25519Signature([u8; 64]);

impl Ed25519Signature {
    pub const LENGTH: usize = 64;

    pub fn from_slice(sig: &[u8]) -> Result<Self, ValidationError> {
        Ok(Self(fixed("signature", sig)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_dalek(&self) -> Signature {
        Signature::from_bytes(&self.0)
    }
}

impl fmt::Debug for Ed25519Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.0[..8]))
    }
}

/// 32 bytes of entropy used to reformat the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Entropy([u8; 32]);

impl Entropy {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        Ok(Self(fixed("entropy", bytes)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Entropy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entropy([REDACTED])")
    }
}

impl Drop for Entropy {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Password hash the token mixes into every derived key.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash([u8; 32]);

impl PasswordHash {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ValidationError> {
        Ok(Self(fixed("password hash", bytes)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PasswordHash([REDACTED])")
    }
}

impl Drop for PasswordHash {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyMaterialError {
    #[error("Public key is not a valid ed25519 point: {reason}")]
    InvalidPoint { reason: String },

    #[error("Failed to encode public key: {reason}")]
    Encoding { reason: String },
}
