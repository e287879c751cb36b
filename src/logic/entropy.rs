//! Entropy collection for device formatting

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::ValidationError;
use crate::model::Entropy;

/// User-typed text hashed into the token's new device secret.
#[derive(Default)]
pub struct EntropyPool {
    text: Zeroizing<String>,
}

impl EntropyPool {
    /// Characters the pool must exceed before it can be used.
    pub const THRESHOLD: usize = 64;

    pub fn add(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_sufficient(&self) -> bool {
        self.len() > Self::THRESHOLD
    }

    /// SHA-256 of the collected text.
    pub fn finish(self) -> Result<Entropy, ValidationError> {
        if !self.is_sufficient() {
            return Err(ValidationError::EntropyExhausted);
        }
        let digest = Sha256::digest(self.text.as_bytes());
        Entropy::from_slice(&digest)
    }
}

impl std::fmt::Debug for EntropyPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntropyPool")
            .field("len", &self.len())
            .finish()
    }
}
