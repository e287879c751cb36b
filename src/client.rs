//! Typed operations on the token
//!
//! Each operation builds one [`Command`], runs it through the shared
//! [`DeviceSession`] and decodes the sentinel answer. Argument sizes are
//! enforced by the argument types, so bad input never reaches the device.

use std::sync::Arc;

use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::error::{ProtocolError, TokensshResult, TransportError};
use crate::model::{
    Command, Ed25519PublicKey, Ed25519Signature, Entropy, PasswordHash, SentinelLine, Timing,
    UsageLabel,
};
use crate::ports::{Transport, UserPrompt};
use crate::protocol::DeviceSession;

/// Shortest site secret the password renderer can use.
pub const MIN_SITE_SECRET_LEN: usize = 9;

/// Handle to the token. Clones share one device session.
pub struct DeviceClient<T> {
    session: Arc<DeviceSession<T>>,
}

impl<T> Clone for DeviceClient<T> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<T: Transport> DeviceClient<T> {
    /// Open a session on `transport`, resetting the device.
    pub fn open(
        transport: T,
        timing: Timing,
        prompt: Arc<dyn UserPrompt>,
    ) -> Result<Self, TransportError> {
        let session = DeviceSession::open(transport, timing, prompt)?;
        Ok(Self::from_session(Arc::new(session)))
    }

    pub fn from_session(session: Arc<DeviceSession<T>>) -> Self {
        Self { session }
    }

    /// Fetch the public key derived for `usage`.
    pub fn get_public_key(&self, usage: &UsageLabel) -> TokensshResult<Ed25519PublicKey> {
        let command = Command::public_key(usage);
        let answer = self.session.call(&command)?;
        let payload = answer.ok_payload(command.verb())?;
        let key = Ed25519PublicKey::from_slice(&payload)
            .map_err(|e| malformed(&answer, &command, e.to_string()))?;
        debug!(%usage, "public key received");
        Ok(key)
    }

    /// Have the token sign `data` with the key derived for `usage`.
    ///
    /// Requires a button press on the device.
    pub fn sign(&self, usage: &UsageLabel, data: &[u8]) -> TokensshResult<Ed25519Signature> {
        let command = Command::sign(usage, data);
        let answer = self.session.call(&command)?;
        let payload = answer.ok_payload(command.verb())?;
        let signature = Ed25519Signature::from_slice(&payload)
            .map_err(|e| malformed(&answer, &command, e.to_string()))?;
        debug!(%usage, len = data.len(), "data signed");
        Ok(signature)
    }

    /// Wipe the token and reseed its device secret from `entropy`.
    pub fn format(&self, entropy: &Entropy) -> TokensshResult<()> {
        let command = Command::format(entropy);
        self.session.call(&command)?.ok_marker(command.verb())?;
        info!("device formatted");
        Ok(())
    }

    /// Store the user seed derived from the user's password.
    pub fn set_user_seed(&self, hash: &PasswordHash) -> TokensshResult<()> {
        let command = Command::user_seed(hash);
        self.session.call(&command)?.ok_marker(command.verb())?;
        info!("user seed stored");
        Ok(())
    }

    /// Secret bytes the token derives for a site-password label.
    pub fn derive_site_password(&self, label: &UsageLabel) -> TokensshResult<Zeroizing<Vec<u8>>> {
        let command = Command::site_password(label);
        let answer = self.session.call(&command)?;
        let secret = Zeroizing::new(answer.ok_payload(command.verb())?);
        if secret.len() < MIN_SITE_SECRET_LEN {
            return Err(malformed(
                &answer,
                &command,
                format!(
                    "secret must be at least {MIN_SITE_SECRET_LEN} bytes, got {}",
                    secret.len()
                ),
            )
            .into());
        }
        Ok(secret)
    }
}

fn malformed(answer: &SentinelLine, command: &Command, reason: String) -> ProtocolError {
    answer.malformed(command.verb(), reason)
}
