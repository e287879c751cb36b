//! Fetch the SSH public key, provisioning the user seed first if needed

use tracing::info;

use crate::client::DeviceClient;
use crate::error::TokensshResult;
use crate::logic::{derive_password_hash, SeedKdfParams};
use crate::model::{Ed25519PublicKey, UsageLabel};
use crate::ports::{SecretInput, Transport};

const PASSWORD_PROMPT: &str = "The key will be generated with your password and the seed \
                               stored on the device.\nPlease enter your password: ";

/// Return the public key of the agent's SSH identity.
///
/// A token that has been formatted but never given a user seed answers the
/// first key request with a seed-missing rejection. In that case this asks
/// for a password, stores its Argon2id hash as the user seed and asks again.
///
/// # Errors
///
/// Returns errors if:
/// - The password is shorter than eight bytes
/// - Reading the password fails
/// - Any device call fails, including the retry after provisioning
pub fn ensure_public_key<T, I>(
    client: &DeviceClient<T>,
    input: &mut I,
    kdf: &SeedKdfParams,
) -> TokensshResult<Ed25519PublicKey>
where
    T: Transport,
    I: SecretInput,
{
    let usage = UsageLabel::ssh_identity();
    match client.get_public_key(&usage) {
        Err(err) if err.is_seed_missing() => {
            info!("device has no user seed, provisioning");
            let password = input.read_password(PASSWORD_PROMPT)?;
            let hash = derive_password_hash(password.as_bytes(), kdf)?;
            client.set_user_seed(&hash)?;
            client.get_public_key(&usage)
        }
        result => result,
    }
}
