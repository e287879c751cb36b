use tracing::{debug, info};

use crate::client::DeviceClient;
use crate::error::{TokensshResult, ValidationError};
use crate::logic::EntropyPool;
use crate::model::Entropy;
use crate::ports::{SecretInput, Transport};

/// Collect typed entropy and format the token with it.
///
/// Wipes the device secret and the user seed; every derived key changes.
/// Returns the entropy that was sent so the caller can show it.
pub fn format_device<T, I>(client: &DeviceClient<T>, input: &mut I) -> TokensshResult<Entropy>
where
    T: Transport,
    I: SecretInput,
{
    let mut pool = EntropyPool::default();
    while !pool.is_sufficient() {
        let prompt = format!(
            "Please enter some random text (>{} chars, {} so far):",
            EntropyPool::THRESHOLD,
            pool.len()
        );
        let Some(line) = input.read_line(&prompt)? else {
            return Err(ValidationError::EntropyExhausted.into());
        };
        pool.add(&line);
        debug!(len = pool.len(), "entropy pool grew");
    }

    let entropy = pool.finish()?;
    info!("formatting device");
    client.format(&entropy)?;
    Ok(entropy)
}
