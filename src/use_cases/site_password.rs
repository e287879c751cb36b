//! Deterministic per-site passwords derived on the token

use std::io;

use tracing::debug;
use zeroize::Zeroizing;

use crate::client::{DeviceClient, MIN_SITE_SECRET_LEN};
use crate::error::{TokensshResult, ValidationError};
use crate::logic::{render_site_password, DEFAULT_SITE_INDEX, MIN_DOMAIN_LEN};
use crate::model::UsageLabel;
use crate::ports::{SecretInput, Transport};

/// Ask for a domain and an index and return the site's password.
///
/// The same domain and index always give the same password for a given
/// device secret and user seed. Bumping the index rotates it.
pub fn generate_site_password<T, I>(
    client: &DeviceClient<T>,
    input: &mut I,
) -> TokensshResult<Zeroizing<String>>
where
    T: Transport,
    I: SecretInput,
{
    let domain = input
        .read_line("Please enter the domain name (e.g. example.com):")?
        .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no domain entered"))?;
    if domain.len() < MIN_DOMAIN_LEN {
        return Err(ValidationError::DomainTooShort {
            min: MIN_DOMAIN_LEN,
        }
        .into());
    }

    let index = match input.read_line(&format!("Index (default {DEFAULT_SITE_INDEX}):"))? {
        Some(index) if !index.is_empty() => index,
        _ => DEFAULT_SITE_INDEX.to_string(),
    };

    let label = UsageLabel::site_password(&index, &domain)?;
    debug!(%label, "deriving site password");
    let secret = client.derive_site_password(&label)?;

    render_site_password(&secret, &index).ok_or_else(|| {
        ValidationError::InvalidLength {
            what: "site secret",
            expected: MIN_SITE_SECRET_LEN,
            actual: secret.len(),
        }
        .into()
    })
}
