use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use zeroize::Zeroizing;

use crate::client::MIN_SITE_SECRET_LEN;

/// Shortest domain accepted for site passwords.
pub const MIN_DOMAIN_LEN: usize = 3;

/// Index used when the user leaves it blank.
pub const DEFAULT_SITE_INDEX: &str = "0";

/// Turn the token's site secret into a typeable password: `base64(secret[..9])!<index>`.
///
/// Returns `None` when the secret is too short.
pub fn render_site_password(secret: &[u8], index: &str) -> Option<Zeroizing<String>> {
    let head = secret.get(..MIN_SITE_SECRET_LEN)?;
    let mut password = Zeroizing::new(STANDARD.encode(head));
    password.push('!');
    password.push_str(index);
    Some(password)
}
