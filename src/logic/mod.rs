mod entropy;
mod seed_kdf;
mod site_password;

pub use entropy::EntropyPool;
pub use seed_kdf::{derive_password_hash, SeedKdfParams, MIN_PASSWORD_LEN};
pub use site_password::{render_site_password, DEFAULT_SITE_INDEX, MIN_DOMAIN_LEN};

#[cfg(test)]
pub(crate) use seed_kdf::test_params;
