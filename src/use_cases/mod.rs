//! Use cases (orchestration)
//!
//! Interactive flows built from several device operations. They talk to
//! the user only through [`SecretInput`](crate::ports::SecretInput) and
//! leave printing results to the caller.

mod format_device;
mod provision;
mod site_password;

pub use format_device::format_device;
pub use provision::ensure_public_key;
pub use site_password::generate_site_password;
