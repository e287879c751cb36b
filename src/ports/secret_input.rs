//! SecretInput trait - interactive input for provisioning flows

use std::io;

use zeroize::Zeroizing;

/// Source of user-typed input.
pub trait SecretInput {
    /// Read a password without echoing it.
    fn read_password(&mut self, prompt: &str) -> io::Result<Zeroizing<String>>;

    /// Read one visible line, without its line terminator.
    ///
    /// Returns `None` at end of input.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}
