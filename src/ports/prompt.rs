use std::time::Duration;

use crate::model::Verb;

/// Tells the user to acknowledge an operation on the token itself.
pub trait UserPrompt: Send + Sync {
    /// Called right before a command that needs a button press is sent.
    fn request_confirmation(&self, verb: Verb, window: Duration);
}
