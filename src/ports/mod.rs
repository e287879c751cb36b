//! Ports (traits) the device layer depends on
//!
//! The protocol core talks to the serial line, the user and the terminal
//! only through these traits. Concrete implementations live in
//! `crate::adapters`; tests swap in scripted and simulated devices.

mod prompt;
mod secret_input;
mod transport;

pub use prompt::UserPrompt;
pub use secret_input::SecretInput;
pub use transport::Transport;
