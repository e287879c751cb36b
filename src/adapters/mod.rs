//! Adapters - concrete implementations of ports (traits)

mod prompt;
mod serial;
mod terminal;

#[cfg(test)]
pub mod fake_token;
#[cfg(test)]
pub mod mock_device;

pub use prompt::TerminalPrompt;
pub use serial::{list_ports, SerialSettings, SerialTransport};
pub use terminal::TerminalInput;

#[cfg(test)]
pub use prompt::RecordingPrompt;
#[cfg(test)]
pub use terminal::ScriptedInput;
