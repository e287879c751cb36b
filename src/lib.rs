//! SSH agent backed by a serial-attached ed25519 token
//!
//! The token keeps its keys on the device and signs internally. This crate
//! talks its line protocol over a serial port, serializes every command
//! through one [`DeviceSession`](protocol::DeviceSession), and serves the
//! resulting identity to OpenSSH clients through the agent protocol.

mod adapters;
pub mod agent;
pub mod api;
pub mod client;
pub mod error;
mod logic;
pub mod model;
pub mod ports;
pub mod protocol;
pub mod use_cases;

// Re-export commonly used types
pub use client::DeviceClient;
pub use error::{TokensshError, TokensshResult};
