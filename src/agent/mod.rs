//! SSH agent surface of the token

mod bridge;
mod server;

pub use bridge::TokenAgent;
pub use server::{AgentServer, Endpoint};
