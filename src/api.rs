//! Entry points for opening the token
//!
//! Wires the serial adapter, the confirmation prompt and the device
//! session together.

use std::sync::Arc;

use tracing::info;

use crate::client::DeviceClient;
use crate::error::TokensshResult;
use crate::model::Timing;
use crate::ports::UserPrompt;

pub use crate::adapters::{
    list_ports, SerialSettings, SerialTransport, TerminalInput, TerminalPrompt,
};
pub use crate::logic::SeedKdfParams;

/// Open the token on `port` with the firmware's line settings.
pub fn open_device(port: &str) -> TokensshResult<DeviceClient<SerialTransport>> {
    open_device_with(port, &SerialSettings::default(), Arc::new(TerminalPrompt))
}

/// Open the token with explicit line settings and confirmation prompt.
///
/// The poll budget follows `settings.read_timeout`.
pub fn open_device_with(
    port: &str,
    settings: &SerialSettings,
    prompt: Arc<dyn UserPrompt>,
) -> TokensshResult<DeviceClient<SerialTransport>> {
    let transport = SerialTransport::open(port, settings)?;
    let timing = Timing {
        read_timeout: settings.read_timeout,
        ..Timing::default()
    };
    let client = DeviceClient::open(transport, timing, prompt)?;
    info!(port, "device session ready");
    Ok(client)
}
