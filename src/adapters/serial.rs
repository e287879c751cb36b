//! Serial-port implementation of the token transport
//!
//! Opens the port with the token's fixed line settings and maps the
//! per-read timeout onto the `Ok(0)` convention of [`Transport`].

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info};

use crate::error::TransportError;
use crate::ports::Transport;

/// Line settings the token firmware expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    pub read_timeout: Duration,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            read_timeout: Duration::from_millis(200),
        }
    }
}

/// The token's serial line.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialTransport {
    /// Open `path`, configure it and de-assert DTR and RTS.
    ///
    /// Holding either control line high resets some boards into their
    /// bootloader.
    pub fn open(path: &str, settings: &SerialSettings) -> Result<Self, TransportError> {
        let open_failed = |reason: String| TransportError::OpenFailed {
            port: path.to_string(),
            reason,
        };

        let mut port = serialport::new(path, settings.baud_rate)
            .data_bits(settings.data_bits)
            .stop_bits(settings.stop_bits)
            .parity(settings.parity)
            .flow_control(FlowControl::None)
            .timeout(settings.read_timeout)
            .open()
            .map_err(|e| open_failed(e.to_string()))?;

        port.write_data_terminal_ready(false)
            .map_err(|e| open_failed(format!("failed to clear DTR: {e}")))?;
        port.write_request_to_send(false)
            .map_err(|e| open_failed(format!("failed to clear RTS: {e}")))?;

        info!(port = path, baud = settings.baud_rate, "serial port opened");
        Ok(Self {
            port,
            name: path.to_string(),
        })
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Transport for SerialTransport {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.port
            .write_all(bytes)
            .and_then(|()| self.port.flush())
            .map_err(|e| TransportError::io("write", &e))
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        match self.port.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if is_read_timeout(&e) => Ok(0),
            Err(e) => Err(TransportError::io("read", &e)),
        }
    }
}

fn is_read_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

/// Names of the serial ports present on this machine.
pub fn list_ports() -> Result<Vec<String>, TransportError> {
    let ports = serialport::available_ports().map_err(|e| TransportError::OpenFailed {
        port: "<enumeration>".to_string(),
        reason: e.to_string(),
    })?;
    debug!(count = ports.len(), "enumerated serial ports");
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
