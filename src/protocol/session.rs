use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::error::{TokensshError, TokensshResult, TransportError};
use crate::model::{Command, SentinelLine, Timing};
use crate::ports::{Transport, UserPrompt};

use super::machine::DeviceProtocol;

struct SessionState<T> {
    protocol: DeviceProtocol<T>,
    fault: Option<TransportError>,
}

/// The one logical connection to the token.
///
/// At most one command is in flight: every call takes the session lock for
/// the whole drain/write/read exchange. The lock is tokio's mutex, which
/// hands itself out in FIFO order, so queued callers are served in arrival
/// order. After a transport fault the session refuses all further calls.
///
/// `call` blocks the current thread; from async code run it on the
/// blocking pool.
pub struct DeviceSession<T> {
    state: Mutex<SessionState<T>>,
}

impl<T: Transport> DeviceSession<T> {
    /// Take ownership of the line and reset the device.
    pub fn open(
        transport: T,
        timing: Timing,
        prompt: Arc<dyn UserPrompt>,
    ) -> Result<Self, TransportError> {
        let mut protocol = DeviceProtocol::new(transport, timing, prompt);
        protocol.reset()?;
        Ok(Self {
            state: Mutex::new(SessionState {
                protocol,
                fault: None,
            }),
        })
    }

    /// Run one command with exclusive access to the device.
    pub fn call(&self, command: &Command) -> TokensshResult<SentinelLine> {
        let mut state = self.state.blocking_lock();
        if let Some(fault) = &state.fault {
            return Err(TransportError::SessionClosed {
                reason: fault.to_string(),
            }
            .into());
        }

        match state.protocol.call(command) {
            Err(TokensshError::Transport(fault)) => {
                error!(verb = %command.verb(), %fault, "device session closed");
                state.fault = Some(fault.clone());
                Err(fault.into())
            }
            result => {
                debug!(verb = %command.verb(), ok = result.is_ok(), "device call finished");
                result
            }
        }
    }

    /// Fault that closed the session, if any.
    pub fn fault(&self) -> Option<TransportError> {
        self.state.blocking_lock().fault.clone()
    }
}
