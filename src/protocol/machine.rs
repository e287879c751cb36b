//! Single-command exchange with the token
//!
//! Protocol assumptions, relied on by [`DeviceProtocol::call`]:
//! - the device prints at most one sentinel line per command;
//! - diagnostic output never starts with the sentinel character.
//!
//! If a chunk completes several sentinel lines the last one wins.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{ProtocolError, TokensshResult, TransportError};
use crate::model::{Command, DeviceLine, SentinelLine, Timing};
use crate::ports::{Transport, UserPrompt};

use super::line_buffer::LineBuffer;

const READ_BUF_SIZE: usize = 1024;

/// Where the last call stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Sending,
    AwaitingLines,
    Resolved,
    TimedOut,
}

pub struct DeviceProtocol<T> {
    transport: T,
    timing: Timing,
    prompt: Arc<dyn UserPrompt>,
    state: CallState,
}

impl<T: Transport> DeviceProtocol<T> {
    pub fn new(transport: T, timing: Timing, prompt: Arc<dyn UserPrompt>) -> Self {
        Self {
            transport,
            timing,
            prompt,
            state: CallState::Idle,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    /// Send a bare newline and throw away whatever the device printed.
    pub fn reset(&mut self) -> Result<(), TransportError> {
        self.transport.write_all(b"\n")?;
        let dropped = self.transport.drain()?;
        debug!(dropped, "device reset");
        Ok(())
    }

    /// Run `command` and return its sentinel line.
    ///
    /// Fails with [`ProtocolError::Timeout`] once the number of empty reads
    /// exceeds the command's budget. Late output from a command that timed
    /// out is dropped by the drain at the start of the next call.
    pub fn call(&mut self, command: &Command) -> TokensshResult<SentinelLine> {
        let verb = command.verb();
        let policy = command.policy();
        let budget = self.timing.budget(policy);
        debug!(%verb, units = budget.units, "device call");

        if policy.requires_confirmation {
            let window = self
                .timing
                .units_to_duration(self.timing.confirmation_extra_units);
            self.prompt.request_confirmation(verb, window);
        }

        self.state = CallState::Sending;
        let stale = self.transport.drain()?;
        if stale > 0 {
            debug!(stale, "dropped stale device output");
        }
        self.transport.write_all(command.to_line().as_bytes())?;

        self.state = CallState::AwaitingLines;
        let mut lines = LineBuffer::default();
        let mut buf = [0u8; READ_BUF_SIZE];
        let mut empty_polls: u32 = 0;
        loop {
            let n = self.transport.read_chunk(&mut buf)?;
            if n == 0 {
                empty_polls += 1;
                if empty_polls > budget.max_empty_polls {
                    self.state = CallState::TimedOut;
                    warn!(%verb, empty_polls, "device call timed out");
                    return Err(ProtocolError::Timeout {
                        verb: verb.as_str(),
                        polls: empty_polls,
                    }
                    .into());
                }
                continue;
            }

            let mut answer = None;
            for line in lines.push(&buf[..n]) {
                debug!(line = %line, "dev");
                if let DeviceLine::Sentinel(sentinel) = DeviceLine::classify(&line) {
                    answer = Some(sentinel);
                }
            }
            if let Some(answer) = answer {
                if lines.pending() > 0 {
                    debug!(bytes = lines.pending(), "discarding partial line");
                }
                self.state = CallState::Resolved;
                return Ok(answer);
            }
        }
    }
}
