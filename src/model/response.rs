//! Classification of device output lines
//!
//! The firmware prints free-form diagnostics interleaved with its answer.
//! Only a line starting with [`SENTINEL`] is a candidate answer; its first
//! field is the status and the optional second field a hex payload.

use crate::error::ProtocolError;

use super::command::Verb;

pub const SENTINEL: char = '+';

const STATUS_OK: &str = "+OK";

/// Kind of one complete line read from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceLine {
    /// Candidate terminal answer
    Sentinel(SentinelLine),
    /// Diagnostic output, logged and dropped
    Noise(String),
}

impl DeviceLine {
    pub fn classify(line: &str) -> Self {
        if line.starts_with(SENTINEL) {
            DeviceLine::Sentinel(SentinelLine(line.to_string()))
        } else {
            DeviceLine::Noise(line.to_string())
        }
    }
}

/// The terminal answer to a command, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentinelLine(String);

impl SentinelLine {
    pub fn raw(&self) -> &str {
        &self.0
    }

    /// Require `+OK,<hex>` and decode the payload.
    pub fn ok_payload(&self, verb: Verb) -> Result<Vec<u8>, ProtocolError> {
        let fields = self.ok_fields(verb)?;
        if fields.len() != 2 {
            return Err(self.malformed(
                verb,
                format!("expected 2 fields, got {}", fields.len()),
            ));
        }
        hex::decode(fields[1]).map_err(|e| self.malformed(verb, format!("bad hex: {e}")))
    }

    /// Require an `+OK` status; any payload is ignored.
    pub fn ok_marker(&self, verb: Verb) -> Result<(), ProtocolError> {
        let fields = self.ok_fields(verb)?;
        if fields.len() > 2 {
            return Err(self.malformed(
                verb,
                format!("expected at most 2 fields, got {}", fields.len()),
            ));
        }
        Ok(())
    }

    fn ok_fields(&self, verb: Verb) -> Result<Vec<&str>, ProtocolError> {
        let fields: Vec<&str> = self.0.split(',').collect();
        if fields[0] != STATUS_OK {
            return Err(ProtocolError::DeviceRejected {
                verb: verb.as_str(),
                raw: self.0.clone(),
            });
        }
        Ok(fields)
    }

    pub(crate) fn malformed(&self, verb: Verb, reason: String) -> ProtocolError {
        ProtocolError::Malformed {
            verb: verb.as_str(),
            reason,
            raw: self.0.clone(),
        }
    }
}
