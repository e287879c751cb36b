//! Error types for tokenssh
//!
//! This module defines the error hierarchy for all token operations.
//! Errors are organized by how far they propagate: transport faults are
//! fatal for the whole process, everything else is returned to the caller
//! that issued the request.

use std::io;

use thiserror::Error;

/// Result type alias for tokenssh operations
pub type TokensshResult<T> = Result<T, TokensshError>;

/// Markers the firmware uses when no user seed has been provisioned yet.
const SEED_MISSING_MARKERS: &[&str] = &["user seed not set", "seed-missing"];

/// Top-level error type for all tokenssh operations
#[derive(Error, Debug)]
pub enum TokensshError {
    /// Serial line I/O failed; the device session is unusable from now on
    #[error("Transport fault: {0}")]
    Transport(#[from] TransportError),

    /// Device answered badly or not at all
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Caller supplied an argument the token would not accept
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Operation the token's fixed identity set cannot perform
    #[error("{operation}: not supported")]
    Unsupported { operation: &'static str },

    /// Agent listener errors
    #[error("Agent server error: {0}")]
    Server(#[from] ServerError),

    /// Reading user input for provisioning failed
    #[error("Failed to read user input: {0}")]
    Input(#[from] io::Error),
}

impl TokensshError {
    /// True for errors that must terminate the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TokensshError::Transport(_) | TokensshError::Server(_))
    }

    /// True when the device reports that no user seed has been provisioned.
    pub fn is_seed_missing(&self) -> bool {
        match self {
            TokensshError::Protocol(err) => err.raw_response().is_some_and(|raw| {
                SEED_MISSING_MARKERS
                    .iter()
                    .any(|marker| raw.contains(marker))
            }),
            _ => false,
        }
    }
}

/// Serial line faults
///
/// Kept `Clone` so the capability bridge can both answer its caller and
/// hand the same fault to the server for shutdown.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Serial port could not be opened or configured
    #[error("Failed to open serial port {port}: {reason}")]
    OpenFailed { port: String, reason: String },

    /// Read or write on the line failed
    #[error("Serial I/O failed during {operation}: {kind:?}: {message}")]
    Io {
        operation: &'static str,
        kind: io::ErrorKind,
        message: String,
    },

    /// A previous fault closed the session
    #[error("Device session closed after earlier fault: {reason}")]
    SessionClosed { reason: String },
}

impl TransportError {
    pub fn io(operation: &'static str, err: &io::Error) -> Self {
        TransportError::Io {
            operation,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Errors in the request/response exchange with the device
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// No sentinel line arrived within the poll budget
    #[error("Timed out after {polls} empty reads waiting for {verb}")]
    Timeout { verb: &'static str, polls: u32 },

    /// Sentinel line with a status other than OK
    #[error("Device rejected {verb}: {raw}")]
    DeviceRejected { verb: &'static str, raw: String },

    /// Sentinel line with OK status that could not be decoded
    #[error("Malformed {verb} response ({reason}): {raw}")]
    Malformed {
        verb: &'static str,
        reason: String,
        raw: String,
    },
}

impl ProtocolError {
    /// Raw device line, when one was received.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            ProtocolError::Timeout { .. } => None,
            ProtocolError::DeviceRejected { raw, .. } | ProtocolError::Malformed { raw, .. } => {
                Some(raw)
            }
        }
    }
}

/// Local precondition failures, detected before any device I/O
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{what} must be {expected} bytes, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Usage label too long: {len} bytes (max {max})")]
    LabelTooLong { len: usize, max: usize },

    #[error("Usage label contains a forbidden character: {ch:?}")]
    LabelForbiddenChar { ch: char },

    #[error("Usage label must not be empty")]
    LabelEmpty,

    #[error("Password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("Domain name must be at least {min} characters long")]
    DomainTooShort { min: usize },

    #[error("Input ended before enough entropy was collected")]
    EntropyExhausted,

    #[error("Key derivation failed: {reason}")]
    KeyDerivation { reason: String },
}

/// Agent listener errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {endpoint}: {source}")]
    Bind {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    #[error("Listener on {endpoint} stopped: {reason}")]
    Accept { endpoint: String, reason: String },

    #[error("Endpoint {endpoint} is not available on this platform")]
    UnsupportedEndpoint { endpoint: String },
}
