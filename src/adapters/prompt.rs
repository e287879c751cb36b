//! Confirmation prompts shown before button-press operations

use std::io::{self, Write};
use std::time::Duration;

use tracing::{info, warn};

use crate::model::Verb;
use crate::ports::UserPrompt;

/// Prints the button-press banner on the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    fn banner(window: Duration) -> String {
        format!(
            "=== Waiting for User Confirmation... ===\n\
             Please press the \"BOOT\" button on the device in {} seconds,\n\
             and hold it for one second.\n\
             =====================================================",
            window.as_secs()
        )
    }
}

impl UserPrompt for TerminalPrompt {
    fn request_confirmation(&self, verb: Verb, window: Duration) {
        info!(%verb, window_secs = window.as_secs(), "waiting for user confirmation");
        let mut stderr = io::stderr().lock();
        if let Err(err) = writeln!(stderr, "{}", Self::banner(window)) {
            warn!(error = %err, "failed to print confirmation banner");
        }
    }
}

/// Remembers every confirmation request instead of printing it.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingPrompt {
    requests: std::sync::Mutex<Vec<(Verb, Duration)>>,
}

#[cfg(test)]
impl RecordingPrompt {
    pub fn requests(&self) -> Vec<(Verb, Duration)> {
        self.requests.lock().expect("prompt lock poisoned").clone()
    }
}

#[cfg(test)]
impl UserPrompt for RecordingPrompt {
    fn request_confirmation(&self, verb: Verb, window: Duration) {
        self.requests
            .lock()
            .expect("prompt lock poisoned")
            .push((verb, window));
    }
}
