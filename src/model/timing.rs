//! Timing policy for device calls
//!
//! Timeouts are expressed in whole "units" (seconds on real hardware) and
//! converted into a number of empty reads, because the serial line only
//! offers a fixed per-read timeout.

use std::time::Duration;

/// Line-level timing shared by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Per-read timeout configured on the serial line
    pub read_timeout: Duration,
    /// Extra units granted when the user must confirm on the device
    pub confirmation_extra_units: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(200),
            confirmation_extra_units: 30,
        }
    }
}

impl Timing {
    /// Empty reads that make up one timeout unit.
    pub fn polls_per_unit(&self) -> u32 {
        let millis = self.read_timeout.as_millis().clamp(1, 1000) as u32;
        1000 / millis
    }

    /// Wall-clock length of `units` timeout units.
    pub fn units_to_duration(&self, units: u32) -> Duration {
        self.read_timeout * units.saturating_mul(self.polls_per_unit())
    }

    /// Budget for a call, with the confirmation window folded in.
    pub fn budget(&self, policy: CallPolicy) -> PollBudget {
        let units = if policy.requires_confirmation {
            policy.base_timeout_units + self.confirmation_extra_units
        } else {
            policy.base_timeout_units
        };
        PollBudget {
            units,
            max_empty_polls: units.saturating_mul(self.polls_per_unit()),
        }
    }
}

/// Per-verb timeout and confirmation requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub base_timeout_units: u32,
    pub requires_confirmation: bool,
}

impl CallPolicy {
    pub const fn plain(base_timeout_units: u32) -> Self {
        Self {
            base_timeout_units,
            requires_confirmation: false,
        }
    }

    pub const fn confirmed(base_timeout_units: u32) -> Self {
        Self {
            base_timeout_units,
            requires_confirmation: true,
        }
    }
}

/// Resolved budget for one call.
///
/// The call times out once the count of empty reads *exceeds*
/// `max_empty_polls`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    pub units: u32,
    pub max_empty_polls: u32,
}
