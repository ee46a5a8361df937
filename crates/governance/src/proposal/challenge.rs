//! Challenge period timing

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GovernanceError, GovernanceResult};

/// Voting window of a proposal. The window only ever grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeClock {
    /// Proposal creation time
    created_at: u64,
    /// Current window length, including extensions
    period_seconds: u64,
    /// Extension applied per late vote
    extend_by_seconds: u64,
    /// Distance from the deadline within which a vote is late
    extension_window_seconds: u64,
}

impl ChallengeClock {
    pub fn new(created_at: u64, period_seconds: u64, extend_by_seconds: u64, extension_window_seconds: u64) -> Self {
        Self {
            created_at,
            period_seconds,
            extend_by_seconds,
            extension_window_seconds,
        }
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn period_seconds(&self) -> u64 {
        self.period_seconds
    }

    pub fn deadline(&self) -> u64 {
        self.created_at.saturating_add(self.period_seconds)
    }

    pub fn is_ended(&self, now: u64) -> bool {
        now >= self.deadline()
    }

    pub fn ensure_open(&self, now: u64) -> GovernanceResult<()> {
        if self.is_ended(now) {
            return Err(GovernanceError::NotInChallengePeriod);
        }
        Ok(())
    }

    pub fn ensure_ended(&self, now: u64) -> GovernanceResult<()> {
        if !self.is_ended(now) {
            return Err(GovernanceError::NotAfterChallengePeriod);
        }
        Ok(())
    }

    /// Apply the late-vote rule for a vote accepted at `now`.
    /// Returns whether the window was extended.
    pub fn register_vote(&mut self, now: u64) -> bool {
        if self.extend_by_seconds == 0 {
            return false;
        }
        let remaining = self.deadline().saturating_sub(now);
        if remaining > self.extension_window_seconds {
            return false;
        }
        self.period_seconds = self.period_seconds.saturating_add(self.extend_by_seconds);
        debug!(
            "Late vote extended challenge period to {}s (deadline {})",
            self.period_seconds,
            self.deadline()
        );
        true
    }
}
