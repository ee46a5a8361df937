//! Vote accounting
//!
//! This module provides the per-voter collateral ledger and the global vote
//! tally of a proposal. Both count vote units, never currency: one unit is
//! one native collateral amount or one token collateral amount.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use dao_core::{Address, Amount, Decision};

use crate::error::{GovernanceError, GovernanceResult};

/// Votes held by one address on one proposal, split by side and source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    /// Native-collateral votes in favour
    pub native_for_votes: u64,
    /// Native-collateral votes against
    pub native_against_votes: u64,
    /// Pool-weighted votes in favour
    pub token_for_votes: u64,
    /// Pool-weighted votes against
    pub token_against_votes: u64,
}

impl VoteRecord {
    pub fn native_on(&self, decision: Decision) -> u64 {
        match decision {
            Decision::For => self.native_for_votes,
            Decision::Against => self.native_against_votes,
        }
    }

    pub fn token_on(&self, decision: Decision) -> u64 {
        match decision {
            Decision::For => self.token_for_votes,
            Decision::Against => self.token_against_votes,
        }
    }

    /// Native and token votes on `decision`
    pub fn votes_on(&self, decision: Decision) -> u64 {
        self.native_on(decision) + self.token_on(decision)
    }
}

/// Per-voter vote records plus the collateral unit used to price them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralLedger {
    /// Native currency backing one vote
    unit: Amount,
    records: BTreeMap<Address, VoteRecord>,
}

impl CollateralLedger {
    pub fn new(unit: Amount) -> Self {
        Self {
            unit,
            records: BTreeMap::new(),
        }
    }

    pub fn unit(&self) -> Amount {
        self.unit
    }

    /// Number of votes an attached native `value` buys.
    ///
    /// The value must be a positive whole multiple of the unit.
    pub fn units_for(&self, value: Amount) -> GovernanceResult<u64> {
        if value < self.unit || self.unit == 0 {
            return Err(GovernanceError::CollateralTooSmall);
        }
        if value % self.unit != 0 {
            return Err(GovernanceError::CollateralIncorrect);
        }
        u64::try_from(value / self.unit).map_err(|_| GovernanceError::ArithmeticOverflow)
    }

    pub fn record(&self, voter: &Address) -> VoteRecord {
        self.records.get(voter).copied().unwrap_or_default()
    }

    pub fn record_native(&mut self, voter: &Address, decision: Decision, units: u64) -> GovernanceResult<()> {
        let record = self.records.entry(voter.clone()).or_default();
        let slot = match decision {
            Decision::For => &mut record.native_for_votes,
            Decision::Against => &mut record.native_against_votes,
        };
        *slot = slot.checked_add(units).ok_or(GovernanceError::ArithmeticOverflow)?;
        Ok(())
    }

    pub fn has_token_vote(&self, voter: &Address, decision: Decision) -> bool {
        self.record(voter).token_on(decision) > 0
    }

    /// Record pool-weighted votes. Returns `false` when this voter already
    /// holds token votes on `decision`, leaving the record untouched.
    pub fn record_token(&mut self, voter: &Address, decision: Decision, units: u64) -> bool {
        if self.has_token_vote(voter, decision) {
            return false;
        }
        let record = self.records.entry(voter.clone()).or_default();
        match decision {
            Decision::For => record.token_for_votes = units,
            Decision::Against => record.token_against_votes = units,
        }
        true
    }

    /// Voters holding at least one vote on `decision`, with their vote count
    pub fn voters_on(&self, decision: Decision) -> impl Iterator<Item = (&Address, u64)> {
        self.records
            .iter()
            .map(move |(voter, record)| (voter, record.votes_on(decision)))
            .filter(|(_, votes)| *votes > 0)
    }

    /// Native currency locked on `decision`
    pub fn native_collateral_on(&self, decision: Decision) -> GovernanceResult<Amount> {
        self.records.values().try_fold(0 as Amount, |total, record| {
            Amount::from(record.native_on(decision))
                .checked_mul(self.unit)
                .and_then(|locked| total.checked_add(locked))
                .ok_or(GovernanceError::ArithmeticOverflow)
        })
    }
}

/// Global vote counters of a proposal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    for_votes: u64,
    against_votes: u64,
}

impl VoteTally {
    pub fn add(&mut self, decision: Decision, units: u64) -> GovernanceResult<()> {
        let counter = match decision {
            Decision::For => &mut self.for_votes,
            Decision::Against => &mut self.against_votes,
        };
        *counter = counter.checked_add(units).ok_or(GovernanceError::ArithmeticOverflow)?;
        Ok(())
    }

    pub fn for_votes(&self) -> u64 {
        self.for_votes
    }

    pub fn against_votes(&self) -> u64 {
        self.against_votes
    }

    pub fn votes_on(&self, decision: Decision) -> u64 {
        match decision {
            Decision::For => self.for_votes,
            Decision::Against => self.against_votes,
        }
    }

    /// Strict majority in favour; a tie fails
    pub fn majority_for(&self) -> bool {
        self.for_votes > self.against_votes
    }

    /// Side that takes the settlement
    pub fn winner(&self) -> Decision {
        Decision::from_support(self.majority_for())
    }
}
