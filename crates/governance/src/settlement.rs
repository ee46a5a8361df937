//! Reward settlement
//!
//! After the challenge period the native collateral of the losing side is
//! shared among winning voters in proportion to their winning votes, native
//! and token alike. Winners also get back their own winning-side native
//! collateral. The last winner to claim receives whatever rounding left
//! behind, so a fully claimed proposal holds no native currency.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use dao_core::{Address, Amount, Decision};

use crate::error::{GovernanceError, GovernanceResult};
use crate::voting::{CollateralLedger, VoteTally};

/// Amount owed to one winning voter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    /// Recipient
    pub voter: Address,
    /// Winning-side votes the payout is based on
    pub votes: u64,
    /// The voter's own winning-side native collateral
    pub collateral_refund: Amount,
    /// Share of the losing side's native collateral
    pub reward: Amount,
}

impl Payout {
    pub fn total(&self) -> Amount {
        self.collateral_refund + self.reward
    }
}

/// Tracks who has been paid and how much of the losing pool is gone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettlementEngine {
    claimed: BTreeSet<Address>,
    /// Losing-pool currency already handed out
    distributed: Amount,
    /// Winning votes already paid
    settled_votes: u64,
}

impl SettlementEngine {
    pub fn has_claimed(&self, voter: &Address) -> bool {
        self.claimed.contains(voter)
    }

    /// Compute what `voter` is owed without recording anything
    pub fn quote(
        &self,
        ledger: &CollateralLedger,
        tally: &VoteTally,
        winner: Decision,
        voter: &Address,
    ) -> GovernanceResult<Payout> {
        if self.has_claimed(voter) {
            return Err(GovernanceError::RewardNotApply);
        }
        let record = ledger.record(voter);
        let votes = record.votes_on(winner);
        if votes == 0 {
            return Err(GovernanceError::RewardNotApply);
        }

        let collateral_refund = Amount::from(record.native_on(winner))
            .checked_mul(ledger.unit())
            .ok_or(GovernanceError::ArithmeticOverflow)?;

        let losing_pool = ledger.native_collateral_on(winner.opposite())?;
        let total_votes = tally.votes_on(winner);
        let unpaid_votes = total_votes.saturating_sub(self.settled_votes);
        let reward = if votes >= unpaid_votes {
            losing_pool.saturating_sub(self.distributed)
        } else {
            losing_pool
                .checked_mul(Amount::from(votes))
                .ok_or(GovernanceError::ArithmeticOverflow)?
                / Amount::from(total_votes)
        };
        if collateral_refund == 0 && reward == 0 {
            return Err(GovernanceError::RewardNotApply);
        }

        Ok(Payout {
            voter: voter.clone(),
            votes,
            collateral_refund,
            reward,
        })
    }

    /// Record a payout that has been transferred
    pub fn settle(&mut self, payout: &Payout) {
        self.claimed.insert(payout.voter.clone());
        self.distributed += payout.reward;
        self.settled_votes += payout.votes;
    }
}
