//! Proposal state machine
//!
//! A proposal is `Open` while its challenge period runs, then `Passed` or
//! `Failed` depending on the final tally. A passed proposal may be
//! `Executed` once. Settlement claims are tracked per voter and are
//! independent of execution.
//!
//! Every state change is split into a check that only reads state and an
//! apply step, so callers can move funds in between.

use serde::{Deserialize, Serialize};
use tracing::debug;

use dao_core::{Address, Amount, Decision, MerkleRoot, ProposalId};

use crate::error::{GovernanceError, GovernanceResult};
use crate::execution::Payload;
use crate::params::DaoParams;
use crate::settlement::{Payout, SettlementEngine};
use crate::voting::{CollateralLedger, VoteRecord, VoteTally};

pub mod challenge;

pub use challenge::ChallengeClock;

/// Lifecycle status of a proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Challenge period running
    Open,
    /// Ended with a strict majority in favour
    Passed,
    /// Ended without a strict majority in favour
    Failed,
    /// Passed and payloads applied
    Executed,
}

impl Default for ProposalStatus {
    fn default() -> Self {
        Self::Open
    }
}

/// Everything needed to open a proposal
#[derive(Debug, Clone)]
pub struct ProposalDraft {
    pub id: ProposalId,
    pub merkle_root: MerkleRoot,
    pub payloads: Vec<Payload>,
}

/// A collateralised proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Proposal handle, also the escrow address of its native collateral
    address: Address,
    /// Caller-supplied identifier, unique within the DAO
    id: ProposalId,
    /// Stored commitment, never interpreted
    merkle_root: MerkleRoot,
    /// Treasury actions applied on execution
    payloads: Vec<Payload>,
    /// Creator of the proposal
    sequencer: Address,
    /// Owning DAO, also the treasury address
    dao: Address,
    /// Pool supplying token voting weight
    pool: Address,
    /// Pool balance per token vote
    token_collateral: Amount,
    clock: ChallengeClock,
    ledger: CollateralLedger,
    tally: VoteTally,
    settlement: SettlementEngine,
    /// Whether payloads have been applied
    executed: bool,
}

impl Proposal {
    /// Open a proposal whose creator locked `creator_votes` native votes in favour
    #[allow(clippy::too_many_arguments)]
    pub fn open(
        address: Address,
        draft: ProposalDraft,
        sequencer: Address,
        dao: Address,
        pool: Address,
        params: &DaoParams,
        now: u64,
        creator_votes: u64,
    ) -> GovernanceResult<Self> {
        let mut proposal = Self {
            address,
            id: draft.id,
            merkle_root: draft.merkle_root,
            payloads: draft.payloads,
            sequencer: sequencer.clone(),
            dao,
            pool,
            token_collateral: params.token_collateral,
            clock: ChallengeClock::new(
                now,
                params.challenge_period_seconds,
                params.extend_challenge_period_seconds,
                params.extension_window_seconds,
            ),
            ledger: CollateralLedger::new(params.native_collateral),
            tally: VoteTally::default(),
            settlement: SettlementEngine::default(),
            executed: false,
        };
        proposal.ledger.record_native(&sequencer, Decision::For, creator_votes)?;
        proposal.tally.add(Decision::For, creator_votes)?;
        Ok(proposal)
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn id(&self) -> &ProposalId {
        &self.id
    }

    pub fn merkle_root(&self) -> &MerkleRoot {
        &self.merkle_root
    }

    pub fn proposal_merkle_root_hex(&self) -> String {
        self.merkle_root.to_hex()
    }

    pub fn sequencer_address(&self) -> &Address {
        &self.sequencer
    }

    pub fn dao_address(&self) -> &Address {
        &self.dao
    }

    pub fn dao_pool(&self) -> &Address {
        &self.pool
    }

    pub fn payloads(&self) -> &[Payload] {
        &self.payloads
    }

    pub fn native_collateral(&self) -> Amount {
        self.ledger.unit()
    }

    pub fn token_collateral(&self) -> Amount {
        self.token_collateral
    }

    pub fn contract_creation_time(&self) -> u64 {
        self.clock.created_at()
    }

    /// Current window length, extensions included
    pub fn challenge_period_seconds(&self) -> u64 {
        self.clock.period_seconds()
    }

    pub fn deadline(&self) -> u64 {
        self.clock.deadline()
    }

    pub fn for_votes_counter(&self) -> u64 {
        self.tally.for_votes()
    }

    pub fn against_votes_counter(&self) -> u64 {
        self.tally.against_votes()
    }

    pub fn votes(&self, voter: &Address) -> VoteRecord {
        self.ledger.record(voter)
    }

    pub fn executed(&self) -> bool {
        self.executed
    }

    pub fn has_claimed(&self, voter: &Address) -> bool {
        self.settlement.has_claimed(voter)
    }

    pub fn is_ended(&self, now: u64) -> bool {
        self.clock.is_ended(now)
    }

    pub fn is_passed(&self, now: u64) -> bool {
        self.is_ended(now) && self.tally.majority_for()
    }

    /// Settling side once the period is over
    pub fn winning_side(&self, now: u64) -> Option<Decision> {
        self.is_ended(now).then(|| self.tally.winner())
    }

    pub fn status(&self, now: u64) -> ProposalStatus {
        if self.executed {
            ProposalStatus::Executed
        } else if !self.is_ended(now) {
            ProposalStatus::Open
        } else if self.tally.majority_for() {
            ProposalStatus::Passed
        } else {
            ProposalStatus::Failed
        }
    }

    /// Native currency locked by votes, before any payout
    pub fn locked_native_collateral(&self) -> GovernanceResult<Amount> {
        let locked = self
            .ledger
            .native_collateral_on(Decision::For)?
            .checked_add(self.ledger.native_collateral_on(Decision::Against)?)
            .ok_or(GovernanceError::ArithmeticOverflow)?;
        Ok(locked)
    }

    /// Votes bought by `value` of native collateral while the period is open
    pub fn check_native_vote(&self, now: u64, value: Amount) -> GovernanceResult<u64> {
        self.clock.ensure_open(now)?;
        self.ledger.units_for(value)
    }

    /// Record native votes validated by [`Proposal::check_native_vote`]
    pub fn apply_native_vote(&mut self, now: u64, voter: &Address, decision: Decision, units: u64) -> GovernanceResult<()> {
        self.ledger.record_native(voter, decision, units)?;
        self.tally.add(decision, units)?;
        self.clock.register_vote(now);
        debug!("{} cast {} native votes {} on {}", voter, units, decision, self.id);
        Ok(())
    }

    /// Whether a token vote from `voter` on `decision` would change anything.
    ///
    /// Fails once the period is over.
    pub fn check_token_vote(&self, now: u64, voter: &Address, decision: Decision) -> GovernanceResult<bool> {
        self.clock.ensure_open(now)?;
        Ok(!self.ledger.has_token_vote(voter, decision))
    }

    pub fn apply_token_vote(&mut self, now: u64, voter: &Address, decision: Decision, units: u64) -> GovernanceResult<()> {
        if !self.ledger.record_token(voter, decision, units) {
            return Ok(());
        }
        self.tally.add(decision, units)?;
        self.clock.register_vote(now);
        debug!("{} cast {} token votes {} on {}", voter, units, decision, self.id);
        Ok(())
    }

    /// Fail unless the proposal can be executed at `now`
    pub fn check_execution(&self, now: u64) -> GovernanceResult<()> {
        self.clock.ensure_ended(now)?;
        if self.executed {
            return Err(GovernanceError::AlreadyExecuted);
        }
        if !self.tally.majority_for() {
            return Err(GovernanceError::ProposalDidNotPass);
        }
        Ok(())
    }

    pub fn mark_executed(&mut self) {
        self.executed = true;
    }

    /// The creator's payout when they are the only address on the winning
    /// side and have not been paid yet
    pub fn creator_settlement_on_execute(&self, now: u64) -> GovernanceResult<Option<Payout>> {
        let Some(winner) = self.winning_side(now) else {
            return Ok(None);
        };
        let mut winners = self.ledger.voters_on(winner).map(|(voter, _)| voter);
        let sole_creator = winners.next() == Some(&self.sequencer) && winners.next().is_none();
        if !sole_creator || self.settlement.has_claimed(&self.sequencer) {
            return Ok(None);
        }
        self.settlement
            .quote(&self.ledger, &self.tally, winner, &self.sequencer)
            .map(Some)
    }

    /// What `voter` would receive by claiming at `now`
    pub fn check_claim(&self, now: u64, voter: &Address) -> GovernanceResult<Payout> {
        self.clock.ensure_ended(now)?;
        let winner = self.tally.winner();
        self.settlement.quote(&self.ledger, &self.tally, winner, voter)
    }

    /// Record a payout obtained from [`Proposal::check_claim`] or
    /// [`Proposal::creator_settlement_on_execute`]
    pub fn apply_claim(&mut self, payout: &Payout) {
        self.settlement.settle(payout);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dao_core::ether;

    const START: u64 = 1_700_000_000;

    fn params() -> DaoParams {
        DaoParams::erc20(Address::from_label("token"), 15, ether(1), ether(100))
    }

    fn open(creator_votes: u64) -> Proposal {
        Proposal::open(
            Address::from_label("proposal"),
            ProposalDraft {
                id: ProposalId::from("p-1"),
                merkle_root: MerkleRoot::digest(b"root"),
                payloads: Vec::new(),
            },
            Address::from_label("creator"),
            Address::from_label("dao"),
            Address::from_label("pool"),
            &params(),
            START,
            creator_votes,
        )
        .unwrap()
    }

    #[test]
    fn test_creator_vote_counts_in_favour() {
        let proposal = open(5);
        let record = proposal.votes(&Address::from_label("creator"));
        assert_eq!(record.native_for_votes, 5);
        assert_eq!(proposal.for_votes_counter(), 5);
        assert_eq!(proposal.against_votes_counter(), 0);
        assert_eq!(proposal.status(START), ProposalStatus::Open);
    }

    #[test]
    fn test_not_passed_before_end() {
        let proposal = open(1);
        assert!(!proposal.is_passed(START + 14));
        assert!(proposal.is_passed(START + 15));
        assert_eq!(proposal.status(START + 15), ProposalStatus::Passed);
    }

    #[test]
    fn test_votes_rejected_after_end() {
        let proposal = open(1);
        assert_eq!(
            proposal.check_native_vote(START + 15, ether(1)),
            Err(GovernanceError::NotInChallengePeriod)
        );
        assert_eq!(
            proposal.check_token_vote(START + 15, &Address::from_label("v"), Decision::For),
            Err(GovernanceError::NotInChallengePeriod)
        );
    }

    #[test]
    fn test_execution_checks() {
        let mut proposal = open(1);
        let voter = Address::from_label("voter");
        let units = proposal.check_native_vote(START + 1, ether(1)).unwrap();
        proposal.apply_native_vote(START + 1, &voter, Decision::Against, units).unwrap();

        assert_eq!(
            proposal.check_execution(START + 1),
            Err(GovernanceError::NotAfterChallengePeriod)
        );
        assert_eq!(
            proposal.check_execution(START + 15),
            Err(GovernanceError::ProposalDidNotPass)
        );
        assert_eq!(proposal.status(START + 15), ProposalStatus::Failed);
    }

    #[test]
    fn test_sole_creator_is_settled_on_execute() {
        let mut proposal = open(1);
        let creator = Address::from_label("creator");
        let payout = proposal.creator_settlement_on_execute(START + 15).unwrap().unwrap();
        assert_eq!(payout.total(), ether(1));

        proposal.apply_claim(&payout);
        proposal.mark_executed();
        assert_eq!(proposal.check_claim(START + 15, &creator), Err(GovernanceError::RewardNotApply));
        assert_eq!(proposal.check_execution(START + 15), Err(GovernanceError::AlreadyExecuted));
        assert_eq!(proposal.status(START + 15), ProposalStatus::Executed);
    }

    #[test]
    fn test_creator_not_settled_when_sharing_the_win() {
        let mut proposal = open(1);
        let voter = Address::from_label("voter");
        proposal.apply_native_vote(START + 1, &voter, Decision::For, 1).unwrap();
        assert_eq!(proposal.creator_settlement_on_execute(START + 15).unwrap(), None);
    }

    #[test]
    fn test_token_vote_repeat_is_idempotent() {
        let mut proposal = open(1);
        let voter = Address::from_label("voter");
        assert!(proposal.check_token_vote(START, &voter, Decision::For).unwrap());
        proposal.apply_token_vote(START, &voter, Decision::For, 5).unwrap();
        assert!(!proposal.check_token_vote(START, &voter, Decision::For).unwrap());
        proposal.apply_token_vote(START, &voter, Decision::For, 5).unwrap();
        assert_eq!(proposal.votes(&voter).token_for_votes, 5);
        assert_eq!(proposal.for_votes_counter(), 6);
    }
}
