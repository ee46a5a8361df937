//! DAO aggregate
//!
//! A [`Dao`] owns its pool and every proposal created under it. Proposals
//! refer back to the DAO and pool by address only. All operations take the
//! asset registry explicitly and either complete fully or leave every
//! balance and record untouched.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use dao_assets::{Assets, TokenId};
use dao_core::{Address, Amount, Decision, ProposalId};
use dao_pool::{DaoPool, Pool, PoolError, PoolKind, Resolution};

use crate::error::{GovernanceError, GovernanceResult};
use crate::execution::execute_payloads;
use crate::params::DaoParams;
use crate::proposal::{Proposal, ProposalDraft};
use crate::settlement::Payout;
use crate::voting::CollateralLedger;

pub mod factory;

pub use factory::{DaoCreated, DaoFactory};

/// Outcome of a successful execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReceipt {
    /// Executed proposal
    pub proposal: Address,
    /// Number of payloads applied
    pub payloads_applied: usize,
    /// Creator reward paid as part of execution, if any
    pub creator_payout: Option<Payout>,
}

#[derive(Debug, Clone)]
pub struct Dao {
    /// DAO address, also the treasury holding its assets
    address: Address,
    params: DaoParams,
    pool: Pool,
    proposals: HashMap<ProposalId, Proposal>,
    /// Proposal handle to id
    handles: HashMap<Address, ProposalId>,
}

impl Dao {
    pub fn new(address: Address, params: DaoParams, pool: Pool) -> Self {
        Self {
            address,
            params,
            pool,
            proposals: HashMap::new(),
            handles: HashMap::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn params(&self) -> &DaoParams {
        &self.params
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    pub fn proposal_by_id(&self, id: &ProposalId) -> Option<&Proposal> {
        self.proposals.get(id)
    }

    pub fn proposal(&self, handle: &Address) -> GovernanceResult<&Proposal> {
        self.handles
            .get(handle)
            .and_then(|id| self.proposals.get(id))
            .ok_or_else(|| GovernanceError::ProposalNotFound(handle.to_string()))
    }

    fn proposal_mut(&mut self, handle: &Address) -> GovernanceResult<&mut Proposal> {
        self.handles
            .get(handle)
            .and_then(|id| self.proposals.get_mut(id))
            .ok_or_else(|| GovernanceError::ProposalNotFound(handle.to_string()))
    }

    /// Handle a proposal with `id` gets under this DAO
    pub fn proposal_address(&self, id: &ProposalId) -> Address {
        let mut seed = self.address.as_str().as_bytes().to_vec();
        seed.extend_from_slice(id.as_bytes());
        Address::derive("proposal", &seed)
    }

    /// Open a proposal; `value` is the creator's native collateral and
    /// counts as their vote in favour.
    pub fn create_proposal(
        &mut self,
        assets: &mut Assets,
        now: u64,
        caller: &Address,
        draft: ProposalDraft,
        value: Amount,
    ) -> GovernanceResult<Address> {
        if self.proposals.contains_key(&draft.id) {
            warn!("Rejected duplicate proposal id {}", draft.id);
            return Err(GovernanceError::DuplicateProposalId(draft.id.to_string()));
        }
        let units = CollateralLedger::new(self.params.native_collateral).units_for(value)?;

        let handle = self.proposal_address(&draft.id);
        let id = draft.id.clone();
        let proposal = Proposal::open(
            handle.clone(),
            draft,
            caller.clone(),
            self.address.clone(),
            self.pool.as_dao_pool().address().clone(),
            &self.params,
            now,
            units,
        )?;

        assets.native.transfer(caller, &handle, value)?;
        // the DAO owns its pool, so approval goes straight to the book
        self.pool.as_dao_pool_mut().book_mut().approve(&handle);
        self.proposals.insert(id.clone(), proposal);
        self.handles.insert(handle.clone(), id.clone());

        info!(
            "Created proposal {} at {} on DAO {} by {} ({} votes)",
            id, handle, self.address, caller, units
        );
        Ok(handle)
    }

    /// Native-collateral vote; returns the votes added
    pub fn vote(
        &mut self,
        assets: &mut Assets,
        now: u64,
        handle: &Address,
        caller: &Address,
        decision: Decision,
        value: Amount,
    ) -> GovernanceResult<u64> {
        let proposal = self.proposal_mut(handle)?;
        let units = proposal.check_native_vote(now, value)?;

        let mut next = proposal.clone();
        next.apply_native_vote(now, caller, decision, units)?;
        assets.native.transfer(caller, handle, value)?;
        *proposal = next;
        Ok(units)
    }

    /// Pool-weighted vote; returns the voter's token votes on `decision`.
    ///
    /// Repeating a vote on the same side changes nothing.
    pub fn vote_with_token(
        &mut self,
        now: u64,
        handle: &Address,
        caller: &Address,
        decision: Decision,
    ) -> GovernanceResult<u64> {
        let id = self
            .handles
            .get(handle)
            .cloned()
            .ok_or_else(|| GovernanceError::ProposalNotFound(handle.to_string()))?;
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or_else(|| GovernanceError::ProposalNotFound(handle.to_string()))?;
        let pool = self.pool.as_dao_pool_mut();

        let fresh = proposal.check_token_vote(now, caller, decision)?;
        if !pool.is_approved(handle) {
            return Err(PoolError::ProposalNotApproved.into());
        }
        let units = pool.voting_units(caller, self.params.token_collateral);
        if units == 0 {
            return Err(GovernanceError::InsufficientPoolBalance);
        }
        if !fresh {
            debug!("Ignoring repeated {} token vote by {} on {}", decision, caller, id);
            return Ok(proposal.votes(caller).token_on(decision));
        }

        let mut next = proposal.clone();
        next.apply_token_vote(now, caller, decision, units)?;
        pool.vote(handle, caller, decision)?;
        *proposal = next;
        Ok(units)
    }

    /// Apply the proposal's payloads against the treasury
    pub fn execute_proposal(
        &mut self,
        assets: &mut Assets,
        now: u64,
        handle: &Address,
        caller: &Address,
    ) -> GovernanceResult<ExecutionReceipt> {
        let dao_address = self.address.clone();
        let proposal = self.proposal_mut(handle)?;
        proposal.check_execution(now)?;
        let creator_payout = proposal.creator_settlement_on_execute(now)?;

        execute_payloads(&dao_address, assets, proposal.payloads(), |staged| {
            if let Some(payout) = &creator_payout {
                staged.native.transfer(handle, &payout.voter, payout.total())?;
            }
            Ok(())
        })?;

        proposal.mark_executed();
        if let Some(payout) = &creator_payout {
            proposal.apply_claim(payout);
        }
        info!(
            "Executed proposal {} ({} payloads) requested by {}",
            proposal.id(),
            proposal.payloads().len(),
            caller
        );
        Ok(ExecutionReceipt {
            proposal: handle.clone(),
            payloads_applied: proposal.payloads().len(),
            creator_payout,
        })
    }

    /// Pay `caller` their settlement share
    pub fn claim_reward(
        &mut self,
        assets: &mut Assets,
        now: u64,
        handle: &Address,
        caller: &Address,
    ) -> GovernanceResult<Payout> {
        let proposal = self.proposal_mut(handle)?;
        let payout = proposal.check_claim(now, caller)?;
        assets.native.transfer(handle, caller, payout.total())?;
        proposal.apply_claim(&payout);
        info!(
            "{} claimed {} (refund {}, reward {}) from proposal {}",
            caller,
            payout.total(),
            payout.collateral_refund,
            payout.reward,
            proposal.id()
        );
        Ok(payout)
    }

    /// Release pool voters of `handle` and forfeit the losers' deposits
    pub fn resolve_proposal(
        &mut self,
        assets: &mut Assets,
        now: u64,
        handle: &Address,
    ) -> GovernanceResult<Resolution> {
        let (ended, winner) = match self.proposal(handle) {
            Ok(proposal) => (
                proposal.is_ended(now),
                proposal.winning_side(now).unwrap_or(Decision::Against),
            ),
            Err(_) => (false, Decision::Against),
        };
        let treasury = self.address.clone();
        Ok(self.pool.resolve_proposal(assets, handle, ended, winner, &treasury)?)
    }

    /// Deposit governance tokens into an ERC-20 pool
    pub fn deposit(&mut self, assets: &mut Assets, caller: &Address, amount: Amount) -> GovernanceResult<()> {
        match &mut self.pool {
            Pool::Erc20(pool) => {
                let token = assets.erc20_mut(pool.governance_token())?;
                Ok(pool.deposit(token, caller, amount)?)
            }
            Pool::Nft(_) => Err(GovernanceError::PoolKindMismatch(format!("{:?}", PoolKind::Nft))),
        }
    }

    /// Deposit one governance NFT into an NFT pool
    pub fn deposit_nft(&mut self, assets: &mut Assets, caller: &Address, token_id: TokenId) -> GovernanceResult<()> {
        match &mut self.pool {
            Pool::Nft(pool) => {
                let nft = assets.erc721_mut(pool.governance_token())?;
                Ok(pool.deposit(nft, caller, token_id)?)
            }
            Pool::Erc20(_) => Err(GovernanceError::PoolKindMismatch(format!("{:?}", PoolKind::Erc20))),
        }
    }

    pub fn withdraw(
        &mut self,
        assets: &mut Assets,
        caller: &Address,
        amount: Amount,
        recipient: &Address,
    ) -> GovernanceResult<()> {
        match &mut self.pool {
            Pool::Erc20(pool) => {
                let token = assets.erc20_mut(pool.governance_token())?;
                Ok(pool.withdraw(token, caller, amount, recipient)?)
            }
            Pool::Nft(_) => Err(GovernanceError::PoolKindMismatch(format!("{:?}", PoolKind::Nft))),
        }
    }

    pub fn withdraw_nft(
        &mut self,
        assets: &mut Assets,
        caller: &Address,
        token_id: TokenId,
        recipient: &Address,
    ) -> GovernanceResult<()> {
        match &mut self.pool {
            Pool::Nft(pool) => {
                let nft = assets.erc721_mut(pool.governance_token())?;
                Ok(pool.withdraw(nft, caller, token_id, recipient)?)
            }
            Pool::Erc20(_) => Err(GovernanceError::PoolKindMismatch(format!("{:?}", PoolKind::Erc20))),
        }
    }
}
