//! DAO pools
//!
//! A pool takes custody of governance assets (fungible tokens or NFTs) and
//! turns deposits into voting weight. Approved proposals record votes with
//! the pool; each vote locks the voter's deposit until the proposal is
//! resolved, at which point the losing side's deposits move to the DAO
//! treasury.

use serde::{Deserialize, Serialize};

use dao_assets::Assets;
use dao_core::{Address, Amount, Decision};

pub mod book;
pub mod erc20_pool;
pub mod error;
pub mod nft_pool;

pub use book::{ProposalBook, Resolution};
pub use erc20_pool::Erc20DaoPool;
pub use error::{PoolError, PoolResult};
pub use nft_pool::NftDaoPool;

/// Operations common to every pool kind
pub trait DaoPool {
    /// Pool contract address
    fn address(&self) -> &Address;

    /// Account allowed to approve proposals
    fn owner(&self) -> &Address;

    /// Asset contract whose deposits carry voting weight
    fn governance_token(&self) -> &Address;

    /// Deposited balance of `voter` (token base units, or NFT count)
    fn balance_of(&self, voter: &Address) -> Amount;

    fn book(&self) -> &ProposalBook;

    fn book_mut(&mut self) -> &mut ProposalBook;

    /// Allow `proposal` to record votes
    fn approve_proposal(&mut self, caller: &Address, proposal: &Address) -> PoolResult<()> {
        if caller != self.owner() {
            return Err(PoolError::NotPoolOwner);
        }
        self.book_mut().approve(proposal);
        Ok(())
    }

    fn is_approved(&self, proposal: &Address) -> bool {
        self.book().is_approved(proposal)
    }

    /// Approved and not yet resolved proposals, sorted
    fn approved_proposals(&self) -> Vec<Address> {
        let mut approved: Vec<Address> = self.book().approved_proposals().cloned().collect();
        approved.sort();
        approved
    }

    /// Record a vote; `proposal` is the calling proposal contract
    fn vote(&mut self, proposal: &Address, voter: &Address, decision: Decision) -> PoolResult<()> {
        self.book_mut().record_vote(proposal, voter, decision)
    }

    fn voter_active_proposals(&self, voter: &Address) -> u64 {
        self.book().active_proposals(voter)
    }

    fn proposal_for_voters(&self, proposal: &Address) -> Vec<Address> {
        self.book().for_voters(proposal).to_vec()
    }

    fn proposal_against_voters(&self, proposal: &Address) -> Vec<Address> {
        self.book().against_voters(proposal).to_vec()
    }

    /// Whole votes `voter` may cast when each vote costs `unit`
    fn voting_units(&self, voter: &Address, unit: Amount) -> u64 {
        if unit == 0 {
            return 0;
        }
        u64::try_from(self.balance_of(voter) / unit).unwrap_or(u64::MAX)
    }
}

/// Kind of governance asset a pool accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    Erc20,
    Nft,
}

impl Default for PoolKind {
    fn default() -> Self {
        Self::Erc20
    }
}

/// A pool of either kind, as owned by a DAO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Pool {
    Erc20(Erc20DaoPool),
    Nft(NftDaoPool),
}

impl Pool {
    /// Create an empty pool of `kind`
    pub fn new(kind: PoolKind, address: Address, owner: Address, token: Address) -> Self {
        match kind {
            PoolKind::Erc20 => Self::Erc20(Erc20DaoPool::new(address, owner, token)),
            PoolKind::Nft => Self::Nft(NftDaoPool::new(address, owner, token)),
        }
    }

    pub fn kind(&self) -> PoolKind {
        match self {
            Self::Erc20(_) => PoolKind::Erc20,
            Self::Nft(_) => PoolKind::Nft,
        }
    }

    pub fn as_dao_pool(&self) -> &dyn DaoPool {
        match self {
            Self::Erc20(pool) => pool,
            Self::Nft(pool) => pool,
        }
    }

    pub fn as_dao_pool_mut(&mut self) -> &mut dyn DaoPool {
        match self {
            Self::Erc20(pool) => pool,
            Self::Nft(pool) => pool,
        }
    }

    /// Resolve `proposal` against the pool's own governance token
    pub fn resolve_proposal(
        &mut self,
        assets: &mut Assets,
        proposal: &Address,
        ended: bool,
        winner: Decision,
        treasury: &Address,
    ) -> PoolResult<Resolution> {
        match self {
            Self::Erc20(pool) => {
                let token = assets.erc20_mut(pool.governance_token())?;
                pool.resolve_proposal(token, proposal, ended, winner, treasury)
            }
            Self::Nft(pool) => {
                let nft = assets.erc721_mut(pool.governance_token())?;
                pool.resolve_proposal(nft, proposal, ended, winner, treasury)
            }
        }
    }
}
