//! Simulated ledger
//!
//! [`Chain`] is the single ordered execution environment every operation
//! runs in. It owns the clock, the asset registry, the DAO factories and
//! every deployed DAO. Each method is one transaction: it either applies in
//! full or returns an error with no state changed.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use dao_assets::{Assets, TokenId};
use dao_core::{Address, Amount, Clock, Decision, MerkleRoot, ProposalId};
use dao_pool::{PoolKind, Resolution};

use crate::dao::{Dao, DaoCreated, DaoFactory, ExecutionReceipt};
use crate::error::{GovernanceError, GovernanceResult};
use crate::execution::Payload;
use crate::params::DaoParams;
use crate::proposal::{Proposal, ProposalDraft, ProposalStatus};
use crate::settlement::Payout;

#[derive(Debug)]
pub struct Chain {
    clock: Arc<dyn Clock>,
    assets: Assets,
    erc20_factory: DaoFactory,
    nft_factory: DaoFactory,
    daos: HashMap<Address, Dao>,
    /// Proposal handle to owning DAO
    proposal_index: HashMap<Address, Address>,
}

impl Chain {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            assets: Assets::new(),
            erc20_factory: DaoFactory::new(PoolKind::Erc20),
            nft_factory: DaoFactory::new(PoolKind::Nft),
            daos: HashMap::new(),
            proposal_index: HashMap::new(),
        }
    }

    /// Current block time
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn factory(&self, kind: PoolKind) -> &DaoFactory {
        match kind {
            PoolKind::Erc20 => &self.erc20_factory,
            PoolKind::Nft => &self.nft_factory,
        }
    }

    /// Credit `account` with native currency
    pub fn fund(&mut self, account: &Address, amount: Amount) -> GovernanceResult<()> {
        self.assets.native.mint(account, amount)?;
        Ok(())
    }

    pub fn native_balance(&self, address: &Address) -> Amount {
        self.assets.native.balance_of(address)
    }

    /// Plain native transfer, e.g. funding a DAO treasury
    pub fn transfer_native(&mut self, from: &Address, to: &Address, amount: Amount) -> GovernanceResult<()> {
        self.assets.native.transfer(from, to, amount)?;
        Ok(())
    }

    pub fn deploy_erc20(&mut self, deployer: &Address, name: &str, symbol: &str, decimals: u32, supply: Amount) -> Address {
        self.assets.deploy_erc20(deployer, name, symbol, decimals, supply)
    }

    pub fn deploy_erc721(&mut self, deployer: &Address, name: &str, symbol: &str) -> Address {
        self.assets.deploy_erc721(deployer, name, symbol)
    }

    pub fn erc20_balance(&self, token: &Address, holder: &Address) -> GovernanceResult<Amount> {
        Ok(self.assets.erc20(token)?.balance_of(holder))
    }

    pub fn erc20_transfer(&mut self, caller: &Address, token: &Address, to: &Address, amount: Amount) -> GovernanceResult<()> {
        self.assets.erc20_mut(token)?.transfer(caller, to, amount)?;
        Ok(())
    }

    pub fn erc20_approve(&mut self, caller: &Address, token: &Address, spender: &Address, amount: Amount) -> GovernanceResult<()> {
        self.assets.erc20_mut(token)?.approve(caller, spender, amount);
        Ok(())
    }

    pub fn mint_nft(&mut self, token: &Address, to: &Address) -> GovernanceResult<TokenId> {
        Ok(self.assets.erc721_mut(token)?.mint(to))
    }

    pub fn nft_owner(&self, token: &Address, token_id: TokenId) -> GovernanceResult<Address> {
        Ok(self.assets.erc721(token)?.owner_of(token_id)?.clone())
    }

    pub fn nft_balance(&self, token: &Address, holder: &Address) -> GovernanceResult<u64> {
        Ok(self.assets.erc721(token)?.balance_of(holder))
    }

    pub fn nft_approve(&mut self, caller: &Address, token: &Address, spender: &Address, token_id: TokenId) -> GovernanceResult<()> {
        self.assets.erc721_mut(token)?.approve(caller, spender, token_id)?;
        Ok(())
    }

    pub fn nft_transfer(&mut self, caller: &Address, token: &Address, to: &Address, token_id: TokenId) -> GovernanceResult<()> {
        self.assets
            .erc721_mut(token)?
            .transfer_from(caller, caller, to, token_id)?;
        Ok(())
    }

    /// Deploy a DAO and its pool through the factory for `params.kind`
    pub fn create_dao(&mut self, creator: &Address, params: DaoParams) -> GovernanceResult<DaoCreated> {
        match params.kind {
            PoolKind::Erc20 => {
                self.assets.erc20(&params.governance_token)?;
            }
            PoolKind::Nft => {
                self.assets.erc721(&params.governance_token)?;
            }
        }
        let factory = match params.kind {
            PoolKind::Erc20 => &mut self.erc20_factory,
            PoolKind::Nft => &mut self.nft_factory,
        };
        let (dao, created) = factory.create_dao(creator, params)?;
        self.daos.insert(created.dao.clone(), dao);
        Ok(created)
    }

    pub fn dao(&self, dao: &Address) -> GovernanceResult<&Dao> {
        self.daos
            .get(dao)
            .ok_or_else(|| GovernanceError::DaoNotFound(dao.to_string()))
    }

    fn dao_mut<'a>(daos: &'a mut HashMap<Address, Dao>, dao: &Address) -> GovernanceResult<&'a mut Dao> {
        daos.get_mut(dao)
            .ok_or_else(|| GovernanceError::DaoNotFound(dao.to_string()))
    }

    pub fn daos(&self) -> impl Iterator<Item = &Dao> {
        self.daos.values()
    }

    pub fn deposit(&mut self, dao: &Address, caller: &Address, amount: Amount) -> GovernanceResult<()> {
        Self::dao_mut(&mut self.daos, dao)?.deposit(&mut self.assets, caller, amount)
    }

    pub fn deposit_nft(&mut self, dao: &Address, caller: &Address, token_id: TokenId) -> GovernanceResult<()> {
        Self::dao_mut(&mut self.daos, dao)?.deposit_nft(&mut self.assets, caller, token_id)
    }

    pub fn withdraw(&mut self, dao: &Address, caller: &Address, amount: Amount, recipient: &Address) -> GovernanceResult<()> {
        Self::dao_mut(&mut self.daos, dao)?.withdraw(&mut self.assets, caller, amount, recipient)
    }

    pub fn withdraw_nft(
        &mut self,
        dao: &Address,
        caller: &Address,
        token_id: TokenId,
        recipient: &Address,
    ) -> GovernanceResult<()> {
        Self::dao_mut(&mut self.daos, dao)?.withdraw_nft(&mut self.assets, caller, token_id, recipient)
    }

    fn owning_dao(&self, proposal: &Address) -> GovernanceResult<Address> {
        self.proposal_index
            .get(proposal)
            .cloned()
            .ok_or_else(|| GovernanceError::ProposalNotFound(proposal.to_string()))
    }

    /// Open a proposal on `dao`; returns its handle
    pub fn create_proposal(
        &mut self,
        dao: &Address,
        caller: &Address,
        id: ProposalId,
        merkle_root: MerkleRoot,
        payloads: Vec<Payload>,
        value: Amount,
    ) -> GovernanceResult<Address> {
        let now = self.now();
        let draft = ProposalDraft {
            id,
            merkle_root,
            payloads,
        };
        let handle = Self::dao_mut(&mut self.daos, dao)?.create_proposal(&mut self.assets, now, caller, draft, value)?;
        self.proposal_index.insert(handle.clone(), dao.clone());
        Ok(handle)
    }

    pub fn proposal(&self, proposal: &Address) -> GovernanceResult<&Proposal> {
        let dao = self.owning_dao(proposal)?;
        self.dao(&dao)?.proposal(proposal)
    }

    pub fn vote(&mut self, proposal: &Address, caller: &Address, decision: Decision, value: Amount) -> GovernanceResult<u64> {
        let now = self.now();
        let dao = self.owning_dao(proposal)?;
        Self::dao_mut(&mut self.daos, &dao)?.vote(&mut self.assets, now, proposal, caller, decision, value)
    }

    pub fn vote_with_token(&mut self, proposal: &Address, caller: &Address, decision: Decision) -> GovernanceResult<u64> {
        let now = self.now();
        let dao = self.owning_dao(proposal)?;
        Self::dao_mut(&mut self.daos, &dao)?.vote_with_token(now, proposal, caller, decision)
    }

    pub fn execute_proposal(&mut self, proposal: &Address, caller: &Address) -> GovernanceResult<ExecutionReceipt> {
        let now = self.now();
        let dao = self.owning_dao(proposal)?;
        Self::dao_mut(&mut self.daos, &dao)?.execute_proposal(&mut self.assets, now, proposal, caller)
    }

    pub fn claim_reward(&mut self, proposal: &Address, caller: &Address) -> GovernanceResult<Payout> {
        let now = self.now();
        let dao = self.owning_dao(proposal)?;
        Self::dao_mut(&mut self.daos, &dao)?.claim_reward(&mut self.assets, now, proposal, caller)
    }

    /// Resolve `proposal` on the pool of the DAO that owns it
    pub fn resolve_proposal(&mut self, proposal: &Address) -> GovernanceResult<Resolution> {
        let now = self.now();
        let dao = self.owning_dao(proposal)?;
        let resolution = Self::dao_mut(&mut self.daos, &dao)?.resolve_proposal(&mut self.assets, now, proposal)?;
        info!("Pool of DAO {} resolved proposal {}", dao, proposal);
        Ok(resolution)
    }

    pub fn is_ended(&self, proposal: &Address) -> GovernanceResult<bool> {
        Ok(self.proposal(proposal)?.is_ended(self.now()))
    }

    pub fn is_passed(&self, proposal: &Address) -> GovernanceResult<bool> {
        Ok(self.proposal(proposal)?.is_passed(self.now()))
    }

    pub fn proposal_status(&self, proposal: &Address) -> GovernanceResult<ProposalStatus> {
        Ok(self.proposal(proposal)?.status(self.now()))
    }
}
