//! NFT governance pool: one deposited token is one unit of voting weight

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use dao_assets::{AssetError, Erc721Token, TokenId};
use dao_core::{Address, Amount, Decision};

use crate::book::{ProposalBook, Resolution};
use crate::error::{PoolError, PoolResult};
use crate::DaoPool;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NftDaoPool {
    /// Pool contract address, the custodian of deposited NFTs
    address: Address,
    /// Account allowed to approve proposals
    owner: Address,
    /// Governance NFT collection
    token: Address,
    /// Deposited token ids per voter
    holdings: HashMap<Address, BTreeSet<TokenId>>,
    /// Vote bookkeeping
    book: ProposalBook,
}

impl NftDaoPool {
    pub fn new(address: Address, owner: Address, token: Address) -> Self {
        Self {
            address,
            owner,
            token,
            holdings: HashMap::new(),
            book: ProposalBook::default(),
        }
    }

    /// Token ids deposited by `voter`
    pub fn tokens_of(&self, voter: &Address) -> Vec<TokenId> {
        self.holdings
            .get(voter)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Take custody of `token_id`; the pool must be approved for it
    pub fn deposit(&mut self, nft: &mut Erc721Token, caller: &Address, token_id: TokenId) -> PoolResult<()> {
        nft.transfer_from(&self.address, caller, &self.address, token_id)?;
        self.holdings.entry(caller.clone()).or_default().insert(token_id);
        debug!("{} deposited NFT #{} into pool {}", caller, token_id, self.address);
        Ok(())
    }

    pub fn withdraw(
        &mut self,
        nft: &mut Erc721Token,
        caller: &Address,
        token_id: TokenId,
        recipient: &Address,
    ) -> PoolResult<()> {
        let owned = self
            .holdings
            .get(caller)
            .map(|ids| ids.contains(&token_id))
            .unwrap_or(false);
        if !owned {
            return Err(PoolError::TokenNotFound);
        }
        if self.book.active_proposals(caller) > 0 {
            return Err(PoolError::UserHasActiveProposals);
        }

        nft.transfer_from(&self.address, &self.address, recipient, token_id)?;
        if let Some(ids) = self.holdings.get_mut(caller) {
            ids.remove(&token_id);
            if ids.is_empty() {
                self.holdings.remove(caller);
            }
        }
        debug!("{} withdrew NFT #{} to {}", caller, token_id, recipient);
        Ok(())
    }

    /// Close out `proposal`, moving every NFT held for a losing voter to
    /// `treasury`.
    pub fn resolve_proposal(
        &mut self,
        nft: &mut Erc721Token,
        proposal: &Address,
        ended: bool,
        winner: Decision,
        treasury: &Address,
    ) -> PoolResult<Resolution> {
        self.book.ensure_resolvable(proposal, ended)?;

        let pending = Resolution {
            for_voters: self.book.for_voters(proposal).to_vec(),
            against_voters: self.book.against_voters(proposal).to_vec(),
        };
        let losers = pending.losers(winner);
        let forfeited: Vec<TokenId> = losers.iter().flat_map(|voter| self.tokens_of(voter)).collect();

        // every forfeited id must still sit in custody before anything moves
        for token_id in &forfeited {
            if nft.owner_of(*token_id)? != &self.address {
                return Err(PoolError::Asset(AssetError::TransferFromIncorrectOwner));
            }
        }
        for token_id in &forfeited {
            nft.transfer_from(&self.address, &self.address, treasury, *token_id)?;
        }
        for voter in &losers {
            self.holdings.remove(voter);
        }

        let resolution = self.book.take_resolution(proposal);
        info!(
            "Resolved proposal {} on NFT pool {}: {} NFTs forfeited",
            proposal,
            self.address,
            forfeited.len()
        );
        Ok(resolution)
    }
}

impl DaoPool for NftDaoPool {
    fn address(&self) -> &Address {
        &self.address
    }

    fn owner(&self) -> &Address {
        &self.owner
    }

    fn governance_token(&self) -> &Address {
        &self.token
    }

    fn balance_of(&self, voter: &Address) -> Amount {
        self.holdings.get(voter).map(|ids| ids.len() as Amount).unwrap_or_default()
    }

    fn book(&self) -> &ProposalBook {
        &self.book
    }

    fn book_mut(&mut self) -> &mut ProposalBook {
        &mut self.book
    }
}
