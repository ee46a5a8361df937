//! Non-fungible token registry

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use dao_core::Address;

use crate::error::{AssetError, AssetResult};

/// Identifier of a single NFT
pub type TokenId = u64;

/// An ERC-721 style collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Erc721Token {
    /// Contract address
    pub address: Address,
    /// Collection name
    pub name: String,
    /// Collection symbol
    pub symbol: String,
    /// Owner per minted token
    owners: BTreeMap<TokenId, Address>,
    /// Single-token approvals
    approvals: HashMap<TokenId, Address>,
    /// Last minted id
    last_token_id: TokenId,
}

impl Erc721Token {
    pub fn new(address: Address, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            address,
            name: name.into(),
            symbol: symbol.into(),
            owners: BTreeMap::new(),
            approvals: HashMap::new(),
            last_token_id: 0,
        }
    }

    /// Mint the next token to `to`. Ids start at 1.
    pub fn mint(&mut self, to: &Address) -> TokenId {
        self.last_token_id += 1;
        self.owners.insert(self.last_token_id, to.clone());
        debug!("Minted {} #{} to {}", self.symbol, self.last_token_id, to);
        self.last_token_id
    }

    pub fn owner_of(&self, token_id: TokenId) -> AssetResult<&Address> {
        self.owners.get(&token_id).ok_or(AssetError::InvalidTokenId)
    }

    pub fn balance_of(&self, holder: &Address) -> u64 {
        self.owners.values().filter(|owner| *owner == holder).count() as u64
    }

    /// All token ids held by `holder`, ascending
    pub fn tokens_of(&self, holder: &Address) -> Vec<TokenId> {
        self.owners
            .iter()
            .filter(|(_, owner)| *owner == holder)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn get_approved(&self, token_id: TokenId) -> Option<&Address> {
        self.approvals.get(&token_id)
    }

    /// Approve `spender` to move `token_id`; only the owner may approve
    pub fn approve(&mut self, caller: &Address, spender: &Address, token_id: TokenId) -> AssetResult<()> {
        if self.owner_of(token_id)? != caller {
            return Err(AssetError::NotTokenOwnerOrApproved);
        }
        self.approvals.insert(token_id, spender.clone());
        Ok(())
    }

    /// Move `token_id` from `from` to `to` on behalf of `caller`
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        token_id: TokenId,
    ) -> AssetResult<()> {
        let owner = self.owner_of(token_id)?.clone();
        let approved = self.approvals.get(&token_id) == Some(caller);
        if &owner != caller && !approved {
            return Err(AssetError::NotTokenOwnerOrApproved);
        }
        if &owner != from {
            return Err(AssetError::TransferFromIncorrectOwner);
        }

        self.approvals.remove(&token_id);
        self.owners.insert(token_id, to.clone());
        debug!("{} #{} moved from {} to {}", self.symbol, token_id, from, to);
        Ok(())
    }
}
