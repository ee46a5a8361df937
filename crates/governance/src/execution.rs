//! Proposal execution
//!
//! This module provides the payloads a proposal carries and the treasury
//! capability they are executed against.

use serde::{Deserialize, Serialize};
use tracing::info;

use dao_assets::{Assets, TokenId};
use dao_core::{Address, Amount};

use crate::error::GovernanceResult;

/// A treasury action encoded in a proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    /// Transfer fungible tokens held by the DAO
    SendErc20 {
        token: Address,
        to: Address,
        amount: Amount,
    },
    /// Transfer an NFT held by the DAO
    SendNft {
        token: Address,
        to: Address,
        token_id: TokenId,
    },
    /// Transfer native currency held by the DAO
    SendNative { to: Address, amount: Amount },
}

impl Payload {
    /// Run this payload against `treasury`
    pub fn apply(&self, treasury: &mut dyn DaoTreasury) -> GovernanceResult<()> {
        match self {
            Payload::SendErc20 { token, to, amount } => treasury.send_erc20(token, to, *amount),
            Payload::SendNft { token, to, token_id } => treasury.send_nft(token, to, *token_id),
            Payload::SendNative { to, amount } => treasury.send_native(to, *amount),
        }
    }
}

/// Narrow capability a proposal uses to move DAO holdings
pub trait DaoTreasury {
    /// Address holding the treasury assets
    fn address(&self) -> &Address;

    fn send_erc20(&mut self, token: &Address, to: &Address, amount: Amount) -> GovernanceResult<()>;

    fn send_nft(&mut self, token: &Address, to: &Address, token_id: TokenId) -> GovernanceResult<()>;

    fn send_native(&mut self, to: &Address, amount: Amount) -> GovernanceResult<()>;
}

/// Treasury backed by the DAO's balances in the asset registry
pub struct AssetTreasury<'a> {
    dao: &'a Address,
    assets: &'a mut Assets,
}

impl<'a> AssetTreasury<'a> {
    pub fn new(dao: &'a Address, assets: &'a mut Assets) -> Self {
        Self { dao, assets }
    }
}

impl DaoTreasury for AssetTreasury<'_> {
    fn address(&self) -> &Address {
        self.dao
    }

    fn send_erc20(&mut self, token: &Address, to: &Address, amount: Amount) -> GovernanceResult<()> {
        self.assets.erc20_mut(token)?.transfer(self.dao, to, amount)?;
        info!("Treasury {} sent {} of token {} to {}", self.dao, amount, token, to);
        Ok(())
    }

    fn send_nft(&mut self, token: &Address, to: &Address, token_id: TokenId) -> GovernanceResult<()> {
        self.assets
            .erc721_mut(token)?
            .transfer_from(self.dao, self.dao, to, token_id)?;
        info!("Treasury {} sent NFT {} #{} to {}", self.dao, token, token_id, to);
        Ok(())
    }

    fn send_native(&mut self, to: &Address, amount: Amount) -> GovernanceResult<()> {
        self.assets.native.transfer(self.dao, to, amount)?;
        info!("Treasury {} sent {} wei to {}", self.dao, amount, to);
        Ok(())
    }
}

/// Apply `payloads` in order as one batch, followed by `settle`.
///
/// Everything runs against a copy of the registry which replaces the
/// original only when every payload and `settle` succeed.
pub fn execute_payloads<F>(dao: &Address, assets: &mut Assets, payloads: &[Payload], settle: F) -> GovernanceResult<()>
where
    F: FnOnce(&mut Assets) -> GovernanceResult<()>,
{
    let mut staged = assets.clone();
    let mut treasury = AssetTreasury::new(dao, &mut staged);
    for payload in payloads {
        payload.apply(&mut treasury)?;
    }
    settle(&mut staged)?;
    *assets = staged;
    Ok(())
}
