//! Native currency balances

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use dao_core::{format_units, Address, Amount, DEFAULT_DECIMALS};

use crate::error::{AssetError, AssetResult};

/// Native currency held by every account and contract
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NativeBank {
    /// Balance per address in wei
    balances: HashMap<Address, Amount>,
}

impl NativeBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `address`, zero when never funded
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or_default()
    }

    /// Check whether `address` can pay `amount`
    pub fn can_debit(&self, address: &Address, amount: Amount) -> bool {
        self.balance_of(address) >= amount
    }

    /// Create currency out of thin air, used to fund test accounts
    pub fn mint(&mut self, to: &Address, amount: Amount) -> AssetResult<()> {
        let balance = self.balances.entry(to.clone()).or_default();
        *balance = balance.checked_add(amount).ok_or(AssetError::Overflow)?;
        Ok(())
    }

    /// Move `amount` from one address to another
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> AssetResult<()> {
        if !self.can_debit(from, amount) {
            return Err(AssetError::InsufficientFunds(format!(
                "{} holds {} but {} is required",
                from,
                format_units(self.balance_of(from), DEFAULT_DECIMALS),
                format_units(amount, DEFAULT_DECIMALS)
            )));
        }
        if amount == 0 || from == to {
            return Ok(());
        }
        self.balance_of(to)
            .checked_add(amount)
            .ok_or(AssetError::Overflow)?;

        if let Some(balance) = self.balances.get_mut(from) {
            *balance -= amount;
        }
        *self.balances.entry(to.clone()).or_default() += amount;
        debug!("Native transfer of {} from {} to {}", amount, from, to);
        Ok(())
    }
}
