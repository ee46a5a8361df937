//! Fungible token ledger with allowances

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use dao_core::{Address, Amount};

use crate::error::{AssetError, AssetResult};

/// An ERC-20 style token contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Erc20Token {
    /// Contract address
    pub address: Address,
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Number of decimals
    pub decimals: u32,
    /// Total minted supply
    pub total_supply: Amount,
    /// Balance per holder
    balances: HashMap<Address, Amount>,
    /// owner -> spender -> remaining allowance
    allowances: HashMap<Address, HashMap<Address, Amount>>,
}

impl Erc20Token {
    /// Deploy a token and mint the whole supply to `deployer`
    pub fn new(
        address: Address,
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u32,
        initial_supply: Amount,
        deployer: &Address,
    ) -> Self {
        let mut balances = HashMap::new();
        balances.insert(deployer.clone(), initial_supply);
        Self {
            address,
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            total_supply: initial_supply,
            balances,
            allowances: HashMap::new(),
        }
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or_default()
    }

    /// Set the allowance of `spender` over `owner`'s tokens
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
    }

    /// Transfer from the caller's own balance
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> AssetResult<()> {
        if self.balance_of(from) < amount {
            return Err(AssetError::TransferAmountExceedsBalance);
        }
        if from == to || amount == 0 {
            return Ok(());
        }
        self.balance_of(to)
            .checked_add(amount)
            .ok_or(AssetError::Overflow)?;

        if let Some(balance) = self.balances.get_mut(from) {
            *balance -= amount;
        }
        *self.balances.entry(to.clone()).or_default() += amount;
        debug!("{} transfer of {} from {} to {}", self.symbol, amount, from, to);
        Ok(())
    }

    /// Transfer on behalf of `from`, spending `spender`'s allowance
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> AssetResult<()> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(AssetError::InsufficientAllowance);
        }
        self.transfer(from, to, amount)?;
        self.approve(from, spender, allowed - amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dao_core::ether;

    fn token(deployer: &Address) -> Erc20Token {
        Erc20Token::new(
            Address::derive("erc20", b"test"),
            "Gov",
            "GOV",
            18,
            ether(1_000),
            deployer,
        )
    }

    #[test]
    fn test_supply_minted_to_deployer() {
        let owner = Address::from_label("owner");
        let token = token(&owner);
        assert_eq!(token.balance_of(&owner), ether(1_000));
        assert_eq!(token.total_supply, ether(1_000));
    }

    #[test]
    fn test_transfer_from_requires_allowance() {
        let owner = Address::from_label("owner");
        let spender = Address::from_label("pool");
        let mut token = token(&owner);

        let result = token.transfer_from(&spender, &owner, &spender, ether(1));
        assert_eq!(result, Err(AssetError::InsufficientAllowance));

        token.approve(&owner, &spender, ether(5));
        token.transfer_from(&spender, &owner, &spender, ether(2)).unwrap();
        assert_eq!(token.balance_of(&spender), ether(2));
        assert_eq!(token.allowance(&owner, &spender), ether(3));
    }

    #[test]
    fn test_transfer_exceeding_balance() {
        let owner = Address::from_label("owner");
        let other = Address::from_label("other");
        let mut token = token(&owner);
        assert_eq!(
            token.transfer(&other, &owner, 1),
            Err(AssetError::TransferAmountExceedsBalance)
        );
    }
}
