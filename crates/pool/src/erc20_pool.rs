//! Fungible governance token pool

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use dao_assets::Erc20Token;
use dao_core::{Address, Amount, Decision};

use crate::book::{ProposalBook, Resolution};
use crate::error::{PoolError, PoolResult};
use crate::DaoPool;

/// Holds deposited governance tokens and exposes them as voting weight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Erc20DaoPool {
    /// Pool contract address, the custodian of deposited tokens
    address: Address,
    /// Account allowed to approve proposals
    owner: Address,
    /// Governance token contract
    token: Address,
    /// Deposited amount per voter
    balances: HashMap<Address, Amount>,
    /// Vote bookkeeping
    book: ProposalBook,
}

impl Erc20DaoPool {
    pub fn new(address: Address, owner: Address, token: Address) -> Self {
        Self {
            address,
            owner,
            token,
            balances: HashMap::new(),
            book: ProposalBook::default(),
        }
    }

    /// Pull `amount` tokens from `caller` using the allowance granted to the pool
    pub fn deposit(&mut self, token: &mut Erc20Token, caller: &Address, amount: Amount) -> PoolResult<()> {
        token.transfer_from(&self.address, caller, &self.address, amount)?;
        *self.balances.entry(caller.clone()).or_default() += amount;
        debug!("{} deposited {} into pool {}", caller, amount, self.address);
        Ok(())
    }

    /// Return `amount` of the caller's deposit to `recipient`
    pub fn withdraw(
        &mut self,
        token: &mut Erc20Token,
        caller: &Address,
        amount: Amount,
        recipient: &Address,
    ) -> PoolResult<()> {
        if self.balance_of(caller) < amount {
            return Err(PoolError::InsufficientBalance);
        }
        if self.book.active_proposals(caller) > 0 {
            return Err(PoolError::UserHasActiveProposals);
        }

        token.transfer(&self.address, recipient, amount)?;
        if let Some(balance) = self.balances.get_mut(caller) {
            *balance -= amount;
        }
        debug!("{} withdrew {} from pool {} to {}", caller, amount, self.address, recipient);
        Ok(())
    }

    /// Close out `proposal`: release every voter and move the losing
    /// side's whole pool balance to `treasury`.
    pub fn resolve_proposal(
        &mut self,
        token: &mut Erc20Token,
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
        let forfeited: Amount = losers.iter().map(|voter| self.balance_of(voter)).sum();
        token.transfer(&self.address, treasury, forfeited)?;

        for voter in &losers {
            self.balances.remove(voter);
        }
        let resolution = self.book.take_resolution(proposal);
        info!(
            "Resolved proposal {} on pool {}: {} losing voters forfeited {}",
            proposal,
            self.address,
            losers.len(),
            forfeited
        );
        Ok(resolution)
    }
}

impl DaoPool for Erc20DaoPool {
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
        self.balances.get(voter).copied().unwrap_or_default()
    }

    fn book(&self) -> &ProposalBook {
        &self.book
    }

    fn book_mut(&mut self) -> &mut ProposalBook {
        &mut self.book
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dao_assets::AssetError;
    use dao_core::ether;

    struct Fixture {
        token: Erc20Token,
        pool: Erc20DaoPool,
        owner: Address,
        alice: Address,
        bob: Address,
        proposal: Address,
        treasury: Address,
    }

    fn setup() -> Fixture {
        let owner = Address::from_label("owner");
        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");
        let mut token = Erc20Token::new(
            Address::derive("erc20", b"gov"),
            "Gov",
            "GOV",
            18,
            ether(10_000),
            &owner,
        );
        token.transfer(&owner, &alice, ether(1_000)).unwrap();
        token.transfer(&owner, &bob, ether(1_000)).unwrap();
        let pool = Erc20DaoPool::new(Address::derive("pool", b"gov"), owner.clone(), token.address.clone());
        Fixture {
            token,
            pool,
            owner,
            alice,
            bob,
            proposal: Address::from_label("proposal"),
            treasury: Address::from_label("treasury"),
        }
    }

    fn deposit(f: &mut Fixture, who: &Address, amount: Amount) {
        let pool_address = f.pool.address().clone();
        f.token.approve(who, &pool_address, amount);
        f.pool.deposit(&mut f.token, who, amount).unwrap();
    }

    #[test]
    fn test_deposit_requires_allowance() {
        let mut f = setup();
        let alice = f.alice.clone();
        let result = f.pool.deposit(&mut f.token, &alice, ether(1));
        assert_eq!(result, Err(PoolError::Asset(AssetError::InsufficientAllowance)));
        assert_eq!(
            result.unwrap_err().to_string(),
            "ERC20: insufficient allowance"
        );
    }

    #[test]
    fn test_deposit_and_withdraw() {
        let mut f = setup();
        let alice = f.alice.clone();
        deposit(&mut f, &alice, ether(500));
        assert_eq!(f.pool.balance_of(&alice), ether(500));
        assert_eq!(f.token.balance_of(f.pool.address()), ether(500));

        let recipient = Address::from_label("recipient");
        f.pool.withdraw(&mut f.token, &alice, ether(200), &recipient).unwrap();
        assert_eq!(f.pool.balance_of(&alice), ether(300));
        assert_eq!(f.token.balance_of(&recipient), ether(200));
    }

    #[test]
    fn test_withdraw_more_than_balance() {
        let mut f = setup();
        let alice = f.alice.clone();
        assert_eq!(
            f.pool.withdraw(&mut f.token, &alice, ether(1), &alice),
            Err(PoolError::InsufficientBalance)
        );
    }

    #[test]
    fn test_withdraw_locked_while_voting() {
        let mut f = setup();
        let (alice, owner, proposal) = (f.alice.clone(), f.owner.clone(), f.proposal.clone());
        deposit(&mut f, &alice, ether(500));
        f.pool.approve_proposal(&owner, &proposal).unwrap();
        f.pool.vote(&proposal, &alice, Decision::For).unwrap();

        assert_eq!(f.pool.voter_active_proposals(&alice), 1);
        assert_eq!(
            f.pool.withdraw(&mut f.token, &alice, ether(500), &alice),
            Err(PoolError::UserHasActiveProposals)
        );
    }

    #[test]
    fn test_only_owner_approves() {
        let mut f = setup();
        let (alice, proposal) = (f.alice.clone(), f.proposal.clone());
        assert_eq!(
            f.pool.approve_proposal(&alice, &proposal),
            Err(PoolError::NotPoolOwner)
        );
    }

    #[test]
    fn test_resolve_moves_losing_balances_to_treasury() {
        let mut f = setup();
        let (alice, bob, owner, proposal, treasury) = (
            f.alice.clone(),
            f.bob.clone(),
            f.owner.clone(),
            f.proposal.clone(),
            f.treasury.clone(),
        );
        deposit(&mut f, &alice, ether(500));
        deposit(&mut f, &bob, ether(300));
        f.pool.approve_proposal(&owner, &proposal).unwrap();
        f.pool.vote(&proposal, &alice, Decision::For).unwrap();
        f.pool.vote(&proposal, &bob, Decision::Against).unwrap();

        assert_eq!(
            f.pool
                .resolve_proposal(&mut f.token, &proposal, false, Decision::For, &treasury)
                .unwrap_err(),
            PoolError::ProposalNotEnded
        );

        f.pool
            .resolve_proposal(&mut f.token, &proposal, true, Decision::For, &treasury)
            .unwrap();
        assert_eq!(f.token.balance_of(&treasury), ether(300));
        assert_eq!(f.pool.balance_of(&bob), 0);
        assert_eq!(f.pool.balance_of(&alice), ether(500));
        assert_eq!(f.pool.voter_active_proposals(&alice), 0);
        assert!(f.pool.proposal_for_voters(&proposal).is_empty());
        assert!(!f.pool.is_approved(&proposal));

        assert_eq!(
            f.pool
                .resolve_proposal(&mut f.token, &proposal, true, Decision::For, &treasury)
                .unwrap_err(),
            PoolError::ProposalNotApproved
        );
    }
}
