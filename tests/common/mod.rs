#![allow(dead_code)]

use std::sync::Arc;

use dao_sim::prelude::*;

pub const START: u64 = 1_700_000_000;
pub const PERIOD: u64 = 15;

pub struct World {
    pub chain: Chain,
    pub clock: ManualClock,
    pub dao: Address,
    pub token: Address,
    pub creator: Address,
}

impl World {
    /// ERC-20 DAO with 1 ETH and 100 GOV per vote
    pub fn erc20() -> Self {
        Self::erc20_with(DaoParams::erc20)
    }

    pub fn erc20_with(params: impl FnOnce(Address, u64, Amount, Amount) -> DaoParams) -> Self {
        let clock = ManualClock::new(START);
        let mut chain = Chain::new(Arc::new(clock.clone()));
        let creator = account("creator");
        chain.fund(&creator, ether(100)).unwrap();
        let token = chain.deploy_erc20(&creator, "Governance", "GOV", 18, ether(10_000));
        let dao = chain
            .create_dao(&creator, params(token.clone(), PERIOD, ether(1), ether(100)))
            .unwrap()
            .dao;
        Self {
            chain,
            clock,
            dao,
            token,
            creator,
        }
    }

    /// NFT DAO with 1 ETH and one NFT per vote
    pub fn nft() -> Self {
        let clock = ManualClock::new(START);
        let mut chain = Chain::new(Arc::new(clock.clone()));
        let creator = account("creator");
        chain.fund(&creator, ether(100)).unwrap();
        let token = chain.deploy_erc721(&creator, "Governance NFT", "GNFT");
        let dao = chain
            .create_dao(&creator, DaoParams::nft(token.clone(), PERIOD, ether(1)))
            .unwrap()
            .dao;
        Self {
            chain,
            clock,
            dao,
            token,
            creator,
        }
    }

    /// Funded account
    pub fn voter(&mut self, label: &str) -> Address {
        let voter = account(label);
        self.chain.fund(&voter, ether(10)).unwrap();
        voter
    }

    pub fn propose(&mut self, id: &str, value: Amount, payloads: Vec<Payload>) -> Address {
        self.chain
            .create_proposal(
                &self.dao,
                &self.creator,
                ProposalId::from(id),
                MerkleRoot::digest(id.as_bytes()),
                payloads,
                value,
            )
            .unwrap()
    }

    /// Give `holder` tokens and deposit `amount` of them into the pool
    pub fn stake(&mut self, holder: &Address, amount: Amount) {
        let pool = self.pool_address();
        self.chain
            .erc20_transfer(&self.creator, &self.token, holder, amount)
            .unwrap();
        self.chain.erc20_approve(holder, &self.token, &pool, amount).unwrap();
        self.chain.deposit(&self.dao, holder, amount).unwrap();
    }

    pub fn pool_address(&self) -> Address {
        self.chain.dao(&self.dao).unwrap().pool().as_dao_pool().address().clone()
    }

    pub fn pool_balance(&self, holder: &Address) -> Amount {
        self.chain.dao(&self.dao).unwrap().pool().as_dao_pool().balance_of(holder)
    }

    pub fn end_challenge(&self) {
        self.clock.advance(PERIOD);
    }
}

pub fn account(label: &str) -> Address {
    Address::from_label(label)
}
