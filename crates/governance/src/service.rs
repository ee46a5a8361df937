//! Async governance service
//!
//! [`DaoService`] shares one [`Chain`] between tasks. Each call takes the
//! write lock for the duration of a single transaction, so concurrent
//! callers observe a strict order of operations.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use dao_core::{Address, Amount, Decision, MerkleRoot, ProposalId};
use dao_pool::Resolution;

use crate::chain::Chain;
use crate::dao::ExecutionReceipt;
use crate::error::GovernanceResult;
use crate::execution::Payload;
use crate::proposal::ProposalStatus;
use crate::settlement::Payout;

/// Proposal lifecycle operations
#[async_trait]
pub trait Governance: Send + Sync {
    /// Open a proposal on `dao` with `value` native collateral
    async fn create_proposal(
        &self,
        dao: &Address,
        caller: &Address,
        id: ProposalId,
        merkle_root: MerkleRoot,
        payloads: Vec<Payload>,
        value: Amount,
    ) -> GovernanceResult<Address>;

    /// Vote with native collateral
    async fn vote(&self, proposal: &Address, caller: &Address, decision: Decision, value: Amount) -> GovernanceResult<u64>;

    /// Vote with pool balance
    async fn vote_with_token(&self, proposal: &Address, caller: &Address, decision: Decision) -> GovernanceResult<u64>;

    async fn execute_proposal(&self, proposal: &Address, caller: &Address) -> GovernanceResult<ExecutionReceipt>;

    async fn claim_reward(&self, proposal: &Address, caller: &Address) -> GovernanceResult<Payout>;

    async fn resolve_proposal(&self, proposal: &Address) -> GovernanceResult<Resolution>;

    async fn is_ended(&self, proposal: &Address) -> GovernanceResult<bool>;

    async fn is_passed(&self, proposal: &Address) -> GovernanceResult<bool>;

    async fn status(&self, proposal: &Address) -> GovernanceResult<ProposalStatus>;
}

/// Shared handle to a simulated chain
#[derive(Debug, Clone)]
pub struct DaoService {
    chain: Arc<RwLock<Chain>>,
}

impl DaoService {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain: Arc::new(RwLock::new(chain)),
        }
    }

    /// Run `f` against the chain as one transaction
    pub async fn transact<R>(&self, f: impl FnOnce(&mut Chain) -> R) -> R {
        let mut chain = self.chain.write().await;
        f(&mut *chain)
    }

    /// Read-only access to the chain
    pub async fn inspect<R>(&self, f: impl FnOnce(&Chain) -> R) -> R {
        let chain = self.chain.read().await;
        f(&*chain)
    }
}

#[async_trait]
impl Governance for DaoService {
    async fn create_proposal(
        &self,
        dao: &Address,
        caller: &Address,
        id: ProposalId,
        merkle_root: MerkleRoot,
        payloads: Vec<Payload>,
        value: Amount,
    ) -> GovernanceResult<Address> {
        let mut chain = self.chain.write().await;
        chain.create_proposal(dao, caller, id, merkle_root, payloads, value)
    }

    async fn vote(&self, proposal: &Address, caller: &Address, decision: Decision, value: Amount) -> GovernanceResult<u64> {
        let mut chain = self.chain.write().await;
        chain.vote(proposal, caller, decision, value)
    }

    async fn vote_with_token(&self, proposal: &Address, caller: &Address, decision: Decision) -> GovernanceResult<u64> {
        let mut chain = self.chain.write().await;
        chain.vote_with_token(proposal, caller, decision)
    }

    async fn execute_proposal(&self, proposal: &Address, caller: &Address) -> GovernanceResult<ExecutionReceipt> {
        let mut chain = self.chain.write().await;
        chain.execute_proposal(proposal, caller)
    }

    async fn claim_reward(&self, proposal: &Address, caller: &Address) -> GovernanceResult<Payout> {
        let mut chain = self.chain.write().await;
        chain.claim_reward(proposal, caller)
    }

    async fn resolve_proposal(&self, proposal: &Address) -> GovernanceResult<Resolution> {
        let mut chain = self.chain.write().await;
        chain.resolve_proposal(proposal)
    }

    async fn is_ended(&self, proposal: &Address) -> GovernanceResult<bool> {
        self.chain.read().await.is_ended(proposal)
    }

    async fn is_passed(&self, proposal: &Address) -> GovernanceResult<bool> {
        self.chain.read().await.is_passed(proposal)
    }

    async fn status(&self, proposal: &Address) -> GovernanceResult<ProposalStatus> {
        self.chain.read().await.proposal_status(proposal)
    }
}

/// Poll `is_ended` every `poll_interval` until the challenge period is over
pub async fn wait_for_proposal_to_end<G>(governance: &G, proposal: &Address, poll_interval: Duration) -> GovernanceResult<()>
where
    G: Governance + ?Sized,
{
    while !governance.is_ended(proposal).await? {
        debug!("Proposal {} still in challenge period, waiting", proposal);
        tokio::time::sleep(poll_interval).await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::DaoParams;
    use dao_core::{ether, Clock, ManualClock};

    async fn setup(clock: &ManualClock) -> (DaoService, Address, Address) {
        let service = DaoService::new(Chain::new(Arc::new(clock.clone())));
        let creator = Address::from_label("creator");
        let dao = service
            .transact(|chain| {
                chain.fund(&creator, ether(10))?;
                let token = chain.deploy_erc20(&creator, "Gov", "GOV", 18, ether(1_000));
                chain.create_dao(&creator, DaoParams::erc20(token, 15, ether(1), ether(100)))
            })
            .await
            .unwrap()
            .dao;
        (service, dao, creator)
    }

    #[tokio::test]
    async fn test_service_round_trip() {
        let clock = ManualClock::new(1_000);
        let (service, dao, creator) = setup(&clock).await;
        let proposal = service
            .create_proposal(&dao, &creator, ProposalId::from("p"), MerkleRoot::default(), Vec::new(), ether(1))
            .await
            .unwrap();

        assert!(!service.is_ended(&proposal).await.unwrap());
        assert_eq!(service.status(&proposal).await.unwrap(), ProposalStatus::Open);
        clock.advance(15);
        assert!(service.is_passed(&proposal).await.unwrap());

        let receipt = service.execute_proposal(&proposal, &creator).await.unwrap();
        assert_eq!(receipt.creator_payout.map(|p| p.total()), Some(ether(1)));
        assert_eq!(service.status(&proposal).await.unwrap(), ProposalStatus::Executed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_proposal_to_end_polls_until_deadline() {
        let clock = ManualClock::new(1_000);
        let (service, dao, creator) = setup(&clock).await;
        let proposal = service
            .create_proposal(&dao, &creator, ProposalId::from("p"), MerkleRoot::default(), Vec::new(), ether(1))
            .await
            .unwrap();

        let ticker = clock.clone();
        let advancing = tokio::spawn(async move {
            for _ in 0..15 {
                tokio::time::sleep(Duration::from_secs(1)).await;
                ticker.advance(1);
            }
        });

        wait_for_proposal_to_end(&service, &proposal, Duration::from_millis(500))
            .await
            .unwrap();
        assert!(clock.now() >= 1_015);
        advancing.await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_on_unknown_proposal_fails() {
        let clock = ManualClock::new(1_000);
        let (service, _, _) = setup(&clock).await;
        let result = wait_for_proposal_to_end(&service, &Address::from_label("nope"), Duration::from_millis(1)).await;
        assert!(result.is_err());
    }
}
