use std::sync::Arc;
use std::time::Duration;

use dao_sim::prelude::*;

async fn service_with_dao(clock: &ManualClock) -> (DaoService, Address, Address) {
    let service = DaoService::new(Chain::new(Arc::new(clock.clone())));
    let creator = Address::from_label("creator");
    let dao = service
        .transact(|chain| {
            chain.fund(&creator, ether(10))?;
            for i in 0..8 {
                chain.fund(&Address::from_label(&format!("voter-{}", i)), ether(10))?;
            }
            let token = chain.deploy_erc20(&creator, "Governance", "GOV", 18, ether(1_000));
            chain.create_dao(&creator, DaoParams::erc20(token, 60, ether(1), ether(100)))
        })
        .await
        .unwrap()
        .dao;
    (service, dao, creator)
}

#[tokio::test]
async fn test_concurrent_votes_are_all_counted() {
    let clock = ManualClock::new(1_700_000_000);
    let (service, dao, creator) = service_with_dao(&clock).await;
    let proposal = service
        .create_proposal(&dao, &creator, ProposalId::from("busy"), MerkleRoot::default(), Vec::new(), ether(1))
        .await
        .unwrap();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        let proposal = proposal.clone();
        tasks.push(tokio::spawn(async move {
            let voter = Address::from_label(&format!("voter-{}", i));
            let decision = Decision::from_support(i % 2 == 0);
            service.vote(&proposal, &voter, decision, ether(1)).await
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), 1);
    }

    let (for_votes, against_votes, locked) = service
        .inspect(|chain| {
            let view = chain.proposal(&proposal).unwrap();
            (view.for_votes_counter(), view.against_votes_counter(), chain.native_balance(&proposal))
        })
        .await;
    assert_eq!((for_votes, against_votes), (5, 4));
    assert_eq!(locked, ether(9));
}

#[tokio::test(start_paused = true)]
async fn test_poll_then_settle() {
    let clock = ManualClock::new(1_700_000_000);
    let (service, dao, creator) = service_with_dao(&clock).await;
    let proposal = service
        .create_proposal(&dao, &creator, ProposalId::from("poll"), MerkleRoot::default(), Vec::new(), ether(1))
        .await
        .unwrap();
    let against = Address::from_label("voter-0");
    service.vote(&proposal, &against, Decision::Against, ether(2)).await.unwrap();

    let ticker = clock.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(10)).await;
            ticker.advance(10);
        }
    });
    wait_for_proposal_to_end(&service, &proposal, Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(service.status(&proposal).await.unwrap(), ProposalStatus::Failed);
    let payout = service.claim_reward(&proposal, &against).await.unwrap();
    assert_eq!(payout.total(), ether(3));
}

#[tokio::test]
async fn test_resolve_by_proposal_handle() {
    let clock = ManualClock::new(1_700_000_000);
    let (service, dao, creator) = service_with_dao(&clock).await;
    service
        .transact(|chain| {
            let pool = chain.dao(&dao)?.pool().as_dao_pool();
            let (pool, token) = (pool.address().clone(), pool.governance_token().clone());
            chain.erc20_approve(&creator, &token, &pool, ether(200))?;
            chain.deposit(&dao, &creator, ether(200))
        })
        .await
        .unwrap();
    let proposal = service
        .create_proposal(&dao, &creator, ProposalId::from("resolve"), MerkleRoot::default(), Vec::new(), ether(1))
        .await
        .unwrap();
    service.vote_with_token(&proposal, &creator, Decision::For).await.unwrap();

    clock.advance(60);
    let resolution = service.resolve_proposal(&proposal).await.unwrap();
    assert_eq!(resolution.for_voters, vec![creator.clone()]);
    assert!(matches!(
        service.resolve_proposal(&Address::from_label("stranger")).await,
        Err(GovernanceError::ProposalNotFound(_))
    ));
}
