mod common;

use common::{account, World};
use dao_sim::prelude::*;

#[test]
fn test_pool_balance_sets_vote_weight() {
    let mut world = World::erc20();
    let holder = account("holder");
    world.stake(&holder, ether(500));
    let proposal = world.propose("weight", ether(1), Vec::new());

    assert_eq!(world.chain.vote_with_token(&proposal, &holder, Decision::For).unwrap(), 5);
    // repeating the same side is a no-op
    assert_eq!(world.chain.vote_with_token(&proposal, &holder, Decision::For).unwrap(), 5);
    assert_eq!(world.chain.proposal(&proposal).unwrap().for_votes_counter(), 6);

    assert_eq!(
        world.chain.vote_with_token(&proposal, &holder, Decision::Against).unwrap(),
        5
    );
    let view = world.chain.proposal(&proposal).unwrap();
    assert_eq!(view.for_votes_counter(), 6);
    assert_eq!(view.against_votes_counter(), 5);
    assert_eq!(view.votes(&holder).token_for_votes, 5);
    assert_eq!(view.votes(&holder).token_against_votes, 5);

    let pool = world.chain.dao(&world.dao).unwrap().pool().as_dao_pool();
    assert_eq!(pool.proposal_for_voters(&proposal), vec![holder.clone()]);
    assert_eq!(pool.proposal_against_voters(&proposal), vec![holder.clone()]);
    assert_eq!(pool.voter_active_proposals(&holder), 2);
}

#[test]
fn test_vote_weight_rounds_down() {
    let mut world = World::erc20();
    let small = account("small");
    let medium = account("medium");
    world.stake(&small, ether(99));
    world.stake(&medium, ether(250));
    let proposal = world.propose("rounding", ether(1), Vec::new());

    assert_eq!(
        world.chain.vote_with_token(&proposal, &small, Decision::For),
        Err(GovernanceError::InsufficientPoolBalance)
    );
    assert_eq!(world.chain.vote_with_token(&proposal, &medium, Decision::For).unwrap(), 2);
    assert_eq!(
        world.chain.vote_with_token(&proposal, &account("nobody"), Decision::Against),
        Err(GovernanceError::InsufficientPoolBalance)
    );
}

#[test]
fn test_token_winners_share_the_native_pool() {
    let mut world = World::erc20();
    let holder = account("holder");
    let against = world.voter("against");
    world.stake(&holder, ether(200));
    let proposal = world.propose("shares", ether(1), Vec::new());

    world.chain.vote_with_token(&proposal, &holder, Decision::For).unwrap();
    world.chain.vote(&proposal, &against, Decision::Against, ether(1)).unwrap();
    world.end_challenge();
    assert!(world.chain.is_passed(&proposal).unwrap());

    let creator = world.creator.clone();
    let creator_payout = world.chain.claim_reward(&proposal, &creator).unwrap();
    assert_eq!(creator_payout.collateral_refund, ether(1));
    assert_eq!(creator_payout.reward, ether(1) / 3);

    let holder_payout = world.chain.claim_reward(&proposal, &holder).unwrap();
    assert_eq!(holder_payout.votes, 2);
    assert_eq!(holder_payout.collateral_refund, 0);
    assert!(holder_payout.reward >= ether(66) / 100);
    assert_eq!(creator_payout.reward + holder_payout.reward, ether(1));
    assert_eq!(world.chain.native_balance(&proposal), 0);
    // token winners keep their deposit
    assert_eq!(world.pool_balance(&holder), ether(200));
}

#[test]
fn test_token_winner_without_losing_pool_cannot_claim() {
    let mut world = World::erc20();
    let holder = account("holder");
    world.stake(&holder, ether(200));
    let proposal = world.propose("unopposed", ether(1), Vec::new());
    world.chain.vote_with_token(&proposal, &holder, Decision::For).unwrap();
    world.end_challenge();
    assert!(world.chain.is_passed(&proposal).unwrap());

    assert_eq!(
        world.chain.claim_reward(&proposal, &holder),
        Err(GovernanceError::RewardNotApply)
    );
    let creator = world.creator.clone();
    assert_eq!(world.chain.claim_reward(&proposal, &creator).unwrap().total(), ether(1));
    assert_eq!(world.chain.native_balance(&proposal), 0);
}

#[test]
fn test_withdrawal_locked_until_resolution() {
    let mut world = World::erc20();
    let holder = account("holder");
    world.stake(&holder, ether(300));
    let proposal = world.propose("lock", ether(1), Vec::new());
    world.chain.vote_with_token(&proposal, &holder, Decision::For).unwrap();

    let dao = world.dao.clone();
    assert!(matches!(
        world.chain.withdraw(&dao, &holder, ether(1), &holder),
        Err(GovernanceError::Pool(PoolError::UserHasActiveProposals))
    ));
    assert!(matches!(
        world.chain.resolve_proposal(&proposal),
        Err(GovernanceError::Pool(PoolError::ProposalNotEnded))
    ));

    world.end_challenge();
    let resolution = world.chain.resolve_proposal(&proposal).unwrap();
    assert_eq!(resolution.for_voters, vec![holder.clone()]);

    world.chain.withdraw(&dao, &holder, ether(300), &holder).unwrap();
    assert_eq!(world.chain.erc20_balance(&world.token, &holder).unwrap(), ether(300));
    assert_eq!(world.pool_balance(&holder), 0);
}

#[test]
fn test_resolution_forfeits_losers_once() {
    let mut world = World::erc20();
    let winner = account("winner");
    let loser = account("loser");
    world.stake(&winner, ether(300));
    world.stake(&loser, ether(200));
    let proposal = world.propose("forfeit", ether(1), Vec::new());
    world.chain.vote_with_token(&proposal, &winner, Decision::For).unwrap();
    world.chain.vote_with_token(&proposal, &loser, Decision::Against).unwrap();
    world.end_challenge();

    let dao = world.dao.clone();
    let resolution = world.chain.resolve_proposal(&proposal).unwrap();
    assert_eq!(resolution.losers(Decision::For), vec![loser.clone()]);
    assert_eq!(world.pool_balance(&loser), 0);
    assert_eq!(world.pool_balance(&winner), ether(300));
    assert_eq!(world.chain.erc20_balance(&world.token, &dao).unwrap(), ether(200));

    assert!(matches!(
        world.chain.resolve_proposal(&proposal),
        Err(GovernanceError::Pool(PoolError::ProposalNotApproved))
    ));
    assert_eq!(world.chain.erc20_balance(&world.token, &dao).unwrap(), ether(200));
    assert_eq!(
        world.chain.vote_with_token(&proposal, &winner, Decision::For),
        Err(GovernanceError::NotInChallengePeriod)
    );
}
