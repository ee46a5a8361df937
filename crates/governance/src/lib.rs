//! Governance for collateralised DAOs
//!
//! This crate provides the proposal lifecycle of a DAO whose members back
//! every vote with collateral: native currency locked in the proposal, or
//! governance tokens deposited in the DAO pool. Proposals run a challenge
//! period that late votes can extend, pass on a strict majority in favour,
//! execute treasury payloads, and settle by paying the losing side's native
//! collateral to the winners.

pub mod chain;
pub mod dao;
pub mod error;
pub mod execution;
pub mod params;
pub mod proposal;
pub mod service;
pub mod settlement;
pub mod voting;

pub use chain::Chain;
pub use dao::{Dao, DaoCreated, DaoFactory, ExecutionReceipt};
pub use error::{GovernanceError, GovernanceResult};
pub use execution::{execute_payloads, AssetTreasury, DaoTreasury, Payload};
pub use params::{DaoParams, DEFAULT_EXTENSION_WINDOW_SECONDS};
pub use proposal::{ChallengeClock, Proposal, ProposalDraft, ProposalStatus};
pub use service::{wait_for_proposal_to_end, DaoService, Governance};
pub use settlement::{Payout, SettlementEngine};
pub use voting::{CollateralLedger, VoteRecord, VoteTally};
