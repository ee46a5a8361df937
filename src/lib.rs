//! DAO simulator
//!
//! A deterministic simulation of collateralised proposal DAOs: native and
//! pool-token voting, extendable challenge periods, treasury payloads and
//! pro-rata settlement of the losing side's collateral.

/// Module version information
pub mod version {
    /// The current version of the simulator library
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

pub use dao_assets as assets;
pub use dao_config as config;
pub use dao_core as core;
pub use dao_governance as governance;
pub use dao_pool as pool;

/// Types most callers need
pub mod prelude {
    pub use dao_core::{ether, Address, Amount, Clock, Decision, ManualClock, MerkleRoot, ProposalId, SystemClock};
    pub use dao_governance::{
        wait_for_proposal_to_end, Chain, DaoParams, DaoService, Governance, GovernanceError, Payload, ProposalStatus,
    };
    pub use dao_pool::{DaoPool, PoolError, PoolKind};
}
