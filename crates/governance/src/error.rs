use thiserror::Error;

use dao_assets::AssetError;
use dao_pool::PoolError;

/// Error types for governance operations.
///
/// Display strings are the revert reasons callers match on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GovernanceError {
    /// Attached value is below one collateral unit
    #[error("Collateral too small")]
    CollateralTooSmall,

    /// Attached value is not a whole multiple of the collateral unit
    #[error("Collateral incorrect")]
    CollateralIncorrect,

    #[error("Is not in challenge period")]
    NotInChallengePeriod,

    #[error("Is not after challenge period")]
    NotAfterChallengePeriod,

    /// Token vote from an address with less than one unit in the pool
    #[error("Insufficient pool balance")]
    InsufficientPoolBalance,

    #[error("Proposal did not pass")]
    ProposalDidNotPass,

    #[error("Proposal already executed")]
    AlreadyExecuted,

    /// Caller has nothing to claim, or has already been paid
    #[error("Reward not apply")]
    RewardNotApply,

    #[error("Proposal id already exists: {0}")]
    DuplicateProposalId(String),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(String),

    #[error("DAO not found: {0}")]
    DaoNotFound(String),

    /// DAO parameters rejected at creation
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Deposit or withdrawal of an asset the DAO pool does not accept
    #[error("Pool kind mismatch: expected {0}")]
    PoolKindMismatch(String),

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Result type for governance operations
pub type GovernanceResult<T> = Result<T, GovernanceError>;
