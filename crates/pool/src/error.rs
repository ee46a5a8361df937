use thiserror::Error;

use dao_assets::AssetError;

/// Error types for pool operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Withdrawal larger than the caller's pool balance
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// The caller has not deposited this NFT
    #[error("Token not found")]
    TokenNotFound,

    /// Withdrawal while votes are still attached to unresolved proposals
    #[error("User has active proposals")]
    UserHasActiveProposals,

    #[error("Proposal not approved")]
    ProposalNotApproved,

    #[error("Proposal not ended")]
    ProposalNotEnded,

    /// Same voter and decision recorded twice on one proposal
    #[error("Already voted")]
    AlreadyVoted,

    /// Only the pool owner may approve proposals
    #[error("Caller is not pool owner")]
    NotPoolOwner,

    /// Failure reported by the underlying token contract
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Result type for pool operations
pub type PoolResult<T> = Result<T, PoolError>;
