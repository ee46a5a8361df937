use thiserror::Error;

use dao_core::Address;

/// Errors raised by the asset ledgers.
///
/// Token errors carry the standard revert reasons verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// Native balance too low for a transfer
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("ERC20: transfer amount exceeds balance")]
    TransferAmountExceedsBalance,

    #[error("ERC20: insufficient allowance")]
    InsufficientAllowance,

    #[error("ERC721: caller is not token owner or approved")]
    NotTokenOwnerOrApproved,

    #[error("ERC721: invalid token ID")]
    InvalidTokenId,

    #[error("ERC721: transfer from incorrect owner")]
    TransferFromIncorrectOwner,

    /// No token contract is deployed at the address
    #[error("Unknown token: {0}")]
    UnknownToken(Address),

    /// Balance arithmetic overflowed
    #[error("Balance overflow")]
    Overflow,
}

/// Result type for asset operations
pub type AssetResult<T> = Result<T, AssetError>;
