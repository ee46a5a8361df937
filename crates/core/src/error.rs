use thiserror::Error;

/// Errors raised while parsing or building core primitives
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Address is not `0x` followed by 40 hex characters
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Merkle root is not 32 bytes of hex
    #[error("Invalid merkle root: {0}")]
    InvalidMerkleRoot(String),

    /// Decimal amount could not be converted to base units
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Tracing subscriber could not be installed
    #[error("Tracing error: {0}")]
    Tracing(String),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;
