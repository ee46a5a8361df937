//! DAO parameters

use serde::{Deserialize, Serialize};

use dao_core::{Address, Amount};
use dao_pool::PoolKind;

use crate::error::{GovernanceError, GovernanceResult};

/// Votes landing this close to the deadline extend it: the last hour
pub const DEFAULT_EXTENSION_WINDOW_SECONDS: u64 = 3_600;

fn default_extension_window() -> u64 {
    DEFAULT_EXTENSION_WINDOW_SECONDS
}

/// Parameters fixed when a DAO is created and copied into every proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoParams {
    /// Kind of pool the DAO deploys
    pub kind: PoolKind,
    /// Governance token (ERC-20) or collection (NFT) accepted by the pool
    pub governance_token: Address,
    /// Voting window measured from proposal creation
    pub challenge_period_seconds: u64,
    /// Added to the window by each late vote
    pub extend_challenge_period_seconds: u64,
    /// How close to the deadline a vote must land to count as late
    #[serde(default = "default_extension_window")]
    pub extension_window_seconds: u64,
    /// Native currency per vote, in wei
    pub native_collateral: Amount,
    /// Pool balance per vote (token base units, or NFTs)
    pub token_collateral: Amount,
}

impl DaoParams {
    /// Parameters for a DAO backed by a fungible governance token
    pub fn erc20(
        governance_token: Address,
        challenge_period_seconds: u64,
        native_collateral: Amount,
        token_collateral: Amount,
    ) -> Self {
        Self {
            kind: PoolKind::Erc20,
            governance_token,
            challenge_period_seconds,
            extend_challenge_period_seconds: 0,
            extension_window_seconds: DEFAULT_EXTENSION_WINDOW_SECONDS,
            native_collateral,
            token_collateral,
        }
    }

    /// Parameters for a DAO backed by an NFT collection, one NFT per vote
    pub fn nft(governance_token: Address, challenge_period_seconds: u64, native_collateral: Amount) -> Self {
        Self {
            kind: PoolKind::Nft,
            token_collateral: 1,
            ..Self::erc20(governance_token, challenge_period_seconds, native_collateral, 1)
        }
    }

    pub fn with_extension(mut self, extend_by_seconds: u64) -> Self {
        self.extend_challenge_period_seconds = extend_by_seconds;
        self
    }

    pub fn with_extension_window(mut self, window_seconds: u64) -> Self {
        self.extension_window_seconds = window_seconds;
        self
    }

    pub fn validate(&self) -> GovernanceResult<()> {
        if self.native_collateral == 0 {
            return Err(GovernanceError::InvalidParams(
                "native collateral must be positive".to_string(),
            ));
        }
        if self.token_collateral == 0 {
            return Err(GovernanceError::InvalidParams(
                "token collateral must be positive".to_string(),
            ));
        }
        if self.challenge_period_seconds == 0 {
            return Err(GovernanceError::InvalidParams(
                "challenge period must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
