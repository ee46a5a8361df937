//! Core primitives for the DAO simulator
//!
//! This crate provides the identifier, amount and clock types shared by the
//! asset, pool and governance crates, and the tracing setup used by binaries.

pub mod clock;
pub mod error;
pub mod types;
pub mod units;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, CoreResult};
pub use types::{Address, Decision, MerkleRoot, ProposalId};
pub use units::{ether, format_units, parse_units, Amount, DEFAULT_DECIMALS, ETHER};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `default_level` when set.
pub fn init_tracing(default_level: &str) -> CoreResult<()> {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| CoreError::Tracing(e.to_string()))?;

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| CoreError::Tracing(e.to_string()))
}
