//! Deployment metadata files

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use dao_core::Address;
use dao_pool::PoolKind;

/// Addresses recorded for one deployed DAO
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Scenario name of the DAO
    pub name: String,
    pub kind: PoolKind,
    pub factory: Address,
    pub dao: Address,
    pub pool: Address,
    pub governance_token: Address,
    pub deployed_at: DateTime<Utc>,
}

/// Factory address file, e.g. `erc-20-dao-factory-localhost.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryDeployment {
    pub address: Address,
}

/// File a DAO kind's records go to, e.g. `erc20-dao-localhost.json`
pub fn deployment_path(dir: &Path, kind: PoolKind, network: &str) -> PathBuf {
    let kind = match kind {
        PoolKind::Erc20 => "erc20",
        PoolKind::Nft => "nft",
    };
    dir.join(format!("{}-dao-{}.json", kind, network))
}

pub fn factory_path(dir: &Path, kind: PoolKind, network: &str) -> PathBuf {
    let kind = match kind {
        PoolKind::Erc20 => "erc-20",
        PoolKind::Nft => "nft",
    };
    dir.join(format!("{}-dao-factory-{}.json", kind, network))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Write `records` grouped by kind into `dir`, plus the factory address of
/// each kind; returns the files written
pub fn write_deployments(dir: &Path, network: &str, records: &[DeploymentRecord]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = Vec::new();
    for kind in [PoolKind::Erc20, PoolKind::Nft] {
        let of_kind: Vec<&DeploymentRecord> = records.iter().filter(|r| r.kind == kind).collect();
        let Some(first) = of_kind.first() else {
            continue;
        };

        let factory = factory_path(dir, kind, network);
        write_json(&factory, &FactoryDeployment { address: first.factory.clone() })?;
        info!("Wrote factory {} to {}", first.factory, factory.display());
        written.push(factory);

        let path = deployment_path(dir, kind, network);
        write_json(&path, &of_kind)?;
        info!("Wrote {} deployment(s) to {}", of_kind.len(), path.display());
        written.push(path);
    }
    Ok(written)
}
