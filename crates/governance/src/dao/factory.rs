//! DAO factories

use serde::{Deserialize, Serialize};
use tracing::info;

use dao_core::Address;
use dao_pool::{Pool, PoolKind};

use crate::dao::Dao;
use crate::error::{GovernanceError, GovernanceResult};
use crate::params::DaoParams;

/// Emitted when a factory deploys a DAO and its pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoCreated {
    /// New DAO, also its treasury
    pub dao: Address,
    /// Pool owned by the new DAO
    pub pool: Address,
    /// Pool kind
    pub kind: PoolKind,
    /// Governance token accepted by the pool
    pub governance_token: Address,
    /// Account that asked for the deployment
    pub creator: Address,
}

/// Deploys DAOs of a single pool kind
#[derive(Debug, Clone)]
pub struct DaoFactory {
    address: Address,
    kind: PoolKind,
    /// DAOs deployed so far, oldest first
    daos: Vec<Address>,
}

impl DaoFactory {
    pub fn new(kind: PoolKind) -> Self {
        let label = match kind {
            PoolKind::Erc20 => "erc20-dao-factory",
            PoolKind::Nft => "nft-dao-factory",
        };
        Self {
            address: Address::derive("factory", label.as_bytes()),
            kind,
            daos: Vec::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    pub fn daos(&self) -> &[Address] {
        &self.daos
    }

    /// Deploy a DAO with a fresh pool owned by it
    pub fn create_dao(&mut self, creator: &Address, params: DaoParams) -> GovernanceResult<(Dao, DaoCreated)> {
        if params.kind != self.kind {
            return Err(GovernanceError::PoolKindMismatch(format!("{:?}", self.kind)));
        }
        params.validate()?;

        let seed = format!("{}:{}:{}", self.address, creator, self.daos.len() + 1);
        let dao_address = Address::derive("dao", seed.as_bytes());
        let pool_address = Address::derive("dao-pool", dao_address.as_str().as_bytes());
        let pool = Pool::new(
            self.kind,
            pool_address.clone(),
            dao_address.clone(),
            params.governance_token.clone(),
        );

        let created = DaoCreated {
            dao: dao_address.clone(),
            pool: pool_address,
            kind: self.kind,
            governance_token: params.governance_token.clone(),
            creator: creator.clone(),
        };
        self.daos.push(dao_address.clone());
        info!(
            "DaoCreated {} with {:?} pool {} for {}",
            created.dao, created.kind, created.pool, creator
        );
        Ok((Dao::new(dao_address, params, pool), created))
    }
}
