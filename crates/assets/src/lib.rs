//! Asset ledgers for the DAO simulator
//!
//! This crate provides the collaborators a DAO interacts with: the native
//! currency, fungible governance tokens and NFT collections. [`Assets`] is
//! the registry of every deployed token contract plus the native bank.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use dao_core::{Address, Amount};

pub mod erc20;
pub mod erc721;
pub mod error;
pub mod native;

pub use erc20::Erc20Token;
pub use erc721::{Erc721Token, TokenId};
pub use error::{AssetError, AssetResult};
pub use native::NativeBank;

/// Every asset known to the simulated chain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Assets {
    /// Native currency balances
    pub native: NativeBank,
    /// Fungible tokens by contract address
    erc20: HashMap<Address, Erc20Token>,
    /// NFT collections by contract address
    erc721: HashMap<Address, Erc721Token>,
    /// Deployment counter used for address derivation
    deployments: u64,
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_address(&mut self, namespace: &str, deployer: &Address) -> Address {
        self.deployments += 1;
        let seed = format!("{}:{}", deployer, self.deployments);
        Address::derive(namespace, seed.as_bytes())
    }

    /// Deploy a fungible token, minting `initial_supply` to `deployer`
    pub fn deploy_erc20(
        &mut self,
        deployer: &Address,
        name: &str,
        symbol: &str,
        decimals: u32,
        initial_supply: Amount,
    ) -> Address {
        let address = self.next_address("erc20", deployer);
        let token = Erc20Token::new(address.clone(), name, symbol, decimals, initial_supply, deployer);
        info!("Deployed ERC20 {} at {}", symbol, address);
        self.erc20.insert(address.clone(), token);
        address
    }

    /// Deploy an empty NFT collection
    pub fn deploy_erc721(&mut self, deployer: &Address, name: &str, symbol: &str) -> Address {
        let address = self.next_address("erc721", deployer);
        info!("Deployed ERC721 {} at {}", symbol, address);
        self.erc721
            .insert(address.clone(), Erc721Token::new(address.clone(), name, symbol));
        address
    }

    pub fn erc20(&self, token: &Address) -> AssetResult<&Erc20Token> {
        self.erc20
            .get(token)
            .ok_or_else(|| AssetError::UnknownToken(token.clone()))
    }

    pub fn erc20_mut(&mut self, token: &Address) -> AssetResult<&mut Erc20Token> {
        self.erc20
            .get_mut(token)
            .ok_or_else(|| AssetError::UnknownToken(token.clone()))
    }

    pub fn erc721(&self, token: &Address) -> AssetResult<&Erc721Token> {
        self.erc721
            .get(token)
            .ok_or_else(|| AssetError::UnknownToken(token.clone()))
    }

    pub fn erc721_mut(&mut self, token: &Address) -> AssetResult<&mut Erc721Token> {
        self.erc721
            .get_mut(token)
            .ok_or_else(|| AssetError::UnknownToken(token.clone()))
    }
}
