//! Scenario replay
//!
//! A scenario is a YAML document naming accounts, tokens, DAOs and proposals
//! and listing the transactions to apply, in order, to a fresh [`Chain`]
//! driven by a [`ManualClock`]. Any step may declare the revert reason it is
//! expected to fail with.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use dao_assets::TokenId;
use dao_config::SimulatorConfig;
use dao_core::{parse_units, Address, Amount, Decision, ManualClock, MerkleRoot, ProposalId, DEFAULT_DECIMALS};
use dao_governance::{Chain, DaoParams, Payload};
use dao_pool::{DaoPool, PoolKind};

use crate::deployments::DeploymentRecord;

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: Option<String>,
    /// Unix time the chain starts at
    #[serde(default = "default_start_time")]
    pub start_time: u64,
    /// Accounts funded before the first step, in ether
    #[serde(default)]
    pub accounts: BTreeMap<String, String>,
    pub steps: Vec<Step>,
}

fn default_start_time() -> u64 {
    1_700_000_000
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Step {
    #[serde(flatten)]
    pub action: Action,
    /// Revert reason the step must fail with
    #[serde(default)]
    pub expect_error: Option<String>,
}

/// One transaction or assertion. Amounts are decimal strings in whole
/// units: ether for native currency, whole tokens for ERC-20s.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Fund {
        account: String,
        amount: String,
    },
    DeployToken {
        name: String,
        deployer: String,
        #[serde(default)]
        symbol: Option<String>,
        #[serde(default)]
        decimals: Option<u32>,
        supply: String,
    },
    DeployNft {
        name: String,
        deployer: String,
        #[serde(default)]
        symbol: Option<String>,
    },
    MintNft {
        token: String,
        to: String,
    },
    TransferNative {
        from: String,
        to: String,
        amount: String,
    },
    TransferToken {
        token: String,
        from: String,
        to: String,
        amount: String,
    },
    TransferNft {
        token: String,
        from: String,
        to: String,
        token_id: TokenId,
    },
    CreateDao {
        name: String,
        kind: PoolKind,
        token: String,
        creator: String,
        #[serde(default)]
        challenge_period_seconds: Option<u64>,
        #[serde(default)]
        extend_challenge_period_seconds: Option<u64>,
        #[serde(default)]
        native_collateral: Option<String>,
        #[serde(default)]
        token_collateral: Option<String>,
    },
    /// Approve a DAO's pool to pull tokens
    ApproveToken {
        token: String,
        owner: String,
        dao: String,
        amount: String,
    },
    ApproveNft {
        token: String,
        owner: String,
        dao: String,
        token_id: TokenId,
    },
    Deposit {
        dao: String,
        account: String,
        amount: String,
    },
    DepositNft {
        dao: String,
        account: String,
        token_id: TokenId,
    },
    Withdraw {
        dao: String,
        account: String,
        amount: String,
        #[serde(default)]
        recipient: Option<String>,
    },
    WithdrawNft {
        dao: String,
        account: String,
        token_id: TokenId,
        #[serde(default)]
        recipient: Option<String>,
    },
    CreateProposal {
        name: String,
        dao: String,
        creator: String,
        value: String,
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        merkle_root: Option<String>,
        #[serde(default)]
        payloads: Vec<PayloadSpec>,
    },
    Vote {
        proposal: String,
        voter: String,
        support: bool,
        value: String,
    },
    VoteWithToken {
        proposal: String,
        voter: String,
        support: bool,
    },
    AdvanceTime {
        seconds: u64,
    },
    Execute {
        proposal: String,
        caller: String,
    },
    Claim {
        proposal: String,
        caller: String,
    },
    Resolve {
        proposal: String,
    },
    ExpectBalance {
        account: String,
        amount: String,
    },
    ExpectTokenBalance {
        token: String,
        account: String,
        amount: String,
    },
    ExpectStatus {
        proposal: String,
        status: String,
    },
}

impl Action {
    fn label(&self) -> &'static str {
        match self {
            Action::Fund { .. } => "fund",
            Action::DeployToken { .. } => "deploy_token",
            Action::DeployNft { .. } => "deploy_nft",
            Action::MintNft { .. } => "mint_nft",
            Action::TransferNative { .. } => "transfer_native",
            Action::TransferToken { .. } => "transfer_token",
            Action::TransferNft { .. } => "transfer_nft",
            Action::CreateDao { .. } => "create_dao",
            Action::ApproveToken { .. } => "approve_token",
            Action::ApproveNft { .. } => "approve_nft",
            Action::Deposit { .. } => "deposit",
            Action::DepositNft { .. } => "deposit_nft",
            Action::Withdraw { .. } => "withdraw",
            Action::WithdrawNft { .. } => "withdraw_nft",
            Action::CreateProposal { .. } => "create_proposal",
            Action::Vote { .. } => "vote",
            Action::VoteWithToken { .. } => "vote_with_token",
            Action::AdvanceTime { .. } => "advance_time",
            Action::Execute { .. } => "execute",
            Action::Claim { .. } => "claim",
            Action::Resolve { .. } => "resolve",
            Action::ExpectBalance { .. } => "expect_balance",
            Action::ExpectTokenBalance { .. } => "expect_token_balance",
            Action::ExpectStatus { .. } => "expect_status",
        }
    }
}

/// Treasury payload with scenario names in place of addresses
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadSpec {
    SendErc20 { token: String, to: String, amount: String },
    SendNft { token: String, to: String, token_id: TokenId },
    SendNative { to: String, amount: String },
}

/// Summary of a completed replay
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub steps: usize,
    /// Steps that failed with their expected reason
    pub expected_failures: usize,
    pub deployments: Vec<DeploymentRecord>,
    /// Final native balances of the declared accounts
    pub balances: BTreeMap<String, Amount>,
}

pub struct ScenarioRunner {
    config: SimulatorConfig,
    clock: ManualClock,
    chain: Chain,
    tokens: HashMap<String, Address>,
    daos: HashMap<String, Address>,
    proposals: HashMap<String, Address>,
    deployments: Vec<DeploymentRecord>,
}

impl ScenarioRunner {
    pub fn new(config: SimulatorConfig, start_time: u64) -> Self {
        let clock = ManualClock::new(start_time);
        Self {
            config,
            chain: Chain::new(Arc::new(clock.clone())),
            clock,
            tokens: HashMap::new(),
            daos: HashMap::new(),
            proposals: HashMap::new(),
            deployments: Vec::new(),
        }
    }

    /// Replay `scenario` on a fresh chain
    pub fn run(config: SimulatorConfig, scenario: &Scenario) -> Result<ScenarioReport> {
        let mut runner = Self::new(config, scenario.start_time);
        info!(
            "Running scenario {} ({} steps)",
            scenario.name.as_deref().unwrap_or("unnamed"),
            scenario.steps.len()
        );

        for (name, amount) in &scenario.accounts {
            let amount = ether_amount(amount)?;
            runner.chain.fund(&account(name), amount)?;
        }

        let mut expected_failures = 0;
        for (index, step) in scenario.steps.iter().enumerate() {
            let number = index + 1;
            let label = step.action.label();
            match (runner.apply(&step.action), &step.expect_error) {
                (Ok(()), None) => debug!("Step {} ({}) ok", number, label),
                (Ok(()), Some(reason)) => {
                    bail!("Step {} ({}) succeeded but was expected to fail with {:?}", number, label, reason)
                }
                (Err(e), Some(reason)) if format!("{:#}", e).contains(reason.as_str()) => {
                    debug!("Step {} ({}) failed as expected: {}", number, label, e);
                    expected_failures += 1;
                }
                (Err(e), _) => return Err(e.context(format!("Step {} ({}) failed", number, label))),
            }
        }

        let balances = scenario
            .accounts
            .keys()
            .map(|name| (name.clone(), runner.chain.native_balance(&account(name))))
            .collect();
        Ok(ScenarioReport {
            steps: scenario.steps.len(),
            expected_failures,
            deployments: runner.deployments,
            balances,
        })
    }

    fn token(&self, name: &str) -> Result<Address> {
        self.tokens
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown token {}", name))
    }

    fn dao(&self, name: &str) -> Result<Address> {
        self.daos.get(name).cloned().ok_or_else(|| anyhow!("Unknown DAO {}", name))
    }

    fn proposal(&self, name: &str) -> Result<Address> {
        self.proposals
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("Unknown proposal {}", name))
    }

    /// DAO and proposal names resolve to their addresses, anything else to
    /// an account
    fn party(&self, name: &str) -> Address {
        self.daos
            .get(name)
            .or_else(|| self.proposals.get(name))
            .cloned()
            .unwrap_or_else(|| account(name))
    }

    fn token_amount(&self, token: &Address, text: &str) -> Result<Amount> {
        let decimals = self.chain.assets().erc20(token)?.decimals;
        Ok(parse_units(text, decimals)?)
    }

    fn pool_of(&self, dao: &Address) -> Result<Address> {
        Ok(self.chain.dao(dao)?.pool().as_dao_pool().address().clone())
    }

    fn payload(&self, spec: &PayloadSpec) -> Result<Payload> {
        Ok(match spec {
            PayloadSpec::SendErc20 { token, to, amount } => {
                let token = self.token(token)?;
                Payload::SendErc20 {
                    amount: self.token_amount(&token, amount)?,
                    token,
                    to: self.party(to),
                }
            }
            PayloadSpec::SendNft { token, to, token_id } => Payload::SendNft {
                token: self.token(token)?,
                to: self.party(to),
                token_id: *token_id,
            },
            PayloadSpec::SendNative { to, amount } => Payload::SendNative {
                to: self.party(to),
                amount: ether_amount(amount)?,
            },
        })
    }

    fn apply(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Fund { account: name, amount } => {
                self.chain.fund(&account(name), ether_amount(amount)?)?;
            }
            Action::DeployToken {
                name,
                deployer,
                symbol,
                decimals,
                supply,
            } => {
                let decimals = decimals.unwrap_or(DEFAULT_DECIMALS);
                let symbol = symbol.clone().unwrap_or_else(|| name.to_uppercase());
                let supply = parse_units(supply, decimals)?;
                let token = self.chain.deploy_erc20(&account(deployer), name, &symbol, decimals, supply);
                info!("Deployed token {} at {}", name, token);
                self.tokens.insert(name.clone(), token);
            }
            Action::DeployNft { name, deployer, symbol } => {
                let symbol = symbol.clone().unwrap_or_else(|| name.to_uppercase());
                let token = self.chain.deploy_erc721(&account(deployer), name, &symbol);
                info!("Deployed NFT collection {} at {}", name, token);
                self.tokens.insert(name.clone(), token);
            }
            Action::MintNft { token, to } => {
                let id = self.chain.mint_nft(&self.token(token)?, &self.party(to))?;
                info!("Minted {} #{} to {}", token, id, to);
            }
            Action::TransferNative { from, to, amount } => {
                self.chain
                    .transfer_native(&account(from), &self.party(to), ether_amount(amount)?)?;
            }
            Action::TransferToken { token, from, to, amount } => {
                let token = self.token(token)?;
                let amount = self.token_amount(&token, amount)?;
                self.chain.erc20_transfer(&account(from), &token, &self.party(to), amount)?;
            }
            Action::TransferNft { token, from, to, token_id } => {
                let token = self.token(token)?;
                self.chain.nft_transfer(&account(from), &token, &self.party(to), *token_id)?;
            }
            Action::CreateDao {
                name,
                kind,
                token,
                creator,
                challenge_period_seconds,
                extend_challenge_period_seconds,
                native_collateral,
                token_collateral,
            } => {
                let token = self.token(token)?;
                let params = self.dao_params(
                    *kind,
                    token.clone(),
                    *challenge_period_seconds,
                    *extend_challenge_period_seconds,
                    native_collateral.as_deref(),
                    token_collateral.as_deref(),
                )?;
                let created = self.chain.create_dao(&account(creator), params)?;
                self.deployments.push(DeploymentRecord {
                    name: name.clone(),
                    kind: *kind,
                    factory: self.chain.factory(*kind).address().clone(),
                    dao: created.dao.clone(),
                    pool: created.pool.clone(),
                    governance_token: token,
                    deployed_at: Utc::now(),
                });
                self.daos.insert(name.clone(), created.dao);
            }
            Action::ApproveToken { token, owner, dao, amount } => {
                let token = self.token(token)?;
                let pool = self.pool_of(&self.dao(dao)?)?;
                let amount = self.token_amount(&token, amount)?;
                self.chain.erc20_approve(&account(owner), &token, &pool, amount)?;
            }
            Action::ApproveNft {
                token,
                owner,
                dao,
                token_id,
            } => {
                let token = self.token(token)?;
                let pool = self.pool_of(&self.dao(dao)?)?;
                self.chain.nft_approve(&account(owner), &token, &pool, *token_id)?;
            }
            Action::Deposit { dao, account: name, amount } => {
                let dao = self.dao(dao)?;
                let token = self.chain.dao(&dao)?.params().governance_token.clone();
                let amount = self.token_amount(&token, amount)?;
                self.chain.deposit(&dao, &account(name), amount)?;
            }
            Action::DepositNft {
                dao,
                account: name,
                token_id,
            } => {
                self.chain.deposit_nft(&self.dao(dao)?, &account(name), *token_id)?;
            }
            Action::Withdraw {
                dao,
                account: name,
                amount,
                recipient,
            } => {
                let dao = self.dao(dao)?;
                let token = self.chain.dao(&dao)?.params().governance_token.clone();
                let amount = self.token_amount(&token, amount)?;
                let recipient = self.party(recipient.as_deref().unwrap_or(name));
                self.chain.withdraw(&dao, &account(name), amount, &recipient)?;
            }
            Action::WithdrawNft {
                dao,
                account: name,
                token_id,
                recipient,
            } => {
                let recipient = self.party(recipient.as_deref().unwrap_or(name));
                self.chain
                    .withdraw_nft(&self.dao(dao)?, &account(name), *token_id, &recipient)?;
            }
            Action::CreateProposal {
                name,
                dao,
                creator,
                value,
                id,
                merkle_root,
                payloads,
            } => {
                let id = id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
                let merkle_root = match merkle_root {
                    Some(hex) => MerkleRoot::from_hex(hex)?,
                    None => MerkleRoot::digest(id.as_bytes()),
                };
                let payloads = payloads
                    .iter()
                    .map(|spec| self.payload(spec))
                    .collect::<Result<Vec<_>>>()?;
                let handle = self.chain.create_proposal(
                    &self.dao(dao)?,
                    &account(creator),
                    ProposalId::from(id),
                    merkle_root,
                    payloads,
                    ether_amount(value)?,
                )?;
                self.proposals.insert(name.clone(), handle);
            }
            Action::Vote {
                proposal,
                voter,
                support,
                value,
            } => {
                let votes = self.chain.vote(
                    &self.proposal(proposal)?,
                    &account(voter),
                    Decision::from_support(*support),
                    ether_amount(value)?,
                )?;
                debug!("{} cast {} vote(s) on {}", voter, votes, proposal);
            }
            Action::VoteWithToken {
                proposal,
                voter,
                support,
            } => {
                let votes = self.chain.vote_with_token(
                    &self.proposal(proposal)?,
                    &account(voter),
                    Decision::from_support(*support),
                )?;
                debug!("{} holds {} token vote(s) on {}", voter, votes, proposal);
            }
            Action::AdvanceTime { seconds } => {
                self.clock.advance(*seconds);
                debug!("Advanced clock by {}s to {}", seconds, self.chain.now());
            }
            Action::Execute { proposal, caller } => {
                self.chain.execute_proposal(&self.proposal(proposal)?, &account(caller))?;
            }
            Action::Claim { proposal, caller } => {
                self.chain.claim_reward(&self.proposal(proposal)?, &account(caller))?;
            }
            Action::Resolve { proposal } => {
                self.chain.resolve_proposal(&self.proposal(proposal)?)?;
            }
            Action::ExpectBalance { account: name, amount } => {
                let expected = ether_amount(amount)?;
                let actual = self.chain.native_balance(&self.party(name));
                if actual != expected {
                    bail!("Balance of {} is {} wei, expected {} wei", name, actual, expected);
                }
            }
            Action::ExpectTokenBalance {
                token,
                account: name,
                amount,
            } => {
                let token = self.token(token)?;
                let expected = self.token_amount(&token, amount)?;
                let actual = self.chain.erc20_balance(&token, &self.party(name))?;
                if actual != expected {
                    bail!("Token balance of {} is {}, expected {}", name, actual, expected);
                }
            }
            Action::ExpectStatus { proposal, status } => {
                let actual = self.chain.proposal_status(&self.proposal(proposal)?)?;
                if !format!("{:?}", actual).eq_ignore_ascii_case(status) {
                    bail!("Proposal {} is {:?}, expected {}", proposal, actual, status);
                }
            }
        }
        Ok(())
    }

    fn dao_params(
        &self,
        kind: PoolKind,
        token: Address,
        challenge_period_seconds: Option<u64>,
        extend_challenge_period_seconds: Option<u64>,
        native_collateral: Option<&str>,
        token_collateral: Option<&str>,
    ) -> Result<DaoParams> {
        let defaults = &self.config.dao;
        let period = challenge_period_seconds.unwrap_or(defaults.challenge_period_seconds);
        let native = match native_collateral {
            Some(text) => ether_amount(text)?,
            None => defaults.native_collateral_amount()?,
        };
        let params = match kind {
            PoolKind::Erc20 => {
                let text = token_collateral.unwrap_or(defaults.token_collateral.as_str());
                let per_vote = self.token_amount(&token, text)?;
                DaoParams::erc20(token, period, native, per_vote)
            }
            PoolKind::Nft => {
                let mut params = DaoParams::nft(token, period, native);
                params.token_collateral = match token_collateral {
                    Some(text) => text.parse()?,
                    None => Amount::from(defaults.nft_token_collateral),
                };
                params
            }
        };
        Ok(params
            .with_extension(extend_challenge_period_seconds.unwrap_or(defaults.extend_challenge_period_seconds))
            .with_extension_window(defaults.extension_window_seconds))
    }
}

fn account(name: &str) -> Address {
    Address::from_label(name)
}

fn ether_amount(text: &str) -> Result<Amount> {
    Ok(parse_units(text, DEFAULT_DECIMALS)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dao_core::ether;

    const AGAINST_WINS: &str = r#"
name: against-wins
accounts:
  alice: "10"
  bob: "10"
steps:
  - deploy_token: { name: gov, deployer: alice, supply: "1000" }
  - create_dao: { name: dao, kind: erc20, token: gov, creator: alice }
  - create_proposal: { name: p1, dao: dao, creator: alice, value: "1" }
  - vote: { proposal: p1, voter: bob, support: false, value: "1" }
  - vote: { proposal: p1, voter: bob, support: false, value: "0.5" }
    expect_error: Collateral too small
  - execute: { proposal: p1, caller: alice }
    expect_error: Is not after challenge period
  - advance_time: { seconds: 15 }
  - expect_status: { proposal: p1, status: failed }
  - execute: { proposal: p1, caller: alice }
    expect_error: Proposal did not pass
  - claim: { proposal: p1, caller: alice }
    expect_error: Reward not apply
  - claim: { proposal: p1, caller: bob }
  - expect_balance: { account: bob, amount: "11" }
"#;

    #[test]
    fn test_against_wins_scenario() {
        let scenario = Scenario::from_yaml(AGAINST_WINS).unwrap();
        let report = ScenarioRunner::run(SimulatorConfig::default(), &scenario).unwrap();

        assert_eq!(report.steps, 12);
        assert_eq!(report.expected_failures, 4);
        assert_eq!(report.balances["alice"], ether(9));
        assert_eq!(report.balances["bob"], ether(11));
        assert_eq!(report.deployments.len(), 1);
        assert_eq!(report.deployments[0].kind, PoolKind::Erc20);
    }

    #[test]
    fn test_token_votes_and_treasury_payload() {
        let yaml = r#"
accounts:
  alice: "10"
steps:
  - deploy_token: { name: gov, deployer: alice, supply: "1000" }
  - create_dao: { name: dao, kind: erc20, token: gov, creator: alice }
  - transfer_token: { token: gov, from: alice, to: dao, amount: "10" }
  - approve_token: { token: gov, owner: alice, dao: dao, amount: "500" }
  - deposit: { dao: dao, account: alice, amount: "500" }
  - create_proposal:
      name: p1
      dao: dao
      creator: alice
      value: "1"
      payloads:
        - send_erc20: { token: gov, to: carol, amount: "3" }
  - vote_with_token: { proposal: p1, voter: alice, support: true }
  - withdraw: { dao: dao, account: alice, amount: "1" }
    expect_error: User has active proposals
  - advance_time: { seconds: 15 }
  - execute: { proposal: p1, caller: alice }
  - expect_token_balance: { token: gov, account: carol, amount: "3" }
  - expect_token_balance: { token: gov, account: dao, amount: "7" }
  - resolve: { proposal: p1 }
  - withdraw: { dao: dao, account: alice, amount: "500" }
  - expect_token_balance: { token: gov, account: alice, amount: "990" }
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        let report = ScenarioRunner::run(SimulatorConfig::default(), &scenario).unwrap();
        assert_eq!(report.expected_failures, 1);
        assert_eq!(report.balances["alice"], ether(10));
    }

    #[test]
    fn test_bundled_scenarios_replay() {
        for yaml in [
            include_str!("../../../scenarios/three-to-two.yaml"),
            include_str!("../../../scenarios/nft-pool.yaml"),
        ] {
            let scenario = Scenario::from_yaml(yaml).unwrap();
            ScenarioRunner::run(SimulatorConfig::default(), &scenario).unwrap();
        }
    }

    #[test]
    fn test_unexpected_success_is_reported() {
        let yaml = r#"
accounts:
  alice: "10"
steps:
  - transfer_native: { from: alice, to: bob, amount: "1" }
    expect_error: Insufficient funds
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        let err = ScenarioRunner::run(SimulatorConfig::default(), &scenario).unwrap_err();
        assert!(err.to_string().contains("expected to fail"));
    }

    #[test]
    fn test_failed_step_names_its_position() {
        let yaml = r#"
steps:
  - vote: { proposal: missing, voter: bob, support: true, value: "1" }
"#;
        let scenario = Scenario::from_yaml(yaml).unwrap();
        let err = ScenarioRunner::run(SimulatorConfig::default(), &scenario).unwrap_err();
        assert!(format!("{:#}", err).contains("Step 1 (vote) failed"));
    }
}
