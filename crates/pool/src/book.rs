//! Proposal-scoped vote bookkeeping shared by both pool kinds

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use dao_core::{Address, Decision};

use crate::error::{PoolError, PoolResult};

/// Which proposals may record votes, who voted on them, and how many
/// unresolved votes each voter has outstanding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalBook {
    /// Proposals allowed to call `vote`
    approved: HashSet<Address>,
    /// Voters in favour, in submission order
    for_voters: HashMap<Address, Vec<Address>>,
    /// Voters against, in submission order
    against_voters: HashMap<Address, Vec<Address>>,
    /// Unresolved vote count per voter
    active: HashMap<Address, u64>,
}

/// Voter lists detached from a proposal at resolution time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub for_voters: Vec<Address>,
    pub against_voters: Vec<Address>,
}

impl Resolution {
    /// Distinct voters who sided against `winner`
    pub fn losers(&self, winner: Decision) -> Vec<Address> {
        let listed = match winner {
            Decision::For => &self.against_voters,
            Decision::Against => &self.for_voters,
        };
        listed
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect()
    }
}

impl ProposalBook {
    pub fn approve(&mut self, proposal: &Address) {
        self.approved.insert(proposal.clone());
    }

    pub fn is_approved(&self, proposal: &Address) -> bool {
        self.approved.contains(proposal)
    }

    pub fn approved_proposals(&self) -> impl Iterator<Item = &Address> {
        self.approved.iter()
    }

    fn voters(&self, proposal: &Address, decision: Decision) -> &[Address] {
        let lists = match decision {
            Decision::For => &self.for_voters,
            Decision::Against => &self.against_voters,
        };
        lists.get(proposal).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn for_voters(&self, proposal: &Address) -> &[Address] {
        self.voters(proposal, Decision::For)
    }

    pub fn against_voters(&self, proposal: &Address) -> &[Address] {
        self.voters(proposal, Decision::Against)
    }

    pub fn has_voted(&self, proposal: &Address, voter: &Address, decision: Decision) -> bool {
        self.voters(proposal, decision).contains(voter)
    }

    pub fn active_proposals(&self, voter: &Address) -> u64 {
        self.active.get(voter).copied().unwrap_or_default()
    }

    /// Record `voter` on `decision` for an approved `proposal`.
    ///
    /// The active counter moves before the voter lands in the list.
    pub fn record_vote(&mut self, proposal: &Address, voter: &Address, decision: Decision) -> PoolResult<()> {
        if !self.is_approved(proposal) {
            return Err(PoolError::ProposalNotApproved);
        }
        if self.has_voted(proposal, voter, decision) {
            return Err(PoolError::AlreadyVoted);
        }

        *self.active.entry(voter.clone()).or_default() += 1;
        let lists = match decision {
            Decision::For => &mut self.for_voters,
            Decision::Against => &mut self.against_voters,
        };
        lists.entry(proposal.clone()).or_default().push(voter.clone());
        Ok(())
    }

    /// Fail unless `proposal` is approved and its voting has ended
    pub fn ensure_resolvable(&self, proposal: &Address, ended: bool) -> PoolResult<()> {
        if !self.is_approved(proposal) {
            return Err(PoolError::ProposalNotApproved);
        }
        if !ended {
            return Err(PoolError::ProposalNotEnded);
        }
        Ok(())
    }

    /// Detach all voters from `proposal`, release their active counts and
    /// revoke the approval.
    pub fn take_resolution(&mut self, proposal: &Address) -> Resolution {
        let resolution = Resolution {
            for_voters: self.for_voters.remove(proposal).unwrap_or_default(),
            against_voters: self.against_voters.remove(proposal).unwrap_or_default(),
        };
        for voter in resolution.for_voters.iter().chain(&resolution.against_voters) {
            if let Some(count) = self.active.get_mut(voter) {
                *count = count.saturating_sub(1);
            }
        }
        self.active.retain(|_, count| *count > 0);
        self.approved.remove(proposal);
        resolution
    }
}
