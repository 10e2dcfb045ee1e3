use serde::{Deserialize, Serialize};

use daogov_core::{Address, ContractEvent, Hash};

use crate::types::HighCouncilConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionVotingEventRegistered {
    pub dao_id: Hash,
    pub config: HighCouncilConfig,
    pub first_term_ends_at: i64,
}

impl ContractEvent for ElectionVotingEventRegistered {
    const NAME: &'static str = "ElectionVotingEventRegistered";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateAdded {
    pub dao_id: Hash,
    pub candidate: Address,
    pub admin: Address,
    pub sponsor: Option<Address>,
    pub announcement_id: Hash,
    /// Stake locked for the candidacy
    pub amount: u64,
    pub term: u64,
}

impl ContractEvent for CandidateAdded {
    const NAME: &'static str = "CandidateAdded";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRemoved {
    pub dao_id: Hash,
    pub candidate: Address,
    /// Account the stake was released to
    pub refunded_to: Address,
    pub amount: u64,
}

impl ContractEvent for CandidateRemoved {
    const NAME: &'static str = "CandidateRemoved";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateAdminChanged {
    pub dao_id: Hash,
    pub candidate: Address,
    pub old_admin: Address,
    pub new_admin: Address,
}

impl ContractEvent for CandidateAdminChanged {
    const NAME: &'static str = "CandidateAdminChanged";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateBanned {
    pub dao_id: Hash,
    pub address: Address,
}

impl ContractEvent for CandidateBanned {
    const NAME: &'static str = "CandidateBanned";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermSnapshotTaken {
    pub dao_id: Hash,
    pub term: u64,
    pub victories: Vec<Address>,
    pub supports: Vec<(Address, u64)>,
    pub next_term_ends_at: i64,
}

impl ContractEvent for TermSnapshotTaken {
    const NAME: &'static str = "TermSnapshotTaken";
}
