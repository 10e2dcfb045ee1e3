use serde::{Deserialize, Serialize};

use daogov_core::{Address, ContractEvent, Hash};

use crate::types::{GovernanceMechanism, VoteMechanism, VoteOption, VoteStrategy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSchemeCreated {
    pub scheme_id: Hash,
    pub mechanism: VoteMechanism,
    pub requires_token_lock: bool,
    pub strategy: VoteStrategy,
}

impl ContractEvent for VoteSchemeCreated {
    const NAME: &'static str = "VoteSchemeCreated";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingItemRegistered {
    pub dao_id: Hash,
    pub voting_item_id: Hash,
    pub scheme_id: Hash,
    pub accepted_token: Option<String>,
    pub governance_mechanism: GovernanceMechanism,
    pub registered_at: i64,
    pub active_start: i64,
    pub active_end: i64,
}

impl ContractEvent for VotingItemRegistered {
    const NAME: &'static str = "VotingItemRegistered";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voted {
    pub dao_id: Hash,
    pub voting_item_id: Hash,
    pub voter: Address,
    pub vote_id: Hash,
    pub option: VoteOption,
    pub amount: u64,
    pub mechanism: VoteMechanism,
    /// Whether `amount` was moved into the voter's escrow account
    pub locked: bool,
    pub timestamp: i64,
    pub active_start: i64,
    pub active_end: i64,
    pub memo: String,
}

impl ContractEvent for Voted {
    const NAME: &'static str = "Voted";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawn {
    pub dao_id: Hash,
    pub withdrawer: Address,
    pub amount: u64,
    pub voting_item_ids: Vec<Hash>,
    pub timestamp: i64,
}

impl ContractEvent for Withdrawn {
    const NAME: &'static str = "Withdrawn";
}
