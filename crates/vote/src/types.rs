use serde::{Deserialize, Serialize};

use daogov_core::{Address, Hash};

/// How a single cast is weighted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteMechanism {
    /// One account, one vote: every cast weighs exactly 1
    UniqueVote,
    /// One token, one vote: a cast weighs the amount of tokens behind it
    TokenBallot,
}

/// Limit on how often one voter may cast on the same item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteStrategy {
    Unlimited,
    /// At most `n` casts per voter per UTC calendar day
    DailyCount(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOption {
    Approve,
    Reject,
    Abstain,
}

/// Who decides a DAO's proposals
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GovernanceMechanism {
    /// The elected High Council
    HighCouncil,
    /// Every token holder
    Referendum,
    /// Organization members
    Organization,
}

impl GovernanceMechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            GovernanceMechanism::HighCouncil => "HighCouncil",
            GovernanceMechanism::Referendum => "Referendum",
            GovernanceMechanism::Organization => "Organization",
        }
    }
}

/// Defining parameters of a vote scheme; its id is derived from these
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteSchemeConfig {
    pub mechanism: VoteMechanism,
    /// Escrow the voted tokens instead of only checking the balance
    pub requires_token_lock: bool,
    pub strategy: VoteStrategy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteScheme {
    pub id: Hash,
    pub mechanism: VoteMechanism,
    pub requires_token_lock: bool,
    pub strategy: VoteStrategy,
}

/// The unit of tallying, bound 1:1 to a proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingItem {
    pub id: Hash,
    pub dao_id: Hash,
    pub scheme_id: Hash,
    pub accepted_token: Option<String>,
    /// Mechanism of the governance scheme at registration time
    pub governance_mechanism: GovernanceMechanism,
    pub registered_at: i64,
    pub active_start: i64,
    pub active_end: i64,
}

/// Running tally of a voting item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingResult {
    pub voting_item_id: Hash,
    pub approve_weight: u64,
    pub reject_weight: u64,
    pub abstain_weight: u64,
    pub total_weight: u64,
    pub unique_voter_count: u64,
    pub active_start: i64,
    pub active_end: i64,
}

impl VotingResult {
    pub(crate) fn new(item: &VotingItem) -> Self {
        Self {
            voting_item_id: item.id,
            active_start: item.active_start,
            active_end: item.active_end,
            ..Self::default()
        }
    }

    pub(crate) fn add(&mut self, option: VoteOption, amount: u64, new_voter: bool) {
        match option {
            VoteOption::Approve => self.approve_weight = self.approve_weight.saturating_add(amount),
            VoteOption::Reject => self.reject_weight = self.reject_weight.saturating_add(amount),
            VoteOption::Abstain => self.abstain_weight = self.abstain_weight.saturating_add(amount),
        }
        self.total_weight = self.total_weight.saturating_add(amount);
        if new_voter {
            self.unique_voter_count += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteDetail {
    pub vote_id: Hash,
    pub option: VoteOption,
    pub amount: u64,
    pub timestamp: i64,
}

/// Everything one voter cast on one voting item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingRecord {
    pub voting_item_id: Hash,
    pub voter: Address,
    pub cumulative_amount: u64,
    pub last_option: VoteOption,
    pub last_vote_id: Hash,
    pub details: Vec<VoteDetail>,
}

/// Status of a voting item, derived from the clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VotingItemStatus {
    Unregistered,
    /// Registered with a window that has not opened yet
    Pending,
    Active,
    Closed,
}

impl VotingItemStatus {
    pub fn of(item: Option<&VotingItem>, now: i64) -> Self {
        match item {
            None => VotingItemStatus::Unregistered,
            Some(item) if now < item.active_start => VotingItemStatus::Pending,
            Some(item) if now <= item.active_end => VotingItemStatus::Active,
            Some(_) => VotingItemStatus::Closed,
        }
    }
}

/// Registration request from the governance engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterVotingItem {
    /// Id of the proposal the item is bound to
    pub voting_item_id: Hash,
    pub scheme_id: Hash,
    pub accepted_token: Option<String>,
    pub active_start: i64,
    pub active_end: i64,
}

/// Registration request from the election engine for one candidate and term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItemInput {
    pub dao_id: Hash,
    pub term: u64,
    pub candidate: Address,
    pub scheme_id: Hash,
    pub accepted_token: String,
    pub active_start: i64,
    pub active_end: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteInput {
    pub voting_item_id: Hash,
    pub option: VoteOption,
    pub amount: u64,
    #[serde(default)]
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawInput {
    pub dao_id: Hash,
    pub voting_item_ids: Vec<Hash>,
    pub amount: u64,
}
