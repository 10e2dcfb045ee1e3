use serde::{Deserialize, Serialize};

use daogov_core::{Address, Hash};

/// Per-DAO election settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighCouncilConfig {
    /// Seats on the council
    pub max_members: u32,
    /// Upper bound on simultaneous candidates
    pub max_candidates: u32,
    /// Governance tokens a candidate locks when announcing
    pub stake_threshold: u64,
    pub governance_token: String,
    /// Length of a term's voting window, in seconds
    pub election_period: i64,
    /// TokenBallot scheme used for candidate voting items
    pub candidate_vote_scheme_id: Hash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateInformation {
    pub dao_id: Hash,
    pub candidate: Address,
    pub is_current_candidate: bool,
    /// Transaction that announced the candidacy; also seeds the stake lock
    pub announcement_id: Hash,
    pub admin: Option<Address>,
    pub sponsor: Option<Address>,
    pub announced_at: i64,
    /// Terms the candidate won a seat in
    pub elected_terms: Vec<u64>,
}

/// The term currently open for candidate voting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionTerm {
    pub term: u64,
    pub started_at: i64,
    pub ends_at: i64,
}

/// Council fixed by a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermSnapshot {
    pub term: u64,
    pub victories: Vec<Address>,
    /// Approve weight of every ranked candidate, in rank order
    pub supports: Vec<(Address, u64)>,
    pub taken_at: i64,
}
