//! Staked candidate election
//!
//! Candidates lock a stake of the DAO's governance token to run for the High
//! Council. Token holders back them through per-term voting items in the vote
//! engine, and a snapshot ranks the candidates and fixes the council (the
//! "victories") for that term.

use thiserror::Error;

use daogov_core::{CoreError, Hash};
use daogov_vote::VoteError;

pub mod candidate;
pub mod engine;
pub mod events;
pub mod keys;
pub mod types;
pub mod view;


pub use engine::ElectionEngine;
pub use events::{
    CandidateAdded, CandidateAdminChanged, CandidateBanned, CandidateRemoved, ElectionVotingEventRegistered,
    TermSnapshotTaken,
};
pub use types::{CandidateInformation, ElectionTerm, HighCouncilConfig, TermSnapshot};
pub use view::CouncilView;

/// Error types for election operations
#[derive(Error, Debug)]
pub enum ElectionError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("{0}")]
    Vote(#[from] VoteError),

    #[error("No permission: {0}")]
    PermissionDenied(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HighCouncilConfig not initialize: {0}")]
    ConfigNotInitialized(Hash),

    #[error("HighCouncilConfig already registered: {0}")]
    ConfigExists(Hash),

    #[error("Candidate cannot be others' admin.")]
    CandidateIsAdmin,

    #[error("This candidate already banned before.")]
    Banned,

    #[error("This address already announced election: {0}")]
    AlreadyAnnounced(String),

    #[error("The number of candidates cannot exceed {0}")]
    TooManyCandidates(u32),

    #[error("Target is not a candidate.")]
    NotCandidate,

    #[error("Only admin can quit election.")]
    NotAdmin,

    #[error("Term {requested} is before the latest snapshot {latest}")]
    TermOutOfOrder { requested: u64, latest: u64 },

    #[error("Voting for term {0} has not ended")]
    TermNotEnded(u64),
}

/// Result type for election operations
pub type ElectionResult<T> = Result<T, ElectionError>;
