//! Vote scheme and tallying engine
//!
//! This crate defines reusable vote schemes, binds them to voting items (one
//! per proposal), accepts votes, keeps per-voter history and tracks the tokens
//! voters escrowed so they can reclaim them once voting has closed.

use thiserror::Error;

use daogov_core::{CoreError, CryptoError, Hash};

pub mod custody;
pub mod engine;
pub mod events;
pub mod keys;
pub mod types;


pub use engine::{ProposalBinding, ProposalDirectory, VoteEngine, DEFAULT_MEMO_MAX_LENGTH};
pub use events::{VoteSchemeCreated, Voted, VotingItemRegistered, Withdrawn};
pub use types::{
    CandidateItemInput, GovernanceMechanism, RegisterVotingItem, VoteDetail, VoteInput, VoteMechanism, VoteOption,
    VoteScheme, VoteSchemeConfig, VoteStrategy, VotingItem, VotingItemStatus, VotingRecord, VotingResult,
    WithdrawInput,
};

/// Error types for voting operations
#[derive(Error, Debug)]
pub enum VoteError {
    /// Failure in storage, the token ledger or another collaborator
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("No permission: {0}")]
    PermissionDenied(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid vote amount: {0}")]
    InvalidAmount(String),

    #[error("VoteScheme already exists: {0}")]
    DuplicateScheme(Hash),

    #[error("VoteScheme not found: {0}")]
    SchemeNotFound(Hash),

    #[error("Voting item not found: {0}")]
    VotingItemNotFound(Hash),

    #[error("Voting item already registered: {0}")]
    VotingItemExists(Hash),

    #[error("Proposal or governance scheme not found: {0}")]
    ProposalNotFound(Hash),

    #[error("DAO is not active: {0}")]
    DaoNotActive(Hash),

    #[error("Token not found: {0}")]
    TokenNotFound(String),

    #[error("Vote not begin.")]
    VoteNotStarted,

    #[error("Vote ended.")]
    VoteEnded,

    #[error("Not eligible to vote: {0}")]
    NotEligible(String),

    #[error("Voter already voted today.")]
    DailyLimitReached,

    #[error("Voter already voted.")]
    AlreadyVoted,

    #[error("Voting item has not closed yet: {0}")]
    VoteNotEnded(Hash),

    #[error("Invalid withdraw: {0}")]
    InvalidWithdraw(String),
}

/// Result type for voting operations
pub type VoteResult<T> = Result<T, VoteError>;
