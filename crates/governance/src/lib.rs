//! Governance proposal state machine
//!
//! Proposals are bound to a per-DAO governance scheme (High Council,
//! Referendum or Organization) and to a vote scheme. Creating a proposal
//! derives its time windows and registers its voting item; executing it
//! re-reads the tally, applies the scheme's basis-point thresholds and runs
//! the attached action exactly once.

use thiserror::Error;

use daogov_config::ConfigError;
use daogov_core::{Address, CoreError, CryptoError, Hash};
use daogov_vote::VoteError;

pub mod engine;
pub mod events;
pub mod execution;
pub mod keys;
pub mod proposal;
pub mod scheme;
pub mod types;

#[cfg(test)]
mod tests;

pub use engine::GovernanceEngine;
pub use events::{
    GovernanceSchemeAdded, GovernanceSchemeRemoved, GovernanceSchemeThresholdUpdated, GovernanceTokenSet,
    ProposalCreated, ProposalExecuted, ProposalTimePeriodSet, ProposalVetoed,
};
pub use execution::{evaluate_thresholds, Electorate};
pub use types::{
    CreateProposalInput, CreateVetoProposalInput, GovernanceCall, GovernanceScheme, GovernanceSchemeThreshold,
    ProposalBasicInfo, ProposalInfo, ProposalStatus, ProposalTime, ProposalType, BASIS_POINTS,
};

/// Error types for governance operations
#[derive(Error, Debug)]
pub enum GovernanceError {
    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("{0}")]
    Vote(#[from] VoteError),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("No permission: {0}")]
    PermissionDenied(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid input governance scheme threshold: {0}")]
    InvalidThreshold(String),

    #[error("Invalid vote scheme for mechanism: {0}")]
    InvalidVoteScheme(String),

    #[error("Governance scheme already exists: {0}")]
    SchemeExists(Address),

    #[error("Governance scheme not found: {0}")]
    SchemeNotFound(Address),

    #[error("Dao {0} not exists.")]
    DaoNotFound(Hash),

    #[error("DAO is not in subsistence: {0}")]
    DaoNotActive(Hash),

    #[error("Token not found: {0}")]
    TokenNotFound(String),

    #[error("Proposal not found: {0}")]
    ProposalNotFound(Hash),

    #[error("Not eligible to propose: {0}")]
    NotEligible(String),

    #[error("Proposal {id} cannot be vetoed while {status:?}")]
    NotVetoable { id: Hash, status: ProposalStatus },

    #[error("Proposal {0} cannot be executed: {1}")]
    NotExecutable(Hash, String),

    #[error("Proposal already executed: {0}")]
    AlreadyExecuted(Hash),

    #[error("Proposal has been vetoed: {0}")]
    Vetoed(Hash),

    #[error("Proposal {0} did not reach the thresholds of its scheme")]
    ThresholdNotMet(Hash),

    #[error("Unknown governance method: {0}")]
    UnknownMethod(String),
}

/// Result type for governance operations
pub type GovernanceResult<T> = Result<T, GovernanceError>;
