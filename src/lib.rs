//! DAO governance engine
//!
//! Governance proposals decided under High Council, Referendum or Organization
//! rules, the weighted voting engine that tallies them, and the staked
//! candidate election that seats the High Council.

pub mod deployment;

pub use deployment::{Deployment, DeploymentExecutor, ElectionCall};

/// Module version information
pub mod version {
    /// The current version of the governance library
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Re-export the shared building blocks
pub mod core {
    pub use daogov_config as config;
    pub use daogov_core as primitives;
}

/// Re-export the engines
pub mod engines {
    pub use daogov_election as election;
    pub use daogov_governance as governance;
    pub use daogov_vote as vote;
}
