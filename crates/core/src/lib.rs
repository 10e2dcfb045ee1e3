//! Core primitives shared by the DAO governance engines
//!
//! This crate provides the building blocks every engine sits on: content
//! hashing and addresses, the key-value storage abstraction, the transactional
//! execution context, event records and the traits through which the engines
//! reach their external collaborators.

use thiserror::Error;

pub mod addresses;
pub mod context;
pub mod crypto;
pub mod event;
pub mod interfaces;
pub mod ledger;
pub mod registry;
pub mod storage;
pub mod utils;

pub use addresses::ComponentAddresses;
pub use context::{Host, Transaction, TxContext};
pub use crypto::{Address, CryptoError, Hash};
pub use event::{ContractEvent, EventRecord};
pub use interfaces::{
    ActionExecutor, BlockProducerSet, CouncilDirectory, DaoInfo, NoopActionExecutor, OrganizationRegistry,
    ProposalAction, TokenLedger,
};
pub use ledger::StoreTokenLedger;
pub use registry::{StaticProducerSet, StoreOrganizationRegistry};
pub use storage::{FileStorage, JsonStorage, MemoryStorage, Storage, StorageError, StorageResult};

/// Errors raised by core primitives and external collaborators
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Write attempted in a read-only context: {0}")]
    ReadOnly(String),

    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    #[error("Insufficient allowance: {0}")]
    InsufficientAllowance(String),

    #[error("Token not found: {0}")]
    TokenNotFound(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Action failed: {0}")]
    ActionFailed(String),
}

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Version of the governance engine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
