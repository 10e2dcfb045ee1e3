pub mod action;
pub mod council;
pub mod organization;
pub mod producers;
pub mod token;

// Re-export all interfaces for easier access
pub use action::{ActionExecutor, NoopActionExecutor, ProposalAction};
pub use council::CouncilDirectory;
pub use organization::{DaoInfo, OrganizationRegistry};
pub use producers::BlockProducerSet;
pub use token::TokenLedger;
