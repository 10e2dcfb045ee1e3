use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::Transaction;
use crate::crypto::{Address, Hash};
use crate::CoreResult;

/// Identity and status of a registered DAO
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoInfo {
    pub dao_id: Hash,
    pub creator: Address,
    pub governance_token: Option<String>,
    pub treasury: Option<Address>,
    /// The network-wide DAO whose High Council falls back to block producers
    pub is_network_dao: bool,
    /// Whether the DAO is active
    pub subsist_status: bool,
}

/// Read access to the organization registry
#[async_trait]
pub trait OrganizationRegistry: Send + Sync {
    /// Address the registry acts under when it calls other components
    fn registry_address(&self) -> &Address;

    /// Look up a DAO
    async fn dao_info(&self, tx: &Transaction, dao_id: &Hash) -> CoreResult<Option<DaoInfo>>;

    /// Whether a DAO exists and is active
    async fn subsist_status(&self, tx: &Transaction, dao_id: &Hash) -> CoreResult<bool> {
        Ok(self
            .dao_info(tx, dao_id)
            .await?
            .map(|info| info.subsist_status)
            .unwrap_or(false))
    }

    /// Treasury account of a DAO, if it has one
    async fn treasury_address(&self, tx: &Transaction, dao_id: &Hash) -> CoreResult<Option<Address>> {
        Ok(self.dao_info(tx, dao_id).await?.and_then(|info| info.treasury))
    }

    /// Whether `who` is a member of the DAO's organization
    async fn is_member(&self, tx: &Transaction, dao_id: &Hash, who: &Address) -> CoreResult<bool>;

    /// All organization members, in ascending address order
    async fn members(&self, tx: &Transaction, dao_id: &Hash) -> CoreResult<Vec<Address>>;
}
