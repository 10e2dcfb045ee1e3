//! Reference organization registry and block-producer set

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::context::Transaction;
use crate::crypto::{Address, Hash};
use crate::event::ContractEvent;
use crate::interfaces::{BlockProducerSet, DaoInfo, OrganizationRegistry};
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaoRegistered {
    pub dao: DaoInfo,
}

impl ContractEvent for DaoRegistered {
    const NAME: &'static str = "DaoRegistered";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipChanged {
    pub dao_id: Hash,
    pub member: Address,
    pub is_member: bool,
}

impl ContractEvent for MembershipChanged {
    const NAME: &'static str = "MembershipChanged";
}

fn dao_key(dao_id: &Hash) -> String {
    format!("registry/daos/{}", dao_id)
}

fn members_prefix(dao_id: &Hash) -> String {
    format!("registry/members/{}/", dao_id)
}

fn member_key(dao_id: &Hash, member: &Address) -> String {
    format!("{}{}", members_prefix(dao_id), member)
}

/// Organization registry persisted through the current [`Transaction`]
#[derive(Debug, Clone)]
pub struct StoreOrganizationRegistry {
    address: Address,
}

impl StoreOrganizationRegistry {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Id a DAO named `name` receives from this registry
    pub fn dao_id_for(&self, name: &str) -> Hash {
        Hash::concat_and_compute(&[
            Hash::from_str_data(self.address.as_str()),
            Hash::from_str_data(name),
        ])
    }

    /// Register a DAO; the sender becomes its creator and first member
    pub async fn register_dao(
        &self,
        tx: &mut Transaction,
        name: &str,
        governance_token: Option<String>,
        is_network_dao: bool,
    ) -> CoreResult<DaoInfo> {
        if name.is_empty() {
            return Err(CoreError::Registry("DAO name is empty".to_string()));
        }
        let dao_id = self.dao_id_for(name);
        if tx.contains(&dao_key(&dao_id)).await? {
            return Err(CoreError::Registry(format!("DAO {} already exists", name)));
        }

        let creator = tx.sender().clone();
        let info = DaoInfo {
            dao_id,
            creator: creator.clone(),
            governance_token,
            treasury: Some(Address::virtual_of(&self.address, &dao_id)),
            is_network_dao,
            subsist_status: true,
        };
        tx.put_json(dao_key(&dao_id), &info)?;
        tx.put_json(member_key(&dao_id, &creator), &true)?;

        info!("Registered DAO {} ({})", name, dao_id);
        let address = self.address.clone();
        tx.emit(&address, &DaoRegistered { dao: info.clone() })?;
        Ok(info)
    }

    async fn creator_only(&self, tx: &Transaction, dao_id: &Hash) -> CoreResult<DaoInfo> {
        let info = self
            .dao_info(tx, dao_id)
            .await?
            .ok_or_else(|| CoreError::Registry(format!("DAO {} not found", dao_id)))?;
        if tx.sender() != &info.creator {
            return Err(CoreError::PermissionDenied(format!(
                "only the creator can manage DAO {}",
                dao_id
            )));
        }
        Ok(info)
    }

    pub async fn add_member(&self, tx: &mut Transaction, dao_id: &Hash, member: &Address) -> CoreResult<()> {
        self.creator_only(tx, dao_id).await?;
        tx.put_json(member_key(dao_id, member), &true)?;
        let address = self.address.clone();
        tx.emit(
            &address,
            &MembershipChanged {
                dao_id: *dao_id,
                member: member.clone(),
                is_member: true,
            },
        )
    }

    pub async fn remove_member(&self, tx: &mut Transaction, dao_id: &Hash, member: &Address) -> CoreResult<()> {
        self.creator_only(tx, dao_id).await?;
        if !tx.contains(&member_key(dao_id, member)).await? {
            return Err(CoreError::Registry(format!("{} is not a member", member)));
        }
        tx.delete(member_key(dao_id, member))?;
        let address = self.address.clone();
        tx.emit(
            &address,
            &MembershipChanged {
                dao_id: *dao_id,
                member: member.clone(),
                is_member: false,
            },
        )
    }

    /// Activate or deactivate a DAO
    pub async fn set_subsist_status(&self, tx: &mut Transaction, dao_id: &Hash, active: bool) -> CoreResult<()> {
        let mut info = self.creator_only(tx, dao_id).await?;
        info.subsist_status = active;
        tx.put_json(dao_key(dao_id), &info)
    }
}

impl Default for StoreOrganizationRegistry {
    fn default() -> Self {
        Self::new(Address::new("registry"))
    }
}

#[async_trait]
impl OrganizationRegistry for StoreOrganizationRegistry {
    fn registry_address(&self) -> &Address {
        &self.address
    }

    async fn dao_info(&self, tx: &Transaction, dao_id: &Hash) -> CoreResult<Option<DaoInfo>> {
        tx.get_json(&dao_key(dao_id)).await
    }

    async fn is_member(&self, tx: &Transaction, dao_id: &Hash, who: &Address) -> CoreResult<bool> {
        tx.contains(&member_key(dao_id, who)).await
    }

    async fn members(&self, tx: &Transaction, dao_id: &Hash) -> CoreResult<Vec<Address>> {
        let prefix = members_prefix(dao_id);
        Ok(tx
            .list(&prefix)
            .await?
            .into_iter()
            .map(|key| Address::new(&key[prefix.len()..]))
            .collect())
    }
}

/// Block-producer set held in memory and replaced wholesale
#[derive(Debug, Default)]
pub struct StaticProducerSet {
    producers: RwLock<BTreeSet<Address>>,
}

impl StaticProducerSet {
    pub fn new(producers: impl IntoIterator<Item = Address>) -> Self {
        Self {
            producers: RwLock::new(producers.into_iter().collect()),
        }
    }

    /// Replace the producer set
    pub async fn set(&self, producers: impl IntoIterator<Item = Address>) {
        *self.producers.write().await = producers.into_iter().collect();
    }
}

#[async_trait]
impl BlockProducerSet for StaticProducerSet {
    async fn current_producers(&self, _tx: &Transaction) -> CoreResult<Vec<Address>> {
        Ok(self.producers.read().await.iter().cloned().collect())
    }
}
