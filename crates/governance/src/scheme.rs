//! Governance scheme and time period management
//!
//! Apart from the registry bootstrap path for new DAOs, every call here must
//! come from the governance engine itself, which only happens while it runs
//! the action of an executed Governance proposal.

use tracing::info;

use daogov_config::ProposalTimePeriod;
use daogov_core::{Address, Hash, Transaction};
use daogov_vote::GovernanceMechanism;

use crate::engine::GovernanceEngine;
use crate::events::{
    GovernanceSchemeAdded, GovernanceSchemeRemoved, GovernanceSchemeThresholdUpdated, GovernanceTokenSet,
    ProposalTimePeriodSet,
};
use crate::keys;
use crate::types::{GovernanceScheme, GovernanceSchemeThreshold};
use crate::{GovernanceError, GovernanceResult};

impl GovernanceEngine {
    fn require_self(&self, tx: &Transaction) -> GovernanceResult<()> {
        if tx.sender() != self.address() {
            return Err(GovernanceError::PermissionDenied(
                "only an executed governance proposal can do this".to_string(),
            ));
        }
        Ok(())
    }

    fn require_self_or_registry(&self, tx: &Transaction) -> GovernanceResult<()> {
        if tx.sender() != self.address() && tx.sender() != self.registry.registry_address() {
            return Err(GovernanceError::PermissionDenied(
                "only the registry or an executed governance proposal can do this".to_string(),
            ));
        }
        Ok(())
    }

    async fn require_dao_scheme(
        &self,
        tx: &Transaction,
        dao_id: &Hash,
        scheme_address: &Address,
    ) -> GovernanceResult<GovernanceScheme> {
        let scheme = self.require_scheme(tx, scheme_address).await?;
        if scheme.dao_id != *dao_id {
            return Err(GovernanceError::InvalidInput(format!(
                "scheme {} does not belong to DAO {}",
                scheme_address, dao_id
            )));
        }
        Ok(scheme)
    }

    async fn require_token(&self, tx: &Transaction, symbol: &str) -> GovernanceResult<()> {
        if symbol.is_empty() || !self.ledger.token_exists(tx, symbol).await? {
            return Err(GovernanceError::TokenNotFound(symbol.to_string()));
        }
        Ok(())
    }

    /// Add the scheme a DAO uses for `mechanism`; returns its address.
    ///
    /// Token-weighted mechanisms fall back to the DAO's governance token.
    pub async fn add_governance_scheme(
        &self,
        tx: &mut Transaction,
        dao_id: &Hash,
        mechanism: GovernanceMechanism,
        threshold: GovernanceSchemeThreshold,
        governance_token: Option<String>,
    ) -> GovernanceResult<Address> {
        self.require_self_or_registry(tx)?;
        let dao = self.require_dao(tx, dao_id).await?;
        threshold.validate(mechanism)?;

        let scheme_id = self.scheme_id(dao_id, mechanism);
        let scheme_address = self.scheme_address(dao_id, mechanism);
        if tx.contains(&keys::scheme(&scheme_address)).await? {
            return Err(GovernanceError::SchemeExists(scheme_address));
        }

        let governance_token = match mechanism {
            GovernanceMechanism::Organization => governance_token.or(dao.governance_token),
            GovernanceMechanism::HighCouncil | GovernanceMechanism::Referendum => {
                let symbol = governance_token.or(dao.governance_token).ok_or_else(|| {
                    GovernanceError::InvalidInput(format!("{} scheme needs a governance token", mechanism.as_str()))
                })?;
                self.require_token(tx, &symbol).await?;
                Some(symbol)
            }
        };

        let scheme = GovernanceScheme {
            scheme_id,
            scheme_address: scheme_address.clone(),
            dao_id: *dao_id,
            mechanism,
            governance_token: governance_token.clone(),
            threshold,
        };
        tx.put_json(keys::scheme(&scheme_address), &scheme)?;
        let mut addresses = self.get_dao_scheme_addresses(tx, dao_id).await?;
        addresses.push(scheme_address.clone());
        tx.put_json(keys::dao_schemes(dao_id), &addresses)?;

        info!("Added {} scheme {} to DAO {}", mechanism.as_str(), scheme_address, dao_id);
        tx.emit(
            self.address(),
            &GovernanceSchemeAdded {
                dao_id: *dao_id,
                scheme_id,
                scheme_address: scheme_address.clone(),
                mechanism,
                governance_token,
                threshold,
            },
        )?;
        Ok(scheme_address)
    }

    pub async fn remove_governance_scheme(
        &self,
        tx: &mut Transaction,
        dao_id: &Hash,
        scheme_address: &Address,
    ) -> GovernanceResult<()> {
        self.require_self(tx)?;
        self.require_dao_scheme(tx, dao_id, scheme_address).await?;

        tx.delete(keys::scheme(scheme_address))?;
        let mut addresses = self.get_dao_scheme_addresses(tx, dao_id).await?;
        addresses.retain(|address| address != scheme_address);
        tx.put_json(keys::dao_schemes(dao_id), &addresses)?;

        info!("Removed scheme {} from DAO {}", scheme_address, dao_id);
        tx.emit(
            self.address(),
            &GovernanceSchemeRemoved {
                dao_id: *dao_id,
                scheme_address: scheme_address.clone(),
            },
        )?;
        Ok(())
    }

    pub async fn update_governance_scheme_threshold(
        &self,
        tx: &mut Transaction,
        dao_id: &Hash,
        scheme_address: &Address,
        threshold: GovernanceSchemeThreshold,
    ) -> GovernanceResult<()> {
        self.require_self(tx)?;
        let mut scheme = self.require_dao_scheme(tx, dao_id, scheme_address).await?;
        threshold.validate(scheme.mechanism)?;

        let old_threshold = scheme.threshold;
        scheme.threshold = threshold;
        tx.put_json(keys::scheme(scheme_address), &scheme)?;

        info!("Updated threshold of scheme {} in DAO {}", scheme_address, dao_id);
        tx.emit(
            self.address(),
            &GovernanceSchemeThresholdUpdated {
                dao_id: *dao_id,
                scheme_address: scheme_address.clone(),
                old_threshold,
                new_threshold: threshold,
            },
        )?;
        Ok(())
    }

    /// Switch every token-weighted scheme of a DAO to `governance_token`
    pub async fn set_governance_token(
        &self,
        tx: &mut Transaction,
        dao_id: &Hash,
        governance_token: &str,
    ) -> GovernanceResult<()> {
        self.require_self(tx)?;
        self.require_dao(tx, dao_id).await?;
        self.require_token(tx, governance_token).await?;

        let mut updated = Vec::new();
        for scheme_address in self.get_dao_scheme_addresses(tx, dao_id).await? {
            let Some(mut scheme) = self.get_governance_scheme(tx, &scheme_address).await? else {
                continue;
            };
            if scheme.mechanism == GovernanceMechanism::Organization {
                continue;
            }
            scheme.governance_token = Some(governance_token.to_string());
            tx.put_json(keys::scheme(&scheme_address), &scheme)?;
            updated.push(scheme_address);
        }

        info!("DAO {} now governed with {}", dao_id, governance_token);
        tx.emit(
            self.address(),
            &GovernanceTokenSet {
                dao_id: *dao_id,
                governance_token: governance_token.to_string(),
                scheme_addresses: updated,
            },
        )?;
        Ok(())
    }

    pub async fn set_proposal_time_period(
        &self,
        tx: &mut Transaction,
        dao_id: &Hash,
        periods: ProposalTimePeriod,
    ) -> GovernanceResult<()> {
        self.require_self_or_registry(tx)?;
        self.require_dao(tx, dao_id).await?;
        self.bounds.validate(&periods)?;

        tx.put_json(keys::time_period(dao_id), &periods)?;

        info!("Set proposal time periods of DAO {}", dao_id);
        tx.emit(
            self.address(),
            &ProposalTimePeriodSet {
                dao_id: *dao_id,
                periods,
            },
        )?;
        Ok(())
    }
}
