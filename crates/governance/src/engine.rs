//! The governance engine and its read-side queries

use std::sync::Arc;

use async_trait::async_trait;

use daogov_config::{DaoGovConfig, ProposalTimePeriod, TimePeriodBounds};
use daogov_core::{
    ActionExecutor, Address, BlockProducerSet, ComponentAddresses, CoreResult, CouncilDirectory, DaoInfo, Hash,
    NoopActionExecutor, OrganizationRegistry, TokenLedger, Transaction,
};
use daogov_vote::{GovernanceMechanism, ProposalBinding, ProposalDirectory, VoteEngine};

use crate::keys;
use crate::types::{GovernanceScheme, ProposalInfo};
use crate::{GovernanceError, GovernanceResult};

/// The governance proposal state machine
pub struct GovernanceEngine {
    pub(crate) addresses: ComponentAddresses,
    pub(crate) vote: Arc<VoteEngine>,
    pub(crate) council: Arc<dyn CouncilDirectory>,
    pub(crate) ledger: Arc<dyn TokenLedger>,
    pub(crate) registry: Arc<dyn OrganizationRegistry>,
    pub(crate) producers: Arc<dyn BlockProducerSet>,
    pub(crate) executor: Arc<dyn ActionExecutor>,
    pub(crate) bounds: TimePeriodBounds,
    pub(crate) max_description_url_length: usize,
}

impl GovernanceEngine {
    /// Create a new governance engine with default bounds and no external executor
    pub fn new(
        addresses: ComponentAddresses,
        vote: Arc<VoteEngine>,
        council: Arc<dyn CouncilDirectory>,
        ledger: Arc<dyn TokenLedger>,
        registry: Arc<dyn OrganizationRegistry>,
        producers: Arc<dyn BlockProducerSet>,
    ) -> Self {
        let defaults = DaoGovConfig::default();
        Self {
            addresses,
            vote,
            council,
            ledger,
            registry,
            producers,
            executor: Arc::new(NoopActionExecutor),
            bounds: defaults.time_periods,
            max_description_url_length: defaults.max_description_url_length,
        }
    }

    /// Take the time-period bounds and description limit from configuration
    pub fn with_config(mut self, config: &DaoGovConfig) -> Self {
        self.bounds = config.time_periods.clone();
        self.max_description_url_length = config.max_description_url_length;
        self
    }

    /// Route actions for other components through `executor`
    pub fn with_executor(mut self, executor: Arc<dyn ActionExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Address the engine acts under
    pub fn address(&self) -> &Address {
        &self.addresses.governance
    }

    /// Deterministic id of the scheme a DAO uses for `mechanism`
    pub fn scheme_id(&self, dao_id: &Hash, mechanism: GovernanceMechanism) -> Hash {
        Hash::concat_and_compute(&[
            *dao_id,
            Hash::from_str_data(self.address().as_str()),
            Hash::from_str_data(mechanism.as_str()),
        ])
    }

    /// Address of the scheme a DAO uses for `mechanism`
    pub fn scheme_address(&self, dao_id: &Hash, mechanism: GovernanceMechanism) -> Address {
        Address::virtual_of(self.address(), &self.scheme_id(dao_id, mechanism))
    }

    pub(crate) async fn require_dao(&self, tx: &Transaction, dao_id: &Hash) -> GovernanceResult<DaoInfo> {
        self.registry
            .dao_info(tx, dao_id)
            .await?
            .ok_or(GovernanceError::DaoNotFound(*dao_id))
    }

    pub(crate) async fn require_active_dao(&self, tx: &Transaction, dao_id: &Hash) -> GovernanceResult<DaoInfo> {
        let dao = self.require_dao(tx, dao_id).await?;
        if !dao.subsist_status {
            return Err(GovernanceError::DaoNotActive(*dao_id));
        }
        Ok(dao)
    }

    pub(crate) async fn require_scheme(
        &self,
        tx: &Transaction,
        scheme_address: &Address,
    ) -> GovernanceResult<GovernanceScheme> {
        self.get_governance_scheme(tx, scheme_address)
            .await?
            .ok_or_else(|| GovernanceError::SchemeNotFound(scheme_address.clone()))
    }

    pub(crate) async fn require_proposal(&self, tx: &Transaction, id: &Hash) -> GovernanceResult<ProposalInfo> {
        self.get_proposal(tx, id)
            .await?
            .ok_or(GovernanceError::ProposalNotFound(*id))
    }

    pub async fn get_governance_scheme(
        &self,
        tx: &Transaction,
        scheme_address: &Address,
    ) -> GovernanceResult<Option<GovernanceScheme>> {
        Ok(tx.get_json(&keys::scheme(scheme_address)).await?)
    }

    /// Scheme addresses of a DAO in the order they were added
    pub async fn get_dao_scheme_addresses(&self, tx: &Transaction, dao_id: &Hash) -> GovernanceResult<Vec<Address>> {
        Ok(tx
            .get_json::<Vec<Address>>(&keys::dao_schemes(dao_id))
            .await?
            .unwrap_or_default())
    }

    /// Time periods of a DAO; the configured defaults until it sets its own
    pub async fn get_proposal_time_period(
        &self,
        tx: &Transaction,
        dao_id: &Hash,
    ) -> GovernanceResult<ProposalTimePeriod> {
        Ok(tx
            .get_json::<ProposalTimePeriod>(&keys::time_period(dao_id))
            .await?
            .unwrap_or_else(|| self.bounds.default_periods()))
    }

    pub async fn get_proposal(&self, tx: &Transaction, id: &Hash) -> GovernanceResult<Option<ProposalInfo>> {
        Ok(tx.get_json(&keys::proposal(id)).await?)
    }
}

#[async_trait]
impl ProposalDirectory for GovernanceEngine {
    async fn proposal_binding(&self, tx: &Transaction, proposal_id: &Hash) -> CoreResult<Option<ProposalBinding>> {
        let proposal: Option<ProposalInfo> = tx.get_json(&keys::proposal(proposal_id)).await?;
        let Some(proposal) = proposal else {
            return Ok(None);
        };
        let scheme: Option<GovernanceScheme> = tx.get_json(&keys::scheme(&proposal.scheme_address)).await?;
        Ok(scheme.map(|scheme| ProposalBinding {
            dao_id: proposal.dao_id,
            mechanism: scheme.mechanism,
        }))
    }
}
