//! A complete deployment: host, collaborators and the three engines wired together

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use daogov_config::DaoGovConfig;
use daogov_core::{
    ActionExecutor, Address, ComponentAddresses, CoreError, CoreResult, Hash, Host, MemoryStorage, ProposalAction,
    StaticProducerSet, Storage, StoreOrganizationRegistry, StoreTokenLedger, Transaction,
};
use daogov_election::{CouncilView, ElectionEngine};
use daogov_governance::GovernanceEngine;
use daogov_vote::VoteEngine;

/// Calls an executed Governance proposal may make on the election engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum ElectionCall {
    BanCandidate { dao_id: Hash, candidate: Address },
    TakeSnapshot { dao_id: Hash, term: u64 },
}

impl ElectionCall {
    pub fn decode(action: &ProposalAction) -> CoreResult<Self> {
        let value = json!({ "method": action.method, "params": action.params });
        serde_json::from_value(value)
            .map_err(|e| CoreError::ActionFailed(format!("unknown election call {}: {}", action.method, e)))
    }

    /// Wrap the call into an action addressed to `election`
    pub fn into_action(self, election: &Address) -> CoreResult<ProposalAction> {
        let value = serde_json::to_value(&self).map_err(|e| CoreError::Serialization(e.to_string()))?;
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let params = value.get("params").cloned().unwrap_or(Value::Null);
        Ok(ProposalAction {
            target: election.clone(),
            method,
            params,
        })
    }

    pub fn dao_id(&self) -> &Hash {
        match self {
            ElectionCall::BanCandidate { dao_id, .. } | ElectionCall::TakeSnapshot { dao_id, .. } => dao_id,
        }
    }
}

/// Routes proposal actions that target the election engine
pub struct DeploymentExecutor {
    election: Arc<ElectionEngine>,
}

impl DeploymentExecutor {
    pub fn new(election: Arc<ElectionEngine>) -> Self {
        Self { election }
    }
}

#[async_trait]
impl ActionExecutor for DeploymentExecutor {
    async fn execute(&self, tx: &mut Transaction, dao_id: &Hash, action: &ProposalAction) -> CoreResult<()> {
        if &action.target != self.election.address() {
            return Err(CoreError::ActionFailed(format!(
                "no handler for {}.{}",
                action.target, action.method
            )));
        }
        let call = ElectionCall::decode(action)?;
        if call.dao_id() != dao_id {
            return Err(CoreError::PermissionDenied(format!(
                "a proposal of DAO {} cannot act on DAO {}",
                dao_id,
                call.dao_id()
            )));
        }
        debug!("Dispatching {} to the election engine", action.method);
        let result = match call {
            ElectionCall::BanCandidate { dao_id, candidate } => {
                self.election.ban_candidate(tx, &dao_id, &candidate).await
            }
            ElectionCall::TakeSnapshot { dao_id, term } => self.election.take_snapshot(tx, &dao_id, term).await,
        };
        result.map_err(|e| CoreError::ActionFailed(e.to_string()))
    }
}

/// Every component of a running governance deployment
pub struct Deployment {
    pub config: DaoGovConfig,
    pub host: Host,
    pub ledger: Arc<StoreTokenLedger>,
    pub registry: Arc<StoreOrganizationRegistry>,
    pub producers: Arc<StaticProducerSet>,
    pub vote: Arc<VoteEngine>,
    pub election: Arc<ElectionEngine>,
    pub governance: Arc<GovernanceEngine>,
}

impl Deployment {
    /// Deployment over fresh in-memory storage
    pub fn in_memory(config: DaoGovConfig, genesis_time: i64) -> Self {
        Self::with_storage(config, Arc::new(MemoryStorage::new()), genesis_time)
    }

    pub fn with_storage(config: DaoGovConfig, storage: Arc<dyn Storage>, genesis_time: i64) -> Self {
        let addresses = config.addresses.clone();
        let host = Host::new(storage, genesis_time);
        let ledger = Arc::new(StoreTokenLedger::new(addresses.token.clone()));
        let registry = Arc::new(StoreOrganizationRegistry::new(addresses.registry.clone()));
        let producers = Arc::new(StaticProducerSet::default());
        let council = Arc::new(CouncilView::new());

        let vote = Arc::new(
            VoteEngine::new(
                addresses.clone(),
                ledger.clone(),
                registry.clone(),
                producers.clone(),
                council.clone(),
            )
            .with_memo_max_length(config.memo_max_length),
        );
        let election = Arc::new(ElectionEngine::new(
            addresses.clone(),
            vote.clone(),
            ledger.clone(),
            registry.clone(),
        ));
        let governance = Arc::new(
            GovernanceEngine::new(
                addresses.clone(),
                vote.clone(),
                council,
                ledger.clone(),
                registry.clone(),
                producers.clone(),
            )
            .with_config(&config)
            .with_executor(Arc::new(DeploymentExecutor::new(election.clone()))),
        );

        info!(
            "Deployment ready: governance={} vote={} election={}",
            addresses.governance, addresses.vote, addresses.election
        );
        Self {
            config,
            host,
            ledger,
            registry,
            producers,
            vote,
            election,
            governance,
        }
    }

    pub fn addresses(&self) -> &ComponentAddresses {
        &self.config.addresses
    }
}
