use serde::{Deserialize, Serialize};

use daogov_config::ProposalTimePeriod;
use daogov_core::{Address, ContractEvent, Hash};
use daogov_vote::GovernanceMechanism;

use crate::types::{GovernanceSchemeThreshold, ProposalInfo, ProposalType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalCreated {
    pub proposal: ProposalInfo,
    pub mechanism: GovernanceMechanism,
}

impl ContractEvent for ProposalCreated {
    const NAME: &'static str = "ProposalCreated";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalExecuted {
    pub dao_id: Hash,
    pub proposal_id: Hash,
    pub proposal_type: ProposalType,
    pub executor: Address,
    pub executed_at: i64,
}

impl ContractEvent for ProposalExecuted {
    const NAME: &'static str = "ProposalExecuted";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalVetoed {
    pub dao_id: Hash,
    pub proposal_id: Hash,
    pub veto_proposal_id: Hash,
    pub vetoed_at: i64,
}

impl ContractEvent for ProposalVetoed {
    const NAME: &'static str = "ProposalVetoed";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSchemeAdded {
    pub dao_id: Hash,
    pub scheme_id: Hash,
    pub scheme_address: Address,
    pub mechanism: GovernanceMechanism,
    pub governance_token: Option<String>,
    pub threshold: GovernanceSchemeThreshold,
}

impl ContractEvent for GovernanceSchemeAdded {
    const NAME: &'static str = "GovernanceSchemeAdded";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSchemeRemoved {
    pub dao_id: Hash,
    pub scheme_address: Address,
}

impl ContractEvent for GovernanceSchemeRemoved {
    const NAME: &'static str = "GovernanceSchemeRemoved";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSchemeThresholdUpdated {
    pub dao_id: Hash,
    pub scheme_address: Address,
    pub old_threshold: GovernanceSchemeThreshold,
    pub new_threshold: GovernanceSchemeThreshold,
}

impl ContractEvent for GovernanceSchemeThresholdUpdated {
    const NAME: &'static str = "GovernanceSchemeThresholdUpdated";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceTokenSet {
    pub dao_id: Hash,
    pub governance_token: String,
    /// Schemes now weighing votes with the token
    pub scheme_addresses: Vec<Address>,
}

impl ContractEvent for GovernanceTokenSet {
    const NAME: &'static str = "GovernanceTokenSet";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalTimePeriodSet {
    pub dao_id: Hash,
    pub periods: ProposalTimePeriod,
}

impl ContractEvent for ProposalTimePeriodSet {
    const NAME: &'static str = "ProposalTimePeriodSet";
}
