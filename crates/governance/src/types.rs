use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use daogov_config::ProposalTimePeriod;
use daogov_core::{Address, Hash, ProposalAction};
use daogov_vote::GovernanceMechanism;

use crate::{GovernanceError, GovernanceResult};

/// Denominator of every ratio threshold
pub const BASIS_POINTS: u64 = 10_000;

/// Pass conditions of a governance scheme.
///
/// Ratios are in basis points. `minimal_vote_threshold` is an absolute weight
/// under the Referendum mechanism, which has no bounded electorate, and
/// `proposal_threshold` is a token balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSchemeThreshold {
    pub minimal_required_threshold: u64,
    pub minimal_vote_threshold: u64,
    pub minimal_approve_threshold: u64,
    pub maximal_rejection_threshold: u64,
    pub maximal_abstention_threshold: u64,
    pub proposal_threshold: u64,
}

impl GovernanceSchemeThreshold {
    /// Check the thresholds can be met by some tally under `mechanism`
    pub fn validate(&self, mechanism: GovernanceMechanism) -> GovernanceResult<()> {
        if self.minimal_required_threshold == 0 {
            return Err(GovernanceError::InvalidThreshold(
                "minimal required threshold must be positive".to_string(),
            ));
        }
        let mut ratios = vec![
            ("minimal approve", self.minimal_approve_threshold),
            ("maximal rejection", self.maximal_rejection_threshold),
            ("maximal abstention", self.maximal_abstention_threshold),
        ];
        if mechanism != GovernanceMechanism::Referendum {
            ratios.push(("minimal vote", self.minimal_vote_threshold));
        }
        if let Some((name, value)) = ratios.into_iter().find(|(_, value)| *value > BASIS_POINTS) {
            return Err(GovernanceError::InvalidThreshold(format!(
                "{} threshold {} exceeds {}",
                name, value, BASIS_POINTS
            )));
        }
        let approve = self.minimal_approve_threshold;
        if approve.saturating_add(self.maximal_abstention_threshold) > BASIS_POINTS
            || approve.saturating_add(self.maximal_rejection_threshold) > BASIS_POINTS
        {
            return Err(GovernanceError::InvalidThreshold(format!(
                "approve {} with rejection {} or abstention {} exceeds {}",
                approve, self.maximal_rejection_threshold, self.maximal_abstention_threshold, BASIS_POINTS
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceScheme {
    pub scheme_id: Hash,
    pub scheme_address: Address,
    pub dao_id: Hash,
    pub mechanism: GovernanceMechanism,
    /// Token weighing votes and gating proposers; unused by Organization schemes
    pub governance_token: Option<String>,
    pub threshold: GovernanceSchemeThreshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalType {
    /// Runs an action once approved
    Governance,
    /// Overturns a Governance proposal awaiting execution
    Veto,
    /// Records opinion only
    Advisory,
}

/// Windows of a proposal, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalTime {
    pub active_start: i64,
    pub active_end: i64,
    /// `None` for Advisory proposals, which are never executed
    pub execute_start: Option<i64>,
    pub execute_end: Option<i64>,
}

impl ProposalTime {
    /// Derive the windows of a proposal created at `now`.
    ///
    /// Only High Council Governance proposals get a pending gap before
    /// execution, leaving time for a veto.
    pub fn derive(
        now: i64,
        proposal_type: ProposalType,
        mechanism: GovernanceMechanism,
        periods: &ProposalTimePeriod,
        active_period: i64,
    ) -> Self {
        let active_end = now + active_period;
        let (execute_start, execute_end) = match proposal_type {
            ProposalType::Governance => {
                let start = if mechanism == GovernanceMechanism::HighCouncil {
                    active_end + periods.pending_time_period
                } else {
                    active_end
                };
                (Some(start), Some(start + periods.execute_time_period))
            }
            ProposalType::Veto => (Some(active_end), Some(active_end + periods.veto_execute_time_period)),
            ProposalType::Advisory => (None, None),
        };
        Self {
            active_start: now,
            active_end,
            execute_start,
            execute_end,
        }
    }
}

/// Fields shared by every kind of proposal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalBasicInfo {
    pub dao_id: Hash,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub forum_url: String,
    pub scheme_address: Address,
    pub vote_scheme_id: Hash,
    /// Active window in seconds; the DAO's configured period when absent
    #[serde(default)]
    pub active_time_period: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProposalInput {
    pub basic: ProposalBasicInfo,
    pub proposal_type: ProposalType,
    #[serde(default)]
    pub action: Option<ProposalAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateVetoProposalInput {
    pub basic: ProposalBasicInfo,
    pub vetoed_proposal_id: Hash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalInfo {
    pub id: Hash,
    pub dao_id: Hash,
    pub proposal_type: ProposalType,
    pub proposer: Address,
    pub title: String,
    pub description: String,
    pub forum_url: String,
    pub scheme_address: Address,
    pub vote_scheme_id: Hash,
    pub action: Option<ProposalAction>,
    pub vetoed_proposal_id: Option<Hash>,
    pub time: ProposalTime,
}

/// Status of a proposal, derived from its windows, tally and markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Pending,
    Active,
    /// Passed; waiting out the pending gap of a High Council proposal
    PendingExecution,
    Executable,
    Executed,
    /// Passed but the execute window closed unused
    Expired,
    Defeated,
    Vetoed,
    /// A passed Advisory proposal
    Approved,
}

/// Scheme management reachable as the action of a Governance proposal
/// that targets the governance engine itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum GovernanceCall {
    AddGovernanceScheme {
        dao_id: Hash,
        mechanism: GovernanceMechanism,
        threshold: GovernanceSchemeThreshold,
        #[serde(default)]
        governance_token: Option<String>,
    },
    RemoveGovernanceScheme {
        dao_id: Hash,
        scheme_address: Address,
    },
    UpdateGovernanceSchemeThreshold {
        dao_id: Hash,
        scheme_address: Address,
        threshold: GovernanceSchemeThreshold,
    },
    SetProposalTimePeriod {
        dao_id: Hash,
        periods: ProposalTimePeriod,
    },
    SetGovernanceToken {
        dao_id: Hash,
        governance_token: String,
    },
}

impl GovernanceCall {
    /// Decode a proposal action; an unknown method or malformed parameters are fatal
    pub fn decode(action: &ProposalAction) -> GovernanceResult<Self> {
        let value = json!({ "method": action.method, "params": action.params });
        serde_json::from_value(value)
            .map_err(|e| GovernanceError::UnknownMethod(format!("{}: {}", action.method, e)))
    }

    /// Wrap the call into an action addressed to `governance`
    pub fn into_action(self, governance: &Address) -> GovernanceResult<ProposalAction> {
        let value = serde_json::to_value(&self)
            .map_err(|e| GovernanceError::InvalidInput(format!("unencodable call: {}", e)))?;
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let params = value.get("params").cloned().unwrap_or(Value::Null);
        Ok(ProposalAction {
            target: governance.clone(),
            method,
            params,
        })
    }

    pub fn dao_id(&self) -> &Hash {
        match self {
            GovernanceCall::AddGovernanceScheme { dao_id, .. }
            | GovernanceCall::RemoveGovernanceScheme { dao_id, .. }
            | GovernanceCall::UpdateGovernanceSchemeThreshold { dao_id, .. }
            | GovernanceCall::SetProposalTimePeriod { dao_id, .. }
            | GovernanceCall::SetGovernanceToken { dao_id, .. } => dao_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daogov_core::utils::days;

    fn threshold(approve: u64, reject: u64, abstain: u64) -> GovernanceSchemeThreshold {
        GovernanceSchemeThreshold {
            minimal_required_threshold: 1,
            minimal_vote_threshold: 0,
            minimal_approve_threshold: approve,
            maximal_rejection_threshold: reject,
            maximal_abstention_threshold: abstain,
            proposal_threshold: 0,
        }
    }

    #[test]
    fn test_threshold_validation() {
        let hc = GovernanceMechanism::HighCouncil;
        assert!(threshold(5000, 5000, 5000).validate(hc).is_ok());
        assert!(threshold(5000, 5001, 0).validate(hc).is_err());
        assert!(threshold(6000, 0, 4001).validate(hc).is_err());

        let zero_required = GovernanceSchemeThreshold {
            minimal_required_threshold: 0,
            ..threshold(5000, 0, 0)
        };
        assert!(matches!(
            zero_required.validate(hc),
            Err(GovernanceError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_ratio_thresholds_stay_within_basis_points() {
        assert!(matches!(
            threshold(0, 10_001, 0).validate(GovernanceMechanism::Referendum),
            Err(GovernanceError::InvalidThreshold(_))
        ));
        assert!(threshold(10_000, 0, 0).validate(GovernanceMechanism::Organization).is_ok());

        let turnout = GovernanceSchemeThreshold {
            minimal_vote_threshold: 20_000,
            ..threshold(5000, 5000, 5000)
        };
        assert!(turnout.validate(GovernanceMechanism::Referendum).is_ok());
        for mechanism in [GovernanceMechanism::HighCouncil, GovernanceMechanism::Organization] {
            assert!(matches!(
                turnout.validate(mechanism),
                Err(GovernanceError::InvalidThreshold(_))
            ));
        }
    }

    #[test]
    fn test_time_derivation() {
        let periods = ProposalTimePeriod::default();
        let now = 1_000;

        let hc = ProposalTime::derive(now, ProposalType::Governance, GovernanceMechanism::HighCouncil, &periods, days(7));
        assert_eq!(hc.active_end, now + days(7));
        assert_eq!(hc.execute_start, Some(now + days(12)));
        assert_eq!(hc.execute_end, Some(now + days(15)));

        let referendum =
            ProposalTime::derive(now, ProposalType::Governance, GovernanceMechanism::Referendum, &periods, days(7));
        assert_eq!(referendum.execute_start, Some(referendum.active_end));

        let veto = ProposalTime::derive(now, ProposalType::Veto, GovernanceMechanism::Referendum, &periods, days(3));
        assert_eq!(veto.execute_end, Some(now + days(4)));

        let advisory =
            ProposalTime::derive(now, ProposalType::Advisory, GovernanceMechanism::Organization, &periods, days(7));
        assert_eq!(advisory.execute_start, None);
        assert_eq!(advisory.execute_end, None);
    }

    #[test]
    fn test_governance_call_action_encoding() {
        let governance = Address::new("governance");
        let call = GovernanceCall::SetGovernanceToken {
            dao_id: Hash::from_str_data("dao"),
            governance_token: "ELF".to_string(),
        };
        let action = call.clone().into_action(&governance).unwrap();
        assert_eq!(action.method, "SetGovernanceToken");
        assert_eq!(action.target, governance);
        assert_eq!(GovernanceCall::decode(&action).unwrap(), call);

        let unknown = ProposalAction {
            target: governance,
            method: "Transfer".to_string(),
            params: Value::Null,
        };
        assert!(matches!(
            GovernanceCall::decode(&unknown),
            Err(GovernanceError::UnknownMethod(_))
        ));
    }
}
