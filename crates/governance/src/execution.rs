//! Threshold evaluation, derived status and proposal execution

use tracing::{debug, info, warn};

use daogov_core::{Hash, ProposalAction, Transaction};
use daogov_vote::{GovernanceMechanism, VotingResult};

use crate::engine::GovernanceEngine;
use crate::events::{ProposalExecuted, ProposalVetoed};
use crate::keys;
use crate::types::{
    GovernanceCall, GovernanceScheme, GovernanceSchemeThreshold, ProposalInfo, ProposalStatus, ProposalTime,
    ProposalType, BASIS_POINTS,
};
use crate::{GovernanceError, GovernanceResult};

/// Who may take part in a vote, for the participation threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Electorate {
    /// A body of this many voters; participation is the share that voted
    Bounded(u64),
    /// Every token holder; participation is the absolute weight cast
    Open,
}

/// Whether a tally satisfies a scheme's thresholds.
///
/// All ratios are compared by cross-multiplying in `u128`, so nothing is
/// rounded. An empty bounded electorate or an empty tally never passes.
pub fn evaluate_thresholds(
    threshold: &GovernanceSchemeThreshold,
    result: &VotingResult,
    electorate: Electorate,
) -> bool {
    let bp = BASIS_POINTS as u128;
    if result.unique_voter_count < threshold.minimal_required_threshold {
        return false;
    }
    let participated = match electorate {
        Electorate::Bounded(0) => false,
        Electorate::Bounded(eligible) => {
            result.unique_voter_count as u128 * bp >= threshold.minimal_vote_threshold as u128 * eligible as u128
        }
        Electorate::Open => result.total_weight >= threshold.minimal_vote_threshold,
    };
    if !participated {
        return false;
    }

    let total = result.total_weight as u128;
    if total == 0 {
        return false;
    }
    result.approve_weight as u128 * bp >= threshold.minimal_approve_threshold as u128 * total
        && result.reject_weight as u128 * bp <= threshold.maximal_rejection_threshold as u128 * total
        && result.abstain_weight as u128 * bp <= threshold.maximal_abstention_threshold as u128 * total
}

/// Status of a proposal whose active window has closed
fn settled_status(time: &ProposalTime, now: i64, passed: bool) -> ProposalStatus {
    if !passed {
        return ProposalStatus::Defeated;
    }
    match (time.execute_start, time.execute_end) {
        (Some(start), _) if now < start => ProposalStatus::PendingExecution,
        (Some(_), Some(end)) if now <= end => ProposalStatus::Executable,
        (Some(_), _) => ProposalStatus::Expired,
        (None, _) => ProposalStatus::Approved,
    }
}

impl GovernanceEngine {
    async fn electorate(&self, tx: &Transaction, scheme: &GovernanceScheme) -> GovernanceResult<Electorate> {
        let size = match scheme.mechanism {
            GovernanceMechanism::Referendum => return Ok(Electorate::Open),
            GovernanceMechanism::Organization => self.registry.members(tx, &scheme.dao_id).await?.len(),
            GovernanceMechanism::HighCouncil => {
                let council = self.council.victories(tx, &scheme.dao_id).await?.len();
                if council > 0 {
                    council
                } else {
                    // no council elected yet: measure against the block producers
                    self.producers.current_producers(tx).await?.len()
                }
            }
        };
        Ok(Electorate::Bounded(size as u64))
    }

    /// Whether the proposal's tally meets its scheme's thresholds now.
    ///
    /// A proposal whose scheme has since been removed can no longer pass.
    pub async fn passes(&self, tx: &Transaction, proposal: &ProposalInfo) -> GovernanceResult<bool> {
        let scheme = match self.get_governance_scheme(tx, &proposal.scheme_address).await? {
            Some(scheme) => scheme,
            None => {
                debug!(
                    "Scheme {} of proposal {} was removed",
                    proposal.scheme_address, proposal.id
                );
                return Ok(false);
            }
        };
        let result = self
            .vote
            .get_voting_result(tx, &proposal.id)
            .await?
            .ok_or(GovernanceError::ProposalNotFound(proposal.id))?;
        let electorate = self.electorate(tx, &scheme).await?;
        Ok(evaluate_thresholds(&scheme.threshold, &result, electorate))
    }

    /// Status at the transaction's block time
    pub async fn get_proposal_status(&self, tx: &Transaction, id: &Hash) -> GovernanceResult<ProposalStatus> {
        let proposal = self.require_proposal(tx, id).await?;
        if tx.contains(&keys::executed(id)).await? {
            return Ok(ProposalStatus::Executed);
        }
        if tx.contains(&keys::vetoed(id)).await? {
            return Ok(ProposalStatus::Vetoed);
        }
        let now = tx.block_time();
        if now < proposal.time.active_start {
            return Ok(ProposalStatus::Pending);
        }
        if now <= proposal.time.active_end {
            return Ok(ProposalStatus::Active);
        }
        let passed = self.passes(tx, &proposal).await?;
        Ok(settled_status(&proposal.time, now, passed))
    }

    /// Execute a passed proposal inside its execute window.
    ///
    /// Anyone may call this. A failing action aborts the whole call and the
    /// proposal stays executable.
    pub async fn execute_proposal(&self, tx: &mut Transaction, id: &Hash) -> GovernanceResult<()> {
        let proposal = self.require_proposal(tx, id).await?;
        let (start, end) = match (proposal.time.execute_start, proposal.time.execute_end) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(GovernanceError::NotExecutable(
                    *id,
                    "advisory proposals have no execute window".to_string(),
                ))
            }
        };
        if tx.contains(&keys::executed(id)).await? {
            return Err(GovernanceError::AlreadyExecuted(*id));
        }
        if tx.contains(&keys::vetoed(id)).await? {
            return Err(GovernanceError::Vetoed(*id));
        }
        let now = tx.block_time();
        if now < start {
            return Err(GovernanceError::NotExecutable(*id, format!("execution opens at {}", start)));
        }
        if now > end {
            return Err(GovernanceError::NotExecutable(*id, format!("execution closed at {}", end)));
        }
        if !self.passes(tx, &proposal).await? {
            return Err(GovernanceError::ThresholdNotMet(*id));
        }

        tx.put_json(keys::executed(id), &now)?;
        match proposal.proposal_type {
            ProposalType::Governance => {
                let action = proposal
                    .action
                    .as_ref()
                    .ok_or_else(|| GovernanceError::InvalidInput("proposal carries no action".to_string()))?;
                self.run_action(tx, &proposal.dao_id, action).await?;
            }
            ProposalType::Veto => {
                let target = proposal
                    .vetoed_proposal_id
                    .ok_or_else(|| GovernanceError::InvalidInput("veto proposal has no target".to_string()))?;
                self.veto(tx, &proposal, &target).await?;
            }
            ProposalType::Advisory => {
                return Err(GovernanceError::NotExecutable(
                    *id,
                    "advisory proposals are never executed".to_string(),
                ))
            }
        }

        info!("Executed proposal {} of DAO {}", id, proposal.dao_id);
        let executor = tx.sender().clone();
        tx.emit(
            self.address(),
            &ProposalExecuted {
                dao_id: proposal.dao_id,
                proposal_id: *id,
                proposal_type: proposal.proposal_type,
                executor,
                executed_at: now,
            },
        )?;
        Ok(())
    }

    async fn run_action(&self, tx: &mut Transaction, dao_id: &Hash, action: &ProposalAction) -> GovernanceResult<()> {
        debug!("Running {} on {} for DAO {}", action.method, action.target, dao_id);
        tx.enter(self.address());
        let outcome = if action.target == *self.address() {
            self.dispatch(tx, dao_id, action).await
        } else {
            self.executor
                .execute(tx, dao_id, action)
                .await
                .map_err(GovernanceError::from)
        };
        tx.leave();
        outcome
    }

    async fn dispatch(&self, tx: &mut Transaction, dao_id: &Hash, action: &ProposalAction) -> GovernanceResult<()> {
        let call = GovernanceCall::decode(action)?;
        if call.dao_id() != dao_id {
            return Err(GovernanceError::PermissionDenied(format!(
                "a proposal of DAO {} cannot manage DAO {}",
                dao_id,
                call.dao_id()
            )));
        }
        match call {
            GovernanceCall::AddGovernanceScheme {
                dao_id,
                mechanism,
                threshold,
                governance_token,
            } => {
                self.add_governance_scheme(tx, &dao_id, mechanism, threshold, governance_token)
                    .await?;
            }
            GovernanceCall::RemoveGovernanceScheme { dao_id, scheme_address } => {
                self.remove_governance_scheme(tx, &dao_id, &scheme_address).await?;
            }
            GovernanceCall::UpdateGovernanceSchemeThreshold {
                dao_id,
                scheme_address,
                threshold,
            } => {
                self.update_governance_scheme_threshold(tx, &dao_id, &scheme_address, threshold)
                    .await?;
            }
            GovernanceCall::SetProposalTimePeriod { dao_id, periods } => {
                self.set_proposal_time_period(tx, &dao_id, periods).await?;
            }
            GovernanceCall::SetGovernanceToken {
                dao_id,
                governance_token,
            } => {
                self.set_governance_token(tx, &dao_id, &governance_token).await?;
            }
        }
        Ok(())
    }

    async fn veto(&self, tx: &mut Transaction, veto: &ProposalInfo, target: &Hash) -> GovernanceResult<()> {
        if tx.contains(&keys::executed(target)).await? {
            return Err(GovernanceError::AlreadyExecuted(*target));
        }
        tx.put_json(keys::vetoed(target), &veto.id)?;

        warn!("Proposal {} vetoed by {}", target, veto.id);
        tx.emit(
            self.address(),
            &ProposalVetoed {
                dao_id: veto.dao_id,
                proposal_id: *target,
                veto_proposal_id: veto.id,
                vetoed_at: tx.block_time(),
            },
        )?;
        Ok(())
    }
}
