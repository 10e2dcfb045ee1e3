//! Proposal creation

use tracing::info;

use daogov_core::{Address, Hash, ProposalAction, Transaction};
use daogov_vote::{GovernanceMechanism, RegisterVotingItem, VoteMechanism};

use crate::engine::GovernanceEngine;
use crate::events::ProposalCreated;
use crate::keys;
use crate::types::{
    CreateProposalInput, CreateVetoProposalInput, GovernanceScheme, ProposalBasicInfo, ProposalInfo, ProposalStatus,
    ProposalTime, ProposalType,
};
use crate::{GovernanceError, GovernanceResult};

impl GovernanceEngine {
    /// Create a Governance or Advisory proposal; returns its id
    pub async fn create_proposal(&self, tx: &mut Transaction, input: CreateProposalInput) -> GovernanceResult<Hash> {
        match (input.proposal_type, &input.action) {
            (ProposalType::Veto, _) => {
                return Err(GovernanceError::InvalidInput(
                    "veto proposals are created with create_veto_proposal".to_string(),
                ))
            }
            (ProposalType::Governance, None) => {
                return Err(GovernanceError::InvalidInput(
                    "a governance proposal needs an action".to_string(),
                ))
            }
            (ProposalType::Advisory, Some(_)) => {
                return Err(GovernanceError::InvalidInput(
                    "an advisory proposal cannot carry an action".to_string(),
                ))
            }
            _ => {}
        }
        let seed = Hash::compute_from(&input)?;
        self.create(tx, seed, input.basic, input.proposal_type, input.action, None)
            .await
    }

    /// Create a Referendum proposal that overturns a Governance proposal
    /// still waiting for execution
    pub async fn create_veto_proposal(
        &self,
        tx: &mut Transaction,
        input: CreateVetoProposalInput,
    ) -> GovernanceResult<Hash> {
        let target = self.require_proposal(tx, &input.vetoed_proposal_id).await?;
        if target.dao_id != input.basic.dao_id || target.proposal_type != ProposalType::Governance {
            return Err(GovernanceError::InvalidInput(format!(
                "proposal {} is not a governance proposal of DAO {}",
                target.id, input.basic.dao_id
            )));
        }
        let status = self.get_proposal_status(tx, &target.id).await?;
        if !matches!(status, ProposalStatus::PendingExecution | ProposalStatus::Executable) {
            return Err(GovernanceError::NotVetoable { id: target.id, status });
        }

        let seed = Hash::compute_from(&input)?;
        self.create(
            tx,
            seed,
            input.basic,
            ProposalType::Veto,
            None,
            Some(input.vetoed_proposal_id),
        )
        .await
    }

    async fn create(
        &self,
        tx: &mut Transaction,
        seed: Hash,
        basic: ProposalBasicInfo,
        proposal_type: ProposalType,
        action: Option<ProposalAction>,
        vetoed_proposal_id: Option<Hash>,
    ) -> GovernanceResult<Hash> {
        if basic.title.trim().is_empty() {
            return Err(GovernanceError::InvalidInput("title is required".to_string()));
        }
        for (name, text) in [("description", &basic.description), ("forum url", &basic.forum_url)] {
            if text.chars().count() > self.max_description_url_length {
                return Err(GovernanceError::InvalidInput(format!(
                    "{} longer than {} characters",
                    name, self.max_description_url_length
                )));
            }
        }

        self.require_active_dao(tx, &basic.dao_id).await?;
        let scheme = self.require_scheme(tx, &basic.scheme_address).await?;
        if scheme.dao_id != basic.dao_id {
            return Err(GovernanceError::InvalidInput(format!(
                "scheme {} does not belong to DAO {}",
                basic.scheme_address, basic.dao_id
            )));
        }
        if proposal_type == ProposalType::Veto && scheme.mechanism != GovernanceMechanism::Referendum {
            return Err(GovernanceError::InvalidInput(
                "veto proposals are decided by referendum".to_string(),
            ));
        }
        self.check_vote_scheme(tx, &scheme, &basic.vote_scheme_id).await?;
        let proposer = tx.sender().clone();
        self.check_proposer(tx, &scheme, &proposer).await?;

        let periods = self.get_proposal_time_period(tx, &basic.dao_id).await?;
        let veto = proposal_type == ProposalType::Veto;
        let active_period = match basic.active_time_period {
            Some(seconds) => {
                self.bounds.check_active(seconds, veto)?;
                seconds
            }
            None if veto => periods.veto_active_time_period,
            None => periods.active_time_period,
        };
        let time = ProposalTime::derive(tx.block_time(), proposal_type, scheme.mechanism, &periods, active_period);

        let id = Hash::concat_and_compute(&[Hash::from_str_data(self.address().as_str()), seed, tx.tx_id()]);
        let proposal = ProposalInfo {
            id,
            dao_id: basic.dao_id,
            proposal_type,
            proposer,
            title: basic.title,
            description: basic.description,
            forum_url: basic.forum_url,
            scheme_address: basic.scheme_address,
            vote_scheme_id: basic.vote_scheme_id,
            action,
            vetoed_proposal_id,
            time,
        };
        // the vote engine resolves the proposal while registering its item
        tx.put_json(keys::proposal(&id), &proposal)?;

        let accepted_token = match self.vote.get_vote_scheme(tx, &proposal.vote_scheme_id).await? {
            Some(vote_scheme) if vote_scheme.mechanism == VoteMechanism::TokenBallot => scheme.governance_token.clone(),
            _ => None,
        };
        let registration = RegisterVotingItem {
            voting_item_id: id,
            scheme_id: proposal.vote_scheme_id,
            accepted_token,
            active_start: time.active_start,
            active_end: time.active_end,
        };
        tx.enter(self.address());
        let registered = self.vote.register(tx, self, registration).await;
        tx.leave();
        registered?;

        info!(
            "Created {:?} proposal {} in DAO {} ({})",
            proposal_type,
            id,
            proposal.dao_id,
            scheme.mechanism.as_str()
        );
        tx.emit(
            self.address(),
            &ProposalCreated {
                proposal,
                mechanism: scheme.mechanism,
            },
        )?;
        Ok(id)
    }

    /// Organization proposals are counted per head, the others by token weight
    async fn check_vote_scheme(
        &self,
        tx: &Transaction,
        scheme: &GovernanceScheme,
        vote_scheme_id: &Hash,
    ) -> GovernanceResult<()> {
        let vote_scheme = self
            .vote
            .get_vote_scheme(tx, vote_scheme_id)
            .await?
            .ok_or_else(|| GovernanceError::InvalidVoteScheme(format!("vote scheme {} not found", vote_scheme_id)))?;
        let expected = match scheme.mechanism {
            GovernanceMechanism::Organization => VoteMechanism::UniqueVote,
            GovernanceMechanism::HighCouncil | GovernanceMechanism::Referendum => VoteMechanism::TokenBallot,
        };
        if vote_scheme.mechanism != expected {
            return Err(GovernanceError::InvalidVoteScheme(format!(
                "{} needs a {:?} scheme",
                scheme.mechanism.as_str(),
                expected
            )));
        }
        Ok(())
    }

    async fn check_proposer(
        &self,
        tx: &Transaction,
        scheme: &GovernanceScheme,
        proposer: &Address,
    ) -> GovernanceResult<()> {
        match scheme.mechanism {
            GovernanceMechanism::Organization => {
                if !self.registry.is_member(tx, &scheme.dao_id, proposer).await? {
                    return Err(GovernanceError::NotEligible(format!(
                        "{} is not an organization member",
                        proposer
                    )));
                }
            }
            GovernanceMechanism::HighCouncil | GovernanceMechanism::Referendum => {
                let token = scheme
                    .governance_token
                    .as_deref()
                    .ok_or_else(|| GovernanceError::TokenNotFound("scheme has no governance token".to_string()))?;
                let balance = self.ledger.balance_of(tx, proposer, token).await?;
                if balance < scheme.threshold.proposal_threshold {
                    return Err(GovernanceError::NotEligible(format!(
                        "Token balance not enough: {} {} below {}",
                        balance, token, scheme.threshold.proposal_threshold
                    )));
                }
            }
        }
        Ok(())
    }
}
