//! Election setup, term snapshots and queries

use std::sync::Arc;

use tracing::info;

use daogov_core::{Address, ComponentAddresses, CouncilDirectory, Hash, OrganizationRegistry, TokenLedger, Transaction};
use daogov_vote::{CandidateItemInput, VoteEngine, VoteMechanism};

use crate::events::{ElectionVotingEventRegistered, TermSnapshotTaken};
use crate::keys;
use crate::types::{CandidateInformation, ElectionTerm, HighCouncilConfig, TermSnapshot};
use crate::view::CouncilView;
use crate::{ElectionError, ElectionResult};

/// The candidate election engine
pub struct ElectionEngine {
    pub(crate) addresses: ComponentAddresses,
    pub(crate) vote: Arc<VoteEngine>,
    pub(crate) ledger: Arc<dyn TokenLedger>,
    registry: Arc<dyn OrganizationRegistry>,
    view: CouncilView,
}

impl ElectionEngine {
    /// Create a new election engine
    pub fn new(
        addresses: ComponentAddresses,
        vote: Arc<VoteEngine>,
        ledger: Arc<dyn TokenLedger>,
        registry: Arc<dyn OrganizationRegistry>,
    ) -> Self {
        Self {
            addresses,
            vote,
            ledger,
            registry,
            view: CouncilView::new(),
        }
    }

    /// Address the engine acts under
    pub fn address(&self) -> &Address {
        &self.addresses.election
    }

    /// Set up the High Council election of a DAO and open its first term.
    ///
    /// Only the organization registry may call this, once per DAO.
    pub async fn register_election_voting_event(
        &self,
        tx: &mut Transaction,
        dao_id: &Hash,
        config: HighCouncilConfig,
    ) -> ElectionResult<()> {
        if tx.sender() != self.registry.registry_address() {
            return Err(ElectionError::PermissionDenied(
                "only the organization registry can register an election".to_string(),
            ));
        }
        if self.registry.dao_info(tx, dao_id).await?.is_none() {
            return Err(ElectionError::InvalidInput(format!("DAO {} not found", dao_id)));
        }
        if tx.contains(&keys::config(dao_id)).await? {
            return Err(ElectionError::ConfigExists(*dao_id));
        }
        if config.max_members == 0 || config.max_candidates < config.max_members {
            return Err(ElectionError::InvalidInput(format!(
                "{} seats with {} candidate slots",
                config.max_members, config.max_candidates
            )));
        }
        if config.stake_threshold == 0 || config.election_period <= 0 {
            return Err(ElectionError::InvalidInput(
                "stake threshold and election period must be positive".to_string(),
            ));
        }
        if !self.ledger.token_exists(tx, &config.governance_token).await? {
            return Err(ElectionError::InvalidInput(format!(
                "governance token {} not found",
                config.governance_token
            )));
        }
        match self.vote.get_vote_scheme(tx, &config.candidate_vote_scheme_id).await? {
            Some(scheme) if scheme.mechanism == VoteMechanism::TokenBallot => {}
            _ => {
                return Err(ElectionError::InvalidInput(
                    "candidate voting needs an existing TokenBallot scheme".to_string(),
                ))
            }
        }

        let now = tx.block_time();
        let first = ElectionTerm {
            term: 1,
            started_at: now,
            ends_at: now + config.election_period,
        };
        tx.put_json(keys::config(dao_id), &config)?;
        tx.put_json(keys::open_term(dao_id), &first)?;

        info!("Registered High Council election for DAO {}", dao_id);
        tx.emit(
            self.address(),
            &ElectionVotingEventRegistered {
                dao_id: *dao_id,
                config,
                first_term_ends_at: first.ends_at,
            },
        )?;
        Ok(())
    }

    /// Fix the council for `term` from the support gathered in the open term.
    ///
    /// Re-submitting the latest term is a no-op; any term other than the open
    /// one is rejected.
    /// The governance engine may snapshot at any time, anyone else only once
    /// the open term's voting window has ended.
    pub async fn take_snapshot(&self, tx: &mut Transaction, dao_id: &Hash, term: u64) -> ElectionResult<()> {
        let config = self.require_config(tx, dao_id).await?;
        let latest = self.view.latest_term(tx, dao_id).await?;
        if term == latest && latest > 0 {
            return Ok(());
        }
        if term != latest + 1 {
            return Err(ElectionError::TermOutOfOrder { requested: term, latest });
        }

        let open = self.open_term(tx, dao_id).await?;
        if open.term != term {
            return Err(ElectionError::TermOutOfOrder { requested: term, latest });
        }
        let now = tx.block_time();
        if tx.sender() != &self.addresses.governance && now <= open.ends_at {
            return Err(ElectionError::TermNotEnded(open.term));
        }

        let mut ranked = Vec::new();
        for candidate in self.get_candidates(tx, dao_id).await? {
            if self.is_banned(tx, dao_id, &candidate).await? {
                continue;
            }
            let support = self.vote.candidate_support(tx, dao_id, open.term, &candidate).await?;
            ranked.push((candidate, support));
        }
        // stable: equal support keeps announcement order
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let victories: Vec<Address> = ranked
            .iter()
            .take(config.max_members as usize)
            .map(|(candidate, _)| candidate.clone())
            .collect();

        for victor in &victories {
            if let Some(mut info) = self.get_candidate_information(tx, dao_id, victor).await? {
                info.elected_terms.push(term);
                tx.put_json(keys::information(dao_id, victor), &info)?;
            }
        }
        let snapshot = TermSnapshot {
            term,
            victories: victories.clone(),
            supports: ranked.clone(),
            taken_at: now,
        };
        tx.put_json(keys::snapshot(dao_id, term), &snapshot)?;
        tx.put_json(keys::latest_term(dao_id), &term)?;

        let next = ElectionTerm {
            term: term + 1,
            started_at: now,
            ends_at: now + config.election_period,
        };
        tx.put_json(keys::open_term(dao_id), &next)?;
        for candidate in self.get_candidates(tx, dao_id).await? {
            self.register_candidate_item(tx, dao_id, &config, &next, &candidate).await?;
        }

        info!(
            "Snapshot of term {} for DAO {}: {} council members",
            term,
            dao_id,
            victories.len()
        );
        tx.emit(
            self.address(),
            &TermSnapshotTaken {
                dao_id: *dao_id,
                term,
                victories,
                supports: ranked,
                next_term_ends_at: next.ends_at,
            },
        )?;
        Ok(())
    }

    pub(crate) async fn register_candidate_item(
        &self,
        tx: &mut Transaction,
        dao_id: &Hash,
        config: &HighCouncilConfig,
        term: &ElectionTerm,
        candidate: &Address,
    ) -> ElectionResult<Hash> {
        let input = CandidateItemInput {
            dao_id: *dao_id,
            term: term.term,
            candidate: candidate.clone(),
            scheme_id: config.candidate_vote_scheme_id,
            accepted_token: config.governance_token.clone(),
            active_start: term.started_at,
            active_end: term.ends_at,
        };
        tx.enter(self.address());
        let registered = self.vote.register_candidate_item(tx, input).await;
        tx.leave();
        Ok(registered?.id)
    }

    pub(crate) async fn require_config(&self, tx: &Transaction, dao_id: &Hash) -> ElectionResult<HighCouncilConfig> {
        self.get_high_council_config(tx, dao_id)
            .await?
            .ok_or(ElectionError::ConfigNotInitialized(*dao_id))
    }

    pub async fn get_high_council_config(
        &self,
        tx: &Transaction,
        dao_id: &Hash,
    ) -> ElectionResult<Option<HighCouncilConfig>> {
        Ok(tx.get_json(&keys::config(dao_id)).await?)
    }

    /// Term currently open for candidate voting
    pub async fn open_term(&self, tx: &Transaction, dao_id: &Hash) -> ElectionResult<ElectionTerm> {
        tx.get_json(&keys::open_term(dao_id))
            .await?
            .ok_or(ElectionError::ConfigNotInitialized(*dao_id))
    }

    /// Current candidates in announcement order
    pub async fn get_candidates(&self, tx: &Transaction, dao_id: &Hash) -> ElectionResult<Vec<Address>> {
        Ok(tx
            .get_json::<Vec<Address>>(&keys::candidates(dao_id))
            .await?
            .unwrap_or_default())
    }

    pub async fn get_candidate_information(
        &self,
        tx: &Transaction,
        dao_id: &Hash,
        candidate: &Address,
    ) -> ElectionResult<Option<CandidateInformation>> {
        Ok(tx.get_json(&keys::information(dao_id, candidate)).await?)
    }

    /// Candidates `admin` manages
    pub async fn get_managed_candidates(
        &self,
        tx: &Transaction,
        dao_id: &Hash,
        admin: &Address,
    ) -> ElectionResult<Vec<Address>> {
        Ok(tx
            .get_json::<Vec<Address>>(&keys::managed(dao_id, admin))
            .await?
            .unwrap_or_default())
    }

    pub async fn get_candidate_admin(
        &self,
        tx: &Transaction,
        dao_id: &Hash,
        candidate: &Address,
    ) -> ElectionResult<Option<Address>> {
        Ok(self
            .get_candidate_information(tx, dao_id, candidate)
            .await?
            .and_then(|info| info.admin))
    }

    pub async fn is_banned(&self, tx: &Transaction, dao_id: &Hash, address: &Address) -> ElectionResult<bool> {
        Ok(tx.contains(&keys::banned(dao_id, address)).await?)
    }

    /// Council of the latest snapshot
    pub async fn get_victories(&self, tx: &Transaction, dao_id: &Hash) -> ElectionResult<Vec<Address>> {
        Ok(self.view.victories(tx, dao_id).await?)
    }

    pub async fn get_term_snapshot(
        &self,
        tx: &Transaction,
        dao_id: &Hash,
        term: u64,
    ) -> ElectionResult<Option<TermSnapshot>> {
        Ok(self.view.snapshot(tx, dao_id, term).await?)
    }

    /// Account holding the stake locked by an announcement
    pub fn lock_address(&self, announcement_id: &Hash) -> Address {
        Address::virtual_of(self.address(), announcement_id)
    }
}
