//! Candidacy: announcing, quitting, admin handover and bans

use tracing::{info, warn};

use daogov_core::{Address, Hash, Transaction};

use crate::engine::ElectionEngine;
use crate::events::{CandidateAdded, CandidateAdminChanged, CandidateBanned, CandidateRemoved};
use crate::keys;
use crate::types::CandidateInformation;
use crate::{ElectionError, ElectionResult};

impl ElectionEngine {
    /// Announce the sender as a candidate, staking from the sender's balance.
    ///
    /// Returns the announcement id, which also seeds the stake lock.
    pub async fn announce(&self, tx: &mut Transaction, dao_id: &Hash, admin: &Address) -> ElectionResult<Hash> {
        let candidate = tx.sender().clone();
        self.announce_candidate(tx, dao_id, candidate, admin, None).await
    }

    /// Announce `candidate`, with the sender sponsoring the stake
    pub async fn announce_for(
        &self,
        tx: &mut Transaction,
        dao_id: &Hash,
        candidate: &Address,
        admin: &Address,
    ) -> ElectionResult<Hash> {
        let sponsor = tx.sender().clone();
        self.announce_candidate(tx, dao_id, candidate.clone(), admin, Some(sponsor))
            .await
    }

    async fn announce_candidate(
        &self,
        tx: &mut Transaction,
        dao_id: &Hash,
        candidate: Address,
        admin: &Address,
        sponsor: Option<Address>,
    ) -> ElectionResult<Hash> {
        if candidate.is_empty() || admin.is_empty() {
            return Err(ElectionError::InvalidInput("candidate and admin are required".to_string()));
        }
        let config = self.require_config(tx, dao_id).await?;

        let managed_by_candidate = self.get_managed_candidates(tx, dao_id, &candidate).await?;
        if managed_by_candidate.iter().any(|managed| managed != &candidate) {
            return Err(ElectionError::CandidateIsAdmin);
        }
        if self.is_banned(tx, dao_id, &candidate).await? {
            return Err(ElectionError::Banned);
        }
        let existing = self.get_candidate_information(tx, dao_id, &candidate).await?;
        if existing.as_ref().map_or(false, |info| info.is_current_candidate) {
            return Err(ElectionError::AlreadyAnnounced(candidate.to_string()));
        }
        let mut candidates = self.get_candidates(tx, dao_id).await?;
        if candidates.len() >= config.max_candidates as usize {
            return Err(ElectionError::TooManyCandidates(config.max_candidates));
        }

        let announcement_id = tx.tx_id();
        let payer = tx.sender().clone();
        let lock = self.lock_address(&announcement_id);
        tx.enter(self.address());
        let locked = self
            .ledger
            .transfer_from(tx, &payer, &lock, &config.governance_token, config.stake_threshold)
            .await;
        tx.leave();
        locked?;

        let now = tx.block_time();
        let info = match existing {
            Some(mut info) => {
                info.is_current_candidate = true;
                info.announcement_id = announcement_id;
                info.admin = Some(admin.clone());
                info.sponsor = sponsor.clone();
                info.announced_at = now;
                info
            }
            None => CandidateInformation {
                dao_id: *dao_id,
                candidate: candidate.clone(),
                is_current_candidate: true,
                announcement_id,
                admin: Some(admin.clone()),
                sponsor: sponsor.clone(),
                announced_at: now,
                elected_terms: Vec::new(),
            },
        };
        tx.put_json(keys::information(dao_id, &candidate), &info)?;
        candidates.push(candidate.clone());
        tx.put_json(keys::candidates(dao_id), &candidates)?;
        self.add_managed(tx, dao_id, admin, &candidate).await?;

        let term = self.open_term(tx, dao_id).await?;
        self.register_candidate_item(tx, dao_id, &config, &term, &candidate)
            .await?;

        info!(
            "{} announced candidacy in DAO {} with {} {} staked",
            candidate, dao_id, config.stake_threshold, config.governance_token
        );
        tx.emit(
            self.address(),
            &CandidateAdded {
                dao_id: *dao_id,
                candidate,
                admin: admin.clone(),
                sponsor,
                announcement_id,
                amount: config.stake_threshold,
                term: term.term,
            },
        )?;
        Ok(announcement_id)
    }

    /// Withdraw a candidacy and release its stake; only the candidate's admin may do this
    pub async fn quit(&self, tx: &mut Transaction, dao_id: &Hash, candidate: &Address) -> ElectionResult<()> {
        let config = self.require_config(tx, dao_id).await?;
        let mut info = match self.get_candidate_information(tx, dao_id, candidate).await? {
            Some(info) if info.admin.as_ref() == Some(tx.sender()) => info,
            _ => return Err(ElectionError::NotAdmin),
        };
        let mut candidates = self.get_candidates(tx, dao_id).await?;
        let position = candidates
            .iter()
            .position(|listed| listed == candidate)
            .ok_or(ElectionError::NotCandidate)?;
        candidates.remove(position);

        let refund_to = info.sponsor.clone().unwrap_or_else(|| candidate.clone());
        tx.enter(self.address());
        let released = self
            .ledger
            .transfer_out(
                tx,
                &info.announcement_id,
                &refund_to,
                &config.governance_token,
                config.stake_threshold,
            )
            .await;
        tx.leave();
        released?;

        let admin = tx.sender().clone();
        self.remove_managed(tx, dao_id, &admin, candidate).await?;
        info.is_current_candidate = false;
        info.announcement_id = Hash::empty();
        info.admin = None;
        info.sponsor = None;
        tx.put_json(keys::information(dao_id, candidate), &info)?;
        tx.put_json(keys::candidates(dao_id), &candidates)?;

        info!("{} quit the election of DAO {}", candidate, dao_id);
        tx.emit(
            self.address(),
            &CandidateRemoved {
                dao_id: *dao_id,
                candidate: candidate.clone(),
                refunded_to: refund_to,
                amount: config.stake_threshold,
            },
        )?;
        Ok(())
    }

    /// Hand a candidate over to a new admin; only the current admin may do this
    pub async fn set_candidate_admin(
        &self,
        tx: &mut Transaction,
        dao_id: &Hash,
        candidate: &Address,
        new_admin: &Address,
    ) -> ElectionResult<()> {
        if new_admin.is_empty() {
            return Err(ElectionError::InvalidInput("new admin is required".to_string()));
        }
        let mut info = self
            .get_candidate_information(tx, dao_id, candidate)
            .await?
            .ok_or(ElectionError::NotCandidate)?;
        let old_admin = match &info.admin {
            Some(admin) if admin == tx.sender() => admin.clone(),
            _ => {
                return Err(ElectionError::PermissionDenied(
                    "only the current admin can hand over a candidate".to_string(),
                ))
            }
        };

        self.remove_managed(tx, dao_id, &old_admin, candidate).await?;
        self.add_managed(tx, dao_id, new_admin, candidate).await?;
        info.admin = Some(new_admin.clone());
        tx.put_json(keys::information(dao_id, candidate), &info)?;

        tx.emit(
            self.address(),
            &CandidateAdminChanged {
                dao_id: *dao_id,
                candidate: candidate.clone(),
                old_admin,
                new_admin: new_admin.clone(),
            },
        )?;
        Ok(())
    }

    /// Ban an address from ever announcing; reachable only as a governance action
    pub async fn ban_candidate(&self, tx: &mut Transaction, dao_id: &Hash, address: &Address) -> ElectionResult<()> {
        if tx.sender() != &self.addresses.governance {
            return Err(ElectionError::PermissionDenied(
                "only the governance engine can ban candidates".to_string(),
            ));
        }
        self.require_config(tx, dao_id).await?;
        tx.put_json(keys::banned(dao_id, address), &true)?;

        warn!("Banned {} from the election of DAO {}", address, dao_id);
        tx.emit(
            self.address(),
            &CandidateBanned {
                dao_id: *dao_id,
                address: address.clone(),
            },
        )?;
        Ok(())
    }

    async fn add_managed(
        &self,
        tx: &mut Transaction,
        dao_id: &Hash,
        admin: &Address,
        candidate: &Address,
    ) -> ElectionResult<()> {
        let mut managed = self.get_managed_candidates(tx, dao_id, admin).await?;
        if !managed.contains(candidate) {
            managed.push(candidate.clone());
            tx.put_json(keys::managed(dao_id, admin), &managed)?;
        }
        Ok(())
    }

    async fn remove_managed(
        &self,
        tx: &mut Transaction,
        dao_id: &Hash,
        admin: &Address,
        candidate: &Address,
    ) -> ElectionResult<()> {
        let mut managed = self.get_managed_candidates(tx, dao_id, admin).await?;
        managed.retain(|listed| listed != candidate);
        if managed.is_empty() {
            tx.delete(keys::managed(dao_id, admin))?;
        } else {
            tx.put_json(keys::managed(dao_id, admin), &managed)?;
        }
        Ok(())
    }
}
