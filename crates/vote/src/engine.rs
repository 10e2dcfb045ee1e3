//! Vote scheme registry, voting item registration and vote casting

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use daogov_core::utils::utc_day;
use daogov_core::{
    Address, BlockProducerSet, ComponentAddresses, CoreResult, CouncilDirectory, DaoInfo, Hash, OrganizationRegistry,
    TokenLedger, Transaction,
};

use crate::events::{VoteSchemeCreated, Voted, VotingItemRegistered};
use crate::keys;
use crate::types::{
    CandidateItemInput, GovernanceMechanism, RegisterVotingItem, VoteDetail, VoteInput, VoteMechanism, VoteScheme,
    VoteSchemeConfig, VoteStrategy, VotingItem, VotingItemStatus, VotingRecord, VotingResult,
};
use crate::{VoteError, VoteResult};

/// Default bound on a vote memo, in characters
pub const DEFAULT_MEMO_MAX_LENGTH: usize = 64;

/// What the governance engine knows about the proposal behind a voting item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalBinding {
    pub dao_id: Hash,
    pub mechanism: GovernanceMechanism,
}

/// Resolves proposals when their voting items are registered
#[async_trait]
pub trait ProposalDirectory: Send + Sync {
    /// The DAO and governance mechanism of a proposal, or `None` when either
    /// the proposal or its governance scheme cannot be found
    async fn proposal_binding(&self, tx: &Transaction, proposal_id: &Hash) -> CoreResult<Option<ProposalBinding>>;
}

/// The vote scheme and tallying engine
pub struct VoteEngine {
    addresses: ComponentAddresses,
    pub(crate) ledger: Arc<dyn TokenLedger>,
    pub(crate) registry: Arc<dyn OrganizationRegistry>,
    producers: Arc<dyn BlockProducerSet>,
    council: Arc<dyn CouncilDirectory>,
    memo_max_length: usize,
}

impl VoteEngine {
    /// Create a new vote engine
    pub fn new(
        addresses: ComponentAddresses,
        ledger: Arc<dyn TokenLedger>,
        registry: Arc<dyn OrganizationRegistry>,
        producers: Arc<dyn BlockProducerSet>,
        council: Arc<dyn CouncilDirectory>,
    ) -> Self {
        Self {
            addresses,
            ledger,
            registry,
            producers,
            council,
            memo_max_length: DEFAULT_MEMO_MAX_LENGTH,
        }
    }

    pub fn with_memo_max_length(mut self, memo_max_length: usize) -> Self {
        self.memo_max_length = memo_max_length;
        self
    }

    /// Address the engine acts under
    pub fn address(&self) -> &Address {
        &self.addresses.vote
    }

    pub fn addresses(&self) -> &ComponentAddresses {
        &self.addresses
    }

    /// Id a scheme with this configuration receives
    pub fn scheme_id_for(&self, config: &VoteSchemeConfig) -> VoteResult<Hash> {
        Ok(Hash::concat_and_compute(&[
            Hash::from_str_data(self.address().as_str()),
            Hash::compute_from(config)?,
        ]))
    }

    /// Id of the voting item collecting support for `candidate` in `term`
    pub fn candidate_item_id(&self, dao_id: &Hash, term: u64, candidate: &Address) -> Hash {
        Hash::concat_and_compute(&[
            Hash::from_str_data(self.addresses.election.as_str()),
            *dao_id,
            Hash::from_bytes(&term.to_be_bytes()),
            Hash::from_str_data(candidate.as_str()),
        ])
    }

    /// Create a vote scheme. Identical configurations map to the same id, so
    /// re-submitting one is rejected as a duplicate.
    pub async fn create_vote_scheme(&self, tx: &mut Transaction, config: VoteSchemeConfig) -> VoteResult<VoteScheme> {
        if config.strategy == VoteStrategy::DailyCount(0) {
            return Err(VoteError::InvalidInput("Invalid VoteCount.".to_string()));
        }

        let id = self.scheme_id_for(&config)?;
        if tx.contains(&keys::scheme(&id)).await? {
            return Err(VoteError::DuplicateScheme(id));
        }

        let scheme = VoteScheme {
            id,
            mechanism: config.mechanism,
            requires_token_lock: config.requires_token_lock,
            strategy: config.strategy,
        };
        tx.put_json(keys::scheme(&id), &scheme)?;

        info!("Created vote scheme {} ({:?}, {:?})", id, scheme.mechanism, scheme.strategy);
        tx.emit(
            self.address(),
            &VoteSchemeCreated {
                scheme_id: id,
                mechanism: scheme.mechanism,
                requires_token_lock: scheme.requires_token_lock,
                strategy: scheme.strategy,
            },
        )?;
        Ok(scheme)
    }

    /// Register the voting item of a freshly created proposal
    pub async fn register(
        &self,
        tx: &mut Transaction,
        directory: &dyn ProposalDirectory,
        input: RegisterVotingItem,
    ) -> VoteResult<VotingItem> {
        if tx.sender() != &self.addresses.governance {
            return Err(VoteError::PermissionDenied(
                "only the governance engine can register voting items".to_string(),
            ));
        }

        let scheme = self.require_scheme(tx, &input.scheme_id).await?;
        if scheme.mechanism == VoteMechanism::TokenBallot {
            self.require_token(tx, input.accepted_token.as_deref()).await?;
        }

        let binding = directory
            .proposal_binding(tx, &input.voting_item_id)
            .await?
            .ok_or(VoteError::ProposalNotFound(input.voting_item_id))?;
        self.require_active_dao(tx, &binding.dao_id).await?;

        let item = VotingItem {
            id: input.voting_item_id,
            dao_id: binding.dao_id,
            scheme_id: input.scheme_id,
            accepted_token: input.accepted_token,
            governance_mechanism: binding.mechanism,
            registered_at: tx.block_time(),
            active_start: input.active_start,
            active_end: input.active_end,
        };
        self.store_item(tx, item).await
    }

    /// Register the item collecting votes for an election candidate.
    ///
    /// Registering an item that already exists returns it unchanged.
    pub async fn register_candidate_item(&self, tx: &mut Transaction, input: CandidateItemInput) -> VoteResult<VotingItem> {
        if tx.sender() != &self.addresses.election {
            return Err(VoteError::PermissionDenied(
                "only the election engine can register candidate items".to_string(),
            ));
        }

        let id = self.candidate_item_id(&input.dao_id, input.term, &input.candidate);
        if let Some(existing) = self.get_voting_item(tx, &id).await? {
            return Ok(existing);
        }

        let scheme = self.require_scheme(tx, &input.scheme_id).await?;
        if scheme.mechanism != VoteMechanism::TokenBallot {
            return Err(VoteError::InvalidInput(
                "candidate voting needs a TokenBallot scheme".to_string(),
            ));
        }
        self.require_token(tx, Some(&input.accepted_token)).await?;
        self.require_active_dao(tx, &input.dao_id).await?;

        let item = VotingItem {
            id,
            dao_id: input.dao_id,
            scheme_id: input.scheme_id,
            accepted_token: Some(input.accepted_token),
            governance_mechanism: GovernanceMechanism::Referendum,
            registered_at: tx.block_time(),
            active_start: input.active_start,
            active_end: input.active_end,
        };
        self.store_item(tx, item).await
    }

    async fn store_item(&self, tx: &mut Transaction, item: VotingItem) -> VoteResult<VotingItem> {
        if item.active_end < item.active_start {
            return Err(VoteError::InvalidInput("voting window ends before it starts".to_string()));
        }
        if tx.contains(&keys::item(&item.id)).await? {
            return Err(VoteError::VotingItemExists(item.id));
        }

        tx.put_json(keys::item(&item.id), &item)?;
        tx.put_json(keys::result(&item.id), &VotingResult::new(&item))?;

        info!(
            "Registered voting item {} for DAO {} [{}, {}]",
            item.id, item.dao_id, item.active_start, item.active_end
        );
        tx.emit(
            self.address(),
            &VotingItemRegistered {
                dao_id: item.dao_id,
                voting_item_id: item.id,
                scheme_id: item.scheme_id,
                accepted_token: item.accepted_token.clone(),
                governance_mechanism: item.governance_mechanism,
                registered_at: item.registered_at,
                active_start: item.active_start,
                active_end: item.active_end,
            },
        )?;
        Ok(item)
    }

    /// Cast a vote as the current sender; returns the vote id
    pub async fn vote(&self, tx: &mut Transaction, input: VoteInput) -> VoteResult<Hash> {
        if input.memo.chars().count() > self.memo_max_length {
            return Err(VoteError::InvalidInput(format!(
                "memo longer than {} characters",
                self.memo_max_length
            )));
        }

        let item = self
            .get_voting_item(tx, &input.voting_item_id)
            .await?
            .ok_or(VoteError::VotingItemNotFound(input.voting_item_id))?;
        let now = tx.block_time();
        if now < item.active_start {
            return Err(VoteError::VoteNotStarted);
        }
        if now > item.active_end {
            return Err(VoteError::VoteEnded);
        }

        let dao = self.require_active_dao(tx, &item.dao_id).await?;
        let scheme = self.require_scheme(tx, &item.scheme_id).await?;
        let voter = tx.sender().clone();
        let existing: Option<VotingRecord> = tx.get_json(&keys::record(&item.id, &voter)).await?;
        check_cast_limit(&scheme, existing.as_ref(), now)?;
        self.check_eligibility(tx, &item, &dao, &voter).await?;

        let locked = match scheme.mechanism {
            VoteMechanism::UniqueVote => {
                if input.amount != 1 {
                    return Err(VoteError::InvalidAmount(format!(
                        "UniqueVote casts weigh exactly 1, got {}",
                        input.amount
                    )));
                }
                false
            }
            VoteMechanism::TokenBallot => {
                if input.amount == 0 {
                    return Err(VoteError::InvalidAmount("amount must be positive".to_string()));
                }
                let symbol = item
                    .accepted_token
                    .clone()
                    .ok_or_else(|| VoteError::InvalidInput("voting item accepts no token".to_string()))?;
                if scheme.requires_token_lock {
                    let escrow = self.custody_address(&voter, &item.dao_id);
                    tx.enter(self.address());
                    let moved = self.ledger.transfer_from(tx, &voter, &escrow, &symbol, input.amount).await;
                    tx.leave();
                    moved?;
                    true
                } else {
                    // every cast on the item must stay covered by the balance
                    let cast = existing.as_ref().map_or(0, |record| record.cumulative_amount);
                    let required = cast
                        .checked_add(input.amount)
                        .ok_or_else(|| VoteError::InvalidAmount("vote weight overflows".to_string()))?;
                    let balance = self.ledger.balance_of(tx, &voter, &symbol).await?;
                    if balance < required {
                        return Err(VoteError::InvalidAmount(format!(
                            "balance {} {} is below {} already cast plus {}",
                            balance, symbol, cast, input.amount
                        )));
                    }
                    false
                }
            }
        };
        if locked {
            self.add_custody(tx, &voter, &item, input.amount).await?;
        }

        let vote_id = Hash::concat_and_compute(&[
            Hash::compute_from(&input)?,
            Hash::from_str_data(voter.as_str()),
            tx.tx_id(),
        ]);
        let new_voter = existing.is_none();
        let detail = VoteDetail {
            vote_id,
            option: input.option,
            amount: input.amount,
            timestamp: now,
        };
        let record = match existing {
            Some(mut record) => {
                record.cumulative_amount = record.cumulative_amount.saturating_add(input.amount);
                record.last_option = input.option;
                record.last_vote_id = vote_id;
                record.details.push(detail);
                record
            }
            None => VotingRecord {
                voting_item_id: item.id,
                voter: voter.clone(),
                cumulative_amount: input.amount,
                last_option: input.option,
                last_vote_id: vote_id,
                details: vec![detail],
            },
        };
        tx.put_json(keys::record(&item.id, &voter), &record)?;

        let mut result = self
            .get_voting_result(tx, &item.id)
            .await?
            .ok_or(VoteError::VotingItemNotFound(item.id))?;
        result.add(input.option, input.amount, new_voter);
        tx.put_json(keys::result(&item.id), &result)?;

        debug!(
            "{} voted {:?} with {} on {} (vote {})",
            voter, input.option, input.amount, item.id, vote_id
        );
        tx.emit(
            self.address(),
            &Voted {
                dao_id: item.dao_id,
                voting_item_id: item.id,
                voter,
                vote_id,
                option: input.option,
                amount: input.amount,
                mechanism: scheme.mechanism,
                locked,
                timestamp: now,
                active_start: item.active_start,
                active_end: item.active_end,
                memo: input.memo,
            },
        )?;
        Ok(vote_id)
    }

    async fn check_eligibility(
        &self,
        tx: &Transaction,
        item: &VotingItem,
        dao: &DaoInfo,
        voter: &Address,
    ) -> VoteResult<()> {
        match item.governance_mechanism {
            GovernanceMechanism::Referendum => Ok(()),
            GovernanceMechanism::HighCouncil => {
                if self.council.victories(tx, &dao.dao_id).await?.contains(voter) {
                    return Ok(());
                }
                if dao.is_network_dao && self.producers.current_producers(tx).await?.contains(voter) {
                    return Ok(());
                }
                Err(VoteError::NotEligible(format!("{} is not a High Council member", voter)))
            }
            GovernanceMechanism::Organization => {
                if self.registry.is_member(tx, &dao.dao_id, voter).await? {
                    Ok(())
                } else {
                    Err(VoteError::NotEligible(format!("{} is not an organization member", voter)))
                }
            }
        }
    }

    async fn require_scheme(&self, tx: &Transaction, id: &Hash) -> VoteResult<VoteScheme> {
        self.get_vote_scheme(tx, id).await?.ok_or(VoteError::SchemeNotFound(*id))
    }

    async fn require_token(&self, tx: &Transaction, symbol: Option<&str>) -> VoteResult<()> {
        match symbol {
            Some(symbol) if self.ledger.token_exists(tx, symbol).await? => Ok(()),
            Some(symbol) => Err(VoteError::TokenNotFound(symbol.to_string())),
            None => Err(VoteError::TokenNotFound("no accepted token".to_string())),
        }
    }

    pub(crate) async fn require_active_dao(&self, tx: &Transaction, dao_id: &Hash) -> VoteResult<DaoInfo> {
        self.registry
            .dao_info(tx, dao_id)
            .await?
            .filter(|dao| dao.subsist_status)
            .ok_or(VoteError::DaoNotActive(*dao_id))
    }

    pub async fn get_vote_scheme(&self, tx: &Transaction, id: &Hash) -> VoteResult<Option<VoteScheme>> {
        Ok(tx.get_json(&keys::scheme(id)).await?)
    }

    pub async fn get_voting_item(&self, tx: &Transaction, id: &Hash) -> VoteResult<Option<VotingItem>> {
        Ok(tx.get_json(&keys::item(id)).await?)
    }

    pub async fn get_voting_result(&self, tx: &Transaction, id: &Hash) -> VoteResult<Option<VotingResult>> {
        Ok(tx.get_json(&keys::result(id)).await?)
    }

    pub async fn get_voting_record(
        &self,
        tx: &Transaction,
        id: &Hash,
        voter: &Address,
    ) -> VoteResult<Option<VotingRecord>> {
        Ok(tx.get_json(&keys::record(id, voter)).await?)
    }

    /// Status of a voting item at the transaction's block time
    pub async fn voting_item_status(&self, tx: &Transaction, id: &Hash) -> VoteResult<VotingItemStatus> {
        let item = self.get_voting_item(tx, id).await?;
        Ok(VotingItemStatus::of(item.as_ref(), tx.block_time()))
    }

    /// Approve weight gathered by a candidate in a term; 0 when never registered
    pub async fn candidate_support(
        &self,
        tx: &Transaction,
        dao_id: &Hash,
        term: u64,
        candidate: &Address,
    ) -> VoteResult<u64> {
        let id = self.candidate_item_id(dao_id, term, candidate);
        Ok(self
            .get_voting_result(tx, &id)
            .await?
            .map(|result| result.approve_weight)
            .unwrap_or(0))
    }
}

/// Enforce how often a voter may cast on one item.
///
/// A `DailyCount(n)` scheme allows `n` casts per UTC day. Without a daily
/// allowance, UniqueVote voters cast once and TokenBallot voters may add to
/// their vote as long as each cast stays backed by tokens.
fn check_cast_limit(scheme: &VoteScheme, record: Option<&VotingRecord>, now: i64) -> VoteResult<()> {
    let record = match record {
        Some(record) => record,
        None => return Ok(()),
    };
    match (scheme.strategy, scheme.mechanism) {
        (VoteStrategy::DailyCount(limit), _) => {
            let today = utc_day(now);
            let cast_today = record
                .details
                .iter()
                .filter(|detail| utc_day(detail.timestamp) == today)
                .count();
            if cast_today >= limit as usize {
                return Err(VoteError::DailyLimitReached);
            }
            Ok(())
        }
        (VoteStrategy::Unlimited, VoteMechanism::UniqueVote) => Err(VoteError::AlreadyVoted),
        (VoteStrategy::Unlimited, VoteMechanism::TokenBallot) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme(mechanism: VoteMechanism, strategy: VoteStrategy) -> VoteScheme {
        VoteScheme {
            id: Hash::empty(),
            mechanism,
            requires_token_lock: false,
            strategy,
        }
    }

    fn record_at(timestamps: &[i64]) -> VotingRecord {
        VotingRecord {
            voting_item_id: Hash::empty(),
            voter: Address::new("voter"),
            cumulative_amount: timestamps.len() as u64,
            last_option: crate::types::VoteOption::Approve,
            last_vote_id: Hash::empty(),
            details: timestamps
                .iter()
                .map(|&timestamp| VoteDetail {
                    vote_id: Hash::empty(),
                    option: crate::types::VoteOption::Approve,
                    amount: 1,
                    timestamp,
                })
                .collect(),
        }
    }

    #[test]
    fn test_daily_count_resets_at_utc_midnight() {
        let day = 1_700_006_400;
        let scheme = scheme(VoteMechanism::TokenBallot, VoteStrategy::DailyCount(2));
        let record = record_at(&[day + 10, day + 20]);

        assert!(matches!(
            check_cast_limit(&scheme, Some(&record), day + 3_600),
            Err(VoteError::DailyLimitReached)
        ));
        assert!(check_cast_limit(&scheme, Some(&record), day + 86_400).is_ok());
        assert!(check_cast_limit(&scheme, Some(&record_at(&[day])), day + 1).is_ok());
    }

    #[test]
    fn test_unlimited_strategy_by_mechanism() {
        let record = record_at(&[0]);
        assert!(check_cast_limit(&scheme(VoteMechanism::TokenBallot, VoteStrategy::Unlimited), Some(&record), 5).is_ok());
        assert!(matches!(
            check_cast_limit(&scheme(VoteMechanism::UniqueVote, VoteStrategy::Unlimited), Some(&record), 5),
            Err(VoteError::AlreadyVoted)
        ));
        assert!(check_cast_limit(&scheme(VoteMechanism::UniqueVote, VoteStrategy::Unlimited), None, 5).is_ok());
    }
}
