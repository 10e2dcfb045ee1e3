//! Escrow of voted tokens
//!
//! Lock-requiring TokenBallot casts move tokens into a virtual account owned
//! by the vote engine and derived from `(voter, DAO)`. Two balances track
//! them: one per `(voter, DAO)` and one per `(voter, DAO, voting item)`. The
//! first always equals the sum of the second over the DAO's items.

use std::collections::BTreeSet;

use tracing::info;

use daogov_core::{Address, Hash, Transaction};

use crate::engine::VoteEngine;
use crate::events::Withdrawn;
use crate::keys;
use crate::types::{VotingItem, WithdrawInput};
use crate::{VoteError, VoteResult};

impl VoteEngine {
    /// Seed of the escrow account holding `voter`'s locked tokens for a DAO
    pub fn custody_seed(voter: &Address, dao_id: &Hash) -> Hash {
        Hash::concat_and_compute(&[Hash::from_str_data(voter.as_str()), *dao_id])
    }

    /// Escrow account holding `voter`'s locked tokens for a DAO
    pub fn custody_address(&self, voter: &Address, dao_id: &Hash) -> Address {
        Address::virtual_of(self.address(), &Self::custody_seed(voter, dao_id))
    }

    pub(crate) async fn add_custody(
        &self,
        tx: &mut Transaction,
        voter: &Address,
        item: &VotingItem,
        amount: u64,
    ) -> VoteResult<()> {
        let dao_remain = self.get_dao_remain_amount(tx, &item.dao_id, voter).await?;
        let item_remain = self.get_proposal_remain_amount(tx, &item.dao_id, voter, &item.id).await?;
        tx.put_json(keys::dao_custody(&item.dao_id, voter), &(dao_remain + amount))?;
        tx.put_json(keys::item_custody(&item.dao_id, voter, &item.id), &(item_remain + amount))?;
        Ok(())
    }

    /// Reclaim tokens locked on closed voting items of a DAO.
    ///
    /// `amount` must equal the sum of the outstanding balances of the listed
    /// items; every listed item is cleared.
    pub async fn withdraw(&self, tx: &mut Transaction, input: WithdrawInput) -> VoteResult<u64> {
        if input.voting_item_ids.is_empty() {
            return Err(VoteError::InvalidWithdraw("no voting items given".to_string()));
        }
        if input.amount == 0 {
            return Err(VoteError::InvalidWithdraw("amount must be positive".to_string()));
        }
        if self.registry.dao_info(tx, &input.dao_id).await?.is_none() {
            return Err(VoteError::InvalidInput(format!("DAO {} not found", input.dao_id)));
        }

        let voter = tx.sender().clone();
        let now = tx.block_time();
        let mut seen = BTreeSet::new();
        let mut releasable: u64 = 0;
        let mut symbol: Option<String> = None;

        for id in &input.voting_item_ids {
            if !seen.insert(*id) {
                return Err(VoteError::InvalidWithdraw(format!("voting item {} listed twice", id)));
            }
            let item = self
                .get_voting_item(tx, id)
                .await?
                .ok_or(VoteError::VotingItemNotFound(*id))?;
            if item.dao_id != input.dao_id {
                return Err(VoteError::InvalidWithdraw(format!(
                    "voting item {} belongs to another DAO",
                    id
                )));
            }
            if now <= item.active_end {
                return Err(VoteError::VoteNotEnded(*id));
            }

            let remain = self.get_proposal_remain_amount(tx, &input.dao_id, &voter, id).await?;
            if remain == 0 {
                return Err(VoteError::InvalidWithdraw(format!("nothing locked on {}", id)));
            }
            match (&symbol, &item.accepted_token) {
                (_, None) => {
                    return Err(VoteError::InvalidWithdraw(format!("voting item {} accepts no token", id)));
                }
                (None, Some(token)) => symbol = Some(token.clone()),
                (Some(current), Some(token)) if current != token => {
                    return Err(VoteError::InvalidWithdraw(
                        "voting items lock different tokens".to_string(),
                    ));
                }
                _ => {}
            }
            releasable = releasable.saturating_add(remain);
        }

        if releasable != input.amount {
            return Err(VoteError::InvalidWithdraw(format!(
                "requested {} but the listed items hold {}",
                input.amount, releasable
            )));
        }
        let dao_remain = self.get_dao_remain_amount(tx, &input.dao_id, &voter).await?;
        if input.amount > dao_remain {
            return Err(VoteError::InvalidWithdraw(format!(
                "requested {} exceeds the {} locked for this DAO",
                input.amount, dao_remain
            )));
        }
        let symbol = symbol.ok_or_else(|| VoteError::InvalidWithdraw("no token to release".to_string()))?;

        let seed = Self::custody_seed(&voter, &input.dao_id);
        tx.enter(self.address());
        let moved = self.ledger.transfer_out(tx, &seed, &voter, &symbol, input.amount).await;
        tx.leave();
        moved?;

        let left = dao_remain - input.amount;
        if left == 0 {
            tx.delete(keys::dao_custody(&input.dao_id, &voter))?;
        } else {
            tx.put_json(keys::dao_custody(&input.dao_id, &voter), &left)?;
        }
        for id in &input.voting_item_ids {
            tx.delete(keys::item_custody(&input.dao_id, &voter, id))?;
        }

        info!("{} withdrew {} {} from DAO {}", voter, input.amount, symbol, input.dao_id);
        tx.emit(
            self.address(),
            &Withdrawn {
                dao_id: input.dao_id,
                withdrawer: voter,
                amount: input.amount,
                voting_item_ids: input.voting_item_ids.clone(),
                timestamp: now,
            },
        )?;
        Ok(input.amount)
    }

    /// Tokens `voter` still has locked across a DAO's voting items
    pub async fn get_dao_remain_amount(&self, tx: &Transaction, dao_id: &Hash, voter: &Address) -> VoteResult<u64> {
        Ok(tx.get_json::<u64>(&keys::dao_custody(dao_id, voter)).await?.unwrap_or(0))
    }

    /// Tokens `voter` still has locked on one voting item
    pub async fn get_proposal_remain_amount(
        &self,
        tx: &Transaction,
        dao_id: &Hash,
        voter: &Address,
        voting_item_id: &Hash,
    ) -> VoteResult<u64> {
        Ok(tx
            .get_json::<u64>(&keys::item_custody(dao_id, voter, voting_item_id))
            .await?
            .unwrap_or(0))
    }

    /// Every voting item of a DAO on which `voter` has tokens locked
    pub async fn get_locked_items(&self, tx: &Transaction, dao_id: &Hash, voter: &Address) -> VoteResult<Vec<Hash>> {
        let prefix = keys::item_custody_prefix(dao_id, voter);
        tx.list(&prefix)
            .await?
            .iter()
            .map(|key| key[prefix.len()..].parse::<Hash>().map_err(VoteError::from))
            .collect()
    }
}
