use async_trait::async_trait;

use daogov_core::{Address, CoreResult, CouncilDirectory, Hash, Transaction};

use crate::keys;
use crate::types::TermSnapshot;

/// Read-only view of election snapshots.
///
/// The vote and governance engines consult the council through this view, so
/// they never need a handle on the election engine itself.
#[derive(Debug, Default, Clone)]
pub struct CouncilView;

impl CouncilView {
    pub fn new() -> Self {
        Self
    }

    /// Term of the latest snapshot; 0 before the first one
    pub async fn latest_term(&self, tx: &Transaction, dao_id: &Hash) -> CoreResult<u64> {
        Ok(tx.get_json::<u64>(&keys::latest_term(dao_id)).await?.unwrap_or(0))
    }

    pub async fn snapshot(&self, tx: &Transaction, dao_id: &Hash, term: u64) -> CoreResult<Option<TermSnapshot>> {
        tx.get_json(&keys::snapshot(dao_id, term)).await
    }
}

#[async_trait]
impl CouncilDirectory for CouncilView {
    async fn victories(&self, tx: &Transaction, dao_id: &Hash) -> CoreResult<Vec<Address>> {
        let latest = self.latest_term(tx, dao_id).await?;
        if latest == 0 {
            return Ok(Vec::new());
        }
        Ok(self
            .snapshot(tx, dao_id, latest)
            .await?
            .map(|snapshot| snapshot.victories)
            .unwrap_or_default())
    }
}
