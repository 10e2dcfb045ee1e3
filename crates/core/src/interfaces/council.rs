use async_trait::async_trait;

use crate::context::Transaction;
use crate::crypto::{Address, Hash};
use crate::CoreResult;

/// Read access to elected High Council members
#[async_trait]
pub trait CouncilDirectory: Send + Sync {
    /// Victors of the latest election snapshot; empty before the first one
    async fn victories(&self, tx: &Transaction, dao_id: &Hash) -> CoreResult<Vec<Address>>;
}
