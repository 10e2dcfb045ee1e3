use async_trait::async_trait;

use crate::context::Transaction;
use crate::crypto::Address;
use crate::CoreResult;

/// Provider of the current block-producer set
#[async_trait]
pub trait BlockProducerSet: Send + Sync {
    async fn current_producers(&self, tx: &Transaction) -> CoreResult<Vec<Address>>;
}
