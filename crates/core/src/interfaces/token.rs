use async_trait::async_trait;

use crate::context::Transaction;
use crate::crypto::{Address, Hash};
use crate::CoreResult;

/// Fungible-token ledger consumed by the engines
///
/// Every call runs inside the caller's transaction, so a ledger move made by a
/// failing operation is rolled back together with it.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    /// Whether a token with this symbol exists
    async fn token_exists(&self, tx: &Transaction, symbol: &str) -> CoreResult<bool>;

    /// Spendable balance of `owner`
    async fn balance_of(&self, tx: &Transaction, owner: &Address, symbol: &str) -> CoreResult<u64>;

    /// Move `amount` from `from` to `to` on behalf of the current sender.
    ///
    /// The sender needs an allowance from `from` unless it is `from` itself.
    async fn transfer_from(
        &self,
        tx: &mut Transaction,
        from: &Address,
        to: &Address,
        symbol: &str,
        amount: u64,
    ) -> CoreResult<()>;

    /// Move `amount` out of the sender's virtual account derived from `seed`
    async fn transfer_out(
        &self,
        tx: &mut Transaction,
        seed: &Hash,
        to: &Address,
        symbol: &str,
        amount: u64,
    ) -> CoreResult<()>;
}
