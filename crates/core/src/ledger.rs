//! Store-backed token ledger
//!
//! A minimal fungible-token ledger that keeps balances and allowances in the
//! same transactional store as the governance engines, so token moves made by
//! a failing operation roll back with it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::Transaction;
use crate::crypto::{Address, Hash};
use crate::event::ContractEvent;
use crate::interfaces::TokenLedger;
use crate::{CoreError, CoreResult};

/// Registered token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub issuer: Address,
    pub supply: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCreated {
    pub symbol: String,
    pub issuer: Address,
}

impl ContractEvent for TokenCreated {
    const NAME: &'static str = "TokenCreated";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transferred {
    pub symbol: String,
    pub from: Option<Address>,
    pub to: Address,
    pub amount: u64,
}

impl ContractEvent for Transferred {
    const NAME: &'static str = "Transferred";
}

fn token_key(symbol: &str) -> String {
    format!("ledger/tokens/{}", symbol)
}

fn balance_key(symbol: &str, owner: &Address) -> String {
    format!("ledger/balances/{}/{}", symbol, owner)
}

fn allowance_key(symbol: &str, owner: &Address, spender: &Address) -> String {
    format!("ledger/allowances/{}/{}/{}", symbol, owner, spender)
}

/// Token ledger persisted through the current [`Transaction`]
#[derive(Debug, Clone)]
pub struct StoreTokenLedger {
    address: Address,
}

impl StoreTokenLedger {
    /// Create a ledger acting under `address`
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    async fn token(&self, tx: &Transaction, symbol: &str) -> CoreResult<TokenInfo> {
        tx.get_json::<TokenInfo>(&token_key(symbol))
            .await?
            .ok_or_else(|| CoreError::TokenNotFound(symbol.to_string()))
    }

    /// Register a new token; the sender becomes its issuer
    pub async fn create_token(&self, tx: &mut Transaction, symbol: &str) -> CoreResult<TokenInfo> {
        if symbol.is_empty() {
            return Err(CoreError::Registry("token symbol is empty".to_string()));
        }
        if tx.contains(&token_key(symbol)).await? {
            return Err(CoreError::Registry(format!("token {} already exists", symbol)));
        }
        let info = TokenInfo {
            symbol: symbol.to_string(),
            issuer: tx.sender().clone(),
            supply: 0,
        };
        tx.put_json(token_key(symbol), &info)?;
        let address = self.address.clone();
        tx.emit(
            &address,
            &TokenCreated {
                symbol: info.symbol.clone(),
                issuer: info.issuer.clone(),
            },
        )?;
        Ok(info)
    }

    /// Issue new tokens; only the issuer may mint
    pub async fn mint(&self, tx: &mut Transaction, symbol: &str, to: &Address, amount: u64) -> CoreResult<()> {
        let mut info = self.token(tx, symbol).await?;
        if tx.sender() != &info.issuer {
            return Err(CoreError::PermissionDenied(format!("only the issuer can mint {}", symbol)));
        }
        info.supply = info
            .supply
            .checked_add(amount)
            .ok_or_else(|| CoreError::Registry(format!("supply overflow for {}", symbol)))?;
        tx.put_json(token_key(symbol), &info)?;
        let balance = self.balance_of(tx, to, symbol).await?;
        tx.put_json(balance_key(symbol, to), &(balance + amount))?;
        let address = self.address.clone();
        tx.emit(
            &address,
            &Transferred {
                symbol: symbol.to_string(),
                from: None,
                to: to.clone(),
                amount,
            },
        )
    }

    /// Let `spender` move up to `amount` of the sender's tokens
    pub async fn approve(&self, tx: &mut Transaction, spender: &Address, symbol: &str, amount: u64) -> CoreResult<()> {
        self.token(tx, symbol).await?;
        let owner = tx.sender().clone();
        tx.put_json(allowance_key(symbol, &owner, spender), &amount)
    }

    pub async fn allowance(&self, tx: &Transaction, owner: &Address, spender: &Address, symbol: &str) -> CoreResult<u64> {
        Ok(tx
            .get_json::<u64>(&allowance_key(symbol, owner, spender))
            .await?
            .unwrap_or(0))
    }

    /// Move the sender's own tokens
    pub async fn transfer(&self, tx: &mut Transaction, to: &Address, symbol: &str, amount: u64) -> CoreResult<()> {
        let from = tx.sender().clone();
        self.move_funds(tx, &from, to, symbol, amount).await
    }

    async fn move_funds(
        &self,
        tx: &mut Transaction,
        from: &Address,
        to: &Address,
        symbol: &str,
        amount: u64,
    ) -> CoreResult<()> {
        self.token(tx, symbol).await?;
        let from_balance = self.balance_of(tx, from, symbol).await?;
        if from_balance < amount {
            return Err(CoreError::InsufficientBalance(format!(
                "{} holds {} {}, needs {}",
                from, from_balance, symbol, amount
            )));
        }
        tx.put_json(balance_key(symbol, from), &(from_balance - amount))?;
        let to_balance = self.balance_of(tx, to, symbol).await?;
        tx.put_json(balance_key(symbol, to), &(to_balance + amount))?;

        debug!("Moved {} {} from {} to {}", amount, symbol, from, to);
        let address = self.address.clone();
        tx.emit(
            &address,
            &Transferred {
                symbol: symbol.to_string(),
                from: Some(from.clone()),
                to: to.clone(),
                amount,
            },
        )
    }
}

impl Default for StoreTokenLedger {
    fn default() -> Self {
        Self::new(Address::new("token"))
    }
}

#[async_trait]
impl TokenLedger for StoreTokenLedger {
    async fn token_exists(&self, tx: &Transaction, symbol: &str) -> CoreResult<bool> {
        tx.contains(&token_key(symbol)).await
    }

    async fn balance_of(&self, tx: &Transaction, owner: &Address, symbol: &str) -> CoreResult<u64> {
        Ok(tx.get_json::<u64>(&balance_key(symbol, owner)).await?.unwrap_or(0))
    }

    async fn transfer_from(
        &self,
        tx: &mut Transaction,
        from: &Address,
        to: &Address,
        symbol: &str,
        amount: u64,
    ) -> CoreResult<()> {
        let spender = tx.sender().clone();
        if &spender != from {
            let allowed = self.allowance(tx, from, &spender, symbol).await?;
            if allowed < amount {
                return Err(CoreError::InsufficientAllowance(format!(
                    "{} may spend {} {} of {}, needs {}",
                    spender, allowed, symbol, from, amount
                )));
            }
            tx.put_json(allowance_key(symbol, from, &spender), &(allowed - amount))?;
        }
        self.move_funds(tx, from, to, symbol, amount).await
    }

    async fn transfer_out(
        &self,
        tx: &mut Transaction,
        seed: &Hash,
        to: &Address,
        symbol: &str,
        amount: u64,
    ) -> CoreResult<()> {
        let from = Address::virtual_of(tx.sender(), seed);
        self.move_funds(tx, &from, to, symbol, amount).await
    }
}
