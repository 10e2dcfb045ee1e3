//! Transactional execution context
//!
//! The host runs operations one at a time. Each operation gets a
//! [`Transaction`]: a write-buffering overlay over the shared [`Storage`] that
//! also collects emitted events and tracks the chain of callers through nested
//! component calls. Nothing reaches storage until the operation succeeds.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::crypto::{Address, Hash};
use crate::event::{ContractEvent, EventRecord};
use crate::storage::{MemoryStorage, Storage, StorageError};
use crate::{CoreError, CoreResult};

/// Identity of the operation being executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxContext {
    /// Unique id of the enclosing transaction
    pub tx_id: Hash,
    /// Account that submitted the operation
    pub origin: Address,
    /// Block time in unix seconds
    pub block_time: i64,
}

/// All-or-nothing view of storage for a single operation
pub struct Transaction {
    storage: Arc<dyn Storage>,
    context: TxContext,
    callers: Vec<Address>,
    writes: BTreeMap<String, Option<Vec<u8>>>,
    events: Vec<EventRecord>,
    read_only: bool,
}

impl Transaction {
    /// Open a writable transaction
    pub fn new(storage: Arc<dyn Storage>, context: TxContext) -> Self {
        Self {
            storage,
            context,
            callers: Vec::new(),
            writes: BTreeMap::new(),
            events: Vec::new(),
            read_only: false,
        }
    }

    /// Open a transaction that only serves queries
    pub fn read_only(storage: Arc<dyn Storage>, context: TxContext) -> Self {
        Self {
            read_only: true,
            ..Self::new(storage, context)
        }
    }

    pub fn context(&self) -> &TxContext {
        &self.context
    }

    pub fn tx_id(&self) -> Hash {
        self.context.tx_id
    }

    pub fn block_time(&self) -> i64 {
        self.context.block_time
    }

    pub fn origin(&self) -> &Address {
        &self.context.origin
    }

    /// The immediate caller: the innermost component on the call stack, or the
    /// submitting account when no component call is in progress.
    pub fn sender(&self) -> &Address {
        self.callers.last().unwrap_or(&self.context.origin)
    }

    /// Begin a nested call made by `caller`
    pub fn enter(&mut self, caller: &Address) {
        self.callers.push(caller.clone());
    }

    /// End the innermost nested call
    pub fn leave(&mut self) {
        self.callers.pop();
    }

    async fn read(&self, key: &str) -> CoreResult<Option<Vec<u8>>> {
        if let Some(buffered) = self.writes.get(key) {
            return Ok(buffered.clone());
        }
        match self.storage.get(key).await {
            Ok(data) => Ok(Some(data)),
            Err(StorageError::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Read and decode a value, seeing this transaction's own writes
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> CoreResult<Option<T>> {
        match self.read(key).await? {
            Some(data) => serde_json::from_slice(&data)
                .map(Some)
                .map_err(|e| CoreError::Serialization(format!("{}: {}", key, e))),
            None => Ok(None),
        }
    }

    /// Whether a key currently holds a value
    pub async fn contains(&self, key: &str) -> CoreResult<bool> {
        Ok(self.read(key).await?.is_some())
    }

    /// Buffer a write
    pub fn put_json<T: Serialize + ?Sized>(&mut self, key: impl Into<String>, value: &T) -> CoreResult<()> {
        let key = key.into();
        self.ensure_writable(&key)?;
        let data = serde_json::to_vec(value).map_err(|e| CoreError::Serialization(e.to_string()))?;
        self.writes.insert(key, Some(data));
        Ok(())
    }

    /// Buffer a delete
    pub fn delete(&mut self, key: impl Into<String>) -> CoreResult<()> {
        let key = key.into();
        self.ensure_writable(&key)?;
        self.writes.insert(key, None);
        Ok(())
    }

    /// List keys under a prefix, merging committed keys with buffered writes
    pub async fn list(&self, prefix: &str) -> CoreResult<Vec<String>> {
        let mut keys: BTreeSet<String> = self.storage.list(prefix).await?.into_iter().collect();
        for (key, value) in self.writes.range(prefix.to_string()..) {
            if !key.starts_with(prefix) {
                break;
            }
            match value {
                Some(_) => keys.insert(key.clone()),
                None => keys.remove(key),
            };
        }
        Ok(keys.into_iter().collect())
    }

    /// Record an event; it is published only if the transaction commits
    pub fn emit<E: ContractEvent>(&mut self, emitter: &Address, event: &E) -> CoreResult<()> {
        self.ensure_writable(E::NAME)?;
        let payload = serde_json::to_value(event).map_err(|e| CoreError::Serialization(e.to_string()))?;
        self.events.push(EventRecord {
            emitter: emitter.clone(),
            name: E::NAME.to_string(),
            tx_id: self.context.tx_id,
            block_time: self.context.block_time,
            payload,
        });
        Ok(())
    }

    /// Events recorded so far
    pub fn pending_events(&self) -> &[EventRecord] {
        &self.events
    }

    fn ensure_writable(&self, what: &str) -> CoreResult<()> {
        if self.read_only {
            return Err(CoreError::ReadOnly(what.to_string()));
        }
        Ok(())
    }

    /// Flush buffered writes to storage and release the events
    pub async fn commit(self) -> CoreResult<Vec<EventRecord>> {
        for (key, value) in &self.writes {
            match value {
                Some(data) => self.storage.put(key, data).await?,
                None => match self.storage.delete(key).await {
                    Ok(()) | Err(StorageError::KeyNotFound(_)) => {}
                    Err(e) => return Err(e.into()),
                },
            }
        }
        debug!(
            "Committed transaction {} ({} writes, {} events)",
            self.context.tx_id,
            self.writes.len(),
            self.events.len()
        );
        Ok(self.events)
    }

    /// Commit on success, discard every effect on failure
    pub async fn finish<T, E>(self, result: Result<T, E>) -> Result<(T, Vec<EventRecord>), E>
    where
        E: From<CoreError> + fmt::Display,
    {
        match result {
            Ok(value) => {
                let events = self.commit().await?;
                Ok((value, events))
            }
            Err(e) => {
                debug!("Transaction {} aborted: {}", self.context.tx_id, e);
                Err(e)
            }
        }
    }
}

/// The execution host: storage, block clock and the committed event log
pub struct Host {
    storage: Arc<dyn Storage>,
    clock: AtomicI64,
    nonce: AtomicU64,
    log: RwLock<Vec<EventRecord>>,
}

impl Host {
    /// Create a host over existing storage
    pub fn new(storage: Arc<dyn Storage>, genesis_time: i64) -> Self {
        Self {
            storage,
            clock: AtomicI64::new(genesis_time),
            nonce: AtomicU64::new(0),
            log: RwLock::new(Vec::new()),
        }
    }

    /// Create a host backed by [`MemoryStorage`]
    pub fn in_memory(genesis_time: i64) -> Self {
        Self::new(Arc::new(MemoryStorage::new()), genesis_time)
    }

    pub fn storage(&self) -> Arc<dyn Storage> {
        self.storage.clone()
    }

    /// Current block time in unix seconds
    pub fn now(&self) -> i64 {
        self.clock.load(Ordering::SeqCst)
    }

    pub fn set_time(&self, time: i64) {
        self.clock.store(time, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.clock.fetch_add(seconds, Ordering::SeqCst);
    }

    /// Open a transaction submitted by `sender`
    pub fn begin(&self, sender: &Address) -> Transaction {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        let now = self.now();
        let tx_id = Hash::concat_and_compute(&[
            Hash::from_bytes(&nonce.to_be_bytes()),
            Hash::from_str_data(sender.as_str()),
            Hash::from_bytes(&now.to_be_bytes()),
        ]);
        Transaction::new(
            self.storage.clone(),
            TxContext {
                tx_id,
                origin: sender.clone(),
                block_time: now,
            },
        )
    }

    /// Open a read-only transaction for queries
    pub fn view(&self) -> Transaction {
        Transaction::read_only(
            self.storage.clone(),
            TxContext {
                tx_id: Hash::empty(),
                origin: Address::new(""),
                block_time: self.now(),
            },
        )
    }

    /// Finish a transaction, appending its events to the host log on success
    pub async fn finish<T, E>(&self, tx: Transaction, result: Result<T, E>) -> Result<T, E>
    where
        E: From<CoreError> + fmt::Display,
    {
        let (value, events) = tx.finish(result).await?;
        self.log.write().await.extend(events);
        Ok(value)
    }

    /// Every committed event so far
    pub async fn events(&self) -> Vec<EventRecord> {
        self.log.read().await.clone()
    }

    /// Committed events of type `E`
    pub async fn events_of<E: ContractEvent>(&self) -> Vec<EventRecord> {
        self.log.read().await.iter().filter(|r| r.is::<E>()).cloned().collect()
    }
}
