//! Events emitted by governance components
//!
//! Events are the external change-log of the engine. Each typed event carries
//! every field needed to reconstruct the state change it describes; the
//! transaction stores them as JSON records and releases them only on commit.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::crypto::{Address, Hash};
use crate::{CoreError, CoreResult};

/// A typed event payload
pub trait ContractEvent: Serialize {
    /// Stable event name used by off-chain observers
    const NAME: &'static str;
}

/// A committed (or pending) event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Component that fired the event
    pub emitter: Address,
    /// Event name, see [`ContractEvent::NAME`]
    pub name: String,
    /// Transaction the event belongs to
    pub tx_id: Hash,
    /// Block time of that transaction
    pub block_time: i64,
    /// JSON payload
    pub payload: serde_json::Value,
}

impl EventRecord {
    /// Whether this record carries an event of type `E`
    pub fn is<E: ContractEvent>(&self) -> bool {
        self.name == E::NAME
    }

    /// Decode the payload into its typed form
    pub fn decode<E: ContractEvent + DeserializeOwned>(&self) -> CoreResult<E> {
        if !self.is::<E>() {
            return Err(CoreError::Serialization(format!(
                "event {} is not a {}",
                self.name,
                E::NAME
            )));
        }
        serde_json::from_value(self.payload.clone()).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

/// Decode every event of type `E` from a list of records, in order
pub fn events_of<E: ContractEvent + DeserializeOwned>(records: &[EventRecord]) -> CoreResult<Vec<E>> {
    records.iter().filter(|r| r.is::<E>()).map(|r| r.decode::<E>()).collect()
}
