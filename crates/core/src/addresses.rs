use serde::{Deserialize, Serialize};

use crate::crypto::Address;

/// Well-known addresses of the components installed on a host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentAddresses {
    #[serde(default = "default_governance")]
    pub governance: Address,
    #[serde(default = "default_vote")]
    pub vote: Address,
    #[serde(default = "default_election")]
    pub election: Address,
    #[serde(default = "default_registry")]
    pub registry: Address,
    #[serde(default = "default_token")]
    pub token: Address,
}

fn default_governance() -> Address {
    Address::new("governance")
}

fn default_vote() -> Address {
    Address::new("vote")
}

fn default_election() -> Address {
    Address::new("election")
}

fn default_registry() -> Address {
    Address::new("registry")
}

fn default_token() -> Address {
    Address::new("token")
}

impl Default for ComponentAddresses {
    fn default() -> Self {
        Self {
            governance: default_governance(),
            vote: default_vote(),
            election: default_election(),
            registry: default_registry(),
            token: default_token(),
        }
    }
}
