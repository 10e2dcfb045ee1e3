use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::Transaction;
use crate::crypto::{Address, Hash};
use crate::{CoreError, CoreResult};

/// A call attached to a proposal, run when the proposal is executed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalAction {
    pub target: Address,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Runs proposal actions that target components outside the governance engine
///
/// The executor is called inside the executing transaction with the governance
/// engine as the sender. `dao_id` is the DAO whose proposal carries the action;
/// executors must not let it act on another DAO. Returning an error aborts the
/// whole execution.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, tx: &mut Transaction, dao_id: &Hash, action: &ProposalAction) -> CoreResult<()>;
}

/// Executor for hosts with no external call targets
#[derive(Debug, Default, Clone)]
pub struct NoopActionExecutor;

#[async_trait]
impl ActionExecutor for NoopActionExecutor {
    async fn execute(&self, _tx: &mut Transaction, _dao_id: &Hash, action: &ProposalAction) -> CoreResult<()> {
        Err(CoreError::ActionFailed(format!(
            "no executor for target {} ({})",
            action.target, action.method
        )))
    }
}
