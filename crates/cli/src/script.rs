//! Scenario scripts
//!
//! A script is a YAML list of steps replayed in order against one deployment.
//! DAOs are referenced by name, vote schemes and proposals by the labels the
//! steps that created them gave them.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use daogov::{Deployment, ElectionCall};
use daogov_core::utils::days;
use daogov_core::{Address, EventRecord, Hash, ProposalAction};
use daogov_election::HighCouncilConfig;
use daogov_governance::{
    CreateProposalInput, CreateVetoProposalInput, GovernanceCall, GovernanceSchemeThreshold, ProposalBasicInfo,
    ProposalType,
};
use daogov_vote::{
    GovernanceMechanism, VoteInput, VoteMechanism, VoteOption, VoteSchemeConfig, VoteStrategy, WithdrawInput,
};

#[derive(Debug, Deserialize)]
pub struct Script {
    /// Block time of the first step; the current wall clock when absent
    #[serde(default)]
    pub genesis_time: Option<i64>,
    pub steps: Vec<Step>,
}

impl Script {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).with_context(|| format!("cannot read script {}", path.display()))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Action carried by a Governance proposal; the proposal's DAO is filled in
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum ScriptAction {
    UpdateThreshold {
        mechanism: GovernanceMechanism,
        threshold: GovernanceSchemeThreshold,
    },
    SetGovernanceToken {
        token: String,
    },
    BanCandidate {
        candidate: String,
    },
    TakeSnapshot {
        term: u64,
    },
    /// Any other component
    Raw {
        target: String,
        method: String,
        #[serde(default)]
        params: Value,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    SetTime {
        time: i64,
    },
    Advance {
        #[serde(default)]
        days: i64,
        #[serde(default)]
        seconds: i64,
    },
    CreateToken {
        sender: String,
        symbol: String,
    },
    Mint {
        sender: String,
        symbol: String,
        to: String,
        amount: u64,
    },
    Approve {
        sender: String,
        spender: String,
        symbol: String,
        amount: u64,
    },
    RegisterDao {
        sender: String,
        name: String,
        #[serde(default)]
        governance_token: Option<String>,
        #[serde(default)]
        network: bool,
    },
    AddMember {
        sender: String,
        dao: String,
        member: String,
    },
    SetProducers {
        producers: Vec<String>,
    },
    /// Bootstrap a governance scheme through the registry
    AddScheme {
        dao: String,
        mechanism: GovernanceMechanism,
        threshold: GovernanceSchemeThreshold,
        #[serde(default)]
        governance_token: Option<String>,
    },
    CreateVoteScheme {
        sender: String,
        label: String,
        mechanism: VoteMechanism,
        #[serde(default)]
        lock: bool,
        strategy: VoteStrategy,
    },
    /// Bootstrap a High Council election through the registry
    RegisterElection {
        dao: String,
        vote_scheme: String,
        max_members: u32,
        max_candidates: u32,
        stake: u64,
        governance_token: String,
        period_days: i64,
    },
    Announce {
        sender: String,
        dao: String,
        admin: String,
        #[serde(default)]
        candidate: Option<String>,
    },
    Quit {
        sender: String,
        dao: String,
        candidate: String,
    },
    Snapshot {
        sender: String,
        dao: String,
        term: u64,
    },
    CreateProposal {
        sender: String,
        label: String,
        dao: String,
        mechanism: GovernanceMechanism,
        vote_scheme: String,
        proposal_type: ProposalType,
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        action: Option<ScriptAction>,
    },
    Veto {
        sender: String,
        label: String,
        dao: String,
        vote_scheme: String,
        target: String,
        title: String,
    },
    Vote {
        sender: String,
        proposal: String,
        option: VoteOption,
        #[serde(default = "default_amount")]
        amount: u64,
        #[serde(default)]
        memo: String,
    },
    /// Back a candidate in the open election term
    Back {
        sender: String,
        dao: String,
        candidate: String,
        amount: u64,
    },
    Withdraw {
        sender: String,
        dao: String,
        proposals: Vec<String>,
        amount: u64,
    },
    Execute {
        sender: String,
        proposal: String,
    },
}

fn default_amount() -> u64 {
    1
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::SetTime { .. } => "set_time",
            Step::Advance { .. } => "advance",
            Step::CreateToken { .. } => "create_token",
            Step::Mint { .. } => "mint",
            Step::Approve { .. } => "approve",
            Step::RegisterDao { .. } => "register_dao",
            Step::AddMember { .. } => "add_member",
            Step::SetProducers { .. } => "set_producers",
            Step::AddScheme { .. } => "add_scheme",
            Step::CreateVoteScheme { .. } => "create_vote_scheme",
            Step::RegisterElection { .. } => "register_election",
            Step::Announce { .. } => "announce",
            Step::Quit { .. } => "quit",
            Step::Snapshot { .. } => "snapshot",
            Step::CreateProposal { .. } => "create_proposal",
            Step::Veto { .. } => "veto",
            Step::Vote { .. } => "vote",
            Step::Back { .. } => "back",
            Step::Withdraw { .. } => "withdraw",
            Step::Execute { .. } => "execute",
        }
    }
}

/// Outcome of one replayed step
#[derive(Debug)]
pub struct StepOutcome {
    pub index: usize,
    pub step: &'static str,
    pub result: Result<Vec<EventRecord>>,
}

/// Replays scripts against a deployment, tracking labels across steps
pub struct Runner {
    deployment: Deployment,
    vote_schemes: HashMap<String, Hash>,
    proposals: HashMap<String, Hash>,
}

impl Runner {
    pub fn new(deployment: Deployment) -> Self {
        Self {
            deployment,
            vote_schemes: HashMap::new(),
            proposals: HashMap::new(),
        }
    }

    pub fn deployment(&self) -> &Deployment {
        &self.deployment
    }

    /// Replay every step; a failed step is reported and the script goes on
    pub async fn run(&mut self, script: &Script) -> Vec<StepOutcome> {
        let mut outcomes = Vec::with_capacity(script.steps.len());
        for (index, step) in script.steps.iter().enumerate() {
            let before = self.deployment.host.events().await.len();
            let result = match self.apply(step).await {
                Ok(()) => Ok(self.deployment.host.events().await.split_off(before)),
                Err(e) => {
                    warn!("Step {} ({}) failed: {}", index + 1, step.name(), e);
                    Err(e)
                }
            };
            outcomes.push(StepOutcome {
                index: index + 1,
                step: step.name(),
                result,
            });
        }
        outcomes
    }

    fn dao_id(&self, name: &str) -> Hash {
        self.deployment.registry.dao_id_for(name)
    }

    fn vote_scheme(&self, label: &str) -> Result<Hash> {
        self.vote_schemes
            .get(label)
            .copied()
            .ok_or_else(|| anyhow!("unknown vote scheme {}", label))
    }

    fn proposal(&self, label: &str) -> Result<Hash> {
        self.proposals
            .get(label)
            .copied()
            .ok_or_else(|| anyhow!("unknown proposal {}", label))
    }

    fn action(&self, dao_id: Hash, action: &ScriptAction) -> Result<ProposalAction> {
        let d = &self.deployment;
        let action = match action {
            ScriptAction::UpdateThreshold { mechanism, threshold } => GovernanceCall::UpdateGovernanceSchemeThreshold {
                dao_id,
                scheme_address: d.governance.scheme_address(&dao_id, *mechanism),
                threshold: *threshold,
            }
            .into_action(d.governance.address())?,
            ScriptAction::SetGovernanceToken { token } => GovernanceCall::SetGovernanceToken {
                dao_id,
                governance_token: token.clone(),
            }
            .into_action(d.governance.address())?,
            ScriptAction::BanCandidate { candidate } => ElectionCall::BanCandidate {
                dao_id,
                candidate: Address::new(candidate),
            }
            .into_action(d.election.address())?,
            ScriptAction::TakeSnapshot { term } => {
                ElectionCall::TakeSnapshot { dao_id, term: *term }.into_action(d.election.address())?
            }
            ScriptAction::Raw { target, method, params } => ProposalAction {
                target: Address::new(target),
                method: method.clone(),
                params: params.clone(),
            },
        };
        Ok(action)
    }

    async fn apply(&mut self, step: &Step) -> Result<()> {
        debug!("Applying {:?}", step);
        let d = &self.deployment;
        let host = &d.host;
        match step {
            Step::SetTime { time } => host.set_time(*time),
            Step::Advance { days: n, seconds } => host.advance(days(*n) + seconds),
            Step::CreateToken { sender, symbol } => {
                let mut tx = host.begin(&Address::new(sender));
                let result = d.ledger.create_token(&mut tx, symbol).await;
                host.finish(tx, result).await?;
            }
            Step::Mint {
                sender,
                symbol,
                to,
                amount,
            } => {
                let mut tx = host.begin(&Address::new(sender));
                let result = d.ledger.mint(&mut tx, symbol, &Address::new(to), *amount).await;
                host.finish(tx, result).await?;
            }
            Step::Approve {
                sender,
                spender,
                symbol,
                amount,
            } => {
                let mut tx = host.begin(&Address::new(sender));
                let result = d.ledger.approve(&mut tx, &Address::new(spender), symbol, *amount).await;
                host.finish(tx, result).await?;
            }
            Step::RegisterDao {
                sender,
                name,
                governance_token,
                network,
            } => {
                let mut tx = host.begin(&Address::new(sender));
                let result = d
                    .registry
                    .register_dao(&mut tx, name, governance_token.clone(), *network)
                    .await;
                host.finish(tx, result).await?;
            }
            Step::AddMember { sender, dao, member } => {
                let mut tx = host.begin(&Address::new(sender));
                let result = d
                    .registry
                    .add_member(&mut tx, &self.dao_id(dao), &Address::new(member))
                    .await;
                host.finish(tx, result).await?;
            }
            Step::SetProducers { producers } => {
                d.producers.set(producers.iter().map(Address::new)).await;
            }
            Step::AddScheme {
                dao,
                mechanism,
                threshold,
                governance_token,
            } => {
                let registry = d.addresses().registry.clone();
                let mut tx = host.begin(&registry);
                let result = d
                    .governance
                    .add_governance_scheme(&mut tx, &self.dao_id(dao), *mechanism, *threshold, governance_token.clone())
                    .await;
                host.finish(tx, result).await?;
            }
            Step::CreateVoteScheme {
                sender,
                label,
                mechanism,
                lock,
                strategy,
            } => {
                let config = VoteSchemeConfig {
                    mechanism: *mechanism,
                    requires_token_lock: *lock,
                    strategy: *strategy,
                };
                let mut tx = host.begin(&Address::new(sender));
                let result = d.vote.create_vote_scheme(&mut tx, config).await;
                let scheme = host.finish(tx, result).await?;
                self.vote_schemes.insert(label.clone(), scheme.id);
            }
            Step::RegisterElection {
                dao,
                vote_scheme,
                max_members,
                max_candidates,
                stake,
                governance_token,
                period_days,
            } => {
                let config = HighCouncilConfig {
                    max_members: *max_members,
                    max_candidates: *max_candidates,
                    stake_threshold: *stake,
                    governance_token: governance_token.clone(),
                    election_period: days(*period_days),
                    candidate_vote_scheme_id: self.vote_scheme(vote_scheme)?,
                };
                let registry = d.addresses().registry.clone();
                let mut tx = host.begin(&registry);
                let result = d
                    .election
                    .register_election_voting_event(&mut tx, &self.dao_id(dao), config)
                    .await;
                host.finish(tx, result).await?;
            }
            Step::Announce {
                sender,
                dao,
                admin,
                candidate,
            } => {
                let dao_id = self.dao_id(dao);
                let admin = Address::new(admin);
                let mut tx = host.begin(&Address::new(sender));
                let result = match candidate {
                    Some(candidate) => {
                        d.election
                            .announce_for(&mut tx, &dao_id, &Address::new(candidate), &admin)
                            .await
                    }
                    None => d.election.announce(&mut tx, &dao_id, &admin).await,
                };
                host.finish(tx, result).await?;
            }
            Step::Quit { sender, dao, candidate } => {
                let mut tx = host.begin(&Address::new(sender));
                let result = d
                    .election
                    .quit(&mut tx, &self.dao_id(dao), &Address::new(candidate))
                    .await;
                host.finish(tx, result).await?;
            }
            Step::Snapshot { sender, dao, term } => {
                let mut tx = host.begin(&Address::new(sender));
                let result = d.election.take_snapshot(&mut tx, &self.dao_id(dao), *term).await;
                host.finish(tx, result).await?;
            }
            Step::CreateProposal {
                sender,
                label,
                dao,
                mechanism,
                vote_scheme,
                proposal_type,
                title,
                description,
                action,
            } => {
                let dao_id = self.dao_id(dao);
                let action = match action {
                    Some(action) => Some(self.action(dao_id, action)?),
                    None => None,
                };
                let input = CreateProposalInput {
                    basic: ProposalBasicInfo {
                        dao_id,
                        title: title.clone(),
                        description: description.clone(),
                        forum_url: String::new(),
                        scheme_address: d.governance.scheme_address(&dao_id, *mechanism),
                        vote_scheme_id: self.vote_scheme(vote_scheme)?,
                        active_time_period: None,
                    },
                    proposal_type: *proposal_type,
                    action,
                };
                let mut tx = host.begin(&Address::new(sender));
                let result = d.governance.create_proposal(&mut tx, input).await;
                let id = host.finish(tx, result).await?;
                self.proposals.insert(label.clone(), id);
            }
            Step::Veto {
                sender,
                label,
                dao,
                vote_scheme,
                target,
                title,
            } => {
                let dao_id = self.dao_id(dao);
                let input = CreateVetoProposalInput {
                    basic: ProposalBasicInfo {
                        dao_id,
                        title: title.clone(),
                        description: String::new(),
                        forum_url: String::new(),
                        scheme_address: d.governance.scheme_address(&dao_id, GovernanceMechanism::Referendum),
                        vote_scheme_id: self.vote_scheme(vote_scheme)?,
                        active_time_period: None,
                    },
                    vetoed_proposal_id: self.proposal(target)?,
                };
                let mut tx = host.begin(&Address::new(sender));
                let result = d.governance.create_veto_proposal(&mut tx, input).await;
                let id = host.finish(tx, result).await?;
                self.proposals.insert(label.clone(), id);
            }
            Step::Vote {
                sender,
                proposal,
                option,
                amount,
                memo,
            } => {
                let input = VoteInput {
                    voting_item_id: self.proposal(proposal)?,
                    option: *option,
                    amount: *amount,
                    memo: memo.clone(),
                };
                let mut tx = host.begin(&Address::new(sender));
                let result = d.vote.vote(&mut tx, input).await;
                host.finish(tx, result).await?;
            }
            Step::Back {
                sender,
                dao,
                candidate,
                amount,
            } => {
                let dao_id = self.dao_id(dao);
                let term = d.election.open_term(&host.view(), &dao_id).await?;
                let input = VoteInput {
                    voting_item_id: d.vote.candidate_item_id(&dao_id, term.term, &Address::new(candidate)),
                    option: VoteOption::Approve,
                    amount: *amount,
                    memo: String::new(),
                };
                let mut tx = host.begin(&Address::new(sender));
                let result = d.vote.vote(&mut tx, input).await;
                host.finish(tx, result).await?;
            }
            Step::Withdraw {
                sender,
                dao,
                proposals,
                amount,
            } => {
                let input = WithdrawInput {
                    dao_id: self.dao_id(dao),
                    voting_item_ids: proposals
                        .iter()
                        .map(|label| self.proposal(label))
                        .collect::<Result<_>>()?,
                    amount: *amount,
                };
                let mut tx = host.begin(&Address::new(sender));
                let result = d.vote.withdraw(&mut tx, input).await;
                host.finish(tx, result).await?;
            }
            Step::Execute { sender, proposal } => {
                let id = self.proposal(proposal)?;
                let mut tx = host.begin(&Address::new(sender));
                let result = d.governance.execute_proposal(&mut tx, &id).await;
                host.finish(tx, result).await?;
            }
        }
        Ok(())
    }
}
