use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::RwLock;

use daogov_config::ProposalTimePeriod;
use daogov_core::utils::days;
use daogov_core::{
    ActionExecutor, Address, ComponentAddresses, CoreError, CoreResult, CouncilDirectory, Hash, Host,
    ProposalAction, StaticProducerSet, StoreOrganizationRegistry, StoreTokenLedger, Transaction,
};
use daogov_vote::{
    GovernanceMechanism, VoteEngine, VoteInput, VoteMechanism, VoteOption, VoteResult, VoteSchemeConfig, VoteStrategy,
};

use crate::*;

const T0: i64 = 1_700_006_400;

#[derive(Default)]
struct FixedCouncil(RwLock<Vec<Address>>);

#[async_trait]
impl CouncilDirectory for FixedCouncil {
    async fn victories(&self, _tx: &Transaction, _dao_id: &Hash) -> CoreResult<Vec<Address>> {
        Ok(self.0.read().await.clone())
    }
}

#[derive(Default)]
struct RecordingExecutor {
    calls: Mutex<Vec<(Hash, ProposalAction)>>,
    fail: AtomicBool,
}

impl RecordingExecutor {
    fn calls(&self) -> Vec<(Hash, ProposalAction)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionExecutor for RecordingExecutor {
    async fn execute(&self, tx: &mut Transaction, dao_id: &Hash, action: &ProposalAction) -> CoreResult<()> {
        assert_eq!(tx.sender().as_str(), "governance");
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoreError::ActionFailed("treasury refused".to_string()));
        }
        self.calls.lock().unwrap().push((*dao_id, action.clone()));
        Ok(())
    }
}

fn threshold(minimal_vote_threshold: u64) -> GovernanceSchemeThreshold {
    GovernanceSchemeThreshold {
        minimal_required_threshold: 1,
        minimal_vote_threshold,
        minimal_approve_threshold: 5000,
        maximal_rejection_threshold: 5000,
        maximal_abstention_threshold: 5000,
        proposal_threshold: 0,
    }
}

struct Fixture {
    host: Host,
    ledger: Arc<StoreTokenLedger>,
    registry: Arc<StoreOrganizationRegistry>,
    producers: Arc<StaticProducerSet>,
    council: Arc<FixedCouncil>,
    executor: Arc<RecordingExecutor>,
    vote: Arc<VoteEngine>,
    engine: GovernanceEngine,
    addresses: ComponentAddresses,
    creator: Address,
    dao_id: Hash,
    token_ballot: Hash,
    unique_vote: Hash,
}

impl Fixture {
    async fn new() -> Self {
        let host = Host::in_memory(T0);
        let addresses = ComponentAddresses::default();
        let ledger = Arc::new(StoreTokenLedger::new(addresses.token.clone()));
        let registry = Arc::new(StoreOrganizationRegistry::new(addresses.registry.clone()));
        let producers = Arc::new(StaticProducerSet::default());
        let council = Arc::new(FixedCouncil::default());
        let executor = Arc::new(RecordingExecutor::default());
        let vote = Arc::new(VoteEngine::new(
            addresses.clone(),
            ledger.clone(),
            registry.clone(),
            producers.clone(),
            council.clone(),
        ));
        let engine = GovernanceEngine::new(
            addresses.clone(),
            vote.clone(),
            council.clone(),
            ledger.clone(),
            registry.clone(),
            producers.clone(),
        )
        .with_executor(executor.clone());

        let creator = Address::new("creator");
        let mut tx = host.begin(&creator);
        let result = async {
            ledger.create_token(&mut tx, "ELF").await?;
            for holder in ["alice", "bob", "carol"] {
                ledger.mint(&mut tx, "ELF", &Address::new(holder), 10_000).await?;
            }
            let dao = registry.register_dao(&mut tx, "dao", Some("ELF".into()), false).await?;
            registry.add_member(&mut tx, &dao.dao_id, &Address::new("alice")).await?;
            Ok::<_, CoreError>(dao)
        }
        .await;
        let dao_id = host.finish(tx, result).await.unwrap().dao_id;

        let mut tx = host.begin(&creator);
        let result = async {
            let token_ballot = vote
                .create_vote_scheme(
                    &mut tx,
                    VoteSchemeConfig {
                        mechanism: VoteMechanism::TokenBallot,
                        requires_token_lock: true,
                        strategy: VoteStrategy::Unlimited,
                    },
                )
                .await?;
            let unique_vote = vote
                .create_vote_scheme(
                    &mut tx,
                    VoteSchemeConfig {
                        mechanism: VoteMechanism::UniqueVote,
                        requires_token_lock: false,
                        strategy: VoteStrategy::Unlimited,
                    },
                )
                .await?;
            Ok::<_, daogov_vote::VoteError>((token_ballot.id, unique_vote.id))
        }
        .await;
        let (token_ballot, unique_vote) = host.finish(tx, result).await.unwrap();

        let fx = Self {
            host,
            ledger,
            registry,
            producers,
            council,
            executor,
            vote,
            engine,
            addresses,
            creator,
            dao_id,
            token_ballot,
            unique_vote,
        };
        fx.add_schemes(&fx.dao_id).await;
        fx
    }

    async fn add_schemes(&self, dao_id: &Hash) {
        let mut tx = self.host.begin(&self.creator);
        tx.enter(&self.addresses.registry);
        let result = async {
            self.engine
                .add_governance_scheme(&mut tx, dao_id, GovernanceMechanism::HighCouncil, threshold(5000), None)
                .await?;
            self.engine
                .add_governance_scheme(&mut tx, dao_id, GovernanceMechanism::Referendum, threshold(100), None)
                .await?;
            self.engine
                .add_governance_scheme(&mut tx, dao_id, GovernanceMechanism::Organization, threshold(5000), None)
                .await
        }
        .await;
        tx.leave();
        self.host.finish(tx, result).await.unwrap();
    }

    fn scheme(&self, mechanism: GovernanceMechanism) -> Address {
        self.engine.scheme_address(&self.dao_id, mechanism)
    }

    fn basic(&self, dao_id: &Hash, mechanism: GovernanceMechanism) -> ProposalBasicInfo {
        ProposalBasicInfo {
            dao_id: *dao_id,
            title: "proposal".to_string(),
            description: "details".to_string(),
            forum_url: "https://forum.example/1".to_string(),
            scheme_address: self.engine.scheme_address(dao_id, mechanism),
            vote_scheme_id: match mechanism {
                GovernanceMechanism::Organization => self.unique_vote,
                _ => self.token_ballot,
            },
            active_time_period: None,
        }
    }

    async fn propose_in(
        &self,
        who: &str,
        dao_id: &Hash,
        mechanism: GovernanceMechanism,
        proposal_type: ProposalType,
        action: Option<ProposalAction>,
    ) -> GovernanceResult<Hash> {
        let input = CreateProposalInput {
            basic: self.basic(dao_id, mechanism),
            proposal_type,
            action,
        };
        let mut tx = self.host.begin(&Address::new(who));
        let result = self.engine.create_proposal(&mut tx, input).await;
        self.host.finish(tx, result).await
    }

    async fn propose(&self, mechanism: GovernanceMechanism, action: ProposalAction) -> Hash {
        self.propose_in("alice", &self.dao_id, mechanism, ProposalType::Governance, Some(action))
            .await
            .unwrap()
    }

    async fn veto(&self, who: &str, target: Hash) -> GovernanceResult<Hash> {
        let input = CreateVetoProposalInput {
            basic: self.basic(&self.dao_id, GovernanceMechanism::Referendum),
            vetoed_proposal_id: target,
        };
        let mut tx = self.host.begin(&Address::new(who));
        let result = self.engine.create_veto_proposal(&mut tx, input).await;
        self.host.finish(tx, result).await
    }

    async fn vote(&self, voter: &str, id: Hash, option: VoteOption, amount: u64) -> VoteResult<Hash> {
        let mut tx = self.host.begin(&Address::new(voter));
        let result = self.ledger.approve(&mut tx, self.vote.address(), "ELF", amount).await;
        self.host.finish(tx, result).await?;

        let input = VoteInput {
            voting_item_id: id,
            option,
            amount,
            memo: String::new(),
        };
        let mut tx = self.host.begin(&Address::new(voter));
        let result = self.vote.vote(&mut tx, input).await;
        self.host.finish(tx, result).await
    }

    async fn execute(&self, id: Hash) -> GovernanceResult<()> {
        let mut tx = self.host.begin(&Address::new("anyone"));
        let result = self.engine.execute_proposal(&mut tx, &id).await;
        self.host.finish(tx, result).await
    }

    async fn status(&self, id: Hash) -> ProposalStatus {
        self.engine.get_proposal_status(&self.host.view(), &id).await.unwrap()
    }

    async fn scheme_info(&self, mechanism: GovernanceMechanism) -> GovernanceScheme {
        self.engine
            .get_governance_scheme(&self.host.view(), &self.scheme(mechanism))
            .await
            .unwrap()
            .unwrap()
    }

    fn call(&self, call: GovernanceCall) -> ProposalAction {
        call.into_action(self.engine.address()).unwrap()
    }

    fn transfer(&self) -> ProposalAction {
        ProposalAction {
            target: Address::new("treasury"),
            method: "Transfer".to_string(),
            params: json!({ "to": "carol", "amount": 5 }),
        }
    }
}

#[tokio::test]
async fn test_scheme_management_is_gated() {
    let fx = Fixture::new().await;
    assert_eq!(
        fx.engine.get_dao_scheme_addresses(&fx.host.view(), &fx.dao_id).await.unwrap(),
        vec![
            fx.scheme(GovernanceMechanism::HighCouncil),
            fx.scheme(GovernanceMechanism::Referendum),
            fx.scheme(GovernanceMechanism::Organization),
        ]
    );
    let hc = fx.scheme_info(GovernanceMechanism::HighCouncil).await;
    assert_eq!(hc.governance_token.as_deref(), Some("ELF"));

    let mut tx = fx.host.begin(&fx.creator);
    let result = fx
        .engine
        .remove_governance_scheme(&mut tx, &fx.dao_id, &fx.scheme(GovernanceMechanism::HighCouncil))
        .await;
    assert!(matches!(result, Err(GovernanceError::PermissionDenied(_))));

    tx.enter(&fx.addresses.registry);
    let again = fx
        .engine
        .add_governance_scheme(&mut tx, &fx.dao_id, GovernanceMechanism::Referendum, threshold(1), None)
        .await;
    assert!(matches!(again, Err(GovernanceError::SchemeExists(_))));
    let result = fx
        .engine
        .update_governance_scheme_threshold(
            &mut tx,
            &fx.dao_id,
            &fx.scheme(GovernanceMechanism::Referendum),
            threshold(1),
        )
        .await;
    assert!(matches!(result, Err(GovernanceError::PermissionDenied(_))));

    let short = ProposalTimePeriod {
        execute_time_period: days(1),
        ..ProposalTimePeriod::default()
    };
    assert!(matches!(
        fx.engine.set_proposal_time_period(&mut tx, &fx.dao_id, short).await,
        Err(GovernanceError::Config(_))
    ));
}

#[tokio::test]
async fn test_create_proposal_validation() {
    let fx = Fixture::new().await;
    let mut tx = fx.host.begin(&Address::new("alice"));

    let mut untitled = fx.basic(&fx.dao_id, GovernanceMechanism::Referendum);
    untitled.title = " ".to_string();
    let input = CreateProposalInput {
        basic: untitled,
        proposal_type: ProposalType::Advisory,
        action: None,
    };
    assert!(matches!(
        fx.engine.create_proposal(&mut tx, input).await,
        Err(GovernanceError::InvalidInput(_))
    ));

    let mut wrong_scheme = fx.basic(&fx.dao_id, GovernanceMechanism::Organization);
    wrong_scheme.vote_scheme_id = fx.token_ballot;
    let input = CreateProposalInput {
        basic: wrong_scheme,
        proposal_type: ProposalType::Advisory,
        action: None,
    };
    assert!(matches!(
        fx.engine.create_proposal(&mut tx, input).await,
        Err(GovernanceError::InvalidVoteScheme(_))
    ));

    let mut too_long = fx.basic(&fx.dao_id, GovernanceMechanism::Referendum);
    too_long.active_time_period = Some(days(16));
    let input = CreateProposalInput {
        basic: too_long,
        proposal_type: ProposalType::Advisory,
        action: None,
    };
    assert!(matches!(
        fx.engine.create_proposal(&mut tx, input).await,
        Err(GovernanceError::Config(_))
    ));

    let input = CreateProposalInput {
        basic: fx.basic(&fx.dao_id, GovernanceMechanism::Referendum),
        proposal_type: ProposalType::Veto,
        action: None,
    };
    assert!(matches!(
        fx.engine.create_proposal(&mut tx, input).await,
        Err(GovernanceError::InvalidInput(_))
    ));

    assert!(matches!(
        fx.propose_in("bob", &fx.dao_id, GovernanceMechanism::Organization, ProposalType::Advisory, None)
            .await,
        Err(GovernanceError::NotEligible(_))
    ));
    fx.propose_in("alice", &fx.dao_id, GovernanceMechanism::Organization, ProposalType::Advisory, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_proposal_threshold_gates_token_proposers() {
    let fx = Fixture::new().await;
    let gated = GovernanceSchemeThreshold {
        proposal_threshold: 5_000,
        ..threshold(100)
    };
    let id = fx
        .propose(
            GovernanceMechanism::Referendum,
            fx.call(GovernanceCall::UpdateGovernanceSchemeThreshold {
                dao_id: fx.dao_id,
                scheme_address: fx.scheme(GovernanceMechanism::Referendum),
                threshold: gated,
            }),
        )
        .await;
    fx.vote("bob", id, VoteOption::Approve, 200).await.unwrap();
    fx.host.advance(days(7) + 1);
    fx.execute(id).await.unwrap();
    assert_eq!(fx.scheme_info(GovernanceMechanism::Referendum).await.threshold, gated);

    fx.propose_in("alice", &fx.dao_id, GovernanceMechanism::Referendum, ProposalType::Advisory, None)
        .await
        .unwrap();
    let mut tx = fx.host.begin(&Address::new("poor"));
    let input = CreateProposalInput {
        basic: fx.basic(&fx.dao_id, GovernanceMechanism::Referendum),
        proposal_type: ProposalType::Advisory,
        action: None,
    };
    assert!(matches!(
        fx.engine.create_proposal(&mut tx, input).await,
        Err(GovernanceError::NotEligible(_))
    ));
}

#[tokio::test]
async fn test_high_council_threshold_decides_execution() {
    let fx = Fixture::new().await;
    *fx.council.0.write().await = vec![Address::new("alice"), Address::new("bob")];

    let passing = fx.propose(GovernanceMechanism::HighCouncil, fx.transfer()).await;
    let failing = fx.propose(GovernanceMechanism::HighCouncil, fx.transfer()).await;
    let proposal = fx
        .engine
        .get_proposal(&fx.host.view(), &passing)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(proposal.time.execute_start, Some(T0 + days(12)));

    assert!(matches!(
        fx.vote("carol", passing, VoteOption::Approve, 10).await,
        Err(daogov_vote::VoteError::NotEligible(_))
    ));
    fx.vote("alice", passing, VoteOption::Approve, 60).await.unwrap();
    fx.vote("bob", passing, VoteOption::Reject, 40).await.unwrap();
    fx.vote("alice", failing, VoteOption::Approve, 40).await.unwrap();
    fx.vote("bob", failing, VoteOption::Reject, 60).await.unwrap();
    assert_eq!(fx.status(passing).await, ProposalStatus::Active);

    fx.host.advance(days(7) + 1);
    assert_eq!(fx.status(passing).await, ProposalStatus::PendingExecution);
    assert_eq!(fx.status(failing).await, ProposalStatus::Defeated);
    assert!(matches!(
        fx.execute(passing).await,
        Err(GovernanceError::NotExecutable(_, _))
    ));

    fx.host.advance(days(5));
    assert_eq!(fx.status(passing).await, ProposalStatus::Executable);
    fx.execute(passing).await.unwrap();
    assert!(matches!(
        fx.execute(failing).await,
        Err(GovernanceError::ThresholdNotMet(_))
    ));

    let calls = fx.executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, fx.dao_id);
    assert_eq!(calls[0].1, fx.transfer());
    assert_eq!(fx.status(passing).await, ProposalStatus::Executed);
    assert!(matches!(
        fx.execute(passing).await,
        Err(GovernanceError::AlreadyExecuted(_))
    ));
    assert_eq!(fx.host.events_of::<ProposalExecuted>().await.len(), 1);
}

#[tokio::test]
async fn test_failed_action_leaves_proposal_executable() {
    let fx = Fixture::new().await;
    let id = fx.propose(GovernanceMechanism::Referendum, fx.transfer()).await;
    fx.vote("alice", id, VoteOption::Approve, 100).await.unwrap();
    fx.host.advance(days(7) + 1);

    fx.executor.fail.store(true, Ordering::SeqCst);
    assert!(matches!(
        fx.execute(id).await,
        Err(GovernanceError::Core(CoreError::ActionFailed(_)))
    ));
    assert_eq!(fx.status(id).await, ProposalStatus::Executable);

    fx.executor.fail.store(false, Ordering::SeqCst);
    fx.execute(id).await.unwrap();
    assert_eq!(fx.executor.calls().len(), 1);

    let late = fx.propose(GovernanceMechanism::Referendum, fx.transfer()).await;
    fx.vote("alice", late, VoteOption::Approve, 100).await.unwrap();
    fx.host.advance(days(10) + 1);
    assert_eq!(fx.status(late).await, ProposalStatus::Expired);
    assert!(matches!(fx.execute(late).await, Err(GovernanceError::NotExecutable(_, _))));
}

#[tokio::test]
async fn test_veto_overturns_pending_council_proposal() {
    let fx = Fixture::new().await;
    *fx.council.0.write().await = vec![Address::new("alice")];
    let target = fx.propose(GovernanceMechanism::HighCouncil, fx.transfer()).await;
    fx.vote("alice", target, VoteOption::Approve, 10).await.unwrap();

    assert!(matches!(
        fx.veto("carol", target).await,
        Err(GovernanceError::NotVetoable {
            status: ProposalStatus::Active,
            ..
        })
    ));

    fx.host.advance(days(7) + 1);
    let veto = fx.veto("carol", target).await.unwrap();
    let info = fx.engine.get_proposal(&fx.host.view(), &veto).await.unwrap().unwrap();
    assert_eq!(info.proposal_type, ProposalType::Veto);
    assert_eq!(info.time.active_end - info.time.active_start, days(3));

    fx.vote("carol", veto, VoteOption::Approve, 500).await.unwrap();
    fx.host.advance(days(3) + 1);
    fx.execute(veto).await.unwrap();
    assert_eq!(fx.status(target).await, ProposalStatus::Vetoed);

    let vetoed: ProposalVetoed = fx.host.events_of::<ProposalVetoed>().await[0].decode().unwrap();
    assert_eq!(vetoed.proposal_id, target);

    fx.host.advance(days(2));
    assert!(matches!(fx.execute(target).await, Err(GovernanceError::Vetoed(_))));
    assert!(fx.executor.calls().is_empty());
}

#[tokio::test]
async fn test_council_falls_back_to_block_producers() {
    let fx = Fixture::new().await;
    let mut tx = fx.host.begin(&fx.creator);
    let result = fx.registry.register_dao(&mut tx, "network", Some("ELF".into()), true).await;
    let network = fx.host.finish(tx, result).await.unwrap().dao_id;
    fx.add_schemes(&network).await;
    fx.producers.set([Address::new("bob")]).await;

    let id = fx
        .propose_in(
            "alice",
            &network,
            GovernanceMechanism::HighCouncil,
            ProposalType::Governance,
            Some(fx.transfer()),
        )
        .await
        .unwrap();
    fx.vote("bob", id, VoteOption::Approve, 10).await.unwrap();
    fx.host.advance(days(7) + 1);
    assert_eq!(fx.status(id).await, ProposalStatus::PendingExecution);

    fx.producers.set(Vec::new()).await;
    assert_eq!(fx.status(id).await, ProposalStatus::Defeated);
}

#[tokio::test]
async fn test_advisory_proposal_is_never_executed() {
    let fx = Fixture::new().await;
    let id = fx
        .propose_in("alice", &fx.dao_id, GovernanceMechanism::Organization, ProposalType::Advisory, None)
        .await
        .unwrap();
    assert!(matches!(
        fx.vote("alice", id, VoteOption::Approve, 2).await,
        Err(daogov_vote::VoteError::InvalidAmount(_))
    ));
    fx.vote("alice", id, VoteOption::Approve, 1).await.unwrap();

    fx.host.advance(days(7) + 1);
    assert_eq!(fx.status(id).await, ProposalStatus::Approved);
    assert!(matches!(fx.execute(id).await, Err(GovernanceError::NotExecutable(_, _))));
}

#[tokio::test]
async fn test_governance_token_and_time_period_amendments() {
    let fx = Fixture::new().await;
    let mut tx = fx.host.begin(&fx.creator);
    let result = fx.ledger.create_token(&mut tx, "GOV").await;
    fx.host.finish(tx, result).await.unwrap();

    let token = fx
        .propose(
            GovernanceMechanism::Referendum,
            fx.call(GovernanceCall::SetGovernanceToken {
                dao_id: fx.dao_id,
                governance_token: "GOV".to_string(),
            }),
        )
        .await;
    let longer = ProposalTimePeriod {
        active_time_period: days(15),
        ..ProposalTimePeriod::default()
    };
    let periods = fx
        .propose(
            GovernanceMechanism::Referendum,
            fx.call(GovernanceCall::SetProposalTimePeriod {
                dao_id: fx.dao_id,
                periods: longer,
            }),
        )
        .await;
    fx.vote("alice", token, VoteOption::Approve, 100).await.unwrap();
    fx.vote("alice", periods, VoteOption::Approve, 100).await.unwrap();

    fx.host.advance(days(7) + 1);
    fx.execute(token).await.unwrap();
    fx.execute(periods).await.unwrap();

    let view = fx.host.view();
    assert_eq!(
        fx.scheme_info(GovernanceMechanism::HighCouncil).await.governance_token.as_deref(),
        Some("GOV")
    );
    assert_eq!(
        fx.scheme_info(GovernanceMechanism::Referendum).await.governance_token.as_deref(),
        Some("GOV")
    );
    assert_eq!(
        fx.scheme_info(GovernanceMechanism::Organization).await.governance_token.as_deref(),
        Some("ELF")
    );
    assert_eq!(
        fx.engine.get_proposal_time_period(&view, &fx.dao_id).await.unwrap(),
        longer
    );
    let token_set: GovernanceTokenSet = fx.host.events_of::<GovernanceTokenSet>().await[0].decode().unwrap();
    assert_eq!(token_set.scheme_addresses.len(), 2);
}

#[tokio::test]
async fn test_action_cannot_manage_another_dao() {
    let fx = Fixture::new().await;
    let id = fx
        .propose(
            GovernanceMechanism::Referendum,
            fx.call(GovernanceCall::RemoveGovernanceScheme {
                dao_id: Hash::from_str_data("other"),
                scheme_address: fx.scheme(GovernanceMechanism::Referendum),
            }),
        )
        .await;
    fx.vote("alice", id, VoteOption::Approve, 100).await.unwrap();
    fx.host.advance(days(7) + 1);

    assert!(matches!(
        fx.execute(id).await,
        Err(GovernanceError::PermissionDenied(_))
    ));
    assert_eq!(fx.status(id).await, ProposalStatus::Executable);
}

#[tokio::test]
async fn test_removed_scheme_defeats_its_closed_proposals() {
    let fx = Fixture::new().await;
    let orphan = fx.propose(GovernanceMechanism::Organization, fx.transfer()).await;
    fx.vote("alice", orphan, VoteOption::Approve, 1).await.unwrap();
    let removal = fx
        .propose(
            GovernanceMechanism::Referendum,
            fx.call(GovernanceCall::RemoveGovernanceScheme {
                dao_id: fx.dao_id,
                scheme_address: fx.scheme(GovernanceMechanism::Organization),
            }),
        )
        .await;
    fx.vote("alice", removal, VoteOption::Approve, 100).await.unwrap();

    fx.host.advance(days(7) + 1);
    fx.execute(removal).await.unwrap();

    assert_eq!(fx.status(orphan).await, ProposalStatus::Defeated);
    assert!(matches!(
        fx.execute(orphan).await,
        Err(GovernanceError::ThresholdNotMet(_))
    ));
    assert!(fx.executor.calls().is_empty());
}

#[tokio::test]
async fn test_unreachable_turnout_is_rejected_for_bounded_electorates() {
    let fx = Fixture::new().await;
    let unreachable = GovernanceSchemeThreshold {
        minimal_vote_threshold: 12_000,
        ..threshold(5000)
    };
    let mut tx = fx.host.begin(&fx.creator);
    tx.enter(&fx.addresses.registry);
    let result = fx
        .engine
        .add_governance_scheme(&mut tx, &fx.dao_id, GovernanceMechanism::HighCouncil, unreachable, None)
        .await;
    assert!(matches!(result, Err(GovernanceError::InvalidThreshold(_))));
    tx.leave();

    let id = fx
        .propose(
            GovernanceMechanism::Referendum,
            fx.call(GovernanceCall::UpdateGovernanceSchemeThreshold {
                dao_id: fx.dao_id,
                scheme_address: fx.scheme(GovernanceMechanism::Referendum),
                threshold: unreachable,
            }),
        )
        .await;
    fx.vote("alice", id, VoteOption::Approve, 100).await.unwrap();
    fx.host.advance(days(7) + 1);
    fx.execute(id).await.unwrap();
    assert_eq!(
        fx.scheme_info(GovernanceMechanism::Referendum).await.threshold.minimal_vote_threshold,
        12_000
    );
}
