#![allow(dead_code)]

use daogov::Deployment;
use daogov_config::DaoGovConfig;
use daogov_core::utils::days;
use daogov_core::{Address, CoreError, Hash, ProposalAction, TokenLedger};
use daogov_election::{ElectionResult, HighCouncilConfig};
use daogov_governance::{
    CreateProposalInput, GovernanceError, GovernanceResult, GovernanceSchemeThreshold, ProposalBasicInfo,
    ProposalStatus, ProposalType,
};
use daogov_vote::{
    GovernanceMechanism, VoteError, VoteInput, VoteMechanism, VoteOption, VoteResult, VoteSchemeConfig, VoteStrategy,
};

/// UTC midnight, so day-boundary arithmetic stays readable
pub const T0: i64 = 1_700_006_400;
pub const STAKE: u64 = 1_000;
pub const HOLDERS: [&str; 4] = ["alice", "bob", "carol", "dave"];

pub fn who(name: &str) -> Address {
    Address::new(name)
}

pub fn threshold(minimal_vote_threshold: u64) -> GovernanceSchemeThreshold {
    GovernanceSchemeThreshold {
        minimal_required_threshold: 1,
        minimal_vote_threshold,
        minimal_approve_threshold: 5000,
        maximal_rejection_threshold: 5000,
        maximal_abstention_threshold: 5000,
        proposal_threshold: 0,
    }
}

/// A deployment with one DAO ("coop", governed with ELF) ready for every mechanism
pub struct Harness {
    pub d: Deployment,
    pub creator: Address,
    pub dao_id: Hash,
    pub token_ballot: Hash,
    pub daily_ballot: Hash,
    pub unique_vote: Hash,
}

impl Harness {
    pub async fn new() -> Self {
        let d = Deployment::in_memory(DaoGovConfig::default(), T0);
        let creator = who("creator");

        let mut tx = d.host.begin(&creator);
        let result = async {
            d.ledger.create_token(&mut tx, "ELF").await?;
            for holder in HOLDERS {
                d.ledger.mint(&mut tx, "ELF", &who(holder), 10_000).await?;
            }
            let dao = d.registry.register_dao(&mut tx, "coop", Some("ELF".into()), false).await?;
            d.registry.add_member(&mut tx, &dao.dao_id, &who("alice")).await?;
            d.registry.add_member(&mut tx, &dao.dao_id, &who("bob")).await?;
            Ok::<_, CoreError>(dao.dao_id)
        }
        .await;
        let dao_id = d.host.finish(tx, result).await.unwrap();

        let mut ids = Vec::new();
        for (mechanism, requires_token_lock, strategy) in [
            (VoteMechanism::TokenBallot, true, VoteStrategy::Unlimited),
            (VoteMechanism::TokenBallot, true, VoteStrategy::DailyCount(1)),
            (VoteMechanism::UniqueVote, false, VoteStrategy::Unlimited),
        ] {
            let config = VoteSchemeConfig {
                mechanism,
                requires_token_lock,
                strategy,
            };
            let mut tx = d.host.begin(&creator);
            let result = d.vote.create_vote_scheme(&mut tx, config).await;
            ids.push(d.host.finish(tx, result).await.unwrap().id);
        }

        let registry = d.addresses().registry.clone();
        let mut tx = d.host.begin(&registry);
        let result = async {
            for (mechanism, vote_threshold) in [
                (GovernanceMechanism::HighCouncil, 5000),
                (GovernanceMechanism::Referendum, 100),
                (GovernanceMechanism::Organization, 5000),
            ] {
                d.governance
                    .add_governance_scheme(&mut tx, &dao_id, mechanism, threshold(vote_threshold), None)
                    .await?;
            }
            Ok::<_, GovernanceError>(())
        }
        .await;
        d.host.finish(tx, result).await.unwrap();

        let config = HighCouncilConfig {
            max_members: 2,
            max_candidates: 5,
            stake_threshold: STAKE,
            governance_token: "ELF".to_string(),
            election_period: days(7),
            candidate_vote_scheme_id: ids[0],
        };
        let mut tx = d.host.begin(&registry);
        let result = d.election.register_election_voting_event(&mut tx, &dao_id, config).await;
        d.host.finish(tx, result).await.unwrap();

        Self {
            d,
            creator,
            dao_id,
            token_ballot: ids[0],
            daily_ballot: ids[1],
            unique_vote: ids[2],
        }
    }

    pub async fn approve(&self, owner: &str, spender: &Address, amount: u64) {
        let mut tx = self.d.host.begin(&who(owner));
        let result = self.d.ledger.approve(&mut tx, spender, "ELF", amount).await;
        self.d.host.finish(tx, result).await.unwrap();
    }

    pub async fn balance(&self, owner: &str) -> u64 {
        self.d
            .ledger
            .balance_of(&self.d.host.view(), &who(owner), "ELF")
            .await
            .unwrap()
    }

    pub async fn propose_with(
        &self,
        proposer: &str,
        mechanism: GovernanceMechanism,
        vote_scheme_id: Hash,
        proposal_type: ProposalType,
        action: Option<ProposalAction>,
    ) -> GovernanceResult<Hash> {
        let input = CreateProposalInput {
            basic: ProposalBasicInfo {
                dao_id: self.dao_id,
                title: "scenario".to_string(),
                description: String::new(),
                forum_url: String::new(),
                scheme_address: self.d.governance.scheme_address(&self.dao_id, mechanism),
                vote_scheme_id,
                active_time_period: None,
            },
            proposal_type,
            action,
        };
        let mut tx = self.d.host.begin(&who(proposer));
        let result = self.d.governance.create_proposal(&mut tx, input).await;
        self.d.host.finish(tx, result).await
    }

    /// A Governance proposal under `mechanism` with its usual vote scheme
    pub async fn propose(&self, proposer: &str, mechanism: GovernanceMechanism, action: ProposalAction) -> Hash {
        let vote_scheme = match mechanism {
            GovernanceMechanism::Organization => self.unique_vote,
            _ => self.token_ballot,
        };
        self.propose_with(proposer, mechanism, vote_scheme, ProposalType::Governance, Some(action))
            .await
            .unwrap()
    }

    pub async fn vote(&self, voter: &str, item: Hash, option: VoteOption, amount: u64) -> VoteResult<Hash> {
        self.approve(voter, self.d.vote.address(), amount).await;
        let input = VoteInput {
            voting_item_id: item,
            option,
            amount,
            memo: String::new(),
        };
        let mut tx = self.d.host.begin(&who(voter));
        let result = self.d.vote.vote(&mut tx, input).await;
        self.d.host.finish(tx, result).await
    }

    pub async fn execute(&self, id: Hash) -> GovernanceResult<()> {
        let mut tx = self.d.host.begin(&who("keeper"));
        let result = self.d.governance.execute_proposal(&mut tx, &id).await;
        self.d.host.finish(tx, result).await
    }

    pub async fn status(&self, id: Hash) -> ProposalStatus {
        self.d
            .governance
            .get_proposal_status(&self.d.host.view(), &id)
            .await
            .unwrap()
    }

    pub async fn announce(&self, candidate: &str, admin: &str) -> ElectionResult<Hash> {
        self.approve(candidate, self.d.election.address(), STAKE).await;
        let mut tx = self.d.host.begin(&who(candidate));
        let result = self.d.election.announce(&mut tx, &self.dao_id, &who(admin)).await;
        self.d.host.finish(tx, result).await
    }

    pub async fn quit(&self, admin: &str, candidate: &str) -> ElectionResult<()> {
        let mut tx = self.d.host.begin(&who(admin));
        let result = self.d.election.quit(&mut tx, &self.dao_id, &who(candidate)).await;
        self.d.host.finish(tx, result).await
    }

    /// Back `candidate` in the open term
    pub async fn back(&self, voter: &str, candidate: &str, amount: u64) -> VoteResult<Hash> {
        let term = self
            .d
            .election
            .open_term(&self.d.host.view(), &self.dao_id)
            .await
            .map_err(|e| VoteError::InvalidInput(e.to_string()))?;
        let item = self.d.vote.candidate_item_id(&self.dao_id, term.term, &who(candidate));
        self.vote(voter, item, VoteOption::Approve, amount).await
    }

    pub async fn snapshot(&self, caller: &str, term: u64) -> ElectionResult<()> {
        let mut tx = self.d.host.begin(&who(caller));
        let result = self.d.election.take_snapshot(&mut tx, &self.dao_id, term).await;
        self.d.host.finish(tx, result).await
    }

    pub async fn victories(&self) -> Vec<Address> {
        self.d
            .election
            .get_victories(&self.d.host.view(), &self.dao_id)
            .await
            .unwrap()
    }
}
