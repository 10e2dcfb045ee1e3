mod common;

use common::*;
use daogov_config::ProposalTimePeriod;
use daogov_core::utils::days;
use daogov_governance::{
    GovernanceCall, GovernanceError, GovernanceSchemeThreshold, ProposalExecuted, ProposalStatus,
};
use daogov_vote::{GovernanceMechanism, VoteOption};

#[tokio::test]
async fn test_failed_action_rolls_back_every_effect() {
    let h = Harness::new().await;
    let hc = h.d.governance.scheme_address(&h.dao_id, GovernanceMechanism::HighCouncil);
    let impossible = GovernanceSchemeThreshold {
        minimal_approve_threshold: 9_000,
        maximal_rejection_threshold: 5_000,
        ..threshold(5000)
    };
    let action = GovernanceCall::UpdateGovernanceSchemeThreshold {
        dao_id: h.dao_id,
        scheme_address: hc.clone(),
        threshold: impossible,
    }
    .into_action(h.d.governance.address())
    .unwrap();
    let id = h.propose("alice", GovernanceMechanism::Referendum, action).await;
    h.vote("alice", id, VoteOption::Approve, 100).await.unwrap();
    h.d.host.advance(days(7) + 1);

    let events_before = h.d.host.events().await.len();
    assert!(matches!(h.execute(id).await, Err(GovernanceError::InvalidThreshold(_))));
    assert_eq!(h.d.host.events().await.len(), events_before);
    assert!(h.d.host.events_of::<ProposalExecuted>().await.is_empty());
    assert_eq!(h.status(id).await, ProposalStatus::Executable);

    let scheme = h
        .d
        .governance
        .get_governance_scheme(&h.d.host.view(), &hc)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(scheme.threshold, threshold(5000));
}

#[tokio::test]
async fn test_duplicate_scheme_is_rejected() {
    let h = Harness::new().await;
    let registry = h.d.addresses().registry.clone();
    let mut tx = h.d.host.begin(&registry);
    let result = h
        .d
        .governance
        .add_governance_scheme(&mut tx, &h.dao_id, GovernanceMechanism::Referendum, threshold(1), None)
        .await;
    assert!(matches!(
        h.d.host.finish(tx, result).await,
        Err(GovernanceError::SchemeExists(_))
    ));

    let action = GovernanceCall::AddGovernanceScheme {
        dao_id: h.dao_id,
        mechanism: GovernanceMechanism::Organization,
        threshold: threshold(5000),
        governance_token: None,
    }
    .into_action(h.d.governance.address())
    .unwrap();
    let id = h.propose("alice", GovernanceMechanism::Referendum, action).await;
    h.vote("alice", id, VoteOption::Approve, 100).await.unwrap();
    h.d.host.advance(days(7) + 1);
    assert!(matches!(h.execute(id).await, Err(GovernanceError::SchemeExists(_))));
    assert_eq!(
        h.d.governance
            .get_dao_scheme_addresses(&h.d.host.view(), &h.dao_id)
            .await
            .unwrap()
            .len(),
        3
    );
}

#[tokio::test]
async fn test_removed_scheme_no_longer_accepts_proposals() {
    let h = Harness::new().await;
    let org = h.d.governance.scheme_address(&h.dao_id, GovernanceMechanism::Organization);
    let action = GovernanceCall::RemoveGovernanceScheme {
        dao_id: h.dao_id,
        scheme_address: org.clone(),
    }
    .into_action(h.d.governance.address())
    .unwrap();
    let id = h.propose("bob", GovernanceMechanism::Referendum, action).await;
    h.vote("bob", id, VoteOption::Approve, 100).await.unwrap();
    h.d.host.advance(days(7) + 1);
    h.execute(id).await.unwrap();

    assert!(!h
        .d
        .governance
        .get_dao_scheme_addresses(&h.d.host.view(), &h.dao_id)
        .await
        .unwrap()
        .contains(&org));
    assert!(matches!(
        h.propose_with(
            "alice",
            GovernanceMechanism::Organization,
            h.unique_vote,
            daogov_governance::ProposalType::Advisory,
            None
        )
        .await,
        Err(GovernanceError::SchemeNotFound(_))
    ));
}

#[tokio::test]
async fn test_time_period_amendment_applies_to_later_proposals() {
    let h = Harness::new().await;
    let periods = ProposalTimePeriod {
        active_time_period: days(10),
        ..ProposalTimePeriod::default()
    };
    let action = GovernanceCall::SetProposalTimePeriod {
        dao_id: h.dao_id,
        periods,
    }
    .into_action(h.d.governance.address())
    .unwrap();
    let amendment = h.propose("alice", GovernanceMechanism::Referendum, action).await;
    h.vote("alice", amendment, VoteOption::Approve, 100).await.unwrap();
    h.d.host.advance(days(7) + 1);
    h.execute(amendment).await.unwrap();
    assert_eq!(h.status(amendment).await, ProposalStatus::Executed);

    let later = h
        .propose_with(
            "alice",
            GovernanceMechanism::Referendum,
            h.token_ballot,
            daogov_governance::ProposalType::Advisory,
            None,
        )
        .await
        .unwrap();
    let proposal = h
        .d
        .governance
        .get_proposal(&h.d.host.view(), &later)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(proposal.time.active_end - proposal.time.active_start, days(10));
    assert_eq!(proposal.time.execute_start, None);
}

#[tokio::test]
async fn test_direct_scheme_changes_are_refused() {
    let h = Harness::new().await;
    let mut tx = h.d.host.begin(&h.creator);
    let result = h.d.governance.set_governance_token(&mut tx, &h.dao_id, "ELF").await;
    assert!(matches!(
        h.d.host.finish(tx, result).await,
        Err(GovernanceError::PermissionDenied(_))
    ));
}
