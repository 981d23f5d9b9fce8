//! Correlation Tests
//!
//! Tests for matching external changes to internal entities:
//! - Rule driven search with zero, one and several candidates
//! - Key matching against entities and linked accounts
//! - Errors for unusable provisions and failed searches

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{init_test_logging, TestEntityStore};
use idmesh_connector::mapping::{ExternalResource, Mapping, MappingItem, Provision};
use idmesh_connector::operation::{ExternalObject, Uid};
use idmesh_core::{Entity, EntityKind, LinkedAccount, PlainAttr};
use idmesh_provisioning::correlation::{
    ChangeType, CorrelationError, CorrelationRule, CorrelationRules, CorrelationState,
    InboundMatcher, MatchType, PullMatch, SyncDelta,
};
use idmesh_provisioning::search::{AttrOp, SearchCondition};

// =============================================================================
// Fixtures
// =============================================================================

fn account_mapping() -> Mapping {
    Mapping::new(vec![
        MappingItem::key("mail", "email"),
        MappingItem::new("username", "login"),
        MappingItem::new("fullname", "cn"),
    ])
}

fn r1() -> ExternalResource {
    ExternalResource::new("R1")
        .with_provision(Provision::new("USER", "__ACCOUNT__").with_mapping(account_mapping()))
}

fn alice() -> Entity {
    Entity::user("alice")
        .with_attr(PlainAttr::single("mail", "a@x.com"))
        .with_attr(PlainAttr::single("fullname", "Alice Doe"))
}

fn bob() -> Entity {
    Entity::user("bob")
        .with_attr(PlainAttr::single("mail", "b@x.com"))
        .with_attr(PlainAttr::single("fullname", "Bob Doe"))
}

fn delta(uid: &str) -> ExternalObject {
    ExternalObject::new("__ACCOUNT__", Uid::from_value(uid))
}

fn update(object: ExternalObject) -> SyncDelta {
    SyncDelta::new(ChangeType::Update, object)
}

fn build_matcher(
    store: TestEntityStore,
    rules: CorrelationRules,
) -> (InboundMatcher<TestEntityStore>, Arc<TestEntityStore>) {
    let store = Arc::new(store);
    (InboundMatcher::with_rules(Arc::clone(&store), rules), store)
}

fn by_username() -> CorrelationRules {
    CorrelationRules::new().with("R1", "USER", CorrelationRule::by_schemas(["username"]))
}

// =============================================================================
// Rule driven correlation
// =============================================================================

#[tokio::test]
async fn test_rule_single_candidate_matches() {
    init_test_logging();
    let alice = alice();
    let (matcher, _) = build_matcher(
        TestEntityStore::new().with_entity(alice.clone()).with_entity(bob()),
        by_username(),
    );

    let correlation = matcher
        .correlate(
            &update(delta("u-1").with("login", "alice")),
            &r1(),
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap();

    assert_eq!(correlation.state, CorrelationState::Matched);
    assert_eq!(correlation.outcome, Some(PullMatch::entity(alice.id)));
}

#[tokio::test]
async fn test_rule_without_candidates_is_unmatched() {
    let (matcher, _) = build_matcher(TestEntityStore::new().with_entity(alice()), by_username());

    let correlation = matcher
        .correlate(
            &update(delta("u-9").with("login", "zoe")),
            &r1(),
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap();

    assert_eq!(correlation.state, CorrelationState::Unmatched);
    assert_eq!(correlation.outcome, Some(PullMatch::NoMatch));
}

#[tokio::test]
async fn test_rule_may_decline_to_act_on_no_match() {
    let rules = CorrelationRules::new().with(
        "R1",
        "USER",
        CorrelationRule::by_schemas(["username"]).with_on_no_match(|_, _| None),
    );
    let (matcher, _) = build_matcher(TestEntityStore::new(), rules);

    let correlation = matcher
        .correlate(
            &update(delta("u-9").with("login", "zoe")),
            &r1(),
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap();

    assert_eq!(correlation.state, CorrelationState::Unmatched);
    assert!(correlation.outcome.is_none());
}

#[tokio::test]
async fn test_rule_several_candidates_is_ambiguous() {
    let twin = Entity::user("alice2").with_attr(PlainAttr::single("fullname", "Alice Doe"));
    let rules = CorrelationRules::new().with("R1", "USER", CorrelationRule::by_schemas(["fullname"]));
    let (matcher, _) = build_matcher(
        TestEntityStore::new().with_entity(alice()).with_entity(twin),
        rules,
    );

    let err = matcher
        .correlate(
            &update(delta("u-1").with("cn", "Alice Doe")),
            &r1(),
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap_err();

    assert!(err.is_ambiguous());
    match err {
        CorrelationError::Ambiguous {
            resource,
            uid,
            candidates,
        } => {
            assert_eq!(resource.as_str(), "R1");
            assert_eq!(uid, "u-1");
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("Expected Ambiguous, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rule_custom_on_match() {
    let alice = alice();
    let rules = CorrelationRules::new().with(
        "R1",
        "USER",
        CorrelationRule::by_schemas(["username"]).with_on_match(|entity, delta, _| {
            PullMatch::linked_account(LinkedAccount::new(entity.id, "R1", delta.uid.value()))
        }),
    );
    let (matcher, _) = build_matcher(TestEntityStore::new().with_entity(alice.clone()), rules);

    let correlation = matcher
        .correlate(
            &update(delta("alice-admin").with("login", "alice")),
            &r1(),
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap();

    let outcome = correlation.outcome.unwrap();
    assert_eq!(outcome.match_type(), MatchType::LinkedAccount);
    assert_eq!(outcome.entity_id(), Some(alice.id));
}

#[tokio::test]
async fn test_rule_without_mapped_schemas_matches_nothing() {
    let rules = CorrelationRules::new().with("R1", "USER", CorrelationRule::by_schemas(["nickname"]));
    let (matcher, store) = build_matcher(TestEntityStore::new().with_entity(alice()), rules);

    let correlation = matcher
        .correlate(
            &update(delta("u-1").with("login", "alice")),
            &r1(),
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap();

    assert_eq!(correlation.state, CorrelationState::Unmatched);
    assert_eq!(store.search_count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_custom_condition_rule() {
    let bob = bob();
    let rules = CorrelationRules::new().with(
        "R1",
        "USER",
        CorrelationRule::new("by_mail_prefix", |delta, _| {
            let login = delta.first_value("login").unwrap_or_default();
            SearchCondition::attr("mail", AttrOp::Like, Some(format!("{login}@%")))
        }),
    );
    let (matcher, _) = build_matcher(
        TestEntityStore::new().with_entity(alice()).with_entity(bob.clone()),
        rules,
    );

    let correlation = matcher
        .correlate(
            &update(delta("u-2").with("login", "b")),
            &r1(),
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap();

    assert_eq!(correlation.outcome, Some(PullMatch::entity(bob.id)));
}

// =============================================================================
// Key correlation
// =============================================================================

#[tokio::test]
async fn test_key_matches_entity() {
    let bob = bob();
    let (matcher, _) = build_matcher(
        TestEntityStore::new().with_entity(alice()).with_entity(bob.clone()),
        CorrelationRules::new(),
    );

    let correlation = matcher
        .correlate(
            &update(delta("u-2").with("email", "b@x.com")),
            &r1(),
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap();

    assert_eq!(correlation.state, CorrelationState::Matched);
    assert_eq!(correlation.outcome, Some(PullMatch::entity(bob.id)));
}

#[tokio::test]
async fn test_key_falls_back_to_uid() {
    let bob = bob();
    let (matcher, _) = build_matcher(TestEntityStore::new().with_entity(bob.clone()), CorrelationRules::new());

    let correlation = matcher
        .correlate(
            &SyncDelta::new(ChangeType::Delete, delta("b@x.com")),
            &r1(),
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap();

    assert_eq!(
        correlation.outcome.and_then(|o| o.entity_id()),
        Some(bob.id)
    );
}

#[tokio::test]
async fn test_key_matches_linked_account() {
    let alice = alice();
    let account = LinkedAccount::new(alice.id, "R1", "alice-admin@x.com");
    let (matcher, _) = build_matcher(
        TestEntityStore::new()
            .with_entity(alice.clone())
            .with_linked_account(account.clone()),
        CorrelationRules::new(),
    );

    let correlation = matcher
        .correlate(
            &update(delta("u-1").with("email", "alice-admin@x.com")),
            &r1(),
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap();

    assert_eq!(correlation.state, CorrelationState::Matched);
    assert_eq!(correlation.outcome, Some(PullMatch::linked_account(account)));
}

#[tokio::test]
async fn test_key_entity_owning_the_account_is_linked_account() {
    let alice = alice();
    let account = LinkedAccount::new(alice.id, "R1", "a@x.com");
    let (matcher, _) = build_matcher(
        TestEntityStore::new()
            .with_entity(alice.clone())
            .with_linked_account(account.clone()),
        CorrelationRules::new(),
    );

    let correlation = matcher
        .correlate(
            &update(delta("u-1").with("email", "a@x.com")),
            &r1(),
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap();

    assert_eq!(
        correlation.outcome.map(|o| o.match_type()),
        Some(MatchType::LinkedAccount)
    );
}

#[tokio::test]
async fn test_key_entity_and_foreign_account_is_ambiguous() {
    let alice = alice();
    let bob = bob();
    let account = LinkedAccount::new(bob.id, "R1", "a@x.com");
    let (matcher, _) = build_matcher(
        TestEntityStore::new()
            .with_entity(alice.clone())
            .with_entity(bob.clone())
            .with_linked_account(account),
        CorrelationRules::new(),
    );

    let err = matcher
        .correlate(
            &update(delta("u-1").with("email", "a@x.com")),
            &r1(),
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap_err();

    match err {
        CorrelationError::Ambiguous { candidates, .. } => {
            assert_eq!(candidates, vec![alice.id, bob.id]);
        }
        other => panic!("Expected Ambiguous, got {other:?}"),
    }
}

#[tokio::test]
async fn test_key_without_match_is_unmatched() {
    let (matcher, _) = build_matcher(TestEntityStore::new().with_entity(alice()), CorrelationRules::new());

    let correlation = matcher
        .correlate(
            &update(delta("u-3").with("email", "c@x.com")),
            &r1(),
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap();

    assert_eq!(correlation.state, CorrelationState::Unmatched);
    assert_eq!(correlation.outcome, Some(PullMatch::NoMatch));
}

#[tokio::test]
async fn test_key_match_honours_case_policy() {
    let bob = bob();
    let resource = ExternalResource::new("R1").with_provision(
        Provision::new("USER", "__ACCOUNT__")
            .with_mapping(account_mapping())
            .ignoring_case(),
    );
    let (matcher, _) = build_matcher(TestEntityStore::new().with_entity(bob.clone()), CorrelationRules::new());

    let correlation = matcher
        .correlate(
            &update(delta("u-2").with("email", "B@X.COM")),
            &resource,
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap();
    assert_eq!(correlation.outcome, Some(PullMatch::entity(bob.id)));

    let (strict, _) = build_matcher(TestEntityStore::new().with_entity(bob), CorrelationRules::new());
    let correlation = strict
        .correlate(
            &update(delta("u-2").with("email", "B@X.COM")),
            &r1(),
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap();
    assert_eq!(correlation.state, CorrelationState::Unmatched);
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_unknown_any_type_is_rejected() {
    let (matcher, store) = build_matcher(TestEntityStore::new(), CorrelationRules::new());

    let err = matcher
        .correlate(
            &update(delta("hp-01")),
            &r1(),
            &"PRINTER".into(),
            EntityKind::AnyObject,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CorrelationError::UnknownResource { .. }));
    assert_eq!(store.search_count.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_provision_without_key_cannot_correlate_by_key() {
    let resource = ExternalResource::new("R1").with_provision(
        Provision::new("USER", "__ACCOUNT__")
            .with_mapping(Mapping::new(vec![MappingItem::new("mail", "email")])),
    );
    let (matcher, _) = build_matcher(TestEntityStore::new(), CorrelationRules::new());

    let err = matcher
        .correlate(
            &update(delta("u-1").with("email", "a@x.com")),
            &resource,
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Resource R1 maps no key for USER");
}

#[tokio::test]
async fn test_search_failure_propagates() {
    let (matcher, _) = build_matcher(TestEntityStore::new().failing(), by_username());

    let err = matcher
        .correlate(
            &update(delta("u-1").with("login", "alice")),
            &r1(),
            &"USER".into(),
            EntityKind::User,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CorrelationError::Search(_)));
}
