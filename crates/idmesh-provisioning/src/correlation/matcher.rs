//! Inbound correlation of external changes to internal entities.

use std::sync::Arc;

use idmesh_connector::mapping::{ExternalResource, Provision};
use idmesh_core::{AnyTypeKey, Entity, EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::delta::SyncDelta;
use super::error::{CorrelationError, CorrelationResult};
use super::outcome::PullMatch;
use super::rule::{value_condition, CorrelationRule, CorrelationRules};
use crate::search::EntitySearch;

/// State a delta's correlation ends in.
///
/// Ambiguous correlations surface as [`CorrelationError::Ambiguous`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationState {
    Matched,
    Unmatched,
}

/// Result of correlating one delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correlation {
    pub state: CorrelationState,
    /// `None` when the rule asked for nothing to be done.
    pub outcome: Option<PullMatch>,
}

impl Correlation {
    fn matched(outcome: PullMatch) -> Self {
        Self {
            state: CorrelationState::Matched,
            outcome: Some(outcome),
        }
    }

    fn unmatched(outcome: Option<PullMatch>) -> Self {
        Self {
            state: CorrelationState::Unmatched,
            outcome,
        }
    }
}

/// Matches external deltas to internal entities.
///
/// A registered rule for (resource, any type) drives the search; otherwise
/// the external key is matched against the mapped internal attribute and
/// against linked accounts.
pub struct InboundMatcher<S: EntitySearch> {
    search: Arc<S>,
    rules: CorrelationRules,
}

impl<S: EntitySearch> InboundMatcher<S> {
    pub fn new(search: Arc<S>) -> Self {
        Self::with_rules(search, CorrelationRules::new())
    }

    pub fn with_rules(search: Arc<S>, rules: CorrelationRules) -> Self {
        Self { search, rules }
    }

    pub fn rules(&self) -> &CorrelationRules {
        &self.rules
    }

    /// Correlate a delta from `resource` for entities of `any_type`.
    #[instrument(skip(self, delta, resource), fields(resource = %resource.key, uid = %delta.uid))]
    pub async fn correlate(
        &self,
        delta: &SyncDelta,
        resource: &ExternalResource,
        any_type: &AnyTypeKey,
        kind: EntityKind,
    ) -> CorrelationResult<Correlation> {
        let provision = resource
            .provision(any_type)
            .ok_or_else(|| CorrelationError::UnknownResource {
                resource: resource.key.clone(),
                any_type: any_type.clone(),
            })?;

        match self.rules.get(&resource.key, any_type) {
            Some(rule) => self.correlate_by_rule(rule, delta, resource, provision, kind).await,
            None => self.correlate_by_key(delta, resource, provision, kind).await,
        }
    }

    async fn correlate_by_rule(
        &self,
        rule: &CorrelationRule,
        delta: &SyncDelta,
        resource: &ExternalResource,
        provision: &Provision,
        kind: EntityKind,
    ) -> CorrelationResult<Correlation> {
        let condition = rule.build_search_condition(delta, provision);
        let mut candidates = self.search.search(&condition, kind).await?;
        debug!(rule = %rule.name, candidates = candidates.len(), "Searched by rule");

        match candidates.len() {
            0 => Ok(Correlation::unmatched(rule.on_no_match(delta, provision))),
            1 => {
                let entity = candidates.remove(0);
                Ok(Correlation::matched(rule.on_match(&entity, delta, provision)))
            }
            _ => Err(ambiguous(resource, delta, ids(&candidates))),
        }
    }

    async fn correlate_by_key(
        &self,
        delta: &SyncDelta,
        resource: &ExternalResource,
        provision: &Provision,
        kind: EntityKind,
    ) -> CorrelationResult<Correlation> {
        let key_item = provision
            .conn_object_key_item()
            .ok_or_else(|| CorrelationError::NoKeyMapping {
                resource: resource.key.clone(),
                any_type: provision.any_type.clone(),
            })?;

        let key_value = delta
            .first_value(&key_item.ext_attr_name)
            .unwrap_or_else(|| delta.uid.value().to_string());

        let condition = value_condition(
            &key_item.int_attr_name,
            Some(key_value.clone()),
            provision.ignore_case_match,
        );
        let entities = self.search.search(&condition, kind).await?;
        let account = self
            .search
            .find_linked_account(&resource.key, &key_value)
            .await?;
        debug!(
            key = %key_value,
            candidates = entities.len(),
            linked_account = account.is_some(),
            "Searched by key"
        );

        match (entities.as_slice(), account) {
            ([], None) => Ok(Correlation::unmatched(Some(PullMatch::NoMatch))),
            ([entity], None) => Ok(Correlation::matched(PullMatch::entity(entity.id))),
            ([], Some(account)) => Ok(Correlation::matched(PullMatch::linked_account(account))),
            ([entity], Some(account)) if account.owner == entity.id => {
                Ok(Correlation::matched(PullMatch::linked_account(account)))
            }
            (entities, account) => {
                let mut candidates = ids(entities);
                candidates.extend(account.map(|a| a.owner));
                Err(ambiguous(resource, delta, candidates))
            }
        }
    }
}

fn ids(entities: &[Entity]) -> Vec<EntityId> {
    entities.iter().map(|e| e.id).collect()
}

fn ambiguous(resource: &ExternalResource, delta: &SyncDelta, candidates: Vec<EntityId>) -> CorrelationError {
    warn!(candidates = candidates.len(), "Ambiguous correlation");
    CorrelationError::Ambiguous {
        resource: resource.key.clone(),
        uid: delta.uid.value().to_string(),
        candidates,
    }
}
