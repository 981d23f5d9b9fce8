//! Pluggable correlation rules.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use idmesh_connector::mapping::Provision;
use idmesh_core::{AnyTypeKey, Entity, ResourceKey};

use super::delta::SyncDelta;
use super::outcome::PullMatch;
use crate::search::{AttrOp, EntityField, SearchCondition};

/// Builds the search for candidates of a delta.
pub type BuildSearchConditionFn =
    Arc<dyn Fn(&SyncDelta, &Provision) -> SearchCondition + Send + Sync>;

/// Resolves a unique candidate into an outcome.
pub type OnMatchFn = Arc<dyn Fn(&Entity, &SyncDelta, &Provision) -> PullMatch + Send + Sync>;

/// Decides what to do when no candidate was found; `None` means do nothing.
pub type OnNoMatchFn = Arc<dyn Fn(&SyncDelta, &Provision) -> Option<PullMatch> + Send + Sync>;

/// A correlation strategy: three functions held as values.
#[derive(Clone)]
pub struct CorrelationRule {
    pub name: String,
    build_search_condition: BuildSearchConditionFn,
    on_match: OnMatchFn,
    on_no_match: OnNoMatchFn,
}

impl fmt::Debug for CorrelationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CorrelationRule")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl CorrelationRule {
    /// Rule with the default match handlers: a unique candidate matches as
    /// itself and no candidate yields `NoMatch`.
    pub fn new<F>(name: impl Into<String>, build_search_condition: F) -> Self
    where
        F: Fn(&SyncDelta, &Provision) -> SearchCondition + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            build_search_condition: Arc::new(build_search_condition),
            on_match: Arc::new(|entity: &Entity, _: &SyncDelta, _: &Provision| {
                PullMatch::entity(entity.id)
            }),
            on_no_match: Arc::new(|_: &SyncDelta, _: &Provision| Some(PullMatch::NoMatch)),
        }
    }

    #[must_use]
    pub fn with_on_match<F>(mut self, on_match: F) -> Self
    where
        F: Fn(&Entity, &SyncDelta, &Provision) -> PullMatch + Send + Sync + 'static,
    {
        self.on_match = Arc::new(on_match);
        self
    }

    #[must_use]
    pub fn with_on_no_match<F>(mut self, on_no_match: F) -> Self
    where
        F: Fn(&SyncDelta, &Provision) -> Option<PullMatch> + Send + Sync + 'static,
    {
        self.on_no_match = Arc::new(on_no_match);
        self
    }

    /// Match on the values of the given internal attributes.
    ///
    /// Each schema is looked up among the mapping's internal names and the
    /// delta value under the mapped external name must equal the entity's
    /// value (ignoring case when the provision says so). A missing delta
    /// value requires the entity attribute to be empty. Schemas without a
    /// mapping item are ignored; if none is left the rule matches nothing.
    pub fn by_schemas<I, S>(schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let schemas: Vec<String> = schemas.into_iter().map(Into::into).collect();
        let name = format!("by_schemas({})", schemas.join(","));
        Self::new(name, move |delta, provision| {
            schema_condition(&schemas, delta, provision)
        })
    }

    pub fn build_search_condition(&self, delta: &SyncDelta, provision: &Provision) -> SearchCondition {
        (self.build_search_condition)(delta, provision)
    }

    pub fn on_match(&self, entity: &Entity, delta: &SyncDelta, provision: &Provision) -> PullMatch {
        (self.on_match)(entity, delta, provision)
    }

    pub fn on_no_match(&self, delta: &SyncDelta, provision: &Provision) -> Option<PullMatch> {
        (self.on_no_match)(delta, provision)
    }
}

fn schema_condition(schemas: &[String], delta: &SyncDelta, provision: &Provision) -> SearchCondition {
    let Some(mapping) = provision.mapping.as_ref() else {
        return SearchCondition::or(vec![]);
    };

    let conditions: Vec<SearchCondition> = schemas
        .iter()
        .filter_map(|schema| {
            let item = mapping.pull_item_for_internal(schema)?;
            let value = delta.first_value(&item.ext_attr_name);
            Some(value_condition(schema, value, provision.ignore_case_match))
        })
        .collect();

    if conditions.is_empty() {
        SearchCondition::or(vec![])
    } else {
        SearchCondition::and(conditions)
    }
}

/// Equality (or emptiness) condition on an internal attribute name.
///
/// Names of entity fields become field conditions.
pub(crate) fn value_condition(name: &str, value: Option<String>, ignore_case: bool) -> SearchCondition {
    let op = match (&value, ignore_case) {
        (None, _) => AttrOp::IsNull,
        (Some(_), true) => AttrOp::IEq,
        (Some(_), false) => AttrOp::Eq,
    };
    match EntityField::parse(name) {
        Some(field) => SearchCondition::field(field, op, value),
        None => SearchCondition::attr(name, op, value),
    }
}

/// Correlation rules by resource and any type.
#[derive(Debug, Clone, Default)]
pub struct CorrelationRules {
    rules: BTreeMap<(ResourceKey, AnyTypeKey), CorrelationRule>,
}

impl CorrelationRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule, replacing any previous one for the pair.
    pub fn register(
        &mut self,
        resource: impl Into<ResourceKey>,
        any_type: impl Into<AnyTypeKey>,
        rule: CorrelationRule,
    ) {
        self.rules.insert((resource.into(), any_type.into()), rule);
    }

    #[must_use]
    pub fn with(
        mut self,
        resource: impl Into<ResourceKey>,
        any_type: impl Into<AnyTypeKey>,
        rule: CorrelationRule,
    ) -> Self {
        self.register(resource, any_type, rule);
        self
    }

    pub fn get(&self, resource: &ResourceKey, any_type: &AnyTypeKey) -> Option<&CorrelationRule> {
        self.rules.get(&(resource.clone(), any_type.clone()))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
