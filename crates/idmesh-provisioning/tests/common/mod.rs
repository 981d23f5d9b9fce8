//! Integration test helpers for idmesh-provisioning.
//!
//! In-memory collaborators for the scope, reconciliation and correlation
//! tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};

use async_trait::async_trait;
use idmesh_connector::error::{ConnectorError, ConnectorResult};
use idmesh_connector::mapping::{ExternalResource, Provision};
use idmesh_connector::operation::{AttributeSet, ExternalObject, Uid};
use idmesh_connector::traits::ConnectorGateway;
use idmesh_core::{AnyTypeKey, Entity, EntityId, EntityKind, LinkedAccount, ResourceKey, Schema};
use idmesh_provisioning::reconciliation::{
    AttributeProjector, PreparedAttributes, ProjectionError, ProjectionScope,
    ReconciliationResult, ResourceDirectory,
};
use idmesh_provisioning::scope::{ScopeResult, UniquenessIndex};
use idmesh_provisioning::search::{
    AttrOp, EntityField, EntityPager, EntitySearch, SearchCondition, SearchError, SearchResult,
};

static INIT: Once = Once::new();

/// Initialize logging for tests (once).
pub fn init_test_logging() {
    INIT.call_once(|| {
        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
                .try_init()
                .ok();
        }
    });
}

// =============================================================================
// Resource directory
// =============================================================================

/// Resolves an entity's resource keys against a fixed set of resources.
pub struct TestDirectory {
    resources: BTreeMap<ResourceKey, ExternalResource>,
}

impl TestDirectory {
    pub fn new(resources: Vec<ExternalResource>) -> Self {
        Self {
            resources: resources.into_iter().map(|r| (r.key.clone(), r)).collect(),
        }
    }
}

#[async_trait]
impl ResourceDirectory for TestDirectory {
    async fn resources_of(&self, entity: &Entity) -> ReconciliationResult<Vec<ExternalResource>> {
        Ok(entity
            .resources
            .iter()
            .filter_map(|key| self.resources.get(key).cloned())
            .collect())
    }
}

// =============================================================================
// Attribute projector
// =============================================================================

/// Value of an internal attribute name: entity fields or own plain attributes.
fn internal_values(entity: &Entity, int_attr_name: &str) -> Vec<String> {
    match EntityField::parse(int_attr_name) {
        Some(EntityField::Key) => vec![entity.id.to_string()],
        Some(EntityField::Username) | Some(EntityField::Name) => vec![entity.name.clone()],
        Some(EntityField::Status) => entity.status.iter().cloned().collect(),
        None => entity
            .plain_attr(int_attr_name)
            .map(|a| a.values.clone())
            .unwrap_or_default(),
    }
}

/// Projects mapped attributes one to one, by external name.
///
/// Binary attributes named in `binary` are sent as raw bytes.
#[derive(Default)]
pub struct MappingProjector {
    binary: BTreeSet<String>,
}

impl MappingProjector {
    pub fn with_binary(mut self, ext_attr_name: &str) -> Self {
        self.binary.insert(ext_attr_name.to_string());
        self
    }
}

impl AttributeProjector for MappingProjector {
    fn conn_object_key_value(
        &self,
        entity: &Entity,
        provision: &Provision,
    ) -> Result<Option<String>, ProjectionError> {
        Ok(provision
            .conn_object_key_item()
            .and_then(|item| internal_values(entity, &item.int_attr_name).into_iter().next()))
    }

    fn prepare(
        &self,
        entity: &Entity,
        _scope: &ProjectionScope,
        provision: &Provision,
    ) -> Result<PreparedAttributes, ProjectionError> {
        let mapping = provision
            .mapping
            .as_ref()
            .ok_or_else(|| ProjectionError::new("provision has no mapping"))?;

        let mut attributes = AttributeSet::new();
        for item in mapping.propagation_items() {
            if item.password {
                continue;
            }
            let values = internal_values(entity, &item.int_attr_name);
            if values.is_empty() {
                continue;
            }
            if self.binary.contains(&item.ext_attr_name) {
                let bytes: Vec<u8> = values.concat().into_bytes();
                attributes.set(item.ext_attr_name.clone(), bytes);
            } else {
                attributes.set(item.ext_attr_name.clone(), values);
            }
        }

        Ok(PreparedAttributes {
            key: self.conn_object_key_value(entity, provision)?,
            attributes,
        })
    }
}

// =============================================================================
// Connector gateway
// =============================================================================

/// Gateway holding objects per resource, keyed by uid value.
#[derive(Default)]
pub struct TestGateway {
    objects: HashMap<(String, String), ExternalObject>,
    offline: BTreeSet<String>,
    pub fetch_count: AtomicUsize,
    pub requested: Mutex<Vec<(String, Uid, Vec<String>, bool)>>,
}

impl TestGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, resource: &str, object: ExternalObject) -> Self {
        self.objects.insert(
            (resource.to_string(), object.uid.value().to_string()),
            object,
        );
        self
    }

    /// Every fetch on `resource` times out.
    pub fn with_offline(mut self, resource: &str) -> Self {
        self.offline.insert(resource.to_string());
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectorGateway for TestGateway {
    async fn fetch(
        &self,
        resource: &ExternalResource,
        _object_class: &str,
        key: &Uid,
        attributes_to_get: &[String],
        ignore_case: bool,
    ) -> ConnectorResult<Option<ExternalObject>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push((
                resource.key.to_string(),
                key.clone(),
                attributes_to_get.to_vec(),
                ignore_case,
            ));
        }

        if self.offline.contains(resource.key.as_str()) {
            return Err(ConnectorError::ConnectionTimeout { timeout_secs: 30 });
        }

        let found = self
            .objects
            .iter()
            .find(|((res, uid), _)| {
                res == resource.key.as_str()
                    && if ignore_case {
                        uid.eq_ignore_ascii_case(key.value())
                    } else {
                        uid == key.value()
                    }
            })
            .map(|(_, object)| object.clone());
        Ok(found)
    }
}

// =============================================================================
// Condition evaluation
// =============================================================================

/// Evaluate a condition against a loaded entity.
///
/// Attribute conditions look at the entity's own plain attributes.
pub fn matches(condition: &SearchCondition, entity: &Entity) -> bool {
    match condition {
        SearchCondition::Attr {
            schema,
            op,
            expression,
        } => {
            let values: Vec<&str> = entity
                .plain_attr(schema)
                .map(|a| a.values.iter().map(String::as_str).collect())
                .unwrap_or_default();
            compare(&values, *op, expression.as_deref())
        }
        SearchCondition::Field {
            field,
            op,
            expression,
        } => {
            let value = field_value(*field, entity);
            let values: Vec<&str> = value.as_deref().into_iter().collect();
            compare(&values, *op, expression.as_deref())
        }
        SearchCondition::AnyType { any_type } => &entity.any_type == any_type,
        SearchCondition::And { conditions } => conditions.iter().all(|c| matches(c, entity)),
        SearchCondition::Or { conditions } => conditions.iter().any(|c| matches(c, entity)),
        SearchCondition::Not { condition } => !matches(condition, entity),
    }
}

fn field_value(field: EntityField, entity: &Entity) -> Option<String> {
    match field {
        EntityField::Key => Some(entity.id.to_string()),
        EntityField::Username => (entity.kind == EntityKind::User).then(|| entity.name.clone()),
        EntityField::Name => (entity.kind != EntityKind::User).then(|| entity.name.clone()),
        EntityField::Status => entity.status.clone(),
    }
}

fn compare(values: &[&str], op: AttrOp, expression: Option<&str>) -> bool {
    match op {
        AttrOp::IsNull => values.is_empty(),
        AttrOp::IsNotNull => !values.is_empty(),
        AttrOp::Eq => expression.is_some_and(|e| values.iter().any(|v| *v == e)),
        AttrOp::IEq => expression.is_some_and(|e| {
            let e = e.to_lowercase();
            values.iter().any(|v| v.to_lowercase() == e)
        }),
        AttrOp::Like => expression.is_some_and(|e| values.iter().any(|v| like(v, e))),
        AttrOp::ILike => expression.is_some_and(|e| {
            let e = e.to_lowercase();
            values.iter().any(|v| like(&v.to_lowercase(), &e))
        }),
    }
}

/// `%` matches any run of characters.
fn like(value: &str, pattern: &str) -> bool {
    let parts: Vec<&str> = pattern.split('%').collect();
    let [first, middle @ .., last] = parts.as_slice() else {
        return value == pattern;
    };
    let Some(mut remaining) = value.strip_prefix(*first) else {
        return false;
    };
    for part in middle {
        match remaining.find(part) {
            Some(pos) => remaining = &remaining[pos + part.len()..],
            None => return false,
        }
    }
    remaining.ends_with(*last)
}

// =============================================================================
// Entity store
// =============================================================================

/// Entities and linked accounts held in memory, searched with [`matches`].
#[derive(Default)]
pub struct TestEntityStore {
    entities: Vec<Entity>,
    linked_accounts: Vec<LinkedAccount>,
    any_object_types: Vec<AnyTypeKey>,
    pub fail_search: bool,
    pub search_count: AtomicUsize,
}

impl TestEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        if entity.kind == EntityKind::AnyObject && !self.any_object_types.contains(&entity.any_type)
        {
            self.any_object_types.push(entity.any_type.clone());
        }
        self.entities.push(entity);
        self
    }

    pub fn with_linked_account(mut self, account: LinkedAccount) -> Self {
        self.linked_accounts.push(account);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_search = true;
        self
    }

    fn matching(&self, kind: EntityKind, condition: Option<&SearchCondition>) -> Vec<Entity> {
        self.entities
            .iter()
            .filter(|e| e.kind == kind && condition.map_or(true, |c| matches(c, e)))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EntitySearch for TestEntityStore {
    async fn search(
        &self,
        condition: &SearchCondition,
        kind: EntityKind,
    ) -> SearchResult<Vec<Entity>> {
        self.search_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_search {
            return Err(SearchError::new("store unavailable"));
        }
        Ok(self.matching(kind, Some(condition)))
    }

    async fn find_linked_account(
        &self,
        resource: &ResourceKey,
        conn_object_key_value: &str,
    ) -> SearchResult<Option<LinkedAccount>> {
        Ok(self
            .linked_accounts
            .iter()
            .find(|a| &a.resource == resource && a.conn_object_key_value == conn_object_key_value)
            .cloned())
    }
}

#[async_trait]
impl EntityPager for TestEntityStore {
    async fn count(
        &self,
        kind: EntityKind,
        condition: Option<&SearchCondition>,
    ) -> SearchResult<usize> {
        if self.fail_search {
            return Err(SearchError::new("store unavailable"));
        }
        Ok(self.matching(kind, condition).len())
    }

    async fn page(
        &self,
        kind: EntityKind,
        condition: Option<&SearchCondition>,
        page: usize,
        size: usize,
    ) -> SearchResult<Vec<Entity>> {
        Ok(self
            .matching(kind, condition)
            .into_iter()
            .skip((page - 1) * size)
            .take(size)
            .collect())
    }

    async fn any_object_types(&self) -> SearchResult<Vec<AnyTypeKey>> {
        Ok(self.any_object_types.clone())
    }
}

// =============================================================================
// Uniqueness index
// =============================================================================

/// Index of values already owned by entities, per schema.
#[derive(Default)]
pub struct TestUniquenessIndex {
    owners: HashMap<(String, String), EntityId>,
    pub lookups: AtomicUsize,
}

impl TestUniquenessIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_owner(mut self, schema: &str, value: &str, owner: EntityId) -> Self {
        self.owners
            .insert((schema.to_string(), value.to_string()), owner);
        self
    }
}

#[async_trait]
impl UniquenessIndex for TestUniquenessIndex {
    async fn exists(&self, entity: EntityId, schema: &Schema, value: &str) -> ScopeResult<bool> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .owners
            .get(&(schema.key.to_string(), value.to_string()))
            .is_some_and(|owner| *owner != entity))
    }
}
