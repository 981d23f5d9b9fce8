//! Reconciliation report model and rendering.

use chrono::{DateTime, SecondsFormat, Utc};
use idmesh_core::{AnyTypeKey, Entity, EntityId, EntityKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::discrepancy::Discrepancy;
use super::engine::EntityReconciliation;
use super::error::ReconciliationError;
use super::statistics::RunStatistics;
use crate::search::SearchCondition;

/// Entity property copied into each report entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFeature {
    Key,
    Username,
    GroupName,
    Status,
    CreationDate,
    LastLoginDate,
    ChangePwdDate,
    PasswordHistorySize,
    FailedLoginCount,
}

impl ReportFeature {
    /// Column name of the feature.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Username => "username",
            Self::GroupName => "group_name",
            Self::Status => "status",
            Self::CreationDate => "creation_date",
            Self::LastLoginDate => "last_login_date",
            Self::ChangePwdDate => "change_pwd_date",
            Self::PasswordHistorySize => "password_history_size",
            Self::FailedLoginCount => "failed_login_count",
        }
    }

    /// Value of the feature for `entity`.
    ///
    /// `None` when the feature does not apply to the entity's kind or is
    /// unset.
    pub fn extract(&self, entity: &Entity) -> Option<String> {
        let details = entity.user_details.as_ref();
        match self {
            Self::Key => Some(entity.id.to_string()),
            Self::Username => (entity.kind == EntityKind::User).then(|| entity.name.clone()),
            Self::GroupName => (entity.kind == EntityKind::Group).then(|| entity.name.clone()),
            Self::Status => entity.status.clone(),
            Self::CreationDate => entity.creation_date.map(format_date),
            Self::LastLoginDate => details.and_then(|d| d.last_login_date).map(format_date),
            Self::ChangePwdDate => details.and_then(|d| d.change_pwd_date).map(format_date),
            Self::PasswordHistorySize => details.map(|d| d.password_history_size.to_string()),
            Self::FailedLoginCount => details.map(|d| d.failed_logins.to_string()),
        }
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn default_features() -> Vec<ReportFeature> {
    vec![
        ReportFeature::Key,
        ReportFeature::Username,
        ReportFeature::GroupName,
    ]
}

/// What a reconciliation report covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConf {
    /// Users to include; all users when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_matching_cond: Option<SearchCondition>,
    /// Groups to include; all groups when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_matching_cond: Option<SearchCondition>,
    /// Any objects to include, combined with each any type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_object_matching_cond: Option<SearchCondition>,
    /// Entity properties copied into each entry.
    #[serde(default = "default_features")]
    pub features: Vec<ReportFeature>,
}

impl Default for ReportConf {
    fn default() -> Self {
        Self {
            user_matching_cond: None,
            group_matching_cond: None,
            any_object_matching_cond: None,
            features: default_features(),
        }
    }
}

/// A resource that could not be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFailure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    pub code: String,
    pub message: String,
}

impl From<&ReconciliationError> for ReportFailure {
    fn from(err: &ReconciliationError) -> Self {
        let code = match err {
            ReconciliationError::Connector { source, .. } => source.error_code().to_string(),
            ReconciliationError::Projection { .. } => "PROJECTION_FAILED".to_string(),
            ReconciliationError::Directory { .. } => "DIRECTORY_FAILED".to_string(),
            ReconciliationError::Search(_) => "SEARCH_FAILED".to_string(),
        };
        Self {
            resource: err.resource().map(|r| r.to_string()),
            code,
            message: err.to_string(),
        }
    }
}

/// One entity with at least one discrepancy or failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub entity_id: EntityId,
    pub kind: EntityKind,
    pub any_type: AnyTypeKey,
    pub name: String,
    /// Selected features by column name; unset features are left out.
    #[serde(default)]
    pub features: BTreeMap<String, String>,
    #[serde(default)]
    pub discrepancies: Vec<Discrepancy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<ReportFailure>,
}

impl ReportEntry {
    /// Build an entry from an entity and its reconciliation outcome.
    pub fn new(entity: &Entity, outcome: &EntityReconciliation, features: &[ReportFeature]) -> Self {
        let features = features
            .iter()
            .filter_map(|f| f.extract(entity).map(|v| (f.as_str().to_string(), v)))
            .collect();
        Self {
            entity_id: entity.id,
            kind: entity.kind,
            any_type: entity.any_type.clone(),
            name: entity.name.clone(),
            features,
            discrepancies: outcome.discrepancies.clone(),
            failures: outcome.failures.iter().map(ReportFailure::from).collect(),
        }
    }
}

/// Entries for one kind (and, for any objects, one any type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    pub kind: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_type: Option<AnyTypeKey>,
    /// Entities matched by the section's condition.
    pub total: usize,
    pub entries: Vec<ReportEntry>,
}

impl ReportSection {
    pub fn new(kind: EntityKind, any_type: Option<AnyTypeKey>, total: usize) -> Self {
        Self {
            kind,
            any_type,
            total,
            entries: Vec::new(),
        }
    }
}

/// Count of misalignments for an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMismatchCount {
    pub attribute: String,
    pub count: u32,
}

/// Performance metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Entities processed per second.
    pub entities_per_second: f64,
    /// Total duration in seconds.
    pub total_duration_seconds: u64,
}

impl PerformanceMetrics {
    /// Calculate from statistics.
    #[must_use]
    pub fn from_statistics(stats: &RunStatistics) -> Self {
        let entities_per_second = if stats.duration_seconds > 0 {
            f64::from(stats.entities_processed) / stats.duration_seconds as f64
        } else {
            0.0
        };

        Self {
            entities_per_second,
            total_duration_seconds: stats.duration_seconds,
        }
    }
}

/// Complete reconciliation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Users, then groups, then one section per any object type.
    pub sections: Vec<ReportSection>,
    pub statistics: RunStatistics,
    /// Attributes most often misaligned, most frequent first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_mismatched_attributes: Vec<AttributeMismatchCount>,
    pub performance: PerformanceMetrics,
}

impl ReconciliationReport {
    /// All entries across sections.
    pub fn entries(&self) -> impl Iterator<Item = &ReportEntry> {
        self.sections.iter().flat_map(|s| s.entries.iter())
    }
}

/// Number of attributes listed in `top_mismatched_attributes`.
const TOP_MISMATCHED_LIMIT: usize = 10;

/// Report generator.
pub struct ReportGenerator;

impl ReportGenerator {
    /// Assemble a report from finished sections.
    #[must_use]
    pub fn generate(
        started_at: DateTime<Utc>,
        sections: Vec<ReportSection>,
        statistics: RunStatistics,
    ) -> ReconciliationReport {
        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for entry in sections.iter().flat_map(|s| s.entries.iter()) {
            for attribute in entry.discrepancies.iter().filter_map(Discrepancy::attribute) {
                *counts.entry(attribute).or_insert(0) += 1;
            }
        }
        let mut top_mismatched_attributes: Vec<AttributeMismatchCount> = counts
            .into_iter()
            .map(|(attribute, count)| AttributeMismatchCount {
                attribute: attribute.to_string(),
                count,
            })
            .collect();
        // Stable sort keeps ties in attribute name order.
        top_mismatched_attributes.sort_by(|a, b| b.count.cmp(&a.count));
        top_mismatched_attributes.truncate(TOP_MISMATCHED_LIMIT);

        let performance = PerformanceMetrics::from_statistics(&statistics);

        ReconciliationReport {
            id: Uuid::new_v4(),
            started_at,
            completed_at: Utc::now(),
            sections,
            statistics,
            top_mismatched_attributes,
            performance,
        }
    }

    /// Generate CSV export of discrepancies, one row per discrepancy.
    ///
    /// Multiple values are joined with `|`.
    #[must_use]
    pub fn generate_csv(report: &ReconciliationReport) -> String {
        let mut csv = String::new();

        csv.push_str(
            "kind,any_type,entity_id,name,type,resource,conn_object_key_value,attribute,on_internal,on_external\n",
        );

        for section in &report.sections {
            for entry in &section.entries {
                for d in &entry.discrepancies {
                    let (on_internal, on_external) = match d {
                        Discrepancy::Missing { .. } => (String::new(), String::new()),
                        Discrepancy::Misaligned {
                            on_internal,
                            on_external,
                            ..
                        } => (join(on_internal), join(on_external)),
                    };
                    let entity_id = entry.entity_id.to_string();
                    let fields: [&str; 10] = [
                        entry.kind.as_str(),
                        entry.any_type.as_str(),
                        &entity_id,
                        &entry.name,
                        d.discrepancy_type().as_str(),
                        d.resource().as_str(),
                        d.conn_object_key_value(),
                        d.attribute().unwrap_or(""),
                        &on_internal,
                        &on_external,
                    ];
                    let row = fields
                        .iter()
                        .map(|field| csv_field(field))
                        .collect::<Vec<_>>()
                        .join(",");
                    csv.push_str(&row);
                    csv.push('\n');
                }
            }
        }

        csv
    }
}

fn join<'a>(values: impl IntoIterator<Item = &'a String>) -> String {
    values
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("|")
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
