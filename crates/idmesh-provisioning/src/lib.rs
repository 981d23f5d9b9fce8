//! # Provisioning Core
//!
//! Schema scope resolution, reconciliation and pull correlation for idmesh.
//!
//! This crate provides:
//! - Resolution of the schemas an entity may carry, on its own and per
//!   membership and relationship type, plus validation of its attributes
//! - Reconciliation of entities against the objects connectors hold on
//!   external resources, and paged reconciliation reports
//! - Correlation of external changes to internal entities through pluggable
//!   rules
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────────┐     ┌──────────────────┐
//! │  SchemaCatalog  │────►│ SchemaScopeResolver  │────►│ AllowedSchemas   │
//! │ UniquenessIndex │     │  resolve / validate  │     │ self / per group │
//! └─────────────────┘     └──────────────────────┘     └──────────────────┘
//!
//! ┌─────────────────┐     ┌──────────────────────┐     ┌──────────────────┐
//! │  EntityPager    │────►│ ReconciliationEngine │◄───►│ ConnectorGateway │
//! │                 │     │  + report runner     │     │                  │
//! └─────────────────┘     └──────────┬───────────┘     └──────────────────┘
//!                                    ▼
//!                          Missing / Misaligned
//!
//! ┌─────────────────┐     ┌──────────────────────┐     ┌──────────────────┐
//! │   SyncDelta     │────►│   InboundMatcher     │────►│    PullMatch     │
//! │                 │     │  CorrelationRule     │     │                  │
//! └─────────────────┘     └──────────────────────┘     └──────────────────┘
//! ```
//!
//! Every collaborator (catalog, index, directory, projector, gateway,
//! search) is a trait passed in explicitly; nothing here holds global state.
//!
//! ## Example
//!
//! ```ignore
//! use idmesh_provisioning::{ReconciliationEngine, ReconciliationReportRunner, ReportConf};
//!
//! let engine = ReconciliationEngine::new(directory, projector, gateway);
//! let runner = ReconciliationReportRunner::new(pager, engine);
//!
//! let report = runner.run(&ReportConf::default()).await?;
//! println!("{}", ReportGenerator::generate_csv(&report));
//! ```

pub mod correlation;
pub mod reconciliation;
pub mod scope;
pub mod search;

// Re-exports for convenience
pub use correlation::{
    ChangeType, Correlation, CorrelationError, CorrelationResult, CorrelationRule,
    CorrelationRules, CorrelationState, InboundMatcher, MatchType, PullMatch, SyncDelta,
};
pub use scope::{
    AllowedSchemas, InMemorySchemaCatalog, SchemaCatalog, SchemaScopeResolver, ScopeError,
    ScopeResult, UniquenessIndex,
};
pub use search::{
    AttrOp, EntityField, EntityPager, EntitySearch, SearchCondition, SearchError, SearchResult,
};

pub use reconciliation::{
    // Comparison logic
    comparator::AttributeComparator,
    // Configuration
    config::ReconciliationConfig,
    // Discrepancy model
    discrepancy::{Discrepancy, DiscrepancyType},
    // Engine and collaborators
    engine::{
        AttributeProjector, EntityReconciliation, PreparedAttributes, ProjectionError,
        ProjectionScope, ReconciliationEngine, ResourceDirectory,
    },
    error::{ReconciliationError, ReconciliationResult},
    // Reporting
    report::{
        AttributeMismatchCount, PerformanceMetrics, ReconciliationReport, ReportConf, ReportEntry,
        ReportFailure, ReportFeature, ReportGenerator, ReportSection,
    },
    runner::ReconciliationReportRunner,
    // Statistics tracking
    statistics::{RunStatistics, StatisticsTracker},
};
