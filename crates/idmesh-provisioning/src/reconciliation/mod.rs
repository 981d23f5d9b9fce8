//! # Reconciliation
//!
//! Read-only comparison between the internal state of entities and the
//! objects connectors hold on external resources.
//!
//! ## Overview
//!
//! For every resource an entity is provisioned to, the engine fetches the
//! object under the entity's external key and diffs it with the attributes a
//! push would send:
//! - `Missing` when the resource holds no such object
//! - `Misaligned` for each attribute whose value sets differ
//!
//! Connector faults are never turned into discrepancies; they are returned
//! next to the discrepancies of the resources that could be reached.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 ReconciliationReportRunner                   │
//! │   EntityPager ──► pages of users, groups, any objects        │
//! ├──────────────────────────────────────────────────────────────┤
//! │                   ReconciliationEngine                       │
//! │                                                              │
//! │  ResourceDirectory ──► AttributeProjector ──► Gateway.fetch  │
//! │                                   │               │          │
//! │                                   ▼               ▼          │
//! │                            AttributeComparator ──► Discrepancy│
//! │                                                              │
//! │  StatisticsTracker            ReportGenerator (JSON / CSV)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use idmesh_provisioning::reconciliation::ReconciliationEngine;
//!
//! let engine = ReconciliationEngine::new(directory, projector, gateway);
//!
//! let outcome = engine.reconcile(&alice).await;
//! for discrepancy in &outcome.discrepancies {
//!     println!("{} on {}", discrepancy.discrepancy_type(), discrepancy.resource());
//! }
//! ```

pub mod comparator;
pub mod config;
pub mod discrepancy;
pub mod engine;
pub mod error;
pub mod report;
pub mod runner;
pub mod statistics;

pub use comparator::{AttributeComparator, AttributeValues};
pub use config::ReconciliationConfig;
pub use discrepancy::{Discrepancy, DiscrepancyType};
pub use engine::{
    AttributeProjector, EntityReconciliation, PreparedAttributes, ProjectionError, ProjectionScope,
    ReconciliationEngine, ResourceDirectory,
};
pub use error::{ReconciliationError, ReconciliationResult};
pub use report::{
    AttributeMismatchCount, PerformanceMetrics, ReconciliationReport, ReportConf, ReportEntry,
    ReportFailure, ReportFeature, ReportGenerator, ReportSection,
};
pub use runner::ReconciliationReportRunner;
pub use statistics::{RunStatistics, StatisticsTracker};
