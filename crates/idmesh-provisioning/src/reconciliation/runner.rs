//! Paged reconciliation report runner.

use std::sync::Arc;

use chrono::Utc;
use idmesh_connector::traits::ConnectorGateway;
use idmesh_core::{AnyTypeKey, EntityKind};
use tracing::{info, instrument};

use super::engine::{AttributeProjector, ReconciliationEngine, ResourceDirectory};
use super::error::ReconciliationResult;
use super::report::{ReconciliationReport, ReportConf, ReportEntry, ReportGenerator, ReportSection};
use super::statistics::StatisticsTracker;
use crate::search::{EntityPager, SearchCondition};

/// Runs a reconciliation report over every matching entity.
///
/// Users come first, then groups, then one section per any object type.
pub struct ReconciliationReportRunner<E, D, P, G>
where
    E: EntityPager,
    D: ResourceDirectory,
    P: AttributeProjector,
    G: ConnectorGateway,
{
    pager: Arc<E>,
    engine: ReconciliationEngine<D, P, G>,
}

impl<E, D, P, G> ReconciliationReportRunner<E, D, P, G>
where
    E: EntityPager,
    D: ResourceDirectory,
    P: AttributeProjector,
    G: ConnectorGateway,
{
    pub fn new(pager: Arc<E>, engine: ReconciliationEngine<D, P, G>) -> Self {
        Self { pager, engine }
    }

    /// Run the report.
    ///
    /// Fails only when paging through entities fails; connector faults are
    /// recorded on the affected entries.
    #[instrument(skip(self, conf))]
    pub async fn run(&self, conf: &ReportConf) -> ReconciliationResult<ReconciliationReport> {
        let started_at = Utc::now();
        let tracker = StatisticsTracker::new();
        let mut sections = Vec::new();

        sections.push(
            self.run_section(
                EntityKind::User,
                None,
                conf.user_matching_cond.as_ref(),
                conf,
                &tracker,
            )
            .await?,
        );
        sections.push(
            self.run_section(
                EntityKind::Group,
                None,
                conf.group_matching_cond.as_ref(),
                conf,
                &tracker,
            )
            .await?,
        );

        for any_type in self.pager.any_object_types().await? {
            let mut condition = SearchCondition::any_type(any_type.clone());
            if let Some(matching) = &conf.any_object_matching_cond {
                condition = condition.and_with(matching.clone());
            }
            sections.push(
                self.run_section(
                    EntityKind::AnyObject,
                    Some(any_type),
                    Some(&condition),
                    conf,
                    &tracker,
                )
                .await?,
            );
        }

        let statistics = tracker.snapshot();
        info!(
            entities = statistics.entities_processed,
            discrepancies = statistics.discrepancies_found,
            failures = statistics.failures,
            "Reconciliation report completed"
        );
        Ok(ReportGenerator::generate(started_at, sections, statistics))
    }

    async fn run_section(
        &self,
        kind: EntityKind,
        any_type: Option<AnyTypeKey>,
        condition: Option<&SearchCondition>,
        conf: &ReportConf,
        tracker: &StatisticsTracker,
    ) -> ReconciliationResult<ReportSection> {
        let total = self.pager.count(kind, condition).await?;
        tracker.add_total(to_u32(total));
        let mut section = ReportSection::new(kind, any_type, total);

        let page_size = self.engine.config().effective_page_size();
        let pages = total.div_ceil(page_size);
        for page in 1..=pages {
            let entities = self.pager.page(kind, condition, page, page_size).await?;
            info!(
                kind = %kind,
                page,
                pages,
                size = entities.len(),
                "Reconciling page"
            );

            for outcome in self.engine.reconcile_page(&entities).await {
                for discrepancy in &outcome.discrepancies {
                    tracker.record_discrepancy(discrepancy.discrepancy_type());
                }
                for _ in &outcome.failures {
                    tracker.record_failure();
                }
                if let Some(entity) = entities.iter().find(|e| e.id == outcome.entity_id) {
                    section
                        .entries
                        .push(ReportEntry::new(entity, &outcome, &conf.features));
                }
            }
            tracker.increment_processed(to_u32(entities.len()));
        }

        Ok(section)
    }
}

fn to_u32(count: usize) -> u32 {
    u32::try_from(count).unwrap_or(u32::MAX)
}
