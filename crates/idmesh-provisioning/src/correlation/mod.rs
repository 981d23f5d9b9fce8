//! # Pull Correlation
//!
//! Matches changes observed on external resources to internal entities.
//!
//! A [`CorrelationRule`] is a strategy record: one function building the
//! candidate search, one resolving a unique candidate and one deciding what
//! happens when nothing matched. The [`InboundMatcher`] runs the registered
//! rule for a (resource, any type) pair, or falls back to matching on the
//! external key. More than one candidate is always an error.
//!
//! ```text
//! SyncDelta ──► rule.build_search_condition ──► EntitySearch
//!                                                   │
//!                 ┌─────────────────┬───────────────┴──────────┐
//!                 ▼                 ▼                          ▼
//!           0: on_no_match    1: on_match          n: CorrelationError::Ambiguous
//! ```

pub mod delta;
pub mod error;
pub mod matcher;
pub mod outcome;
pub mod rule;

pub use delta::{ChangeType, SyncDelta};
pub use error::{CorrelationError, CorrelationResult};
pub use matcher::{Correlation, CorrelationState, InboundMatcher};
pub use outcome::{MatchType, PullMatch};
pub use rule::{BuildSearchConditionFn, CorrelationRule, CorrelationRules, OnMatchFn, OnNoMatchFn};
