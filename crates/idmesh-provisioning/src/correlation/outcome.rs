//! Correlation outcomes.

use idmesh_core::{EntityId, LinkedAccount};
use serde::{Deserialize, Serialize};

/// How specific a match is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// The external record is the entity itself.
    Any,
    /// The external record is an account linked under an entity.
    LinkedAccount,
}

/// What an external change correlates to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PullMatch {
    /// An existing entity.
    Matched { entity: EntityId },
    /// An account linked under an entity.
    LinkedAccount { account: LinkedAccount },
    /// Nothing; the pull may create a new entity.
    NoMatch,
}

impl PullMatch {
    /// Match on an entity.
    pub fn entity(entity: EntityId) -> Self {
        Self::Matched { entity }
    }

    /// Match on a linked account.
    pub fn linked_account(account: LinkedAccount) -> Self {
        Self::LinkedAccount { account }
    }

    /// Match kind; `NoMatch` counts as `Any`.
    pub fn match_type(&self) -> MatchType {
        match self {
            Self::Matched { .. } | Self::NoMatch => MatchType::Any,
            Self::LinkedAccount { .. } => MatchType::LinkedAccount,
        }
    }

    /// The entity this outcome points at, directly or as the account owner.
    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            Self::Matched { entity } => Some(*entity),
            Self::LinkedAccount { account } => Some(account.owner),
            Self::NoMatch => None,
        }
    }
}
