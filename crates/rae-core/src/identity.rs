//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the Risk Appetite
//! Engine. Each identifier is a distinct type — you cannot pass a
//! [`MetricId`] where an [`IndicatorId`] is expected, and a mixed-up
//! argument order is a compile error rather than a silently corrupted
//! ledger row.
//!
//! All identifiers are UUID-backed and always valid by construction.
//! [`RiskCategoryId`] is string-backed because the risk taxonomy key is
//! an externally governed slug, not something this engine mints.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Access the underlying UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id! {
    /// A unique identifier for an organization (tenant) whose appetite
    /// statement, categories, and metrics this engine evaluates.
    OrgId
}

uuid_id! {
    /// A unique identifier for a tolerance metric.
    MetricId
}

uuid_id! {
    /// A unique identifier for an appetite category.
    CategoryId
}

uuid_id! {
    /// A unique identifier for a Key Risk Indicator time series.
    IndicatorId
}

uuid_id! {
    /// A unique identifier for a breach ledger entry.
    BreachId
}

uuid_id! {
    /// A unique identifier for an organization's appetite statement.
    StatementId
}

uuid_id! {
    /// The acting user on whose behalf a mutation is stamped
    /// (`approved_by`, `activated_by`, `resolved_by`).
    ActorId
}

/// The externally governed key of a risk category in the organization's
/// risk taxonomy (e.g., `"operational"`, `"credit"`, `"conduct"`).
///
/// String-backed: the taxonomy is owned by the risk register, an external
/// collaborator; this engine only matches categories against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RiskCategoryId(String);

impl RiskCategoryId {
    /// Create a risk category key from a taxonomy slug.
    pub fn new(slug: impl Into<String>) -> Self {
        Self(slug.into())
    }

    /// Access the underlying slug.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RiskCategoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
