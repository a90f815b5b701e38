//! # Appetite Categories & Statements
//!
//! The declared, qualitative side of the framework: appetite levels per
//! risk category and the organization-wide appetite statement whose
//! approval the chain validator gates.

use serde::{Deserialize, Serialize};

use crate::identity::{ActorId, CategoryId, OrgId, RiskCategoryId, StatementId};
use crate::temporal::Timestamp;

/// The declared willingness to accept risk in one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppetiteLevel {
    /// No appetite: avoid entirely.
    Zero,
    /// Minimal appetite.
    Low,
    /// Balanced appetite.
    Moderate,
    /// Willing to accept significant risk for return.
    High,
}

impl std::fmt::Display for AppetiteLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Zero => f.write_str("ZERO"),
            Self::Low => f.write_str("LOW"),
            Self::Moderate => f.write_str("MODERATE"),
            Self::High => f.write_str("HIGH"),
        }
    }
}

/// An organization's declared appetite for one risk category, owning
/// zero or more tolerance metrics.
///
/// Invariant (chain-validated, not store-enforced): every risk category
/// with active risk records has exactly one appetite category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppetiteCategory {
    /// Unique category identifier.
    pub id: CategoryId,
    /// The owning organization.
    pub org_id: OrgId,
    /// The risk taxonomy key this category covers.
    pub risk_category_id: RiskCategoryId,
    /// Human-readable category name.
    pub name: String,
    /// The declared appetite level.
    pub level: AppetiteLevel,
}

/// A risk category actually in use by active risk records, as reported
/// by the risk register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCategoryRef {
    /// The taxonomy key.
    pub id: RiskCategoryId,
    /// Display name for gap messages.
    pub name: String,
}

/// Lifecycle status of an appetite statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementStatus {
    /// Being drafted; not yet in force.
    Draft,
    /// Formally approved and in force.
    Approved,
}

impl std::fmt::Display for StatementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => f.write_str("DRAFT"),
            Self::Approved => f.write_str("APPROVED"),
        }
    }
}

/// The organization-wide appetite statement.
///
/// Approval (DRAFT → APPROVED) is the blocking governance action: it is
/// refused while any CRITICAL chain gap exists for the organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppetiteStatement {
    /// Unique statement identifier.
    pub id: StatementId,
    /// The owning organization.
    pub org_id: OrgId,
    /// Statement title.
    pub title: String,
    /// Current lifecycle status.
    pub status: StatementStatus,
    /// Who approved the statement, once approved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<ActorId>,
    /// When the statement was approved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<Timestamp>,
}

impl AppetiteStatement {
    /// Create a draft statement.
    pub fn draft(org_id: OrgId, title: impl Into<String>) -> Self {
        Self {
            id: StatementId::new(),
            org_id,
            title: title.into(),
            status: StatementStatus::Draft,
            approved_by: None,
            approved_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_statement_has_no_approval_fields() {
        let stmt = AppetiteStatement::draft(OrgId::new(), "FY2026 appetite");
        assert_eq!(stmt.status, StatementStatus::Draft);
        assert!(stmt.approved_by.is_none());
        assert!(stmt.approved_at.is_none());
    }

    #[test]
    fn appetite_level_display() {
        assert_eq!(AppetiteLevel::Zero.to_string(), "ZERO");
        assert_eq!(AppetiteLevel::Moderate.to_string(), "MODERATE");
    }

    #[test]
    fn statement_serde_omits_empty_approval() {
        let stmt = AppetiteStatement::draft(OrgId::new(), "t");
        let json = serde_json::to_string(&stmt).unwrap();
        assert!(!json.contains("approved_by"));
        assert!(!json.contains("approved_at"));
    }
}
