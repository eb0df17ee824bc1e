//! Summary counts for the admin dashboard.
//!
//! The dashboard fetches the newest rows of each table and reduces them on
//! the client; nothing here talks to a store.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{KioskSession, UserId};

/// Number of rows the dashboard fetches per table.
pub const DASHBOARD_ROW_LIMIT: usize = 50;

/// Complaint status that counts as closed.
pub const RESOLVED_STATUS: &str = "resolved";

/// Minimal complaint row needed for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ComplaintRow {
    /// Complaint identifier
    pub id: Uuid,
    /// Filing user
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Department tag
    pub department: String,
    /// Workflow status ("submitted", "in_progress", "resolved", ...)
    pub status: String,
    /// Filing timestamp
    pub created_at: DateTime<Utc>,
}

/// Minimal payment row needed for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PaymentRow {
    /// Payment identifier
    pub id: Uuid,
    /// Amount paid
    pub amount: f64,
    /// Department tag
    pub department: String,
    /// Payment status
    pub status: String,
    /// Payment timestamp
    pub created_at: DateTime<Utc>,
}

/// Aggregated counts shown on the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DashboardStats {
    /// Complaints fetched
    pub total_complaints: usize,
    /// Complaints whose status is not "resolved"
    pub active_complaints: usize,
    /// Complaints whose status is "resolved"
    pub resolved_complaints: usize,
    /// Payments fetched
    pub total_payments: usize,
    /// Sum of payment amounts
    pub total_revenue: f64,
    /// Distinct users among complaint filers
    pub total_users: usize,
    /// Sessions still marked active
    pub active_sessions: usize,
}

impl DashboardStats {
    /// Reduce fetched rows into dashboard counts.
    pub fn compute(
        complaints: &[ComplaintRow],
        payments: &[PaymentRow],
        sessions: &[KioskSession],
    ) -> Self {
        let resolved = complaints
            .iter()
            .filter(|c| c.status == RESOLVED_STATUS)
            .count();
        let users: HashSet<Option<UserId>> = complaints.iter().map(|c| c.user_id).collect();

        Self {
            total_complaints: complaints.len(),
            active_complaints: complaints.len() - resolved,
            resolved_complaints: resolved,
            total_payments: payments.len(),
            total_revenue: payments.iter().map(|p| p.amount).sum(),
            total_users: users.len(),
            active_sessions: sessions.iter().filter(|s| s.is_active()).count(),
        }
    }
}
