//! Append-only audit log for catalog mutations.
//!
//! Recording is best-effort: the audit write happens after the primary
//! mutation commits and its failure is logged, never surfaced to the client.

use serde::Serialize;
use serde_json::Value;
use tracing::error;

use super::ports::ActivityLog;

/// Kind of catalog mutation being audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Create,
    Update,
    Delete,
}

impl ActivityAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// One audit entry, written as a side effect of a catalog mutation.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub action: ActivityAction,
    pub app_id: Option<i64>,
    pub app_name: String,
    pub user_email: String,
    pub details: Option<Value>,
}

/// Record an audit entry, swallowing adapter failures.
pub fn record_activity(log: &dyn ActivityLog, entry: ActivityEntry) {
    if let Err(err) = log.record(&entry) {
        error!(error = %err, action = entry.action.as_str(), "failed to record app activity");
    }
}
