//! Deployment metadata records.
//!
//! A deployment record describes where a workflow's code lives and its
//! status. Records are keyed by workflow id; redeploying the same id
//! overwrites the previous record (last write wins).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata record written after a workflow's code blob is stored.
///
/// A record with status `deployed` is only ever written after the
/// corresponding code blob write has completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Workflow identifier (also the metadata document key)
    pub workflow_id: String,

    /// Deployment status
    pub status: DeploymentStatus,

    /// When this deployment was recorded
    pub created_at: DateTime<Utc>,
}

impl DeploymentRecord {
    /// Create a record for a freshly deployed workflow
    pub fn deployed(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            status: DeploymentStatus::Deployed,
            created_at: Utc::now(),
        }
    }
}

/// Status of a workflow deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    /// Code blob and metadata are both durably stored
    Deployed,
}
