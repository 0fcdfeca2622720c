/// Per-project task counts

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::models::task::TaskStatus;
use crate::store::Store;

/// Count of current tasks per status; every key is always present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectReport {
    pub todo: i64,
    pub doing: i64,
    pub done: i64,
}

impl ProjectReport {
    /// Folds grouped counts into a report, zero-filling missing statuses
    pub fn from_counts(counts: impl IntoIterator<Item = (TaskStatus, i64)>) -> Self {
        let mut report = Self::default();
        for (status, count) in counts {
            match status {
                TaskStatus::Todo => report.todo += count,
                TaskStatus::Doing => report.doing += count,
                TaskStatus::Done => report.done += count,
            }
        }
        report
    }
}

#[derive(Clone)]
pub struct Reporting {
    store: Arc<dyn Store>,
}

impl Reporting {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Computes the report from current task state
    pub async fn project_report(&self, project_id: Uuid) -> CoreResult<ProjectReport> {
        let counts = self.store.count_tasks_by_status(project_id).await?;
        Ok(ProjectReport::from_counts(counts))
    }
}
