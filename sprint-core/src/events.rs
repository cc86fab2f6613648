//! "Capacity changed" notifications.
//!
//! The engine does not own any cache. Callers that keep derived views
//! around register a listener and invalidate on their own terms.

use serde::{Deserialize, Serialize};

use crate::task::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityChange {
    TaskAdded,
    TaskRemoved,
    EstimateChanged,
    SprintCleared,
    AutoAssigned,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityEvent {
    pub change: CapacityChange,
    pub task_ids: Vec<TaskId>,
    /// Store revision after the commit that caused the change.
    pub revision: u64,
}

pub trait CapacityListener: Send + Sync {
    fn capacity_changed(&self, event: &CapacityEvent);
}

impl<F> CapacityListener for F
where
    F: Fn(&CapacityEvent) + Send + Sync,
{
    fn capacity_changed(&self, event: &CapacityEvent) {
        self(event)
    }
}
