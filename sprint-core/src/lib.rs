//! sprint-core: capacity planning and auto-assignment for production sprints.
//!
//! The engine reads flat snapshots from a [`SprintStore`], derives capacity,
//! timeline and summary views from them, and commits sprint membership
//! changes back with optimistic concurrency.

pub mod capacity;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod planner;
pub mod planning;
pub mod resource;
pub mod schedule;
pub mod store;
pub mod summary;
pub mod task;
pub mod timeline;
pub mod validator;

pub use capacity::{CapacitySnapshot, ResourceLoad};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{EngineConfig, HourApportionment};
pub use engine::SprintEngine;
pub use error::{StoreError, StoreResult};
pub use events::{CapacityChange, CapacityEvent, CapacityListener};
pub use planner::AssignmentPlan;
pub use planning::{Page, PlanningData, PlanningQuery, ResourceView, TaskFilter};
pub use resource::{Machine, MachineId, Operator, OperatorId};
pub use store::{InMemoryStore, SprintSnapshot, SprintStore};
pub use summary::{SprintHealth, SprintSummary};
pub use task::{Priority, Task, TaskId, TaskStatus};
pub use timeline::{DayStatus, TimelineDay, TimelineTask};
pub use validator::{Validation, Verdict};
