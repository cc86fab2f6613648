//! Sprint engine: the public operations the boundary layer calls.
//!
//! Reads work on a fresh [`SprintSnapshot`]. Mutations follow
//! snapshot -> compute -> commit with the snapshot revision as the
//! concurrency token; on a revision conflict the whole computation is
//! redone against a new snapshot, up to `max_commit_attempts` times.
//!
//! Business-rule failures come back as `Ok(false)` or a rejected
//! [`Validation`]. Only storage failures surface as `Err`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::capacity::{self, CapacitySnapshot};
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::error::StoreResult;
use crate::events::{CapacityChange, CapacityEvent, CapacityListener};
use crate::planner::{candidate_order, plan_auto_assignment};
use crate::planning::{paginate, PlanningData, PlanningQuery, ResourceView};
use crate::schedule::{add_days, planned_window};
use crate::store::{SprintSnapshot, SprintStore};
use crate::summary::{summarize, SprintSummary};
use crate::task::{Task, TaskId};
use crate::timeline::{build_timeline, TimelineDay};
use crate::validator::{validate_against, Validation};

/// What a mutation closure decided to do with the snapshot it was handed.
struct Outcome<T> {
    value: T,
    changed: Vec<TaskId>,
    change: Option<CapacityChange>,
}

impl<T> Outcome<T> {
    fn unchanged(value: T) -> Self {
        Self {
            value,
            changed: Vec::new(),
            change: None,
        }
    }

    fn changed(value: T, changed: Vec<TaskId>, change: Option<CapacityChange>) -> Self {
        Self {
            value,
            changed,
            change,
        }
    }
}

pub struct SprintEngine<S: SprintStore, C: Clock> {
    store: S,
    clock: C,
    config: EngineConfig,
    listeners: Vec<Box<dyn CapacityListener>>,
}

impl<S: SprintStore, C: Clock> SprintEngine<S, C> {
    pub fn new(store: S, clock: C, config: EngineConfig) -> Self {
        Self {
            store,
            clock,
            config,
            listeners: Vec::new(),
        }
    }

    /// Register a callback fired after every commit that changes capacity use.
    pub fn with_listener(mut self, listener: impl CapacityListener + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // ---- reads -------------------------------------------------------

    pub fn get_sprint_capacity(&self) -> StoreResult<CapacitySnapshot> {
        let snap = self.store.snapshot()?;
        let cap = capacity::aggregate(&snap);
        debug!(
            required_operator_hours = cap.required_operator_hours,
            total_operator_hours = cap.total_operator_hours,
            required_machine_hours = cap.required_machine_hours,
            total_machine_hours = cap.total_machine_hours,
            "sprint capacity"
        );
        Ok(cap)
    }

    pub fn validate_task_for_sprint(&self, task_id: TaskId) -> StoreResult<Validation> {
        let snap = self.store.snapshot()?;
        Ok(validate_in(&snap, task_id))
    }

    pub fn get_sprint_timeline(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<TimelineDay>> {
        let snap = self.store.snapshot()?;
        Ok(self.timeline_for(&snap, start, end))
    }

    pub fn get_sprint_summary(&self) -> StoreResult<SprintSummary> {
        let snap = self.store.snapshot()?;
        Ok(summarize(&snap.tasks, self.clock.today()))
    }

    /// Order to give a task appended at the end of the sprint.
    pub fn next_sprint_order(&self) -> StoreResult<i32> {
        let snap = self.store.snapshot()?;
        Ok(snap.max_sprint_order().unwrap_or(0) + 1)
    }

    pub fn get_sprint_planning_data(&self, query: &PlanningQuery) -> StoreResult<PlanningData> {
        let snap = self.store.snapshot()?;
        let today = self.clock.today();

        let mut sprint_tasks: Vec<Task> = snap.sprint_tasks().cloned().collect();
        sprint_tasks.sort_by_key(|t| (t.sprint_order.unwrap_or(i32::MAX), t.id));

        let mut backlog: Vec<Task> = snap
            .backlog_tasks()
            .filter(|t| query.filter.matches(t))
            .cloned()
            .collect();
        backlog.sort_by(candidate_order);
        let page_size = query.page_size.unwrap_or(self.config.default_page_size);

        let days = self.config.timeline_window_days();
        let timeline = self.timeline_for(&snap, today, add_days(today, days - 1));

        Ok(PlanningData {
            today,
            sprint_tasks,
            backlog: paginate(backlog, query.page, page_size),
            capacity: capacity::aggregate(&snap),
            resources: ResourceView {
                operators: snap.operators.clone(),
                machines: snap.machines.clone(),
            },
            summary: summarize(&snap.tasks, today),
            timeline,
        })
    }

    // ---- mutations ---------------------------------------------------

    /// Commit `task_id` at `sprint_order` without a capacity check.
    ///
    /// Prefer [`Self::try_add_task_to_sprint`], which validates and adds in
    /// one revision.
    pub fn add_task_to_sprint(&self, task_id: TaskId, sprint_order: i32) -> StoreResult<bool> {
        let hours_per_day = self.config.hours_per_day();
        self.transact("add_task_to_sprint", |snap, today| {
            let Some(was_in_sprint) = snap.task(task_id).map(|t| t.in_sprint) else {
                return Outcome::unchanged(false);
            };
            place_in_sprint(snap, task_id, sprint_order, today, hours_per_day);
            let change = (!was_in_sprint).then_some(CapacityChange::TaskAdded);
            Outcome::changed(true, vec![task_id], change)
        })
    }

    /// Validate and add as one atomic step.
    pub fn try_add_task_to_sprint(
        &self,
        task_id: TaskId,
        sprint_order: i32,
    ) -> StoreResult<Validation> {
        let hours_per_day = self.config.hours_per_day();
        self.transact("try_add_task_to_sprint", |snap, today| {
            let verdict = validate_in(snap, task_id);
            if !verdict.can_add {
                return Outcome::unchanged(verdict);
            }
            place_in_sprint(snap, task_id, sprint_order, today, hours_per_day);
            Outcome::changed(verdict, vec![task_id], Some(CapacityChange::TaskAdded))
        })
    }

    pub fn remove_task_from_sprint(&self, task_id: TaskId) -> StoreResult<bool> {
        self.transact("remove_task_from_sprint", |snap, _| {
            match snap.task_mut(task_id) {
                Some(task) if task.in_sprint => {
                    task.leave_sprint();
                    Outcome::changed(true, vec![task_id], Some(CapacityChange::TaskRemoved))
                }
                _ => Outcome::unchanged(false),
            }
        })
    }

    /// Apply new sprint orders. Ids that are unknown or not in the sprint
    /// are skipped; the rest of the batch still applies.
    pub fn update_sprint_task_order(&self, orders: &BTreeMap<TaskId, i32>) -> StoreResult<bool> {
        self.reorder_sprint_tasks(orders).map(|_| true)
    }

    /// Same as [`Self::update_sprint_task_order`], returning how many tasks
    /// actually took a new order.
    pub fn reorder_sprint_tasks(&self, orders: &BTreeMap<TaskId, i32>) -> StoreResult<usize> {
        self.transact("update_sprint_task_order", |snap, _| {
            let mut changed = Vec::new();
            for (&id, &order) in orders {
                match snap.task_mut(id) {
                    Some(task) if task.in_sprint => {
                        task.sprint_order = Some(order);
                        changed.push(id);
                    }
                    _ => debug!(task_id = id, "reorder skipped unknown or backlog task"),
                }
            }
            Outcome::changed(changed.len(), changed, None)
        })
    }

    pub fn update_task_estimated_time(&self, task_id: TaskId, hours: i64) -> StoreResult<bool> {
        let Some(hours) = u32::try_from(hours).ok().filter(|h| *h > 0) else {
            return Ok(false);
        };
        self.transact("update_task_estimated_time", |snap, _| {
            let Some(task) = snap.task_mut(task_id) else {
                return Outcome::unchanged(false);
            };
            task.estimated_hours = hours;
            let change = task.in_sprint.then_some(CapacityChange::EstimateChanged);
            Outcome::changed(true, vec![task_id], change)
        })
    }

    pub fn update_task_planned_dates(
        &self,
        task_id: TaskId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> StoreResult<bool> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                return Ok(false);
            }
        }
        self.transact("update_task_planned_dates", |snap, _| {
            let Some(task) = snap.task_mut(task_id) else {
                return Outcome::unchanged(false);
            };
            task.planned_start_date = start;
            task.planned_end_date = end;
            Outcome::changed(true, vec![task_id], None)
        })
    }

    /// Always true. An already empty sprint is left untouched (no commit).
    pub fn clear_sprint(&self) -> StoreResult<bool> {
        self.transact("clear_sprint", |snap, _| {
            let mut cleared = Vec::new();
            for task in snap.tasks.iter_mut().filter(|t| t.in_sprint) {
                task.leave_sprint();
                cleared.push(task.id);
            }
            let change = (!cleared.is_empty()).then_some(CapacityChange::SprintCleared);
            Outcome::changed(true, cleared, change)
        })
    }

    /// Greedy fill from the backlog; returns how many tasks were assigned.
    pub fn auto_assign_tasks_to_sprint(&self, max_tasks: i32) -> StoreResult<usize> {
        if max_tasks <= 0 {
            return Ok(0);
        }
        let hours_per_day = self.config.hours_per_day();
        self.transact("auto_assign_tasks_to_sprint", |snap, today| {
            let plan = plan_auto_assignment(snap, max_tasks, today, hours_per_day);
            for (id, reason) in &plan.skipped {
                debug!(task_id = *id, reason = %reason, "auto-assign skipped candidate");
            }
            let count = plan.assigned.len();
            let change = (count > 0).then_some(CapacityChange::AutoAssigned);
            Outcome::changed(count, plan.assigned, change)
        })
    }

    // ---- internals ---------------------------------------------------

    fn timeline_for(
        &self,
        snap: &SprintSnapshot,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<TimelineDay> {
        build_timeline(
            snap.sprint_tasks(),
            start,
            end,
            self.config.apportionment,
            self.config.hours_per_day(),
        )
    }

    fn transact<T>(
        &self,
        op: &'static str,
        mut apply: impl FnMut(&mut SprintSnapshot, NaiveDate) -> Outcome<T>,
    ) -> StoreResult<T> {
        let attempts = self.config.commit_attempts();
        let mut attempt = 1;
        loop {
            let mut snap = self.store.snapshot()?;
            let base_revision = snap.revision;
            let outcome = apply(&mut snap, self.clock.today());
            if outcome.changed.is_empty() {
                return Ok(outcome.value);
            }

            let tasks: Vec<Task> = outcome
                .changed
                .iter()
                .filter_map(|id| snap.task(*id).cloned())
                .collect();

            match self.store.commit(base_revision, &tasks) {
                Ok(revision) => {
                    info!(op, revision, tasks = tasks.len(), "sprint mutation committed");
                    if let Some(change) = outcome.change {
                        self.notify(CapacityEvent {
                            change,
                            task_ids: outcome.changed,
                            revision,
                        });
                    }
                    return Ok(outcome.value);
                }
                Err(e) if e.is_conflict() && attempt < attempts => {
                    warn!(op, attempt, error = %e, "commit conflict, retrying on fresh snapshot");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn notify(&self, event: CapacityEvent) {
        for listener in &self.listeners {
            listener.capacity_changed(&event);
        }
    }
}

fn validate_in(snap: &SprintSnapshot, task_id: TaskId) -> Validation {
    match snap.task(task_id) {
        Some(task) => validate_against(&capacity::aggregate(snap), task),
        None => Validation::not_found(task_id),
    }
}

fn place_in_sprint(
    snap: &mut SprintSnapshot,
    task_id: TaskId,
    sprint_order: i32,
    today: NaiveDate,
    hours_per_day: u32,
) {
    let Some(task) = snap.task(task_id) else { return };
    let (start, end) = planned_window(task, &snap.tasks, today, hours_per_day);
    if let Some(task) = snap.task_mut(task_id) {
        task.in_sprint = true;
        task.sprint_order = Some(sprint_order);
        task.planned_start_date = Some(start);
        task.planned_end_date = Some(end);
    }
}
