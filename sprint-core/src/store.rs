//! Storage contract and an in-memory implementation.
//!
//! The engine never holds a live object graph. It reads a flat
//! [`SprintSnapshot`] and writes changed tasks back through
//! [`SprintStore::commit`], passing the snapshot revision as an optimistic
//! concurrency token.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::resource::{Machine, Operator};
use crate::task::{Task, TaskId};

/// Read-only copy of everything the engine needs for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SprintSnapshot {
    pub revision: u64,
    pub tasks: Vec<Task>,
    pub operators: Vec<Operator>,
    pub machines: Vec<Machine>,
}

impl SprintSnapshot {
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn sprint_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| t.in_sprint)
    }

    pub fn backlog_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.in_sprint)
    }

    /// Highest sprint order in use, if any task is in the sprint.
    pub fn max_sprint_order(&self) -> Option<i32> {
        self.sprint_tasks().filter_map(|t| t.sprint_order).max()
    }
}

/// Storage collaborator.
///
/// `commit` must apply all tasks or none, and must fail with
/// [`StoreError::Conflict`] when `base_revision` is not the current revision.
pub trait SprintStore: Send + Sync {
    fn snapshot(&self) -> StoreResult<SprintSnapshot>;

    /// Overwrite the given tasks (matched by id). Returns the new revision.
    fn commit(&self, base_revision: u64, tasks: &[Task]) -> StoreResult<u64>;
}

#[derive(Debug, Default)]
struct Inner {
    revision: u64,
    tasks: Vec<Task>,
    operators: Vec<Operator>,
    machines: Vec<Machine>,
}

/// In-memory implementation for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(tasks: Vec<Task>, operators: Vec<Operator>, machines: Vec<Machine>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                revision: 0,
                tasks,
                operators,
                machines,
            }),
        }
    }

    /// Insert or replace a task outside of the engine (the task-management layer).
    pub fn put_task(&self, task: Task) -> StoreResult<()> {
        let mut inner = self.write()?;
        match inner.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => inner.tasks.push(task),
        }
        inner.revision += 1;
        Ok(())
    }

    pub fn put_operator(&self, operator: Operator) -> StoreResult<()> {
        let mut inner = self.write()?;
        match inner.operators.iter_mut().find(|o| o.id == operator.id) {
            Some(slot) => *slot = operator,
            None => inner.operators.push(operator),
        }
        inner.revision += 1;
        Ok(())
    }

    pub fn put_machine(&self, machine: Machine) -> StoreResult<()> {
        let mut inner = self.write()?;
        match inner.machines.iter_mut().find(|m| m.id == machine.id) {
            Some(slot) => *slot = machine,
            None => inner.machines.push(machine),
        }
        inner.revision += 1;
        Ok(())
    }

    pub fn revision(&self) -> StoreResult<u64> {
        Ok(self.read()?.revision)
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Internal(e.to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Internal(e.to_string()))
    }
}

impl SprintStore for InMemoryStore {
    fn snapshot(&self) -> StoreResult<SprintSnapshot> {
        let inner = self.read()?;
        Ok(SprintSnapshot {
            revision: inner.revision,
            tasks: inner.tasks.clone(),
            operators: inner.operators.clone(),
            machines: inner.machines.clone(),
        })
    }

    fn commit(&self, base_revision: u64, tasks: &[Task]) -> StoreResult<u64> {
        let mut inner = self.write()?;
        if inner.revision != base_revision {
            return Err(StoreError::Conflict {
                expected: base_revision,
                actual: inner.revision,
            });
        }
        apply_tasks(&mut inner.tasks, tasks)?;
        inner.revision += 1;
        Ok(inner.revision)
    }
}

/// Overwrite `current` rows with `changed`, all-or-nothing.
pub fn apply_tasks(current: &mut [Task], changed: &[Task]) -> StoreResult<()> {
    let index: HashMap<TaskId, usize> = current
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id, i))
        .collect();

    // Resolve every slot before touching anything.
    let mut slots = Vec::with_capacity(changed.len());
    for task in changed {
        let Some(&i) = index.get(&task.id) else {
            return Err(StoreError::Internal(format!("task {} does not exist", task.id)));
        };
        slots.push(i);
    }
    for (i, task) in slots.into_iter().zip(changed) {
        current[i] = task.clone();
    }
    Ok(())
}
