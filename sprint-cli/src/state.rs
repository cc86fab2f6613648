use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use sprint_core::store::apply_tasks;
use sprint_core::{Machine, Operator, SprintSnapshot, SprintStore, StoreError, StoreResult, Task};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub fn sprint_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".sprint"))
}

pub fn ensure_sprint_home() -> Result<PathBuf> {
    let dir = sprint_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_store_path() -> Result<PathBuf> {
    Ok(ensure_sprint_home()?.join("sprint.json"))
}

/// On-disk layout of the store file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    revision: u64,
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    operators: Vec<Operator>,
    #[serde(default)]
    machines: Vec<Machine>,
}

/// What an import changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub inserted: usize,
    pub updated: usize,
}

/// JSON file store.
///
/// Every write takes an exclusive advisory lock on `<store>.lock`, re-reads
/// the file, checks the revision and replaces the file through a unique temp
/// file + rename. The lock is per open file, so separate processes and
/// separate handles in one process exclude each other. Readers skip the
/// lock: a rename never exposes a half-written file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Upsert tasks. A task that is already in the sprint keeps its sprint
    /// fields; everything else comes from the import.
    pub fn import_tasks(&self, tasks: Vec<Task>) -> StoreResult<ImportCounts> {
        self.rewrite(|file| {
            let mut counts = ImportCounts::default();
            for mut task in tasks {
                match file.tasks.iter_mut().find(|t| t.id == task.id) {
                    Some(slot) => {
                        if slot.in_sprint {
                            task.in_sprint = true;
                            task.sprint_order = slot.sprint_order;
                            task.planned_start_date = slot.planned_start_date;
                            task.planned_end_date = slot.planned_end_date;
                        }
                        task.created_at_utc = slot.created_at_utc;
                        *slot = task;
                        counts.updated += 1;
                    }
                    None => {
                        file.tasks.push(task);
                        counts.inserted += 1;
                    }
                }
            }
            counts
        })
    }

    pub fn import_operators(&self, operators: Vec<Operator>) -> StoreResult<ImportCounts> {
        self.rewrite(|file| upsert(&mut file.operators, operators, |o| o.id))
    }

    pub fn import_machines(&self, machines: Vec<Machine>) -> StoreResult<ImportCounts> {
        self.rewrite(|file| upsert(&mut file.machines, machines, |m| m.id))
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    fn dir(&self) -> &Path {
        self.path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
    }

    /// Held until the returned handle is dropped.
    fn guard(&self) -> StoreResult<File> {
        fs::create_dir_all(self.dir())?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn load(&self) -> StoreResult<StoreFile> {
        if !self.path.exists() {
            return Ok(StoreFile::default());
        }
        let s = fs::read_to_string(&self.path)?;
        serde_json::from_str(&s)
            .map_err(|e| StoreError::Serialization(format!("{}: {e}", self.path.display())))
    }

    /// Caller must hold [`Self::guard`].
    fn save(&self, file: &StoreFile) -> StoreResult<()> {
        let data = serde_json::to_string_pretty(file)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let mut tmp = NamedTempFile::new_in(self.dir())?;
        tmp.write_all(data.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::from(e.error))?;
        Ok(())
    }

    /// Load, edit and save under the lock, bumping the revision.
    fn rewrite<T>(&self, edit: impl FnOnce(&mut StoreFile) -> T) -> StoreResult<T> {
        let _guard = self.guard()?;
        let mut file = self.load()?;
        let out = edit(&mut file);
        file.revision += 1;
        self.save(&file)?;
        Ok(out)
    }
}

fn upsert<T>(current: &mut Vec<T>, incoming: Vec<T>, id: impl Fn(&T) -> u64) -> ImportCounts {
    let mut counts = ImportCounts::default();
    for item in incoming {
        match current.iter_mut().find(|c| id(c) == id(&item)) {
            Some(slot) => {
                *slot = item;
                counts.updated += 1;
            }
            None => {
                current.push(item);
                counts.inserted += 1;
            }
        }
    }
    counts
}

impl SprintStore for FileStore {
    fn snapshot(&self) -> StoreResult<SprintSnapshot> {
        let file = self.load()?;
        Ok(SprintSnapshot {
            revision: file.revision,
            tasks: file.tasks,
            operators: file.operators,
            machines: file.machines,
        })
    }

    fn commit(&self, base_revision: u64, tasks: &[Task]) -> StoreResult<u64> {
        let _guard = self.guard()?;
        let mut file = self.load()?;
        if file.revision != base_revision {
            return Err(StoreError::Conflict {
                expected: base_revision,
                actual: file.revision,
            });
        }
        apply_tasks(&mut file.tasks, tasks)?;
        file.revision += 1;
        self.save(&file)?;
        Ok(file.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sprint_core::{EngineConfig, FixedClock, SprintEngine};

    fn store_in(dir: &tempfile::TempDir) -> FileStore {
        FileStore::open(dir.path().join("sprint.json"))
    }

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let snap = store_in(&dir).snapshot().unwrap();
        assert_eq!(snap.revision, 0);
        assert!(snap.tasks.is_empty());
    }

    #[test]
    fn commit_persists_and_rejects_stale_revisions() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.import_tasks(vec![Task::new(1, "Weld", 8)]).unwrap();

        let snap = store.snapshot().unwrap();
        let mut t = snap.task(1).unwrap().clone();
        t.estimated_hours = 12;
        let rev = store.commit(snap.revision, &[t.clone()]).unwrap();
        assert_eq!(rev, snap.revision + 1);

        let err = store.commit(snap.revision, &[t]).unwrap_err();
        assert!(err.is_conflict());

        let reopened = store_in(&dir);
        assert_eq!(reopened.snapshot().unwrap().task(1).unwrap().estimated_hours, 12);

        let mut left: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["sprint.json", "sprint.json.lock"]);
    }

    #[test]
    fn two_handles_never_both_win() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        for _ in 0..25 {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("sprint.json");
            let seed = FileStore::open(&path);
            seed.import_operators(vec![Operator::new(1, "Ana", 80)]).unwrap();
            seed.import_tasks(vec![Task::new(1, "Weld", 60), Task::new(2, "Paint", 60)])
                .unwrap();

            let winners: Vec<u64> = std::thread::scope(|s| {
                let handles: Vec<_> = [1u64, 2]
                    .into_iter()
                    .map(|id| {
                        let path = path.clone();
                        s.spawn(move || {
                            let engine = SprintEngine::new(
                                FileStore::open(path),
                                FixedClock(today),
                                EngineConfig::default(),
                            );
                            let v = engine.try_add_task_to_sprint(id, id as i32).unwrap();
                            v.can_add.then_some(id)
                        })
                    })
                    .collect();
                handles.into_iter().filter_map(|h| h.join().unwrap()).collect()
            });
            assert_eq!(winners.len(), 1);

            let snap = seed.snapshot().unwrap();
            let in_sprint: Vec<u64> =
                snap.tasks.iter().filter(|t| t.in_sprint).map(|t| t.id).collect();
            assert_eq!(in_sprint, winners);
            assert_eq!(snap.revision, 3);
        }
    }

    #[test]
    fn reimport_keeps_sprint_membership() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.import_tasks(vec![Task::new(1, "Weld", 8)]).unwrap();
        store.import_operators(vec![Operator::new(1, "Ana", 40)]).unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let engine = SprintEngine::new(store, FixedClock(today), EngineConfig::default());
        assert!(engine.add_task_to_sprint(1, 1).unwrap());

        let counts = engine
            .store()
            .import_tasks(vec![Task::new(1, "Weld frame", 10), Task::new(2, "Paint", 4)])
            .unwrap();
        assert_eq!(counts, ImportCounts { inserted: 1, updated: 1 });

        let snap = engine.store().snapshot().unwrap();
        let weld = snap.task(1).unwrap();
        assert_eq!(weld.name, "Weld frame");
        assert!(weld.in_sprint);
        assert_eq!(weld.sprint_order, Some(1));
        assert_eq!(weld.planned_start_date, Some(today));
        assert!(!snap.task(2).unwrap().in_sprint);
    }

    #[test]
    fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.snapshot(), Err(StoreError::Serialization(_))));
    }
}
