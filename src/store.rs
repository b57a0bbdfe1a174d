// Task collection owner: mutations, views, and write-through persistence

use crate::error::{StorageError, ValidationError};
use crate::filter::Filter;
use crate::storage::{self, KeyValueStore};
use crate::task::{Task, validate_text};
use tracing::{debug, info, warn};

/// Default storage key for the collection
pub const DEFAULT_KEY: &str = "tasks";

/// Result of a mutation that was applied in memory
///
/// `persist_error` is set when the write-through to storage failed. The
/// in-memory change stands either way.
#[derive(Debug)]
pub struct Applied<T> {
    pub value: T,
    pub persist_error: Option<StorageError>,
}

impl<T> Applied<T> {
    pub fn is_saved(&self) -> bool {
        self.persist_error.is_none()
    }
}

/// Outcome of `clear_completed`
#[derive(Debug)]
pub enum ClearOutcome {
    /// No completed tasks; nothing was touched or written
    NothingToClear,
    /// Number of tasks removed
    Cleared(Applied<usize>),
}

/// Active and completed task counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub active: usize,
    pub completed: usize,
}

/// Ordered, newest-first task collection backed by one key of a key-value store
pub struct TaskStore<S: KeyValueStore> {
    storage: S,
    key: String,
    tasks: Vec<Task>,
    editing: Option<String>,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Load the collection stored under `key`
    ///
    /// Missing or corrupt data yields an empty store rather than an error.
    pub fn open(storage: S, key: impl Into<String>) -> Self {
        let key = key.into();
        let tasks = storage::load_tasks(&storage, &key);
        info!(key = %key, count = tasks.len(), "Opened task store");

        Self {
            storage,
            key,
            tasks,
            editing: None,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// All tasks, newest first
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a task at the front of the collection, returning its id
    pub fn add(&mut self, text: &str) -> Result<Applied<String>, ValidationError> {
        let text = validate_text(text)?;
        let task = Task::new(text);
        let id = task.id.clone();

        debug!(id = %id, "Adding task");
        self.tasks.insert(0, task);

        Ok(self.persist(id))
    }

    /// Flip completion of `id`. Returns `None` if no such task exists.
    pub fn toggle(&mut self, id: &str) -> Option<Applied<bool>> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        let completed = task.toggle();

        debug!(id, completed, "Toggled task");
        Some(self.persist(completed))
    }

    /// Replace the text of `id`
    ///
    /// The text is validated before the lookup, so invalid text is reported
    /// even for unknown ids. `Ok(None)` means the id was not found.
    pub fn edit(&mut self, id: &str, text: &str) -> Result<Option<Applied<()>>, ValidationError> {
        let text = validate_text(text)?;

        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        task.set_text(text);
        self.editing = None;

        debug!(id, "Edited task");
        Ok(Some(self.persist(())))
    }

    /// Remove `id`, returning the removed task
    pub fn delete(&mut self, id: &str) -> Option<Applied<Task>> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        let task = self.tasks.remove(index);

        if self.editing.as_deref() == Some(id) {
            self.editing = None;
        }

        debug!(id, "Deleted task");
        Some(self.persist(task))
    }

    /// Remove every completed task
    pub fn clear_completed(&mut self) -> ClearOutcome {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let removed = before - self.tasks.len();

        if removed == 0 {
            return ClearOutcome::NothingToClear;
        }

        if self
            .editing
            .as_ref()
            .is_some_and(|id| !self.tasks.iter().any(|t| &t.id == id))
        {
            self.editing = None;
        }

        info!(removed, "Cleared completed tasks");
        ClearOutcome::Cleared(self.persist(removed))
    }

    fn persist<T>(&mut self, value: T) -> Applied<T> {
        let persist_error = match storage::save_tasks(&mut self.storage, &self.key, &self.tasks) {
            Ok(()) => None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to persist tasks, keeping in-memory state");
                Some(e)
            }
        };

        Applied { value, persist_error }
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Tasks matching `filter`, in collection order
    pub fn filtered_view(&self, filter: Filter) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    pub fn counts(&self) -> Counts {
        self.tasks.iter().fold(Counts::default(), |mut counts, task| {
            if task.completed {
                counts.completed += 1;
            } else {
                counts.active += 1;
            }
            counts
        })
    }

    // ========================================================================
    // Edit mode
    // ========================================================================

    /// Put `id` into edit mode, replacing any previous one. Returns false if
    /// the task does not exist, leaving edit mode unchanged.
    pub fn begin_edit(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.editing = Some(id.to_string());
        true
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Id of the task currently in edit mode
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }
}
