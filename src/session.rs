// UI boundary: turns input signals into store calls and render frames

use crate::error::StorageError;
use crate::filter::Filter;
use crate::storage::KeyValueStore;
use crate::store::{Applied, ClearOutcome, Counts, TaskStore};
use crate::task::Task;
use std::fmt;
use tracing::debug;

/// Input signal from the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add(String),
    Toggle(String),
    BeginEdit(String),
    Edit { id: String, text: String },
    CancelEdit,
    Delete(String),
    ClearCompleted,
    SetFilter(Filter),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Success => write!(f, "success"),
            NotificationKind::Error => write!(f, "error"),
            NotificationKind::Info => write!(f, "info"),
        }
    }
}

/// User-facing message emitted after an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }

    fn persist_failed(err: &StorageError) -> Self {
        Self::error(format!("Changes could not be saved: {}", err))
    }
}

/// Everything a renderer needs after one command
#[derive(Debug)]
pub struct Frame<'a> {
    pub filter: Filter,
    pub view: Vec<&'a Task>,
    pub counts: Counts,
    pub editing: Option<&'a str>,
    pub notification: Option<Notification>,
}

/// A task store plus the current view filter
pub struct Session<S: KeyValueStore> {
    store: TaskStore<S>,
    filter: Filter,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(store: TaskStore<S>) -> Self {
        Self {
            store,
            filter: Filter::default(),
        }
    }

    pub fn store(&self) -> &TaskStore<S> {
        &self.store
    }

    /// Apply one command and describe the resulting state
    pub fn handle(&mut self, command: Command) -> Frame<'_> {
        debug!(?command, "Handling command");
        let notification = self.apply(command);
        self.frame(notification)
    }

    /// Current state with no notification
    pub fn render(&self) -> Frame<'_> {
        self.frame(None)
    }

    fn apply(&mut self, command: Command) -> Option<Notification> {
        match command {
            Command::Add(text) => match self.store.add(&text) {
                Ok(applied) => notify(applied, || Some(Notification::success("Task added"))),
                Err(e) => Some(Notification::error(e.to_string())),
            },
            Command::Toggle(id) => self.store.toggle(&id).and_then(|applied| notify(applied, || None)),
            Command::BeginEdit(id) => {
                self.store.begin_edit(&id);
                None
            }
            Command::Edit { id, text } => match self.store.edit(&id, &text) {
                Ok(Some(applied)) => notify(applied, || Some(Notification::success("Task updated"))),
                Ok(None) => None,
                Err(e) => Some(Notification::error(e.to_string())),
            },
            Command::CancelEdit => {
                self.store.cancel_edit();
                None
            }
            Command::Delete(id) => self
                .store
                .delete(&id)
                .and_then(|applied| notify(applied, || Some(Notification::info("Task deleted")))),
            Command::ClearCompleted => match self.store.clear_completed() {
                ClearOutcome::NothingToClear => Some(Notification::info("No completed tasks to clear")),
                ClearOutcome::Cleared(applied) => {
                    let removed = applied.value;
                    notify(applied, || {
                        Some(Notification::success(format!("{} completed task(s) deleted", removed)))
                    })
                }
            },
            Command::SetFilter(filter) => {
                self.filter = filter;
                None
            }
        }
    }

    fn frame(&self, notification: Option<Notification>) -> Frame<'_> {
        Frame {
            filter: self.filter,
            view: self.store.filtered_view(self.filter),
            counts: self.store.counts(),
            editing: self.store.editing(),
            notification,
        }
    }
}

/// A failed write outranks whatever the operation would have reported
fn notify<T>(applied: Applied<T>, on_saved: impl FnOnce() -> Option<Notification>) -> Option<Notification> {
    match &applied.persist_error {
        Some(e) => Some(Notification::persist_failed(e)),
        None => on_saved(),
    }
}
