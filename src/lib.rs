// todostore - Newest-first task list with filtered views and key-value persistence

pub mod error;
pub mod filter;
pub mod session;
pub mod storage;
pub mod store;
pub mod task;

// Re-export main types for convenience
pub use error::{StorageError, ValidationError};
pub use filter::Filter;
pub use session::{Command, Frame, Notification, NotificationKind, Session};
pub use storage::{FileStorage, KeyValueStore, MemoryStorage, load_tasks, save_tasks};
pub use store::{Applied, ClearOutcome, Counts, DEFAULT_KEY, TaskStore};
pub use task::{MAX_TEXT_LEN, Task, generate_id, validate_text};
