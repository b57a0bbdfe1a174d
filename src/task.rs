// Task data model

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum task text length, in characters, after trimming
pub const MAX_TEXT_LEN: usize = 100;

/// A single to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create an incomplete task. `text` must already be validated.
    pub(crate) fn new(text: String) -> Self {
        Task {
            id: generate_id(),
            text,
            completed: false,
            created_at: Utc::now(),
            completed_at: None,
            updated_at: None,
        }
    }

    /// Flip completion, keeping `completed_at` in step
    pub(crate) fn toggle(&mut self) -> bool {
        self.completed = !self.completed;
        self.completed_at = if self.completed { Some(Utc::now()) } else { None };
        self.completed
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
        self.updated_at = Some(Utc::now());
    }

    /// True if the task could have been produced by the store's own mutations.
    /// Used to reject hand-edited or foreign entries when loading.
    pub fn is_well_formed(&self) -> bool {
        !self.id.is_empty()
            && validate_text(&self.text).is_ok_and(|t| t == self.text)
            && self.completed == self.completed_at.is_some()
    }
}

/// Trim `text` and check it against the length rules
pub fn validate_text(text: &str) -> Result<String, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty);
    }

    let len = trimmed.chars().count();
    if len > MAX_TEXT_LEN {
        return Err(ValidationError::TooLong { len, max: MAX_TEXT_LEN });
    }

    Ok(trimmed.to_string())
}

/// Fresh task identifier: millisecond timestamp followed by random bits (UUIDv7)
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_validate_text_trims() {
        assert_eq!(validate_text("  Buy milk \n").unwrap(), "Buy milk");
    }

    #[test]
    fn test_validate_text_empty() {
        assert_eq!(validate_text(""), Err(ValidationError::Empty));
        assert_eq!(validate_text(" \t "), Err(ValidationError::Empty));
    }

    #[test]
    fn test_validate_text_length_boundary() {
        assert!(validate_text(&"a".repeat(100)).is_ok());
        assert_eq!(
            validate_text(&"a".repeat(101)),
            Err(ValidationError::TooLong { len: 101, max: 100 })
        );
        // Surrounding whitespace does not count
        assert!(validate_text(&format!("  {}  ", "a".repeat(100))).is_ok());
    }

    #[test]
    fn test_validate_text_counts_chars_not_bytes() {
        let text = "é".repeat(100);
        assert!(text.len() > 100);
        assert!(validate_text(&text).is_ok());
    }

    #[test]
    fn test_generate_id_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_task_new() {
        let task = Task::new("Walk dog".to_string());
        assert_eq!(task.text, "Walk dog");
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
        assert!(task.updated_at.is_none());
        assert!(task.is_well_formed());
    }

    #[test]
    fn test_toggle_tracks_completed_at() {
        let mut task = Task::new("Walk dog".to_string());

        assert!(task.toggle());
        assert!(task.completed_at.is_some());
        assert!(task.is_well_formed());

        assert!(!task.toggle());
        assert!(task.completed_at.is_none());
        assert!(task.is_well_formed());
    }

    #[test]
    fn test_set_text_touches_updated_at() {
        let mut task = Task::new("Walk dog".to_string());
        let created = task.created_at;
        task.set_text("Walk cat".to_string());

        assert_eq!(task.text, "Walk cat");
        assert_eq!(task.created_at, created);
        assert!(task.updated_at.is_some());
    }

    #[test]
    fn test_serialization_field_names() {
        let mut task = Task::new("Walk dog".to_string());
        let json = serde_json::to_value(&task).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("id"));
        assert!(obj.contains_key("createdAt"));
        assert!(!obj.contains_key("completedAt"));
        assert!(!obj.contains_key("updatedAt"));
        assert_eq!(obj["completed"], false);

        task.toggle();
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("completedAt").is_some());
    }

    #[test]
    fn test_is_well_formed_rejects_inconsistent() {
        let mut task = Task::new("Walk dog".to_string());
        task.completed = true;
        assert!(!task.is_well_formed());

        let mut task = Task::new("Walk dog".to_string());
        task.text = "  padded ".to_string();
        assert!(!task.is_well_formed());

        let mut task = Task::new("Walk dog".to_string());
        task.id.clear();
        assert!(!task.is_well_formed());
    }
}
