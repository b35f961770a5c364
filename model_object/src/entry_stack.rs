//! Batches of entries

use crate::entry::Entry;
use crate::errors::{ModelhausError, Result};
use crate::model::Model;
use serde_json::Value;

/// Ordered entries handled as one unit.
///
/// A batch write or save locks the stack; while locked, no entries can be
/// added. Saving unlocks it again.
#[derive(Debug, Default)]
pub struct EntryStack {
    entries: Vec<Entry>,
    locked: bool,
}

impl EntryStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the stack is locked
    pub fn add_entry(&mut self, entry: Entry) -> bool {
        if self.locked {
            return false;
        }
        self.entries.push(entry);
        true
    }

    /// Returns how many entries were added
    pub fn add_entries(&mut self, entries: impl IntoIterator<Item = Entry>) -> usize {
        if self.locked {
            return 0;
        }
        let before = self.entries.len();
        self.entries.extend(entries);
        self.entries.len() - before
    }

    /// Value of `field` in every entry, null where unset
    pub fn get(&self, field: &str) -> Vec<Value> {
        self.entries
            .iter()
            .map(|e| e.get(field).cloned().unwrap_or(Value::Null))
            .collect()
    }

    /// Write `value` to `field` of every entry; stops at the first failure
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> Result<()> {
        self.locked = true;
        let value = value.into();
        for entry in &mut self.entries {
            entry.set_field(field, value.clone())?;
        }
        Ok(())
    }

    /// Save every entry through `model`. Failures are reported and
    /// collected with the index of the failing entry; the remaining entries
    /// are still saved.
    pub async fn save(&mut self, model: &mut Model) -> Vec<(usize, ModelhausError)> {
        self.locked = true;
        let mut failures = Vec::new();

        for (index, entry) in self.entries.iter_mut().enumerate() {
            if let Err(e) = entry.save(model).await {
                model
                    .context()
                    .report(model.model_name(), "entry stack save", &e);
                failures.push((index, e));
            }
        }

        self.locked = false;
        failures
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{model, row, ScriptedBackend};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_get_collects_values() {
        let backend = Arc::new(ScriptedBackend::new());
        let user = model(&backend, "user").await;

        let mut stack = EntryStack::new();
        stack.add_entry(user.entry(row(json!({"user_id": 1, "user_name": "Ann"}))));
        stack.add_entry(user.entry(row(json!({"user_id": 2}))));

        assert_eq!(stack.get("user_name"), vec![json!("Ann"), json!(null)]);
        assert_eq!(stack.len(), 2);
    }

    #[tokio::test]
    async fn test_set_locks_until_save() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut user = model(&backend, "user").await;

        let mut stack = EntryStack::new();
        stack.add_entries(vec![
            user.entry(row(json!({"user_id": 1, "user_email": "a@example.com"}))),
            user.entry(row(json!({"user_id": 2, "user_email": "b@example.com"}))),
        ]);

        stack.set("user_status", "archived").unwrap();
        assert!(stack.is_locked());
        assert!(!stack.add_entry(user.entry(row(json!({"user_id": 3})))));
        assert_eq!(stack.len(), 2);

        let failures = stack.save(&mut user).await;
        assert!(failures.is_empty());
        assert!(!stack.is_locked());
        assert_eq!(backend.writes().len(), 2);
        assert!(stack.add_entry(user.entry(row(json!({"user_id": 3})))));
    }

    #[tokio::test]
    async fn test_set_propagates_first_failure() {
        let backend = Arc::new(ScriptedBackend::new());
        let user = model(&backend, "user").await;

        let mut stack = EntryStack::new();
        stack.add_entry(user.entry(row(json!({"user_id": 1}))));

        let result = stack.set("user_age", "old");
        assert!(matches!(result, Err(ModelhausError::InvalidField(_))));
        assert!(stack.is_locked());
    }

    #[tokio::test]
    async fn test_save_continues_after_failure() {
        let backend = Arc::new(ScriptedBackend::new());
        let mut user = model(&backend, "user").await;

        let mut stack = EntryStack::new();
        // missing the required email: the save is refused
        stack.add_entry(user.entry(row(json!({"user_id": 1}))));
        stack.add_entry(user.entry(row(json!({"user_id": 2, "user_email": "b@example.com"}))));
        stack.set("user_name", "Same").unwrap();

        let failures = stack.save(&mut user).await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, 0);
        assert!(matches!(failures[0].1, ModelhausError::InvalidData(_)));
        assert_eq!(backend.writes().len(), 1);
    }
}
