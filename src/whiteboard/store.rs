use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use crate::error::Result;
use crate::whiteboard::{ChangeSource, RecordsDiff, WhiteboardChange, WhiteboardStore};

/// Local persistence key of a room's board
pub fn persistence_key(room: &str) -> String {
    format!("tldraw-{}", room)
}

/// In-memory record store.
///
/// Direct `put`/`remove` calls are user edits and queue a change for
/// [`RecordStore::take_local_changes`]; edits made inside
/// `merge_remote_changes` are not queued.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: HashMap<String, Value>,
    merging_remote: bool,
    pending: Vec<WhiteboardChange>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&Value> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records sorted by id
    pub fn records(&self) -> Vec<&Value> {
        let mut ids: Vec<&String> = self.records.keys().collect();
        ids.sort();
        ids.into_iter().filter_map(|id| self.records.get(id)).collect()
    }

    /// Put records as a user edit and return the resulting change instead of
    /// queueing it.
    pub fn put_local(&mut self, records: Vec<Value>) -> WhiteboardChange {
        WhiteboardChange {
            source: ChangeSource::User,
            changes: self.put_records(records),
        }
    }

    /// Remove records as a user edit and return the resulting change.
    pub fn remove_local(&mut self, ids: &[String]) -> WhiteboardChange {
        WhiteboardChange {
            source: ChangeSource::User,
            changes: self.remove_records(ids),
        }
    }

    pub fn take_local_changes(&mut self) -> Vec<WhiteboardChange> {
        std::mem::take(&mut self.pending)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };
        let records: Vec<Value> = serde_json::from_str(&text)?;
        let mut store = Self::new();
        store.put_records(records);
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string(&self.records())?;
        std::fs::write(path, text)?;
        Ok(())
    }

    fn put_records(&mut self, records: Vec<Value>) -> RecordsDiff {
        let mut diff = RecordsDiff::default();
        for record in records {
            let Some(id) = record.get("id").and_then(Value::as_str).map(str::to_string) else {
                tracing::warn!("Ignoring whiteboard record without an id");
                continue;
            };
            match self.records.insert(id.clone(), record.clone()) {
                Some(previous) if previous == record => {}
                Some(previous) => {
                    diff.updated.insert(id, (previous, record));
                }
                None => {
                    diff.added.insert(id, record);
                }
            }
        }
        diff
    }

    fn remove_records(&mut self, ids: &[String]) -> RecordsDiff {
        let mut diff = RecordsDiff::default();
        for id in ids {
            if let Some(record) = self.records.remove(id) {
                diff.removed.insert(id.clone(), record);
            }
        }
        diff
    }

    fn queue(&mut self, changes: RecordsDiff) {
        if self.merging_remote || changes.is_empty() {
            return;
        }
        self.pending.push(WhiteboardChange {
            source: ChangeSource::User,
            changes,
        });
    }
}

impl WhiteboardStore for RecordStore {
    fn put(&mut self, records: Vec<Value>) {
        let diff = self.put_records(records);
        self.queue(diff);
    }

    fn remove(&mut self, ids: &[String]) {
        let diff = self.remove_records(ids);
        self.queue(diff);
    }

    fn merge_remote_changes<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
        Self: Sized,
    {
        self.merging_remote = true;
        f(self);
        self.merging_remote = false;
    }
}
