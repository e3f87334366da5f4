//! Whiteboard delta relay.
//!
//! Merging is owned by the whiteboard library; this module only ships local
//! user changes over the signaling channel and feeds remote ones back into a
//! [`WhiteboardStore`].

pub mod store;

pub use store::RecordStore;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rtm::{BufferCursor, RtmEvent, RtmMultiplexer, WhiteboardEvent};

/// Who produced a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeSource {
    User,
    Remote,
}

/// Record-level diff, keyed by record id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordsDiff {
    #[serde(default)]
    pub added: BTreeMap<String, Value>,
    /// id -> [from, to]
    #[serde(default)]
    pub updated: BTreeMap<String, (Value, Value)>,
    #[serde(default)]
    pub removed: BTreeMap<String, Value>,
}

impl RecordsDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhiteboardChange {
    pub source: ChangeSource,
    pub changes: RecordsDiff,
}

/// Record storage of the whiteboard library
pub trait WhiteboardStore {
    fn put(&mut self, records: Vec<Value>);
    fn remove(&mut self, ids: &[String]);

    /// Apply `f` as a remote merge; changes made inside are not reported as
    /// local user edits.
    fn merge_remote_changes<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Self),
        Self: Sized,
    {
        f(self)
    }
}

/// Apply one remote diff: added and the `to` side of updates are put,
/// removed records are dropped by id.
pub fn apply_change<S: WhiteboardStore>(store: &mut S, change: &WhiteboardChange) {
    let diff = &change.changes;

    if !diff.added.is_empty() {
        store.put(diff.added.values().cloned().collect());
    }
    if !diff.updated.is_empty() {
        store.put(diff.updated.values().map(|(_, to)| to.clone()).collect());
    }
    if !diff.removed.is_empty() {
        let ids: Vec<String> = diff
            .removed
            .iter()
            .map(|(key, record)| {
                record
                    .get("id")
                    .and_then(Value::as_str)
                    .unwrap_or(key)
                    .to_string()
            })
            .collect();
        store.remove(&ids);
    }
}

/// Bridges a room's whiteboard to the shared signaling channel
pub struct WhiteboardSync {
    rtm: Arc<RtmMultiplexer>,
    cursor: BufferCursor<WhiteboardEvent>,
}

impl WhiteboardSync {
    pub fn new(rtm: Arc<RtmMultiplexer>) -> Self {
        let cursor = rtm.whiteboard().cursor();
        Self { rtm, cursor }
    }

    /// Forward a local change. Only user edits are sent, so applying a remote
    /// change never bounces back onto the channel.
    pub async fn on_local_change(&self, change: &WhiteboardChange) -> bool {
        if change.source != ChangeSource::User || change.changes.is_empty() {
            return false;
        }
        match serde_json::to_value(change) {
            Ok(data) => self.rtm.send(&RtmEvent::whiteboard(data)).await,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode whiteboard change");
                false
            }
        }
    }

    /// Apply every remote change received since the last call.
    /// Returns how many were applied.
    pub fn apply_remote<S: WhiteboardStore>(&mut self, store: &mut S) -> usize {
        let mut applied = 0;
        for event in self.cursor.drain_new() {
            match serde_json::from_value::<WhiteboardChange>(event.data) {
                Ok(change) => {
                    store.merge_remote_changes(|s| apply_change(s, &change));
                    applied += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed whiteboard change");
                }
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtm::multiplexer::tests::{login, LoopbackConnector};
    use serde_json::json;
    use std::time::Duration;

    fn shape(id: &str, x: i64) -> Value {
        json!({ "id": id, "typeName": "shape", "x": x })
    }

    async fn connected() -> (Arc<RtmMultiplexer>, LoopbackConnector) {
        let connector = LoopbackConnector::default();
        let rtm = Arc::new(RtmMultiplexer::new("standup"));
        rtm.connect(&connector, login("standup")).await.unwrap();
        (rtm, connector)
    }

    #[test]
    fn test_change_wire_format() {
        let text = r#"{
            "source": "user",
            "changes": {
                "added": { "shape:a": { "id": "shape:a", "x": 1 } },
                "updated": { "shape:b": [ { "id": "shape:b", "x": 1 }, { "id": "shape:b", "x": 2 } ] },
                "removed": {}
            }
        }"#;
        let change: WhiteboardChange = serde_json::from_str(text).unwrap();
        assert_eq!(change.source, ChangeSource::User);
        assert_eq!(change.changes.updated["shape:b"].1["x"], 2);
    }

    #[test]
    fn test_apply_change_to_store() {
        let mut store = RecordStore::new();
        store.put(vec![shape("shape:b", 1), shape("shape:c", 5)]);

        let mut diff = RecordsDiff::default();
        diff.added.insert("shape:a".to_string(), shape("shape:a", 0));
        diff.updated.insert(
            "shape:b".to_string(),
            (shape("shape:b", 1), shape("shape:b", 9)),
        );
        diff.removed.insert("shape:c".to_string(), shape("shape:c", 5));

        apply_change(
            &mut store,
            &WhiteboardChange {
                source: ChangeSource::Remote,
                changes: diff,
            },
        );

        assert_eq!(store.get("shape:a"), Some(&shape("shape:a", 0)));
        assert_eq!(store.get("shape:b").unwrap()["x"], 9);
        assert!(store.get("shape:c").is_none());
    }

    #[tokio::test]
    async fn test_only_user_changes_are_sent() {
        let (rtm, connector) = connected().await;
        let mut server = connector.take_peer();
        let sync = WhiteboardSync::new(rtm);

        let mut store = RecordStore::new();
        let change = store.put_local(vec![shape("shape:a", 3)]);
        assert!(sync.on_local_change(&change).await);

        let remote = WhiteboardChange {
            source: ChangeSource::Remote,
            changes: change.changes.clone(),
        };
        assert!(!sync.on_local_change(&remote).await);

        let frame = RtmEvent::decode(&server.incoming.recv().await.unwrap()).unwrap();
        match frame {
            RtmEvent::Whiteboard(event) => {
                assert_eq!(event.data["changes"]["added"]["shape:a"]["x"], 3);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remote_changes_applied_and_not_echoed() {
        let (rtm, connector) = connected().await;
        let server = connector.take_peer();
        let mut sync = WhiteboardSync::new(rtm);
        let mut store = RecordStore::new();

        let mut diff = RecordsDiff::default();
        diff.added.insert("shape:z".to_string(), shape("shape:z", 7));
        let change = WhiteboardChange {
            source: ChangeSource::User,
            changes: diff,
        };
        server
            .outgoing
            .send(
                RtmEvent::whiteboard(serde_json::to_value(&change).unwrap())
                    .encode()
                    .unwrap(),
            )
            .unwrap();
        server
            .outgoing
            .send(RtmEvent::whiteboard(json!({ "bogus": true })).encode().unwrap())
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(sync.apply_remote(&mut store), 1);
        assert_eq!(store.get("shape:z").unwrap()["x"], 7);
        assert!(store.take_local_changes().is_empty());
    }
}
