use std::collections::BTreeSet;

use crate::rtm::RaiseHandEvent;

/// Account ids of participants with a raised hand
#[derive(Debug, Default, Clone)]
pub struct RaisedHands {
    raised: BTreeSet<String>,
}

impl RaisedHands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &RaiseHandEvent) {
        self.set(&event.user_id, event.is_raised);
    }

    pub fn set(&mut self, user_id: &str, raised: bool) {
        if raised {
            self.raised.insert(user_id.to_string());
        } else {
            self.raised.remove(user_id);
        }
    }

    pub fn is_raised(&self, user_id: &str) -> bool {
        self.raised.contains(user_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.raised.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.raised.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raised.is_empty()
    }
}
