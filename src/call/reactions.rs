use std::time::Duration;

use tokio::time::Instant;

use crate::rtm::ReactionEvent;

/// Reaction currently floating over the call
#[derive(Debug, Clone, PartialEq)]
pub struct FloatingReaction {
    pub id: u64,
    pub emoji: String,
    pub from: String,
    expires_at: Instant,
}

/// Received reactions, each shown for a fixed time then dropped
#[derive(Debug)]
pub struct ReactionBoard {
    ttl: Duration,
    next_id: u64,
    active: Vec<FloatingReaction>,
}

impl ReactionBoard {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            next_id: 1,
            active: Vec::new(),
        }
    }

    /// Every event becomes its own reaction, duplicates included
    pub fn ingest(&mut self, events: impl IntoIterator<Item = ReactionEvent>) {
        let now = Instant::now();
        for event in events {
            let id = self.next_id;
            self.next_id += 1;
            self.active.push(FloatingReaction {
                id,
                emoji: event.emoji,
                from: event.from_name,
                expires_at: now + self.ttl,
            });
        }
    }

    pub fn prune(&mut self) {
        let now = Instant::now();
        self.active.retain(|r| r.expires_at > now);
    }

    /// Reactions still on screen, oldest first
    pub fn visible(&mut self) -> &[FloatingReaction] {
        self.prune();
        &self.active
    }

    /// When the oldest visible reaction disappears
    pub fn next_expiry(&self) -> Option<Instant> {
        self.active.iter().map(|r| r.expires_at).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reaction(emoji: &str, from: &str) -> ReactionEvent {
        ReactionEvent {
            emoji: emoji.to_string(),
            from_name: from.to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_reaction_disappears_after_ttl() {
        let mut board = ReactionBoard::new(Duration::from_millis(4000));
        board.ingest([reaction("👍", "Alice")]);

        assert_eq!(board.visible().len(), 1);
        assert_eq!(board.visible()[0].from, "Alice");

        tokio::time::advance(Duration::from_millis(3999)).await;
        assert_eq!(board.visible().len(), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(board.visible().is_empty());
        assert_eq!(board.next_expiry(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicates_get_distinct_ids() {
        let mut board = ReactionBoard::new(Duration::from_secs(4));
        board.ingest([reaction("🎉", "Bob"), reaction("🎉", "Bob")]);

        let ids: Vec<u64> = board.visible().iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_staggered_expiry() {
        let mut board = ReactionBoard::new(Duration::from_secs(4));
        board.ingest([reaction("👍", "Alice")]);
        tokio::time::advance(Duration::from_secs(2)).await;
        board.ingest([reaction("❤️", "Bob")]);
        tokio::time::advance(Duration::from_secs(2)).await;

        let visible = board.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].emoji, "❤️");
    }
}
