use std::sync::{Arc, RwLock};

use tokio::sync::Notify;

struct BufferInner<T> {
    items: RwLock<Vec<T>>,
    notify: Notify,
}

/// Append-only event log shared between the receive loop and its consumers.
///
/// Each consumer reads through its own [`BufferCursor`], so several views can
/// drain the same buffer independently.
pub struct EventBuffer<T> {
    inner: Arc<BufferInner<T>>,
}

impl<T> Clone for EventBuffer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone> EventBuffer<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BufferInner {
                items: RwLock::new(Vec::new()),
                notify: Notify::new(),
            }),
        }
    }

    pub fn push(&self, item: T) {
        match self.inner.items.write() {
            Ok(mut items) => items.push(item),
            Err(poisoned) => poisoned.into_inner().push(item),
        }
        self.inner.notify.notify_waiters();
    }

    pub fn len(&self) -> usize {
        self.read(|items| items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.read(|items| items.to_vec())
    }

    /// Cursor positioned at the start of the log
    pub fn cursor(&self) -> BufferCursor<T> {
        BufferCursor {
            buffer: self.clone(),
            position: 0,
        }
    }

    /// Cursor that only sees items appended from now on
    pub fn cursor_at_end(&self) -> BufferCursor<T> {
        BufferCursor {
            buffer: self.clone(),
            position: self.len(),
        }
    }

    fn read<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        match self.inner.items.read() {
            Ok(items) => f(&items),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

impl<T: Clone> Default for EventBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct BufferCursor<T> {
    buffer: EventBuffer<T>,
    position: usize,
}

impl<T: Clone> BufferCursor<T> {
    /// Items appended since the previous drain
    pub fn drain_new(&mut self) -> Vec<T> {
        let position = self.position;
        let batch = self
            .buffer
            .read(|items| items.get(position..).map(<[T]>::to_vec).unwrap_or_default());
        self.position += batch.len();
        batch
    }

    /// Wait until at least one new item is available, then drain
    pub async fn next_batch(&mut self) -> Vec<T> {
        let inner = self.buffer.inner.clone();
        loop {
            // registered before the check so a concurrent push cannot be missed
            let notified = inner.notify.notified();
            let batch = self.drain_new();
            if !batch.is_empty() {
                return batch;
            }
            notified.await;
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }
}
