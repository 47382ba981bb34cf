use std::collections::VecDeque;

use rentdesk_protocol::Module;

use crate::types::Notification;

/// Default number of notifications kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Bounded notification history, newest first.
///
/// Backed by a `VecDeque`. When full, pushing evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct NotificationHistory {
    buf: VecDeque<Notification>,
    capacity: usize,
}

impl NotificationHistory {
    /// Creates an empty history. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepends a notification. Returns the evicted oldest entry, if any.
    pub fn push(&mut self, notification: Notification) -> Option<Notification> {
        let evicted = if self.buf.len() == self.capacity {
            self.buf.pop_back()
        } else {
            None
        };
        self.buf.push_front(notification);
        evicted
    }

    /// Iterates from newest to oldest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Notification> {
        self.buf.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.buf.iter().find(|n| n.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Notification> {
        self.buf.iter_mut().find(|n| n.id == id)
    }

    /// Removes one notification by id.
    pub fn remove(&mut self, id: &str) -> Option<Notification> {
        let pos = self.buf.iter().position(|n| n.id == id)?;
        self.buf.remove(pos)
    }

    /// Removes every notification of one module. Returns how many were removed.
    pub fn remove_module(&mut self, module: Module) -> usize {
        let before = self.buf.len();
        self.buf.retain(|n| n.module != module);
        before - self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

impl Default for NotificationHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
