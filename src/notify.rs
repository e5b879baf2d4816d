//! User-visible notifications for failed remote operations.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::channel::lock;
use crate::remote::Operation;

pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub operation: Operation,
    pub message: String,
}

impl Notification {
    pub fn info(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            operation,
            message: message.into(),
        }
    }

    pub fn error(operation: Operation, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            operation,
            message: message.into(),
        }
    }
}

/// Sink for non-blocking notifications. Implementations must return quickly.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Bounded in-memory notification queue; the oldest entry is evicted when
/// full. UI layers drain it on their own schedule.
#[derive(Clone, Debug)]
pub struct NotificationLog {
    entries: Arc<Mutex<VecDeque<Notification>>>,
    capacity: usize,
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFICATION_CAPACITY)
    }
}

impl NotificationLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn drain(&self) -> Vec<Notification> {
        lock(&self.entries).drain(..).collect()
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        lock(&self.entries).iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        let mut entries = lock(&self.entries);
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(notification);
    }
}
