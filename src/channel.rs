//! Session-wide runner event channel.
//!
//! Carries two event kinds to any number of UI regions: changes of the
//! current runner identity, and one-shot requests to show a runner's log.
//! Delivery is synchronous on the publisher's turn, in registration order.
//! A panicking handler is logged and skipped; the rest still receive the
//! event.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Container,
}

impl LogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LogKind::Container => "container",
        }
    }
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShowLog {
    pub kind: LogKind,
    pub pod_name: String,
    pub environment: String,
}

type RunnerHandler = Arc<dyn Fn(Option<&str>) + Send + Sync>;
type ShowLogHandler = Arc<dyn Fn(&ShowLog) + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Topic {
    CurrentRunner,
    ShowLog,
}

struct ChannelInner {
    next_subscription: AtomicU64,
    current_runner: Mutex<Option<String>>,
    runner_handlers: Mutex<Vec<(u64, RunnerHandler)>>,
    show_log_handlers: Mutex<Vec<(u64, ShowLogHandler)>>,
}

impl ChannelInner {
    fn remove(&self, topic: Topic, id: u64) {
        match topic {
            Topic::CurrentRunner => lock(&self.runner_handlers).retain(|(sid, _)| *sid != id),
            Topic::ShowLog => lock(&self.show_log_handlers).retain(|(sid, _)| *sid != id),
        }
    }
}

/// Handle to the process-wide runner identity and its subscribers.
///
/// Create one per UI session and clone it into every toolbar; clones share
/// the same identity and subscriber lists.
#[derive(Clone)]
pub struct RunnerEventChannel {
    inner: Arc<ChannelInner>,
}

impl Default for RunnerEventChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RunnerEventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerEventChannel")
            .field("current_runner", &self.current_runner())
            .field("runner_subscribers", &self.runner_subscriber_count())
            .field("show_log_subscribers", &self.show_log_subscriber_count())
            .finish()
    }
}

impl RunnerEventChannel {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                next_subscription: AtomicU64::new(1),
                current_runner: Mutex::new(None),
                runner_handlers: Mutex::new(Vec::new()),
                show_log_handlers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn current_runner(&self) -> Option<String> {
        lock(&self.inner.current_runner).clone()
    }

    /// Replace the session's runner identity and notify every subscriber.
    pub fn publish_current_runner(&self, name: Option<&str>) {
        *lock(&self.inner.current_runner) = name.map(str::to_owned);
        tracing::debug!(runner = name.unwrap_or("<none>"), "current runner changed");

        let handlers: Vec<RunnerHandler> = lock(&self.inner.runner_handlers)
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            dispatch("current_runner", || handler(name));
        }
    }

    pub fn subscribe_current_runner<F>(&self, handler: F) -> Subscription
    where
        F: Fn(Option<&str>) + Send + Sync + 'static,
    {
        let id = self.next_id();
        lock(&self.inner.runner_handlers).push((id, Arc::new(handler)));
        self.subscription(Topic::CurrentRunner, id)
    }

    pub fn publish_show_log(&self, kind: LogKind, pod_name: &str, environment: &str) {
        let event = ShowLog {
            kind,
            pod_name: pod_name.to_string(),
            environment: environment.to_string(),
        };
        tracing::debug!(kind = %kind, pod = pod_name, environment, "show log requested");

        let handlers: Vec<ShowLogHandler> = lock(&self.inner.show_log_handlers)
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();
        for handler in handlers {
            dispatch("show_log", || handler(&event));
        }
    }

    pub fn subscribe_show_log<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&ShowLog) + Send + Sync + 'static,
    {
        let id = self.next_id();
        lock(&self.inner.show_log_handlers).push((id, Arc::new(handler)));
        self.subscription(Topic::ShowLog, id)
    }

    /// Close the session: clear the runner identity (notifying subscribers if
    /// one was set) and drop every subscriber.
    pub fn end_session(&self) {
        if self.current_runner().is_some() {
            self.publish_current_runner(None);
        }
        lock(&self.inner.runner_handlers).clear();
        lock(&self.inner.show_log_handlers).clear();
    }

    pub fn runner_subscriber_count(&self) -> usize {
        lock(&self.inner.runner_handlers).len()
    }

    pub fn show_log_subscriber_count(&self) -> usize {
        lock(&self.inner.show_log_handlers).len()
    }

    fn next_id(&self) -> u64 {
        self.inner.next_subscription.fetch_add(1, Ordering::Relaxed)
    }

    fn subscription(&self, topic: Topic, id: u64) -> Subscription {
        Subscription {
            channel: Arc::downgrade(&self.inner),
            topic,
            id,
        }
    }
}

/// Registration handle; dropping it removes the handler.
#[must_use = "dropping a Subscription unsubscribes its handler"]
pub struct Subscription {
    channel: Weak<ChannelInner>,
    topic: Topic,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("topic", &self.topic)
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.channel.upgrade() {
            inner.remove(self.topic, self.id);
        }
    }
}

fn dispatch(topic: &'static str, f: impl FnOnce()) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(f)) {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        tracing::warn!(topic, %reason, "runner event subscriber panicked");
    }
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/channel_tests.rs"]
mod tests;
