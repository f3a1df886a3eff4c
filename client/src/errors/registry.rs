use crate::config::Config;
use crate::errors::messages;
use crate::errors::types::{ErrorCategory, ErrorEvent, ErrorId, ErrorSnapshot};
use crate::time::now_millis;
use indexmap::IndexMap;
use metrics::counter;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// Registry configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Quiet period after the last change before non-critical events are dropped
    pub auto_dismiss_after: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            auto_dismiss_after: Duration::from_millis(5000),
        }
    }
}

impl From<&Config> for RegistryConfig {
    fn from(config: &Config) -> Self {
        Self {
            auto_dismiss_after: config.errors.auto_dismiss_after,
        }
    }
}

struct Inner {
    /// Insertion-ordered
    events: IndexMap<ErrorId, ErrorEvent>,
    visible: bool,
    /// Bumped on every reschedule; a timer only fires for its own generation
    generation: u64,
    expiry: Option<JoinHandle<()>>,
}

impl Inner {
    fn snapshot(&self) -> ErrorSnapshot {
        ErrorSnapshot {
            events: self.events.values().cloned().collect(),
            visible: self.visible,
        }
    }
}

struct Shared {
    inner: RwLock<Inner>,
    updates: watch::Sender<ErrorSnapshot>,
    config: RegistryConfig,
}

impl Shared {
    fn publish(&self, inner: &Inner) {
        self.updates.send_replace(inner.snapshot());
    }

    /// Restart the expiry countdown after a change to the event list
    fn reschedule(self: &Arc<Self>, inner: &mut Inner) {
        inner.generation += 1;
        if let Some(previous) = inner.expiry.take() {
            previous.abort();
        }

        if !inner.events.values().any(|e| e.category.auto_dismisses()) {
            return;
        }

        let weak: Weak<Shared> = Arc::downgrade(self);
        let generation = inner.generation;
        let delay = self.config.auto_dismiss_after;
        inner.expiry = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(shared) = weak.upgrade() {
                shared.expire(generation).await;
            }
        }));
    }

    async fn expire(self: &Arc<Self>, generation: u64) {
        let mut inner = self.inner.write().await;
        if inner.generation != generation {
            return;
        }
        // This task's own handle; let it finish instead of aborting it
        drop(inner.expiry.take());

        let before = inner.events.len();
        inner.events.retain(|_, e| !e.category.auto_dismisses());
        let expired = before - inner.events.len();
        if expired == 0 {
            return;
        }

        if inner.events.is_empty() {
            inner.visible = false;
        }
        self.reschedule(&mut inner);
        self.publish(&inner);

        counter!("taskboard_errors_expired_total").increment(expired as u64);
        debug!("Auto-dismissed {} error notifications", expired);
    }
}

/// Ordered collection of error notifications
///
/// Non-critical notifications are dropped once the list has been left alone for
/// `auto_dismiss_after`; auth and permission ones stay until removed. Share as
/// `Arc<ErrorRegistry>`; the pending timer is cancelled when the registry drops.
pub struct ErrorRegistry {
    shared: Arc<Shared>,
}

impl ErrorRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        let (updates, _) = watch::channel(ErrorSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                inner: RwLock::new(Inner {
                    events: IndexMap::new(),
                    visible: false,
                    generation: 0,
                    expiry: None,
                }),
                updates,
                config,
            }),
        }
    }

    /// Append a notification and show the registry
    pub async fn add_error(
        &self,
        category: ErrorCategory,
        action: &str,
        component: Option<&str>,
        custom_message: Option<&str>,
    ) -> ErrorId {
        let event = ErrorEvent {
            id: Uuid::new_v4(),
            category,
            message: messages::resolve(category, action, custom_message),
            component: component.map(str::to_string),
            action: Some(action.to_string()),
            created_at: now_millis(),
        };
        let id = event.id;

        debug!(
            "Error added: {}/{} from {:?}: {}",
            category, action, event.component, event.message
        );
        counter!("taskboard_errors_reported_total", "category" => category.as_str()).increment(1);

        let mut inner = self.shared.inner.write().await;
        inner.events.insert(id, event);
        inner.visible = true;
        self.shared.reschedule(&mut inner);
        self.shared.publish(&inner);

        id
    }

    /// Remove one notification. Returns whether it was present.
    pub async fn remove_error(&self, id: ErrorId) -> bool {
        let mut inner = self.shared.inner.write().await;
        if inner.events.shift_remove(&id).is_none() {
            return false;
        }

        if inner.events.is_empty() {
            inner.visible = false;
        }
        self.shared.reschedule(&mut inner);
        self.shared.publish(&inner);
        true
    }

    pub async fn clear_errors(&self) {
        let mut inner = self.shared.inner.write().await;
        inner.events.clear();
        inner.visible = false;
        self.shared.reschedule(&mut inner);
        self.shared.publish(&inner);
    }

    /// Show or hide without touching the stored notifications
    pub async fn set_visibility(&self, visible: bool) {
        let mut inner = self.shared.inner.write().await;
        inner.visible = visible;
        self.shared.publish(&inner);
    }

    pub async fn snapshot(&self) -> ErrorSnapshot {
        self.shared.inner.read().await.snapshot()
    }

    /// Receive a snapshot after every change, including timer-driven ones
    pub fn subscribe(&self) -> watch::Receiver<ErrorSnapshot> {
        self.shared.updates.subscribe()
    }
}

impl Default for ErrorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ErrorRegistry {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.shared.inner.try_write()
            && let Some(handle) = inner.expiry.take()
        {
            handle.abort();
        }
    }
}
