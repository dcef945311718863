//! Named event listeners
//!
//! The connection pushes every dispatch into a channel; the router drains it
//! and runs the listeners registered for that event name.

use super::DispatchEvent;
use dashmap::DashMap;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

type Handler = Arc<dyn Fn(DispatchEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Identifies a registered listener for [`EventRouter::off`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Routes dispatch events to listeners by case-insensitive event name
#[derive(Default)]
pub struct EventRouter {
    listeners: DashMap<String, Vec<(ListenerId, Handler)>>,
    next_id: AtomicU64,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async listener for `event`
    pub fn on<F, Fut>(&self, event: &str, handler: F) -> ListenerId
    where
        F: Fn(DispatchEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handler: Handler = Arc::new(move |event| Box::pin(handler(event)));

        self.listeners
            .entry(event.to_lowercase())
            .or_default()
            .push((id, handler));

        tracing::debug!(event = %event, listener = id.0, "Listener registered");
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let key = event.to_lowercase();
        let removed = match self.listeners.get_mut(&key) {
            Some(mut handlers) => {
                let before = handlers.len();
                handlers.retain(|(listener, _)| *listener != id);
                handlers.len() != before
            }
            None => false,
        };
        self.listeners.remove_if(&key, |_, handlers| handlers.is_empty());
        removed
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .get(&event.to_lowercase())
            .map_or(0, |handlers| handlers.len())
    }

    /// Run every listener for this event, one after another
    ///
    /// Returns the number of listeners run.
    pub async fn dispatch(&self, event: DispatchEvent) -> usize {
        // Clone the handlers out so no map guard is held across an await
        let handlers: Vec<Handler> = match self.listeners.get(&event.name.to_lowercase()) {
            Some(entry) => entry.iter().map(|(_, handler)| handler.clone()).collect(),
            None => {
                tracing::trace!(event = %event.name, "No listeners for event");
                return 0;
            }
        };

        for handler in &handlers {
            handler(event.clone()).await;
        }
        handlers.len()
    }

    /// Drain the connection's event channel until it closes
    pub async fn run(self: Arc<Self>, mut events: mpsc::Receiver<DispatchEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(event).await;
        }
        tracing::debug!("Event channel closed");
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("events", &self.listeners.len())
            .finish()
    }
}
