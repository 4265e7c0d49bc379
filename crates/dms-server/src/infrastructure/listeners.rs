//! Change-listener registry.
//!
//! Listeners are per agent (client process) and per [`ListenerKind`].  All
//! kinds an agent subscribes to in one call share a single channel, so a
//! client sees screen and display events in the order they were published.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use dms_core::protocol::AgentId;
use dms_core::{ChangeEvent, DmError, DmResult, ListenerKind};

/// Outbound side of every change notification.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: ChangeEvent);
}

#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<HashMap<(AgentId, ListenerKind), UnboundedSender<ChangeEvent>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes `agent` to every kind in `kinds`.
    ///
    /// # Errors
    ///
    /// - [`DmError::InvalidParam`] when `kinds` is empty.
    /// - [`DmError::StateConflict`] when `agent` already listens to one of
    ///   the kinds; nothing is registered in that case.
    pub fn register(
        &self,
        agent: AgentId,
        kinds: &[ListenerKind],
    ) -> DmResult<UnboundedReceiver<ChangeEvent>> {
        if kinds.is_empty() {
            return Err(DmError::invalid("no listener kinds given"));
        }
        let mut listeners = self.lock();
        if let Some(kind) = kinds.iter().find(|k| listeners.contains_key(&(agent, **k))) {
            return Err(DmError::StateConflict(format!(
                "agent {agent} already has a {kind:?} listener"
            )));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        for kind in kinds {
            listeners.insert((agent, *kind), tx.clone());
        }
        debug!(%agent, ?kinds, "listener registered");
        Ok(rx)
    }

    pub fn unregister(&self, agent: AgentId, kind: ListenerKind) -> bool {
        self.lock().remove(&(agent, kind)).is_some()
    }

    /// Drops every registration of `agent`; returns how many were removed.
    pub fn unregister_agent(&self, agent: AgentId) -> usize {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(owner, _), _| *owner != agent);
        before - listeners.len()
    }

    pub fn listener_count(&self, kind: ListenerKind) -> usize {
        self.lock().keys().filter(|(_, k)| *k == kind).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(AgentId, ListenerKind), UnboundedSender<ChangeEvent>>> {
        self.listeners
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl EventSink for ListenerRegistry {
    fn publish(&self, event: ChangeEvent) {
        let kind = event.listener_kind();
        let mut listeners = self.lock();
        let mut closed = Vec::new();
        for ((agent, k), tx) in listeners.iter() {
            if *k == kind && tx.send(event.clone()).is_err() {
                closed.push((*agent, *k));
            }
        }
        for key in closed {
            warn!(agent = %key.0, "dropping listener with closed channel");
            listeners.remove(&key);
        }
    }
}
