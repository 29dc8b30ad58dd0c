// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Event subscription registry.
//
// Tracks local listeners per event name and reports the edges the native
// peer cares about: an event becomes Active when its first listener arrives
// and Inactive when its last one leaves. Everything in between stays local.
// The registry is plain state; issuing the native commands for each edge is
// the controller's job.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use platypus_core::types::{EventName, SubscriptionHandle};

/// Error type a listener may return. It is logged and otherwise ignored.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

pub type ListenerResult = std::result::Result<(), ListenerError>;

/// Callback invoked with each event payload.
pub type Listener = Arc<dyn Fn(&Value) -> ListenerResult + Send + Sync>;

/// Per-event state change caused by a subscribe/unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// First listener for this event (0 → 1).
    Activated(EventName),
    /// Last listener for this event left (1 → 0).
    Deactivated(EventName),
    /// Subscriber count changed without crossing zero.
    Unchanged,
}

struct Entry {
    handle: SubscriptionHandle,
    listener: Listener,
}

/// Listener table keyed by event name. Insertion order is delivery order.
#[derive(Default)]
pub struct SubscriptionRegistry {
    next_handle: u64,
    /// Only events with at least one listener have an entry here.
    by_event: HashMap<EventName, Vec<Entry>>,
    index: HashMap<SubscriptionHandle, EventName>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` under `event`. Always succeeds.
    pub fn subscribe(
        &mut self,
        event: EventName,
        listener: Listener,
    ) -> (SubscriptionHandle, Transition) {
        self.next_handle += 1;
        let handle = SubscriptionHandle::from_raw(self.next_handle);

        let entries = self.by_event.entry(event.clone()).or_default();
        let transition = if entries.is_empty() {
            Transition::Activated(event.clone())
        } else {
            Transition::Unchanged
        };
        entries.push(Entry { handle, listener });
        self.index.insert(handle, event);

        (handle, transition)
    }

    /// Remove the listener behind `handle`. `None` if it was not registered
    /// (already removed, cleared, or never issued here).
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> Option<Transition> {
        let event = self.index.remove(&handle)?;
        let entries = self.by_event.get_mut(&event)?;
        entries.retain(|entry| entry.handle != handle);

        if entries.is_empty() {
            self.by_event.remove(&event);
            Some(Transition::Deactivated(event))
        } else {
            Some(Transition::Unchanged)
        }
    }

    /// Snapshot of the listeners for `event`, in subscription order.
    pub fn listeners(&self, event: &EventName) -> Vec<(SubscriptionHandle, Listener)> {
        self.by_event
            .get(event)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| (entry.handle, entry.listener.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self, event: &EventName) -> usize {
        self.by_event.get(event).map_or(0, Vec::len)
    }

    pub fn is_active(&self, event: &EventName) -> bool {
        self.by_event.contains_key(event)
    }

    /// Event names with at least one listener, sorted.
    pub fn active_events(&self) -> Vec<EventName> {
        let mut events: Vec<_> = self.by_event.keys().cloned().collect();
        events.sort();
        events
    }

    pub fn event_of(&self, handle: SubscriptionHandle) -> Option<&EventName> {
        self.index.get(&handle)
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Drop every subscription. Returns the events that were active, i.e.
    /// the ones whose native registration now needs undoing.
    pub fn clear(&mut self) -> Vec<EventName> {
        let events = self.active_events();
        self.by_event.clear();
        self.index.clear();
        events
    }
}
