// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Routes native event notifications to registered listeners.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{trace, warn};

use platypus_bridge::EventSink;
use platypus_core::types::EventNotification;

use crate::registry::SubscriptionRegistry;

/// Outcome of routing one notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners that returned `Ok`.
    pub delivered: usize,
    /// Listeners that returned an error or panicked.
    pub failed: usize,
}

impl DispatchReport {
    /// True when nobody was subscribed.
    pub fn dropped(&self) -> bool {
        self.delivered == 0 && self.failed == 0
    }
}

/// Stateless fan-out over a shared [`SubscriptionRegistry`].
///
/// Listeners are snapshotted under the registry lock and invoked after it is
/// released, so a listener may subscribe or unsubscribe without deadlocking.
pub struct EventDispatcher {
    registry: Arc<Mutex<SubscriptionRegistry>>,
}

impl EventDispatcher {
    pub fn new(registry: Arc<Mutex<SubscriptionRegistry>>) -> Self {
        Self { registry }
    }

    /// Deliver `notification` to every listener of its event, in
    /// subscription order. A failing listener never stops the rest.
    /// Events nobody listens to are dropped silently; they can race an
    /// in-flight `removeEventListener`.
    pub fn dispatch(&self, notification: &EventNotification) -> DispatchReport {
        let listeners = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners(&notification.event);

        let mut report = DispatchReport::default();
        if listeners.is_empty() {
            trace!(event = %notification.event, "no listeners; notification dropped");
            return report;
        }

        for (handle, listener) in listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(&notification.payload))) {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    warn!(event = %notification.event, %handle, error = %e, "listener failed");
                    report.failed += 1;
                }
                Err(_) => {
                    warn!(event = %notification.event, %handle, "listener panicked");
                    report.failed += 1;
                }
            }
        }
        report
    }
}

impl EventSink for EventDispatcher {
    fn on_native_event(&self, notification: EventNotification) {
        self.dispatch(&notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Listener, ListenerResult};
    use platypus_core::types::EventName;
    use serde_json::{Value, json};

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording(log: &Log, tag: &'static str) -> Listener {
        let log = log.clone();
        Arc::new(move |payload: &Value| -> ListenerResult {
            log.lock().unwrap().push(format!("{tag}:{payload}"));
            Ok(())
        })
    }

    fn setup() -> (Arc<Mutex<SubscriptionRegistry>>, EventDispatcher) {
        let registry = Arc::new(Mutex::new(SubscriptionRegistry::new()));
        (registry.clone(), EventDispatcher::new(registry))
    }

    #[test]
    fn single_subscriber_gets_payload_once() {
        let (registry, dispatcher) = setup();
        let log: Log = Arc::default();
        registry
            .lock()
            .unwrap()
            .subscribe(EventName::from("receive"), recording(&log, "cb"));

        let report = dispatcher.dispatch(&EventNotification::new("receive", json!({"v": 1})));
        assert_eq!(report, DispatchReport { delivered: 1, failed: 0 });
        assert_eq!(*log.lock().unwrap(), vec![r#"cb:{"v":1}"#.to_string()]);
    }

    #[test]
    fn delivery_follows_subscription_order() {
        let (registry, dispatcher) = setup();
        let log: Log = Arc::default();
        {
            let mut reg = registry.lock().unwrap();
            reg.subscribe(EventName::from("receive"), recording(&log, "cb1"));
            reg.subscribe(EventName::from("receive"), recording(&log, "cb2"));
        }

        dispatcher.dispatch(&EventNotification::new("receive", json!(7)));
        assert_eq!(*log.lock().unwrap(), vec!["cb1:7", "cb2:7"]);
    }

    #[test]
    fn unknown_event_is_dropped_silently() {
        let (registry, dispatcher) = setup();
        let log: Log = Arc::default();
        registry
            .lock()
            .unwrap()
            .subscribe(EventName::from("connection"), recording(&log, "cb"));

        let report = dispatcher.dispatch(&EventNotification::new("receive", json!(1)));
        assert!(report.dropped());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn failing_listeners_do_not_block_later_ones() {
        let (registry, dispatcher) = setup();
        let log: Log = Arc::default();
        {
            let mut reg = registry.lock().unwrap();
            reg.subscribe(
                EventName::from("receive"),
                Arc::new(|_: &Value| -> ListenerResult { Err("bad payload".into()) }),
            );
            reg.subscribe(
                EventName::from("receive"),
                Arc::new(|_: &Value| -> ListenerResult { panic!("listener bug") }),
            );
            reg.subscribe(EventName::from("receive"), recording(&log, "last"));
        }

        let report = dispatcher.dispatch(&EventNotification::new("receive", json!(true)));
        assert_eq!(report, DispatchReport { delivered: 1, failed: 2 });
        assert_eq!(*log.lock().unwrap(), vec!["last:true"]);

        // Registry is untouched by the failures.
        let count = registry
            .lock()
            .unwrap()
            .subscriber_count(&EventName::from("receive"));
        assert_eq!(count, 3);
    }

    #[test]
    fn listener_may_unsubscribe_itself_during_dispatch() {
        let (registry, dispatcher) = setup();
        let slot: Arc<Mutex<Option<platypus_core::types::SubscriptionHandle>>> = Arc::default();

        let listener: Listener = {
            let registry = registry.clone();
            let slot = slot.clone();
            Arc::new(move |_: &Value| -> ListenerResult {
                if let Some(handle) = slot.lock().unwrap().take() {
                    registry.lock().unwrap().unsubscribe(handle);
                }
                Ok(())
            })
        };
        let (handle, _) = registry
            .lock()
            .unwrap()
            .subscribe(EventName::from("receive"), listener);
        *slot.lock().unwrap() = Some(handle);

        let first = dispatcher.dispatch(&EventNotification::new("receive", json!(1)));
        let second = dispatcher.dispatch(&EventNotification::new("receive", json!(2)));
        assert_eq!(first.delivered, 1);
        assert!(second.dropped());
    }
}
