// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Public surface of the controller plugin: commands plus handle-based event
// listeners with edge-triggered native registration.
//
// The native peer is told about an event only when its local subscriber
// count crosses zero. Subscribe/unsubscribe calls are serialised through
// `registration` so that an add and a remove for the same event always
// reach the peer in the order the local state changed. Event dispatch never
// takes that gate; it only needs a brief registry lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use platypus_bridge::{BridgeTransport, EventSink};
use platypus_core::config::BridgeConfig;
use platypus_core::error::Result;
use platypus_core::types::{CommandResult, EventName, SubscriptionHandle};

use crate::client::CommandClient;
use crate::dispatcher::EventDispatcher;
use crate::registry::{Listener, ListenerResult, SubscriptionRegistry, Transition};

/// Entry point for callers: owns the command client, the listener registry
/// and the gate that keeps native registration in step with it.
pub struct Controller {
    client: CommandClient,
    registry: Arc<Mutex<SubscriptionRegistry>>,
    registration: tokio::sync::Mutex<()>,
}

impl Controller {
    /// Wrap `transport` and attach the event dispatcher to it.
    pub fn new(transport: Arc<dyn BridgeTransport>, config: &BridgeConfig) -> Self {
        let registry = Arc::new(Mutex::new(SubscriptionRegistry::new()));
        let dispatcher: Arc<dyn EventSink> = Arc::new(EventDispatcher::new(registry.clone()));
        transport.attach(dispatcher);

        info!(
            transport = transport.transport_name(),
            service = %config.service,
            "controller bridge ready"
        );

        Self {
            client: CommandClient::new(transport, config),
            registry,
            registration: tokio::sync::Mutex::new(()),
        }
    }

    pub fn client(&self) -> &CommandClient {
        &self.client
    }

    pub async fn get_version(&self) -> Result<String> {
        self.client.get_version().await
    }

    pub async fn is_connected(&self) -> Result<bool> {
        self.client.is_connected().await
    }

    pub async fn send(&self, message: Value) -> Result<CommandResult> {
        self.client.send(message).await
    }

    /// Subscribe `listener` to `event`.
    ///
    /// The first listener for an event issues one native `addEventListener`
    /// and is only recorded once the peer accepts it. A rejection is returned
    /// with nothing recorded, and so is a caller that gives up mid-flight.
    /// Later listeners join locally without a round trip.
    #[instrument(skip_all, fields(event))]
    pub async fn add_event_listener<F>(
        &self,
        event: impl Into<EventName>,
        listener: F,
    ) -> Result<SubscriptionHandle>
    where
        F: Fn(&Value) -> ListenerResult + Send + Sync + 'static,
    {
        let event = event.into();
        tracing::Span::current().record("event", event.as_str());
        let listener: Listener = Arc::new(listener);

        let _gate = self.registration.lock().await;
        let active = self.registry().is_active(&event);
        if !active {
            if let Err(e) = self.client.register(&event).await {
                warn!(error = %e, "native registration failed");
                return Err(e);
            }
            info!("native listener registered");
        }

        let (handle, _) = self.registry().subscribe(event, listener);
        debug!(%handle, "listener added");
        Ok(handle)
    }

    /// Drop the listener behind `handle`. Unknown or already removed
    /// handles are a no-op. The last listener for an event issues one
    /// native `removeEventListener`; local delivery stops even if that fails.
    #[instrument(skip(self))]
    pub async fn remove_event_listener(&self, handle: SubscriptionHandle) -> Result<()> {
        let _gate = self.registration.lock().await;
        let transition = self.registry().unsubscribe(handle);

        match transition {
            None => {
                debug!("handle not registered; nothing to remove");
                Ok(())
            }
            Some(Transition::Deactivated(event)) => {
                self.client.deregister(&event).await?;
                info!(%event, "native listener removed");
                Ok(())
            }
            Some(_) => Ok(()),
        }
    }

    pub fn subscriber_count(&self, event: impl Into<EventName>) -> usize {
        self.registry().subscriber_count(&event.into())
    }

    pub fn active_events(&self) -> Vec<EventName> {
        self.registry().active_events()
    }

    /// Drop every listener, undo each native registration, then close the
    /// transport. Later commands fail with `Closed`.
    ///
    /// Every deregistration is attempted; the first failure is returned.
    pub async fn shutdown(&self) -> Result<()> {
        let _gate = self.registration.lock().await;
        let events = self.registry().clear();
        info!(active = events.len(), "controller shutting down");

        let mut first_error = None;
        for event in events {
            if let Err(e) = self.client.deregister(&event).await {
                warn!(%event, error = %e, "native deregistration failed during shutdown");
                first_error.get_or_insert(e);
            }
        }

        self.client.transport().close();
        first_error.map_or(Ok(()), Err)
    }

    fn registry(&self) -> MutexGuard<'_, SubscriptionRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
