// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-process bridge transport.
//
// The client half (`ChannelTransport`) pushes each command into a bounded
// mailbox together with a oneshot reply slot. The host half (`NativePeer`)
// pops requests, resolves them in whatever order it likes, and pushes
// events through an `EventEmitter`. Every request carries its own reply
// slot, so results never cross between callers even when the peer answers
// out of order. The request id only exists for logs and host bookkeeping.
//
// Closing flips a watch flag that every in-flight `dispatch` also waits on,
// so commands the peer still holds resolve as abandoned at teardown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, trace};

use platypus_core::error::{PlatypusError, Result};
use platypus_core::types::{Command, CommandResult, EventName, EventNotification};

use crate::traits::{BridgeTransport, EventSink};

type SinkSlot = Arc<Mutex<Option<Arc<dyn EventSink>>>>;

/// One command waiting for the native peer to answer it.
#[derive(Debug)]
pub struct BridgeRequest {
    pub id: u64,
    pub service: String,
    pub command: Command,
    reply: oneshot::Sender<CommandResult>,
}

impl BridgeRequest {
    /// Deliver the outcome. Returns false if the caller has gone away
    /// (timed out or dropped its future).
    pub fn resolve(self, result: CommandResult) -> bool {
        let delivered = self.reply.send(result).is_ok();
        if !delivered {
            debug!(request_id = self.id, "caller gone before resolution");
        }
        delivered
    }

    pub fn succeed(self, payload: Value) -> bool {
        self.resolve(CommandResult::Success(payload))
    }

    pub fn fail(self, payload: Value) -> bool {
        self.resolve(CommandResult::Failure(payload))
    }
}

/// Client half of the in-process bridge.
pub struct ChannelTransport {
    requests: Mutex<Option<mpsc::Sender<BridgeRequest>>>,
    next_id: AtomicU64,
    sink: SinkSlot,
    closed: watch::Sender<bool>,
}

/// Host half of the in-process bridge, held by whoever plays the native peer.
pub struct NativePeer {
    requests: mpsc::Receiver<BridgeRequest>,
    emitter: EventEmitter,
}

/// Cloneable handle for pushing events from the native side.
#[derive(Clone)]
pub struct EventEmitter {
    sink: SinkSlot,
}

impl ChannelTransport {
    /// Create a connected transport/peer pair with a mailbox of `capacity`.
    pub fn pair(capacity: usize) -> (Self, NativePeer) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let sink: SinkSlot = Arc::new(Mutex::new(None));
        let (closed, _) = watch::channel(false);

        let transport = Self {
            requests: Mutex::new(Some(tx)),
            next_id: AtomicU64::new(1),
            sink: sink.clone(),
            closed,
        };
        let peer = NativePeer {
            requests: rx,
            emitter: EventEmitter { sink },
        };
        (transport, peer)
    }

    fn sender(&self) -> Option<mpsc::Sender<BridgeRequest>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl BridgeTransport for ChannelTransport {
    fn transport_name(&self) -> &str {
        "channel"
    }

    async fn dispatch(&self, service: &str, command: Command) -> Result<CommandResult> {
        let action = command.action();
        let teardown = self.closed.subscribe();
        let sender = self.sender().ok_or(PlatypusError::Closed)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, outcome) = oneshot::channel();

        sender
            .send(BridgeRequest {
                id,
                service: service.to_string(),
                command,
                reply,
            })
            .await
            .map_err(|_| PlatypusError::Closed)?;
        trace!(request_id = id, %action, "request queued for native peer");

        tokio::select! {
            biased;
            result = outcome => result.map_err(|_| PlatypusError::Abandoned { action }),
            () = until_closed(teardown) => {
                debug!(request_id = id, %action, "transport closed with command pending");
                Err(PlatypusError::Abandoned { action })
            }
        }
    }

    fn attach(&self, sink: Arc<dyn EventSink>) {
        *self.sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink);
    }

    fn close(&self) {
        let had_sender = self
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        self.sink.lock().unwrap_or_else(PoisonError::into_inner).take();
        self.closed.send_replace(true);
        if had_sender {
            info!("channel transport closed");
        }
    }
}

/// Resolves once the transport is closed (or dropped).
async fn until_closed(mut teardown: watch::Receiver<bool>) {
    loop {
        let done = *teardown.borrow_and_update();
        if done || teardown.changed().await.is_err() {
            return;
        }
    }
}

impl NativePeer {
    /// Wait for the next command. `None` once the transport is closed and
    /// the mailbox is drained.
    pub async fn next_request(&mut self) -> Option<BridgeRequest> {
        self.requests.recv().await
    }

    /// Pop a queued command without waiting.
    pub fn try_next_request(&mut self) -> Option<BridgeRequest> {
        self.requests.try_recv().ok()
    }

    pub fn emitter(&self) -> EventEmitter {
        self.emitter.clone()
    }

    pub fn emit(&self, event: impl Into<EventName>, payload: Value) -> bool {
        self.emitter.emit(event, payload)
    }
}

impl EventEmitter {
    /// Push an event to the attached sink. Returns false if nothing is
    /// attached (not yet wired, or torn down), in which case it is dropped.
    pub fn emit(&self, event: impl Into<EventName>, payload: Value) -> bool {
        // Clone out of the slot so the sink runs without the lock held.
        let sink = self
            .sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match sink {
            Some(sink) => {
                sink.on_native_event(EventNotification::new(event, payload));
                true
            }
            None => false,
        }
    }
}
