// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for the native bridge.

use std::sync::Arc;

use async_trait::async_trait;
use platypus_core::error::Result;
use platypus_core::types::{Command, CommandResult, EventNotification};

/// Channel to the native peer.
///
/// `dispatch` resolves exactly once per command. `Ok` carries whatever the
/// peer answered, including a `CommandResult::Failure`. `Err` means the
/// command never got an answer (transport closed, peer gone).
#[async_trait]
pub trait BridgeTransport: Send + Sync {
    /// Short transport name for logs (e.g. "channel", "stub").
    fn transport_name(&self) -> &str;

    /// Marshal `command` to the peer under the `service` namespace.
    async fn dispatch(&self, service: &str, command: Command) -> Result<CommandResult>;

    /// Install the receiver for native events. Replaces any previous sink.
    fn attach(&self, sink: Arc<dyn EventSink>);

    /// Stop accepting commands and drop the event sink. Commands still
    /// waiting on the peer resolve as abandoned right away; later ones fail
    /// as closed.
    fn close(&self);
}

/// Receiver for notifications the native peer pushes at any time,
/// independent of any pending command.
pub trait EventSink: Send + Sync {
    fn on_native_event(&self, notification: EventNotification);
}
