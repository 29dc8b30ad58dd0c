// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where no native host is embedded.
//
// Every command fails with `PlatformUnavailable`; events never arrive.

use std::sync::Arc;

use async_trait::async_trait;
use platypus_core::error::{PlatypusError, Result};
use platypus_core::types::{Command, CommandResult};

use crate::traits::{BridgeTransport, EventSink};

/// No-op bridge used when the process runs outside a native host.
pub struct StubBridge;

#[async_trait]
impl BridgeTransport for StubBridge {
    fn transport_name(&self) -> &str {
        "stub"
    }

    async fn dispatch(&self, service: &str, command: Command) -> Result<CommandResult> {
        tracing::warn!(
            service,
            action = %command.action(),
            "command dispatched on stub bridge"
        );
        Err(PlatypusError::PlatformUnavailable)
    }

    fn attach(&self, _sink: Arc<dyn EventSink>) {}

    fn close(&self) {}
}
