// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by the transport and the controller client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bridge namespace every command is dispatched under.
    pub service: String,
    /// Deadline for a single command. `None` waits until the peer answers
    /// or the transport is torn down.
    pub command_timeout_ms: Option<u64>,
    /// Mailbox size of the in-process channel transport.
    pub channel_capacity: usize,
    /// Fallback `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl BridgeConfig {
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            service: crate::types::DEFAULT_SERVICE.to_string(),
            command_timeout_ms: Some(30_000),
            channel_capacity: 64,
            log_filter: "info".to_string(),
        }
    }
}
