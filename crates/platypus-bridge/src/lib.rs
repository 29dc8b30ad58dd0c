// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Platypus: bridge transport abstractions.
//!
//! The native controller plugin lives outside this workspace. Everything the
//! client needs from it goes through [`traits::BridgeTransport`] (commands
//! out, one result back) and [`traits::EventSink`] (unsolicited events in).

pub mod channel;
pub mod stub;
pub mod traits;

pub use channel::{BridgeRequest, ChannelTransport, EventEmitter, NativePeer};
pub use stub::StubBridge;
pub use traits::{BridgeTransport, EventSink};
