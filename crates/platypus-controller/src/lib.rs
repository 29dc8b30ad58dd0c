// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platypus Controller: typed commands to the native controller plugin and
// fan-out of its asynchronous events. The transport itself lives in
// `platypus-bridge`; this crate only owns the request/event contract.

pub mod client;
pub mod controller;
pub mod dispatcher;
pub mod registry;

pub use client::CommandClient;
pub use controller::Controller;
pub use dispatcher::{DispatchReport, EventDispatcher};
pub use registry::{Listener, ListenerError, ListenerResult, SubscriptionRegistry, Transition};
