// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for the Platypus bridge.

use serde_json::Value;
use thiserror::Error;

use crate::types::Action;

/// Top-level error type for all bridge operations.
#[derive(Debug, Error)]
pub enum PlatypusError {
    // -- Caller errors (raised locally, never reach the transport) --
    #[error("{action} expects {expected} argument(s), got {actual}")]
    InvalidArity {
        action: Action,
        expected: usize,
        actual: usize,
    },

    #[error("invalid argument for {action}: {reason}")]
    InvalidArgument { action: Action, reason: String },

    #[error("unknown bridge action: {0}")]
    UnknownAction(String),

    // -- Native peer outcomes --
    #[error("native peer rejected {action}: {payload}")]
    Native { action: Action, payload: Value },

    #[error("unexpected payload for {action}: {payload}")]
    UnexpectedPayload { action: Action, payload: Value },

    // -- Transport / teardown --
    #[error("{action} was abandoned before the native peer resolved it")]
    Abandoned { action: Action },

    #[error("{action} timed out after {after_ms} ms")]
    Timeout { action: Action, after_ms: u64 },

    #[error("bridge transport is closed")]
    Closed,

    #[error("native bridge not available on this platform")]
    PlatformUnavailable,

    // -- Configuration --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Coarse classification of a [`PlatypusError`], used for logging and by
/// callers deciding whether an outcome is their own fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments; fixed by changing the call, never by retrying.
    Caller,
    /// The native peer answered with a failure or a payload we can't read.
    Transport,
    /// The command never resolved: deadline, teardown, or no native host.
    Teardown,
    /// Local configuration could not be loaded or saved.
    Config,
}

impl PlatypusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArity { .. } | Self::InvalidArgument { .. } | Self::UnknownAction(_) => {
                ErrorKind::Caller
            }
            Self::Native { .. } | Self::UnexpectedPayload { .. } => ErrorKind::Transport,
            Self::Abandoned { .. }
            | Self::Timeout { .. }
            | Self::Closed
            | Self::PlatformUnavailable => ErrorKind::Teardown,
            Self::Io(_) | Self::Serialization(_) => ErrorKind::Config,
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PlatypusError>;
