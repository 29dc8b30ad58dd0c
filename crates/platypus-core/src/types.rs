// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Platypus controller bridge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PlatypusError, Result};

/// Bridge namespace the native controller plugin is registered under.
pub const DEFAULT_SERVICE: &str = "Controller";

/// Well-known event names understood by the native controller.
pub mod events {
    /// Controller attached/detached. Payload: `bool`.
    pub const CONNECTION: &str = "connection";
    /// JSON object received from the controller.
    pub const RECEIVE: &str = "receive";
}

/// The fixed set of actions the native peer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    GetVersion,
    IsConnected,
    AddEventListener,
    RemoveEventListener,
    Send,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::GetVersion,
        Action::IsConnected,
        Action::AddEventListener,
        Action::RemoveEventListener,
        Action::Send,
    ];

    /// Method name as the native peer spells it.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::GetVersion => "getVersion",
            Action::IsConnected => "isConnected",
            Action::AddEventListener => "addEventListener",
            Action::RemoveEventListener => "removeEventListener",
            Action::Send => "send",
        }
    }

    /// Exact number of positional arguments the native peer expects.
    pub fn arity(self) -> usize {
        match self {
            Action::GetVersion | Action::IsConnected => 0,
            Action::AddEventListener | Action::RemoveEventListener | Action::Send => 1,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = PlatypusError;

    fn from_str(s: &str) -> Result<Self> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| PlatypusError::UnknownAction(s.to_string()))
    }
}

/// A validated request for the native peer. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    action: Action,
    args: Vec<Value>,
}

impl Command {
    /// Build a command, checking arity and argument shape locally.
    pub fn new(action: Action, args: Vec<Value>) -> Result<Self> {
        let expected = action.arity();
        if args.len() != expected {
            return Err(PlatypusError::InvalidArity {
                action,
                expected,
                actual: args.len(),
            });
        }

        match action {
            Action::AddEventListener | Action::RemoveEventListener if !args[0].is_string() => {
                return Err(PlatypusError::InvalidArgument {
                    action,
                    reason: "event name must be a string".into(),
                });
            }
            Action::Send if args[0].is_null() => {
                return Err(PlatypusError::InvalidArgument {
                    action,
                    reason: "expected one non-empty message".into(),
                });
            }
            _ => {}
        }

        Ok(Self { action, args })
    }

    /// Parse the action from its native spelling, then validate as [`Command::new`].
    pub fn parse(name: &str, args: Vec<Value>) -> Result<Self> {
        Self::new(name.parse()?, args)
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn into_args(self) -> Vec<Value> {
        self.args
    }
}

/// Outcome of exactly one issued [`Command`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "payload", rename_all = "lowercase")]
pub enum CommandResult {
    Success(Value),
    Failure(Value),
}

impl CommandResult {
    pub fn is_success(&self) -> bool {
        matches!(self, CommandResult::Success(_))
    }

    pub fn payload(&self) -> &Value {
        match self {
            CommandResult::Success(v) | CommandResult::Failure(v) => v,
        }
    }

    /// Success payload as `Ok`, failure payload as `Err`.
    pub fn into_result(self) -> std::result::Result<Value, Value> {
        match self {
            CommandResult::Success(v) => Ok(v),
            CommandResult::Failure(v) => Err(v),
        }
    }
}

/// Key identifying a subscribable event category. Not validated locally;
/// the native peer owns the set of valid names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventName(String);

impl EventName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EventName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for EventName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Unsolicited message pushed by the native peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventNotification {
    pub event: EventName,
    pub payload: Value,
}

impl EventNotification {
    pub fn new(event: impl Into<EventName>, payload: Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }
}

/// Opaque token returned by a subscription; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_names_round_trip_through_from_str() {
        for action in Action::ALL {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
        assert!(matches!(
            "reboot".parse::<Action>(),
            Err(PlatypusError::UnknownAction(name)) if name == "reboot"
        ));
    }

    #[test]
    fn extra_argument_is_rejected() {
        let err = Command::new(Action::GetVersion, vec![json!(1)]).unwrap_err();
        assert!(matches!(
            err,
            PlatypusError::InvalidArity { expected: 0, actual: 1, .. }
        ));
    }

    #[test]
    fn missing_argument_is_rejected() {
        let err = Command::new(Action::Send, vec![]).unwrap_err();
        assert!(matches!(
            err,
            PlatypusError::InvalidArity { expected: 1, actual: 0, .. }
        ));
    }

    #[test]
    fn listener_actions_need_string_event() {
        let err = Command::new(Action::AddEventListener, vec![json!(42)]).unwrap_err();
        assert!(matches!(err, PlatypusError::InvalidArgument { .. }));
        assert!(Command::new(Action::AddEventListener, vec![json!("receive")]).is_ok());
    }

    #[test]
    fn send_rejects_null_message() {
        let err = Command::new(Action::Send, vec![Value::Null]).unwrap_err();
        assert!(matches!(err, PlatypusError::InvalidArgument { action: Action::Send, .. }));
    }

    #[test]
    fn parse_uses_native_spelling() {
        let cmd = Command::parse("isConnected", vec![]).unwrap();
        assert_eq!(cmd.action(), Action::IsConnected);
        assert!(Command::parse("is_connected", vec![]).is_err());
    }

    #[test]
    fn command_result_serializes_tagged() {
        let failure = CommandResult::Failure(json!({"code": 3}));
        let encoded = serde_json::to_value(&failure).unwrap();
        assert_eq!(encoded, json!({"status": "failure", "payload": {"code": 3}}));
        assert_eq!(failure.into_result(), Err(json!({"code": 3})));
    }
}
