// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Single-shot request/response commands over the bridge transport.
//
// Every call validates locally, then performs exactly one dispatch. Nothing
// is retried, batched or deduplicated: a repeated `send` may not be
// idempotent on the native side, so retrying is left to the caller.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use platypus_bridge::BridgeTransport;
use platypus_core::config::BridgeConfig;
use platypus_core::error::{PlatypusError, Result};
use platypus_core::types::{Action, Command, CommandResult, EventName};

/// Typed client for the native controller's commands.
#[derive(Clone)]
pub struct CommandClient {
    transport: Arc<dyn BridgeTransport>,
    service: String,
    timeout: Option<Duration>,
}

impl CommandClient {
    pub fn new(transport: Arc<dyn BridgeTransport>, config: &BridgeConfig) -> Self {
        Self {
            transport,
            service: config.service.clone(),
            timeout: config.command_timeout(),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Validate `args` for `action` and issue the command.
    ///
    /// `Ok` carries the peer's answer verbatim, `Failure` included. `Err` is
    /// either a caller error (nothing was dispatched) or a command that never
    /// resolved (timeout, teardown).
    pub async fn invoke(&self, action: Action, args: Vec<Value>) -> Result<CommandResult> {
        self.issue(Command::new(action, args)?).await
    }

    /// Same as [`CommandClient::invoke`], taking the action by its native name.
    pub async fn invoke_named(&self, name: &str, args: Vec<Value>) -> Result<CommandResult> {
        self.issue(Command::parse(name, args)?).await
    }

    #[instrument(skip_all, fields(action = %command.action()))]
    pub async fn issue(&self, command: Command) -> Result<CommandResult> {
        let action = command.action();
        let pending = self.transport.dispatch(&self.service, command);

        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, pending).await.map_err(|_| {
                warn!(after_ms = limit.as_millis() as u64, "command deadline elapsed");
                PlatypusError::Timeout {
                    action,
                    after_ms: limit.as_millis() as u64,
                }
            })??,
            None => pending.await?,
        };

        match &result {
            CommandResult::Success(_) => debug!("native peer resolved command"),
            CommandResult::Failure(payload) => warn!(%payload, "native peer reported failure"),
        }
        Ok(result)
    }

    /// Native build/version identifier.
    ///
    /// The controller reports its version as an array of integers; it is
    /// rendered dotted (`[0, 0, 1]` becomes `"0.0.1"`). Strings pass through.
    pub async fn get_version(&self) -> Result<String> {
        let payload = self.expect_success(Action::GetVersion, vec![]).await?;
        render_version(payload)
    }

    /// Whether a controller is attached to the native host.
    pub async fn is_connected(&self) -> Result<bool> {
        match self.expect_success(Action::IsConnected, vec![]).await? {
            Value::Bool(connected) => Ok(connected),
            payload => Err(PlatypusError::UnexpectedPayload {
                action: Action::IsConnected,
                payload,
            }),
        }
    }

    /// Forward `message` to the controller. The outcome is returned as-is.
    pub async fn send(&self, message: Value) -> Result<CommandResult> {
        self.invoke(Action::Send, vec![message]).await
    }

    pub(crate) async fn register(&self, event: &EventName) -> Result<()> {
        self.expect_success(Action::AddEventListener, vec![Value::from(event.as_str())])
            .await
            .map(drop)
    }

    pub(crate) async fn deregister(&self, event: &EventName) -> Result<()> {
        self.expect_success(Action::RemoveEventListener, vec![Value::from(event.as_str())])
            .await
            .map(drop)
    }

    pub(crate) fn transport(&self) -> &Arc<dyn BridgeTransport> {
        &self.transport
    }

    async fn expect_success(&self, action: Action, args: Vec<Value>) -> Result<Value> {
        self.invoke(action, args)
            .await?
            .into_result()
            .map_err(|payload| PlatypusError::Native { action, payload })
    }
}

fn render_version(payload: Value) -> Result<String> {
    match payload {
        Value::String(version) => Ok(version),
        Value::Array(parts) if !parts.is_empty() && parts.iter().all(Value::is_u64) => Ok(parts
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(".")),
        payload => Err(PlatypusError::UnexpectedPayload {
            action: Action::GetVersion,
            payload,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platypus_bridge::{ChannelTransport, NativePeer};
    use serde_json::json;

    fn client_pair(config: BridgeConfig) -> (CommandClient, NativePeer) {
        let (transport, peer) = ChannelTransport::pair(config.channel_capacity);
        (CommandClient::new(Arc::new(transport), &config), peer)
    }

    #[test]
    fn version_rendering() {
        assert_eq!(render_version(json!([0, 0, 1])).unwrap(), "0.0.1");
        assert_eq!(render_version(json!("2.1-beta")).unwrap(), "2.1-beta");
        assert!(render_version(json!([])).is_err());
        assert!(render_version(json!({"major": 1})).is_err());
    }

    #[tokio::test]
    async fn caller_error_never_reaches_transport() {
        let (client, mut peer) = client_pair(BridgeConfig::default());

        let err = client
            .invoke(Action::GetVersion, vec![json!("extra")])
            .await
            .unwrap_err();
        assert!(matches!(err, PlatypusError::InvalidArity { .. }));

        let err = client.invoke_named("reboot", vec![]).await.unwrap_err();
        assert!(matches!(err, PlatypusError::UnknownAction(_)));

        assert!(peer.try_next_request().is_none());
    }

    #[tokio::test]
    async fn send_failure_is_surfaced_unchanged() {
        let (client, mut peer) = client_pair(BridgeConfig::default());

        let host = tokio::spawn(async move {
            let req = peer.next_request().await.unwrap();
            assert_eq!(req.command.args(), &[json!({"thrust": 0.5})]);
            req.fail(json!({"code": 3}));
            // exactly one dispatch per call
            assert!(peer.next_request().await.is_none());
        });

        let result = client.send(json!({"thrust": 0.5})).await.unwrap();
        assert_eq!(result, CommandResult::Failure(json!({"code": 3})));

        drop(client);
        host.await.unwrap();
    }

    #[tokio::test]
    async fn interleaved_resolution_reports_each_callers_own_result() {
        let (client, mut peer) = client_pair(BridgeConfig::default());

        let host = tokio::spawn(async move {
            let version = peer.next_request().await.unwrap();
            let connected = peer.next_request().await.unwrap();
            assert_eq!(version.command.action(), Action::GetVersion);
            assert_eq!(connected.command.action(), Action::IsConnected);
            connected.succeed(json!(true));
            version.succeed(json!([0, 0, 1]));
        });

        let (version, connected) = tokio::join!(client.get_version(), client.is_connected());
        assert_eq!(version.unwrap(), "0.0.1");
        assert!(connected.unwrap());
        host.await.unwrap();
    }

    #[tokio::test]
    async fn typed_wrapper_maps_failure_to_native_error() {
        let (client, mut peer) = client_pair(BridgeConfig::default());

        let host = tokio::spawn(async move {
            peer.next_request().await.unwrap().fail(json!("no accessory"));
        });

        let err = client.is_connected().await.unwrap_err();
        assert!(matches!(
            err,
            PlatypusError::Native { action: Action::IsConnected, ref payload } if *payload == json!("no accessory")
        ));
        host.await.unwrap();
    }

    #[tokio::test]
    async fn unexpected_payload_shape_is_reported() {
        let (client, mut peer) = client_pair(BridgeConfig::default());

        let host = tokio::spawn(async move {
            peer.next_request().await.unwrap().succeed(json!("yes"));
        });

        let err = client.is_connected().await.unwrap_err();
        assert!(matches!(err, PlatypusError::UnexpectedPayload { .. }));
        host.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_command_times_out() {
        let config = BridgeConfig {
            command_timeout_ms: Some(250),
            ..Default::default()
        };
        let (client, mut peer) = client_pair(config);

        let err = client.is_connected().await.unwrap_err();
        assert!(matches!(err, PlatypusError::Timeout { after_ms: 250, .. }));

        // The late answer finds no caller.
        let req = peer.try_next_request().unwrap();
        assert!(!req.succeed(json!(true)));
    }

    #[tokio::test]
    async fn peer_teardown_abandons_pending_command() {
        let (client, peer) = client_pair(BridgeConfig::default());

        let pending = tokio::spawn({
            let client = client.clone();
            async move { client.get_version().await }
        });
        tokio::task::yield_now().await;
        drop(peer);

        let err = pending.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            PlatypusError::Abandoned { action: Action::GetVersion } | PlatypusError::Closed
        ));
    }
}
