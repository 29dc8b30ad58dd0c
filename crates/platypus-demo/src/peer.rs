// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Simulated native host for running the demo without a device.
//
// Answers the controller plugin's commands the way the native side does:
// version as an integer triple, listener registration only for the events it
// knows, `send` echoed back while a controller is attached. A `SensorFeed`
// pushes readings for registered events only.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Value, json};
use tracing::{debug, info};

use platypus_bridge::{BridgeRequest, EventEmitter, NativePeer};
use platypus_core::types::{Action, events};

use crate::app::{GEOLOCATION, MOTION, ORIENTATION};
use crate::config::SensorToggles;
use crate::readout::{Acceleration, Coordinates, Motion, Orientation, Position, RotationRate};

const VERSION: [u64; 3] = [0, 0, 1];

type Registered = Arc<Mutex<BTreeSet<String>>>;

pub struct SimulatedController {
    peer: NativePeer,
    supported: BTreeSet<String>,
    registered: Registered,
    connected: Arc<AtomicBool>,
}

/// Pushes synthetic readings for whatever the app currently listens to.
pub struct SensorFeed {
    emitter: EventEmitter,
    registered: Registered,
    connected: Arc<AtomicBool>,
}

impl SimulatedController {
    pub fn new(peer: NativePeer, sensors: &SensorToggles) -> Self {
        let mut supported: BTreeSet<String> =
            [events::CONNECTION, events::RECEIVE].map(String::from).into();
        for (enabled, event) in [
            (sensors.orientation, ORIENTATION),
            (sensors.motion, MOTION),
            (sensors.geolocation, GEOLOCATION),
        ] {
            if enabled {
                supported.insert(event.to_string());
            }
        }

        Self {
            peer,
            supported,
            registered: Arc::default(),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn feed(&self) -> SensorFeed {
        SensorFeed {
            emitter: self.peer.emitter(),
            registered: self.registered.clone(),
            connected: self.connected.clone(),
        }
    }

    /// Answer commands until the transport closes.
    pub async fn serve(mut self) {
        while let Some(request) = self.peer.next_request().await {
            self.handle(request);
        }
        info!("simulated controller stopped");
    }

    fn handle(&self, request: BridgeRequest) {
        let action = request.command.action();
        debug!(request_id = request.id, %action, "simulated controller handling command");
        let arg = request.command.args().first().cloned().unwrap_or(Value::Null);

        match action {
            Action::GetVersion => {
                request.succeed(json!(VERSION));
            }
            Action::IsConnected => {
                request.succeed(json!(self.connected.load(Ordering::SeqCst)));
            }
            Action::AddEventListener => {
                let event = arg.as_str().unwrap_or_default();
                if self.supported.contains(event) {
                    self.registered().insert(event.to_string());
                    request.succeed(Value::Null);
                } else {
                    request.fail(json!(format!("Unsupported event type '{event}' specified.")));
                }
            }
            Action::RemoveEventListener => {
                let event = arg.as_str().unwrap_or_default();
                if self.registered().remove(event) {
                    request.succeed(Value::Null);
                } else {
                    request.fail(json!(format!("Listener did not exist for event '{event}'.")));
                }
            }
            Action::Send => {
                if self.connected.load(Ordering::SeqCst) {
                    request.succeed(arg);
                } else {
                    request.fail(json!("Controller is not connected."));
                }
            }
        }
    }

    fn registered(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.registered.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SensorFeed {
    /// Attach or detach the controller and announce it.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
        self.emit(events::CONNECTION, json!(connected));
    }

    /// Emit one round of readings. Returns how many events went out.
    pub fn tick(&self, n: u32) -> usize {
        let t = f64::from(n);
        let orientation = Orientation {
            alpha: ((t * 15.0) % 360.0).into(),
            beta: (10.0 + t).into(),
            gamma: (-5.0 + t * 0.5).into(),
            interval: 16.0.into(),
        };
        let motion = Motion {
            acceleration: Acceleration {
                x: (0.25 * t).into(),
                y: 0.0.into(),
                z: 9.75.into(),
            },
            rotation_rate: RotationRate {
                alpha: 1.5.into(),
                beta: (0.5 * t).into(),
                gamma: 0.0.into(),
            },
            interval: 16.0.into(),
        };
        let position = Position {
            coords: Coordinates {
                latitude: 40.4433 + t * 1e-4,
                longitude: -79.9436,
                altitude: 270.0.into(),
                accuracy: 5.0,
                altitude_accuracy: Default::default(),
                heading: Default::default(),
                speed: 0.0.into(),
            },
            timestamp: chrono::Utc::now(),
        };

        let readings = [
            (ORIENTATION, serde_json::to_value(orientation)),
            (MOTION, serde_json::to_value(motion)),
            (GEOLOCATION, serde_json::to_value(position)),
        ];

        let mut emitted = 0;
        for (event, payload) in readings {
            if let Ok(payload) = payload {
                if self.emit(event, payload) {
                    emitted += 1;
                }
            }
        }
        emitted
    }

    fn emit(&self, event: &str, payload: Value) -> bool {
        let listening = self
            .registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(event);
        listening && self.emitter.emit(event, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platypus_bridge::ChannelTransport;
    use platypus_controller::Controller;
    use platypus_core::config::BridgeConfig;
    use platypus_core::error::PlatypusError;

    fn start(sensors: SensorToggles) -> (Controller, SensorFeed, tokio::task::JoinHandle<()>) {
        let config = BridgeConfig::default();
        let (transport, peer) = ChannelTransport::pair(config.channel_capacity);
        let device = SimulatedController::new(peer, &sensors);
        let feed = device.feed();
        let host = tokio::spawn(device.serve());
        (Controller::new(Arc::new(transport), &config), feed, host)
    }

    #[tokio::test]
    async fn reports_version_and_connection() {
        let (controller, feed, host) = start(SensorToggles::default());

        assert_eq!(controller.get_version().await.unwrap(), "0.0.1");
        assert!(!controller.is_connected().await.unwrap());
        feed.set_connected(true);
        assert!(controller.is_connected().await.unwrap());

        controller.shutdown().await.unwrap();
        host.await.unwrap();
    }

    #[tokio::test]
    async fn send_echoes_only_while_connected() {
        let (controller, feed, host) = start(SensorToggles::default());

        let offline = controller.send(json!({"cmd": "ping"})).await.unwrap();
        assert!(!offline.is_success());

        feed.set_connected(true);
        let online = controller.send(json!({"cmd": "ping"})).await.unwrap();
        assert_eq!(online.payload(), &json!({"cmd": "ping"}));

        controller.shutdown().await.unwrap();
        host.await.unwrap();
    }

    #[tokio::test]
    async fn disabled_sensor_is_rejected() {
        let sensors = SensorToggles {
            motion: false,
            ..Default::default()
        };
        let (controller, feed, host) = start(sensors);

        let err = controller
            .add_event_listener(MOTION, |_: &Value| Ok(()))
            .await
            .unwrap_err();
        assert!(matches!(err, PlatypusError::Native { .. }));

        // Nothing registered, nothing emitted.
        assert_eq!(feed.tick(0), 0);

        controller.shutdown().await.unwrap();
        host.await.unwrap();
    }

    #[tokio::test]
    async fn feed_only_emits_registered_events() {
        let (controller, feed, host) = start(SensorToggles::default());

        controller
            .add_event_listener(ORIENTATION, |_: &Value| Ok(()))
            .await
            .unwrap();
        assert_eq!(feed.tick(1), 1);

        controller.shutdown().await.unwrap();
        host.await.unwrap();
        assert_eq!(feed.tick(2), 0);
    }
}
