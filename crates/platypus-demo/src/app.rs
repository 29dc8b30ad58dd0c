// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Demo application: subscribes to the device's sensor events through the
// controller bridge and keeps a text view of the latest readings.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use platypus_controller::{Controller, ListenerResult};
use platypus_core::error::{ErrorKind, PlatypusError, Result};
use platypus_core::types::{SubscriptionHandle, events};

use crate::readout::{Motion, Orientation, Position, PositionError, PositionUpdate};

pub const ORIENTATION: &str = "deviceorientation";
pub const MOTION: &str = "devicemotion";
pub const GEOLOCATION: &str = "geolocation";

const NOT_SUPPORTED: &str = "Not supported.";

/// Latest rendered value per display slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct View {
    fields: BTreeMap<&'static str, String>,
}

impl View {
    pub fn set(&mut self, slot: &'static str, value: impl Into<String>) {
        self.fields.insert(slot, value.into());
    }

    pub fn get(&self, slot: &str) -> Option<&str> {
        self.fields.get(slot).map(String::as_str)
    }

    /// One `slot: value` line per populated slot, sorted by slot.
    pub fn render(&self) -> String {
        self.fields
            .iter()
            .map(|(slot, value)| format!("{slot}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn on_device_orientation(&mut self, reading: &Orientation) {
        self.set("orientationPose", reading.pose());
        self.set("orientationInterval", reading.interval.to_string());
    }

    pub fn on_device_motion(&mut self, reading: &Motion) {
        self.set("motionAccel", reading.acceleration());
        self.set("motionRotation", reading.rotation());
        self.set("motionInterval", reading.interval.to_string());
    }

    pub fn on_device_position(&mut self, position: &Position) {
        let c = &position.coords;
        self.set("geoLatitude", c.latitude.to_string());
        self.set("geoLongitude", c.longitude.to_string());
        self.set("geoAltitude", c.altitude.to_string());
        self.set("geoAccuracy", c.accuracy.to_string());
        self.set("geoAltitudeAccuracy", c.altitude_accuracy.to_string());
        self.set("geoHeading", c.heading.to_string());
        self.set("geoSpeed", c.speed.to_string());
        self.set("geoTimestamp", position.timestamp.to_rfc3339());
    }

    pub fn on_device_position_error(&mut self, error: &PositionError) {
        warn!(code = error.code, message = %error.message, "position unavailable");
        self.set("geoError", error.to_string());
    }

    pub fn on_connection(&mut self, connected: bool) {
        self.set("connection", if connected { "connected" } else { "disconnected" });
    }
}

/// The demo application. Built once at startup; owns the view and the
/// subscriptions it made.
pub struct App {
    view: Arc<Mutex<View>>,
    handles: Vec<SubscriptionHandle>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            view: Arc::new(Mutex::new(View::default())),
            handles: Vec::new(),
        }
    }

    /// Subscribe every handler. Sensors the device rejects, or every sensor
    /// when no native host is present, are marked "Not supported." rather
    /// than failing startup.
    pub async fn bind(&mut self, controller: &Controller) -> Result<()> {
        self.bind_sensor(
            controller,
            ORIENTATION,
            "hasOrientationEvent",
            View::on_device_orientation,
        )
        .await?;
        self.bind_sensor(controller, MOTION, "hasMotionEvent", View::on_device_motion)
            .await?;
        self.bind_sensor(
            controller,
            GEOLOCATION,
            "hasGeolocation",
            |view: &mut View, update: &PositionUpdate| match update {
                PositionUpdate::Fix(position) => view.on_device_position(position),
                PositionUpdate::Error { error } => view.on_device_position_error(error),
            },
        )
        .await?;
        self.bind_sensor(
            controller,
            events::CONNECTION,
            "hasConnectionEvent",
            |view: &mut View, connected: &bool| view.on_connection(*connected),
        )
        .await?;

        self.update(|view| view.set("deviceready", "received"));
        info!(subscriptions = self.handles.len(), "received event: deviceready");
        Ok(())
    }

    /// Remove every subscription this app made.
    pub async fn unbind(&mut self, controller: &Controller) -> Result<()> {
        for handle in self.handles.drain(..) {
            controller.remove_event_listener(handle).await?;
        }
        Ok(())
    }

    pub fn view(&self) -> View {
        self.view.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    async fn bind_sensor<T, H>(
        &mut self,
        controller: &Controller,
        event: &'static str,
        support_slot: &'static str,
        handler: H,
    ) -> Result<()>
    where
        T: DeserializeOwned + 'static,
        H: Fn(&mut View, &T) + Send + Sync + 'static,
    {
        let view = self.view.clone();
        let listener = move |payload: &Value| -> ListenerResult {
            let reading: T = serde_json::from_value(payload.clone())?;
            handler(&mut *view.lock().unwrap_or_else(PoisonError::into_inner), &reading);
            Ok(())
        };

        match controller.add_event_listener(event, listener).await {
            Ok(handle) => {
                self.handles.push(handle);
                Ok(())
            }
            Err(e)
                if e.kind() == ErrorKind::Transport
                    || matches!(e, PlatypusError::PlatformUnavailable) =>
            {
                info!(event, error = %e, "device does not support event");
                self.update(|view| view.set(support_slot, NOT_SUPPORTED));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn update(&self, f: impl FnOnce(&mut View)) {
        f(&mut *self.view.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readout::{Acceleration, Field, RotationRate};
    use platypus_bridge::StubBridge;
    use platypus_core::config::BridgeConfig;

    #[test]
    fn orientation_fills_pose_and_interval() {
        let mut view = View::default();
        view.on_device_orientation(&Orientation {
            alpha: 10.0.into(),
            beta: 20.5.into(),
            gamma: Field(None),
            interval: 16.0.into(),
        });
        assert_eq!(view.get("orientationPose"), Some("[10, 20.5, null]"));
        assert_eq!(view.get("orientationInterval"), Some("16"));
    }

    #[test]
    fn motion_fills_three_slots() {
        let mut view = View::default();
        view.on_device_motion(&Motion {
            acceleration: Acceleration {
                x: 0.5.into(),
                y: 0.0.into(),
                z: 9.75.into(),
            },
            rotation_rate: RotationRate::default(),
            interval: 20.0.into(),
        });
        assert_eq!(view.get("motionAccel"), Some("[0.5, 0, 9.75]"));
        assert_eq!(view.get("motionRotation"), Some("[null, null, null]"));
        assert_eq!(view.get("motionInterval"), Some("20"));
    }

    #[test]
    fn render_is_sorted_by_slot() {
        let mut view = View::default();
        view.set("b", "2");
        view.set("a", "1");
        assert_eq!(view.render(), "a: 1\nb: 2");
    }

    #[tokio::test]
    async fn without_native_host_every_sensor_is_unsupported() {
        let controller = Controller::new(Arc::new(StubBridge), &BridgeConfig::default());
        let mut app = App::new();
        app.bind(&controller).await.unwrap();

        let view = app.view();
        for slot in [
            "hasOrientationEvent",
            "hasMotionEvent",
            "hasGeolocation",
            "hasConnectionEvent",
        ] {
            assert_eq!(view.get(slot), Some(NOT_SUPPORTED), "{slot}");
        }
        assert_eq!(view.get("deviceready"), Some("received"));
        assert!(controller.active_events().is_empty());
    }
}
