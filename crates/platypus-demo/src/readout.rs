// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sensor payloads delivered over the bridge and their display formatting.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A sensor value the platform may leave unset. Displays as `null` when
/// missing, matching what the web view shows for an absent reading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Field(pub Option<f64>);

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v}"),
            None => f.write_str("null"),
        }
    }
}

impl From<f64> for Field {
    fn from(v: f64) -> Self {
        Self(Some(v))
    }
}

/// Render three values as `[a, b, c]`.
pub fn triple<A, B, C>((a, b, c): (A, B, C)) -> String
where
    A: fmt::Display,
    B: fmt::Display,
    C: fmt::Display,
{
    format!("[{a}, {b}, {c}]")
}

/// Device attitude in degrees.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    #[serde(default)]
    pub alpha: Field,
    #[serde(default)]
    pub beta: Field,
    #[serde(default)]
    pub gamma: Field,
    #[serde(default)]
    pub interval: Field,
}

impl Orientation {
    pub fn pose(&self) -> String {
        triple((self.alpha, self.beta, self.gamma))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Acceleration {
    #[serde(default)]
    pub x: Field,
    #[serde(default)]
    pub y: Field,
    #[serde(default)]
    pub z: Field,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RotationRate {
    #[serde(default)]
    pub alpha: Field,
    #[serde(default)]
    pub beta: Field,
    #[serde(default)]
    pub gamma: Field,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Motion {
    #[serde(default)]
    pub acceleration: Acceleration,
    #[serde(default)]
    pub rotation_rate: RotationRate,
    #[serde(default)]
    pub interval: Field,
}

impl Motion {
    pub fn acceleration(&self) -> String {
        let a = &self.acceleration;
        triple((a.x, a.y, a.z))
    }

    pub fn rotation(&self) -> String {
        let r = &self.rotation_rate;
        triple((r.alpha, r.beta, r.gamma))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Field,
    pub accuracy: f64,
    #[serde(default)]
    pub altitude_accuracy: Field,
    #[serde(default)]
    pub heading: Field,
    #[serde(default)]
    pub speed: Field,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub coords: Coordinates,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionError {
    pub code: u16,
    pub message: String,
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code: {}\nmessage: {}\n", self.code, self.message)
    }
}

/// Payload of a geolocation event: a fix, or the reason there isn't one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PositionUpdate {
    Fix(Position),
    Error { error: PositionError },
}
