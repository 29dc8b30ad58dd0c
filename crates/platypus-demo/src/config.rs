// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Demo settings, persisted as JSON in the data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use platypus_core::config::BridgeConfig;
use platypus_core::error::Result;

const CONFIG_FILE: &str = "platypus.json";

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PLATYPUS_CONFIG";

/// Which sensors the simulated device offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorToggles {
    pub orientation: bool,
    pub motion: bool,
    pub geolocation: bool,
}

impl Default for SensorToggles {
    fn default() -> Self {
        Self {
            orientation: true,
            motion: true,
            geolocation: true,
        }
    }
}

/// A command issued by its native name once the sensor rounds are done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedCommand {
    pub action: String,
    #[serde(default)]
    pub args: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub bridge: BridgeConfig,
    /// Run against the in-process simulated controller. When off, the
    /// stub bridge stands in and every command is unavailable.
    pub simulated_host: bool,
    pub sensors: SensorToggles,
    /// Rounds of sensor readings to emit before exiting.
    pub ticks: u32,
    pub tick_interval_ms: u64,
    pub commands: Vec<ScriptedCommand>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            bridge: BridgeConfig::default(),
            simulated_host: true,
            sensors: SensorToggles::default(),
            ticks: 5,
            tick_interval_ms: 200,
            commands: vec![ScriptedCommand {
                action: "send".into(),
                args: vec![json!({"type": "ping"})],
            }],
        }
    }
}

/// `$PLATYPUS_CONFIG` if set, else `platypus.json` in the data directory.
pub fn config_path() -> PathBuf {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => PathBuf::from(path),
        None => data_dir().join(CONFIG_FILE),
    }
}

/// Read a config file. `None` if it is missing or unreadable.
pub fn load_config(path: &Path) -> Option<DemoConfig> {
    let data = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&data).ok()
}

pub fn persist_config(path: &Path, config: &DemoConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn data_dir() -> PathBuf {
    // Try XDG data dir, then fallback to home
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg).join("platypus");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share").join("platypus");
    }
    PathBuf::from("/tmp").join("platypus")
}
