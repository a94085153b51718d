//! Configuration for the jukebox appliance.
//!
//! A TOML file layered with `JUKEBOX_` environment variables, validated
//! and translated into `jukebox_core::CoordinatorConfig`. Durations are
//! written as humantime strings (`"90s"`, `"15m"`, `"1500ms"`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use jukebox_core::{
    CoordinatorConfig, IdleConfig, KeyInput, NavigationConfig, RemoteKeymap, ShutdownConfig,
    VolumeConfig,
};

/// Prefix for environment overrides. Nested keys are separated by `__`,
/// e.g. `JUKEBOX_SHUTDOWN__ALLOW_SHUTDOWN=false`.
pub const ENV_PREFIX: &str = "JUKEBOX_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("remote code '{code}' maps to unknown key '{key}'")]
    UnknownKey { code: String, key: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub idle: IdleSection,

    #[serde(default)]
    pub navigation: NavigationSection,

    #[serde(default)]
    pub shutdown: ShutdownSection,

    #[serde(default)]
    pub volume: VolumeSection,

    /// Extra IR remote codes, e.g. `KEY_RED = "Stop"`.
    #[serde(default)]
    pub remote_keymap: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IdleSection {
    /// No key or tag input for this long dims the display.
    #[serde(default = "default_input_timeout")]
    pub input_timeout: String,

    /// No activity of any kind for this long shuts the appliance down.
    #[serde(default = "default_system_timeout")]
    pub system_timeout: String,

    /// Audio playback resets the input timer too, keeping the display
    /// awake. Set to `false` to let the display dim while music plays.
    #[serde(default = "default_true")]
    pub system_activity_resets_input: bool,
}

impl Default for IdleSection {
    fn default() -> Self {
        Self {
            input_timeout: default_input_timeout(),
            system_timeout: default_system_timeout(),
            system_activity_resets_input: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NavigationSection {
    #[serde(default = "default_overlay_timeout")]
    pub volume_overlay_timeout: String,
}

impl Default for NavigationSection {
    fn default() -> Self {
        Self {
            volume_overlay_timeout: default_overlay_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ShutdownSection {
    /// Power the machine off on system idle and let power-button
    /// shutdowns proceed. When false only the application stops.
    #[serde(default = "default_true")]
    pub allow_shutdown: bool,
}

impl Default for ShutdownSection {
    fn default() -> Self {
        Self {
            allow_shutdown: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct VolumeSection {
    #[serde(default = "default_initial_volume")]
    pub initial: u8,
    #[serde(default = "default_volume_step")]
    pub step: u8,
    #[serde(default = "default_max_volume")]
    pub max: u8,
}

impl Default for VolumeSection {
    fn default() -> Self {
        Self {
            initial: default_initial_volume(),
            step: default_volume_step(),
            max: default_max_volume(),
        }
    }
}

fn default_input_timeout() -> String {
    "1m".into()
}
fn default_system_timeout() -> String {
    "15m".into()
}
fn default_overlay_timeout() -> String {
    "1500ms".into()
}
fn default_true() -> bool {
    true
}
fn default_initial_volume() -> u8 {
    30
}
fn default_volume_step() -> u8 {
    5
}
fn default_max_volume() -> u8 {
    100
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "jukebox", "jukebox").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("jukebox");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// The provider stack: defaults, then the TOML file (if present), then
/// environment overrides.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load the full Config from file + environment.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment(path).extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

impl Config {
    /// Validate and build the runtime configuration.
    pub fn to_coordinator_config(&self) -> Result<CoordinatorConfig, ConfigError> {
        let input_timeout = parse_timeout("idle.input_timeout", &self.idle.input_timeout)?;
        let system_timeout = parse_timeout("idle.system_timeout", &self.idle.system_timeout)?;
        let volume_overlay_timeout = parse_timeout(
            "navigation.volume_overlay_timeout",
            &self.navigation.volume_overlay_timeout,
        )?;

        let VolumeSection { initial, step, max } = self.volume;
        if max == 0 {
            return Err(ConfigError::Validation {
                field: "volume.max".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if step == 0 || step > max {
            return Err(ConfigError::Validation {
                field: "volume.step".into(),
                reason: format!("must be between 1 and {max}, got {step}"),
            });
        }
        if initial > max {
            return Err(ConfigError::Validation {
                field: "volume.initial".into(),
                reason: format!("must not exceed volume.max ({max}), got {initial}"),
            });
        }

        Ok(CoordinatorConfig {
            idle: IdleConfig {
                input_timeout,
                system_timeout,
                system_activity_resets_input: self.idle.system_activity_resets_input,
            },
            navigation: NavigationConfig {
                volume_overlay_timeout,
            },
            shutdown: ShutdownConfig {
                allow_shutdown: self.shutdown.allow_shutdown,
            },
            volume: VolumeConfig { initial, step, max },
            remote_keymap: self.remote_keymap()?,
        })
    }

    /// Parse the `[remote_keymap]` table. Key names are case-insensitive.
    pub fn remote_keymap(&self) -> Result<RemoteKeymap, ConfigError> {
        let mut keymap = RemoteKeymap::new();
        for (code, key) in &self.remote_keymap {
            let parsed = KeyInput::from_str(key.trim()).map_err(|_| ConfigError::UnknownKey {
                code: code.clone(),
                key: key.clone(),
            })?;
            keymap.insert(code, parsed);
        }
        Ok(keymap)
    }

    /// Settings that load fine but are probably mistakes.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let input = humantime::parse_duration(&self.idle.input_timeout).ok();
        let system = humantime::parse_duration(&self.idle.system_timeout).ok();
        if let (Some(input), Some(system)) = (input, system) {
            if system < input {
                warnings.push(format!(
                    "idle.system_timeout ({}) is shorter than idle.input_timeout ({}); \
                     the appliance will shut down before the display dims",
                    humantime::format_duration(system),
                    humantime::format_duration(input),
                ));
            }
        }
        warnings
    }
}

fn parse_timeout(field: &str, value: &str) -> Result<Duration, ConfigError> {
    let duration =
        humantime::parse_duration(value.trim()).map_err(|e| ConfigError::Validation {
            field: field.into(),
            reason: format!("'{value}' is not a duration ({e})"),
        })?;
    if duration.is_zero() {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(duration)
}
