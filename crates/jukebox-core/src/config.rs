// ── Runtime coordinator configuration ──
//
// These types describe *how* the coordinator behaves: idle thresholds,
// overlay timing, the shutdown policy and volume stepping. They never
// touch disk. The binary builds a `CoordinatorConfig` (usually through
// `jukebox-config`) and hands it in.

use std::collections::HashMap;
use std::time::Duration;

use crate::input::KeyInput;

/// How long the volume overlay stays up after the last change.
pub const DEFAULT_VOLUME_OVERLAY_TIMEOUT: Duration = Duration::from_millis(1500);

/// Idle monitor thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdleConfig {
    /// No user input for this long raises `InputIdle`.
    pub input_timeout: Duration,
    /// No input or system activity for this long raises `SystemIdle`.
    pub system_timeout: Duration,
    /// Reported system activity (audio playing) also resets the input
    /// tier and wakes the display. Clear it to let the display dim while
    /// music plays.
    pub system_activity_resets_input: bool,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            input_timeout: Duration::from_secs(60),
            system_timeout: Duration::from_secs(15 * 60),
            system_activity_resets_input: true,
        }
    }
}

/// View navigator timing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationConfig {
    pub volume_overlay_timeout: Duration,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            volume_overlay_timeout: DEFAULT_VOLUME_OVERLAY_TIMEOUT,
        }
    }
}

/// Initial shutdown policy. The flag can be flipped at runtime through
/// [`ShutdownController::set_allow_shutdown`](crate::ShutdownController::set_allow_shutdown).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownConfig {
    pub allow_shutdown: bool,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            allow_shutdown: true,
        }
    }
}

/// Volume stepping for the rotary encoder and volume keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeConfig {
    pub initial: u8,
    pub step: u8,
    pub max: u8,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            initial: 30,
            step: 5,
            max: 100,
        }
    }
}

/// Extra remote-control codes layered over the built-in table.
///
/// Keys are normalised the same way incoming codes are (trimmed,
/// upper-cased, `KEY_` prefix stripped) so lookups are consistent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteKeymap {
    entries: HashMap<String, KeyInput>,
}

impl RemoteKeymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a mapping.
    pub fn insert(&mut self, code: &str, key: KeyInput) {
        self.entries
            .insert(crate::input::normalize_remote_code(code), key);
    }

    pub fn get(&self, normalized_code: &str) -> Option<KeyInput> {
        self.entries.get(normalized_code).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<(S, KeyInput)> for RemoteKeymap {
    fn from_iter<I: IntoIterator<Item = (S, KeyInput)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (code, key) in iter {
            map.insert(code.as_ref(), key);
        }
        map
    }
}

/// Complete configuration for a [`Coordinator`](crate::Coordinator).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub idle: IdleConfig,
    pub navigation: NavigationConfig,
    pub shutdown: ShutdownConfig,
    pub volume: VolumeConfig,
    pub remote_keymap: RemoteKeymap,
}
