// ── Logical input model ──
//
// Canonical keys and tag identifiers, plus the pure mapping from raw
// device events. Nothing here fails: unrecognised remote codes become
// `KeyInput::Unknown` and are still forwarded.

use std::fmt;
use std::fmt::Write as _;

use crate::config::RemoteKeymap;
use crate::device::{Button, DeviceEvent, RotaryDirection, TagUid};

/// Canonical logical key produced by any physical control.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum KeyInput {
    Ok,
    Left,
    Right,
    Select,
    Up,
    Down,
    Menu,
    PlayPause,
    Next,
    Previous,
    Stop,
    Unknown,
}

/// A detected RFID tag, identified by its canonical UID string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagInput {
    uid: String,
}

impl TagInput {
    pub fn new(uid: &TagUid) -> Self {
        Self {
            uid: canonical_uid(uid),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }
}

impl fmt::Display for TagInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uid)
    }
}

/// Result of mapping one raw device event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappedInput {
    Key(KeyInput),
    Tag(TagInput),
}

/// Two upper-case hex digits per UID byte, no separators.
pub fn canonical_uid(uid: &TagUid) -> String {
    let mut out = String::with_capacity(uid.as_bytes().len() * 2);
    for byte in uid.as_bytes() {
        let _ = write!(out, "{byte:02X}");
    }
    out
}

pub fn key_for_button(button: Button) -> KeyInput {
    match button {
        Button::PlayPause => KeyInput::PlayPause,
        Button::Next => KeyInput::Next,
        Button::Previous => KeyInput::Previous,
        Button::Menu => KeyInput::Menu,
    }
}

pub fn key_for_rotation(direction: RotaryDirection) -> KeyInput {
    match direction {
        RotaryDirection::Clockwise => KeyInput::Up,
        RotaryDirection::CounterClockwise => KeyInput::Down,
    }
}

/// Trim, upper-case and strip a leading `KEY_` so `key_playpause`,
/// `KEY_PLAYPAUSE` and `PlayPause` all compare equal.
pub fn normalize_remote_code(code: &str) -> String {
    let upper = code.trim().to_ascii_uppercase();
    match upper.strip_prefix("KEY_") {
        Some(rest) => rest.to_owned(),
        None => upper,
    }
}

/// Look a remote code up in `overrides` first, then the built-in table.
pub fn key_for_remote(code: &str, overrides: &RemoteKeymap) -> KeyInput {
    let normalized = normalize_remote_code(code);
    if let Some(key) = overrides.get(&normalized) {
        return key;
    }
    match normalized.as_str() {
        "OK" => KeyInput::Ok,
        "LEFT" => KeyInput::Left,
        "RIGHT" => KeyInput::Right,
        "SELECT" | "ENTER" => KeyInput::Select,
        "UP" | "VOLUMEUP" => KeyInput::Up,
        "DOWN" | "VOLUMEDOWN" => KeyInput::Down,
        "MENU" => KeyInput::Menu,
        "PLAYPAUSE" | "PLAY" | "PAUSE" => KeyInput::PlayPause,
        "NEXT" | "NEXTSONG" | "FASTFORWARD" => KeyInput::Next,
        "PREVIOUS" | "PREVIOUSSONG" | "REWIND" => KeyInput::Previous,
        "STOP" => KeyInput::Stop,
        _ => KeyInput::Unknown,
    }
}

/// Map a raw device event onto exactly one logical input.
pub fn map_device_event(event: &DeviceEvent, overrides: &RemoteKeymap) -> MappedInput {
    match event {
        DeviceEvent::ButtonPressed(button) => MappedInput::Key(key_for_button(*button)),
        DeviceEvent::RotaryRotated(direction) => MappedInput::Key(key_for_rotation(*direction)),
        DeviceEvent::RotaryPressed => MappedInput::Key(KeyInput::Select),
        DeviceEvent::RemoteCommand(code) => MappedInput::Key(key_for_remote(code, overrides)),
        DeviceEvent::TagDetected(uid) => MappedInput::Tag(TagInput::new(uid)),
    }
}
