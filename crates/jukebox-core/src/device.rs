// ── External device contracts ──
//
// Everything behind these traits is implemented elsewhere: GPIO button
// drivers, the RFID reader, the rotary encoder, the IR receiver, the
// character display, the power-control board and the view renderer.
// The core only consumes the notifications and operations below.

use futures_util::future::BoxFuture;

use crate::error::CoreError;
use crate::event::EventChannel;
use crate::navigation::{InputTarget, NavigationEntry, ViewIdentity};
use crate::shutdown::ShutdownRequest;

// ── Raw device events ────────────────────────────────────────────

/// Physical push buttons on the front panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Button {
    PlayPause,
    Next,
    Previous,
    Menu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotaryDirection {
    Clockwise,
    CounterClockwise,
}

/// Raw UID bytes reported by the RFID reader.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TagUid(Vec<u8>);

impl TagUid {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Parse a hex string such as `04A1B2C3` or `04:a1:b2:c3`.
    /// Returns `None` for odd-length or non-hex input.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let digits: Vec<u8> = s
            .bytes()
            .filter(|b| !matches!(b, b':' | b'-' | b' '))
            .collect();
        if digits.len() % 2 != 0 {
            return None;
        }
        let mut bytes = Vec::with_capacity(digits.len() / 2);
        for pair in digits.chunks_exact(2) {
            let hi = char::from(pair[0]).to_digit(16)?;
            let lo = char::from(pair[1]).to_digit(16)?;
            bytes.push(u8::try_from(hi * 16 + lo).ok()?);
        }
        Some(Self(bytes))
    }
}

/// One notification from a device source. Each occurrence produces
/// exactly one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    ButtonPressed(Button),
    TagDetected(TagUid),
    RotaryRotated(RotaryDirection),
    RotaryPressed,
    /// Raw remote-control code, e.g. `KEY_PLAYPAUSE`.
    RemoteCommand(String),
}

// ── Device traits ────────────────────────────────────────────────

/// A source of raw device notifications.
pub trait InputSource: Send + Sync {
    /// Short name used in logs ("buttons", "rfid", ...).
    fn name(&self) -> &str;

    fn notifications(&self) -> &EventChannel<DeviceEvent>;
}

/// The character display's backlight capability.
pub trait Display: Send + Sync {
    fn has_backlight(&self) -> bool;

    fn backlight_enabled(&self) -> bool;

    fn set_backlight_enabled(&self, enabled: bool) -> Result<(), CoreError>;
}

/// The power-control board.
pub trait SystemControl: Send + Sync {
    /// Power the machine off.
    fn shutdown(&self) -> Result<(), CoreError>;

    /// Raised when the power button starts a hardware shutdown sequence.
    fn shutting_down(&self) -> &EventChannel<ShutdownRequest>;
}

/// Receives volume levels (usually forwarded to the music player daemon).
pub trait VolumeSink: Send + Sync {
    fn set_volume(&self, level: u8) -> Result<(), CoreError>;
}

/// Draws views on the display. Each returned future resolves once the
/// transition has been rendered.
pub trait ViewRenderer: Send + Sync {
    /// Show a transient view (overlay or blank screen).
    fn show(&self, view: ViewIdentity) -> BoxFuture<'_, Result<(), CoreError>>;

    /// Replace the current view.
    fn navigate_to(&self, view: ViewIdentity) -> BoxFuture<'_, Result<(), CoreError>>;

    /// Show a modal view whose key input is captured by `captured`.
    fn navigate_to_modal(
        &self,
        view: ViewIdentity,
        captured: Option<InputTarget>,
    ) -> BoxFuture<'_, Result<(), CoreError>>;

    /// Return to `restored`, the entry below the view being dismissed.
    fn navigate_back(&self, restored: NavigationEntry) -> BoxFuture<'_, Result<(), CoreError>>;
}
