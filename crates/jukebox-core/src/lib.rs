//! Interaction, navigation and power-lifecycle coordination for the
//! jukebox appliance.
//!
//! Device drivers, the display renderer and the music player live
//! elsewhere; this crate turns their notifications into behaviour:
//!
//! - **[`InteractionController`]**: maps raw device events (buttons,
//!   rotary encoder, IR remote, RFID reader) onto exactly one
//!   [`KeyInput`] or [`TagInput`] dispatch each.
//!
//! - **[`IdleMonitor`]**: two independently timed idle tiers (input and
//!   system) raising [`IdleEvent`]s.
//!
//! - **[`DisplayStateController`]**: switches the backlight, or shows a
//!   blank view on displays without one.
//!
//! - **[`ViewNavigator`]**: stack-based modal navigation with a debounced
//!   volume overlay and a terminal Shutdown view. All stack mutations are
//!   serialized through one actor task.
//!
//! - **[`ShutdownController`]**: arbitrates idle and power-button
//!   shutdowns against the "allow shutdown" policy and cancels the
//!   session token exactly once.
//!
//! - **[`Coordinator`]**: the composition root wiring all of the above.
//!
//! Components talk through [`EventChannel`]s, ordered synchronous
//! observer registries whose handlers must not block.

pub mod config;
pub mod coordinator;
pub mod device;
pub mod display;
pub mod error;
pub mod event;
pub mod idle;
pub mod input;
pub mod interaction;
pub mod menu;
pub mod navigation;
pub mod shutdown;
pub mod volume;

mod timer;

#[cfg(test)]
mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{
    CoordinatorConfig, DEFAULT_VOLUME_OVERLAY_TIMEOUT, IdleConfig, NavigationConfig,
    RemoteKeymap, ShutdownConfig, VolumeConfig,
};
pub use coordinator::{Coordinator, Devices};
pub use device::{
    Button, DeviceEvent, Display, InputSource, RotaryDirection, SystemControl, TagUid,
    ViewRenderer, VolumeSink,
};
pub use display::DisplayStateController;
pub use error::CoreError;
pub use event::{EventChannel, Notifier, SubscriptionId};
pub use idle::{Activity, IdleEvent, IdleMonitor, IdleSnapshot, IdleState};
pub use input::{KeyInput, MappedInput, TagInput};
pub use interaction::InteractionController;
pub use menu::{MenuController, MenuExit, MenuRequested};
pub use navigation::{
    InputTarget, Navigable, NavigationEntry, NavigationOutcome, NavigationSnapshot,
    NavigationStack, NavigatorEvents, ViewIdentity, ViewNavigator,
};
pub use shutdown::{
    ShutdownController, ShutdownRequest, ShutdownSource, ShutdownState, ShuttingDown,
};
pub use volume::{VolumeChanged, VolumeController};
