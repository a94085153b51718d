// ── Volume controller ──
//
// Turns Up/Down keys into volume steps while the active view captures
// volume input (the Player view or the volume overlay itself).

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tracing::{debug, warn};

use crate::config::VolumeConfig;
use crate::device::VolumeSink;
use crate::event::{EventChannel, SubscriptionId};
use crate::input::KeyInput;
use crate::navigation::{InputTarget, ViewNavigator};

/// Raised on every volume key press handled by the controller, even
/// when the level is already at a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeChanged {
    pub level: u8,
}

pub struct VolumeController {
    config: VolumeConfig,
    level: AtomicU8,
    sink: Option<Arc<dyn VolumeSink>>,
    navigator: ViewNavigator,
    volume_changed: Arc<EventChannel<VolumeChanged>>,
}

impl VolumeController {
    pub fn new(
        config: VolumeConfig,
        sink: Option<Arc<dyn VolumeSink>>,
        navigator: ViewNavigator,
        volume_changed: Arc<EventChannel<VolumeChanged>>,
    ) -> Self {
        let level = config.initial.min(config.max);
        Self {
            config,
            level: AtomicU8::new(level),
            sink,
            navigator,
            volume_changed,
        }
    }

    pub fn attach(self: &Arc<Self>, keys: &EventChannel<KeyInput>) -> SubscriptionId {
        let this = Arc::clone(self);
        keys.subscribe("volume-controller", move |key| this.on_key(*key))
    }

    pub fn level(&self) -> u8 {
        self.level.load(Ordering::SeqCst)
    }

    pub fn volume_changed(&self) -> &Arc<EventChannel<VolumeChanged>> {
        &self.volume_changed
    }

    fn captures_input(&self) -> bool {
        let snapshot = self.navigator.snapshot();
        !snapshot.is_terminal()
            && snapshot
                .active()
                .is_some_and(|entry| entry.captured == Some(InputTarget::Volume))
    }

    fn on_key(&self, key: KeyInput) {
        let up = match key {
            KeyInput::Up => true,
            KeyInput::Down => false,
            _ => return,
        };
        if !self.captures_input() {
            debug!(?key, "volume input not captured by active view");
            return;
        }
        self.step(up);
    }

    /// Move the level one step. Returns the new level.
    pub fn step(&self, up: bool) -> u8 {
        let step = self.config.step;
        let max = self.config.max;
        let previous = self
            .level
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(if up {
                    current.saturating_add(step).min(max)
                } else {
                    current.saturating_sub(step)
                })
            })
            .unwrap_or_else(|current| current);
        let level = if up {
            previous.saturating_add(step).min(max)
        } else {
            previous.saturating_sub(step)
        };

        if level != previous {
            if let Some(sink) = &self.sink {
                if let Err(e) = sink.set_volume(level) {
                    warn!(level, error = %e, "failed to apply volume");
                }
            }
        }
        debug!(level, "volume changed");
        self.volume_changed.dispatch(&VolumeChanged { level });
        level
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::error::CoreError;
    use crate::navigation::{Navigable, NavRequest, ViewIdentity};
    use crate::test_support::{RecordingRenderer, detached_navigator};

    #[derive(Default)]
    struct FakeMixer {
        levels: Mutex<Vec<u8>>,
    }

    impl VolumeSink for FakeMixer {
        fn set_volume(&self, level: u8) -> Result<(), CoreError> {
            self.levels.lock().unwrap().push(level);
            Ok(())
        }
    }

    struct Fixture {
        navigator: ViewNavigator,
        mixer: Arc<FakeMixer>,
        keys: EventChannel<KeyInput>,
        controller: Arc<VolumeController>,
        changes: Arc<Mutex<Vec<u8>>>,
    }

    async fn fixture(initial: u8) -> Fixture {
        let navigator = detached_navigator(Arc::new(RecordingRenderer::default()));
        navigator.spawn(CancellationToken::new()).unwrap();
        navigator.navigate_to_player_view().await.unwrap();

        let mixer = Arc::new(FakeMixer::default());
        let channel = Arc::new(EventChannel::new("volume-changed"));
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        channel.subscribe("test", move |e: &VolumeChanged| sink.lock().unwrap().push(e.level));

        let config = VolumeConfig {
            initial,
            step: 5,
            max: 100,
        };
        let controller = Arc::new(VolumeController::new(
            config,
            Some(mixer.clone()),
            navigator.clone(),
            channel,
        ));
        let keys = EventChannel::new("keys");
        controller.attach(&keys);

        Fixture {
            navigator,
            mixer,
            keys,
            controller,
            changes,
        }
    }

    #[tokio::test]
    async fn steps_are_clamped_but_always_reported() {
        let f = fixture(95).await;
        f.keys.dispatch(&KeyInput::Up);
        f.keys.dispatch(&KeyInput::Up);
        assert_eq!(f.controller.level(), 100);
        assert_eq!(*f.changes.lock().unwrap(), vec![100, 100]);
        assert_eq!(*f.mixer.levels.lock().unwrap(), vec![100]);

        let f = fixture(3).await;
        f.keys.dispatch(&KeyInput::Down);
        f.keys.dispatch(&KeyInput::Down);
        assert_eq!(f.controller.level(), 0);
        assert_eq!(*f.changes.lock().unwrap(), vec![0, 0]);
    }

    #[tokio::test]
    async fn other_keys_are_ignored() {
        let f = fixture(30).await;
        f.keys.dispatch(&KeyInput::Ok);
        f.keys.dispatch(&KeyInput::Next);
        f.keys.dispatch(&KeyInput::Unknown);
        assert_eq!(f.controller.level(), 30);
        assert!(f.changes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn not_captured_while_menu_is_active() {
        let f = fixture(30).await;
        f.navigator.post(NavRequest::ShowMenu);
        f.navigator
            .subscribe()
            .wait_for(|s| s.active_view() == Some(ViewIdentity::Menu))
            .await
            .unwrap();

        f.keys.dispatch(&KeyInput::Up);
        assert_eq!(f.controller.level(), 30);
        assert!(f.changes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn initial_level_is_clamped_to_max() {
        let navigator = detached_navigator(Arc::new(RecordingRenderer::default()));
        let config = VolumeConfig {
            initial: 120,
            step: 5,
            max: 80,
        };
        let controller =
            VolumeController::new(config, None, navigator, Arc::new(EventChannel::new("v")));
        assert_eq!(controller.level(), 80);
        assert_eq!(controller.step(false), 75);
    }
}
