// ── Display state controller ──
//
// Dims the display on input-idle and restores it on activation. Displays
// with a backlight are switched directly; others get a blank view pushed
// over whatever is showing.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::device::Display;
use crate::event::{EventChannel, SubscriptionId};
use crate::idle::IdleEvent;
use crate::navigation::{NavRequest, ViewNavigator};

pub struct DisplayStateController {
    display: Arc<dyn Display>,
    navigator: ViewNavigator,
}

impl DisplayStateController {
    pub fn new(display: Arc<dyn Display>, navigator: ViewNavigator) -> Self {
        Self { display, navigator }
    }

    pub fn attach(self: &Arc<Self>, idle_events: &EventChannel<IdleEvent>) -> SubscriptionId {
        let this = Arc::clone(self);
        idle_events.subscribe("display-state-controller", move |event| this.on_idle_event(*event))
    }

    pub fn on_idle_event(&self, event: IdleEvent) {
        if self.display.has_backlight() {
            match event {
                IdleEvent::InputIdle => self.set_backlight(false),
                IdleEvent::Activated { .. } => self.set_backlight(true),
                IdleEvent::SystemIdle => {}
            }
            return;
        }

        match event {
            IdleEvent::InputIdle => {
                debug!("input idle; blanking display");
                self.navigator.post(NavRequest::ShowBlank);
            }
            IdleEvent::Activated {
                first_activation: false,
            } => {
                debug!("activated; restoring view");
                self.navigator.post(NavRequest::DismissBlank);
            }
            IdleEvent::Activated {
                first_activation: true,
            }
            | IdleEvent::SystemIdle => {}
        }
    }

    fn set_backlight(&self, enabled: bool) {
        if self.display.backlight_enabled() == enabled {
            debug!(enabled, "backlight already in requested state");
            return;
        }
        match self.display.set_backlight_enabled(enabled) {
            Ok(()) => debug!(enabled, "backlight switched"),
            Err(e) => warn!(enabled, error = %e, "failed to switch backlight"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::error::CoreError;
    use crate::navigation::{Navigable, NavigationEntry, ViewIdentity};
    use crate::test_support::{RecordingRenderer, detached_navigator};

    struct FakeDisplay {
        backlight: Option<AtomicBool>,
        writes: AtomicUsize,
    }

    impl FakeDisplay {
        fn with_backlight(on: bool) -> Self {
            Self {
                backlight: Some(AtomicBool::new(on)),
                writes: AtomicUsize::new(0),
            }
        }

        fn without_backlight() -> Self {
            Self {
                backlight: None,
                writes: AtomicUsize::new(0),
            }
        }
    }

    impl Display for FakeDisplay {
        fn has_backlight(&self) -> bool {
            self.backlight.is_some()
        }

        fn backlight_enabled(&self) -> bool {
            self.backlight
                .as_ref()
                .is_none_or(|b| b.load(Ordering::SeqCst))
        }

        fn set_backlight_enabled(&self, enabled: bool) -> Result<(), CoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            if let Some(b) = &self.backlight {
                b.store(enabled, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    fn navigator() -> ViewNavigator {
        detached_navigator(Arc::new(RecordingRenderer::default()))
    }

    #[test]
    fn backlight_toggles_without_redundant_writes() {
        let display = Arc::new(FakeDisplay::with_backlight(true));
        let controller = Arc::new(DisplayStateController::new(display.clone(), navigator()));
        let idle = EventChannel::new("idle");
        controller.attach(&idle);

        idle.dispatch(&IdleEvent::InputIdle);
        idle.dispatch(&IdleEvent::InputIdle);
        assert!(!display.backlight_enabled());
        assert_eq!(display.writes.load(Ordering::SeqCst), 1);

        idle.dispatch(&IdleEvent::Activated {
            first_activation: false,
        });
        idle.dispatch(&IdleEvent::Activated {
            first_activation: true,
        });
        assert!(display.backlight_enabled());
        assert_eq!(display.writes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn system_idle_leaves_backlight_alone() {
        let display = Arc::new(FakeDisplay::with_backlight(true));
        let controller = DisplayStateController::new(display.clone(), navigator());
        controller.on_idle_event(IdleEvent::SystemIdle);
        assert_eq!(display.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_view_covers_and_restores_active_view() {
        let navigator = navigator();
        let cancel = CancellationToken::new();
        let _task = navigator.spawn(cancel.clone()).unwrap();
        navigator.navigate_to_player_view().await.unwrap();

        let display = Arc::new(FakeDisplay::without_backlight());
        let controller = DisplayStateController::new(display.clone(), navigator.clone());

        controller.on_idle_event(IdleEvent::Activated {
            first_activation: true,
        });
        controller.on_idle_event(IdleEvent::InputIdle);
        let mut state = navigator.subscribe();
        state
            .wait_for(|s| s.active_view() == Some(ViewIdentity::Blank))
            .await
            .unwrap();

        controller.on_idle_event(IdleEvent::Activated {
            first_activation: false,
        });
        state
            .wait_for(|s| s.active_view() == Some(ViewIdentity::Player))
            .await
            .unwrap();
        assert_eq!(navigator.history(), vec![NavigationEntry::player()]);
        assert_eq!(display.writes.load(Ordering::SeqCst), 0);
    }
}
