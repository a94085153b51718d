// ── Menu controller ──
//
// Opens the menu on the Menu key from the player and closes it on Ok (or
// a second Menu press) while the menu captures input.

use std::sync::Arc;

use tracing::debug;

use crate::event::{EventChannel, SubscriptionId};
use crate::input::KeyInput;
use crate::navigation::{InputTarget, NavRequest, ViewNavigator};

/// Raised when the user asks for the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuRequested;

/// Raised when the user leaves the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuExit;

pub struct MenuController {
    navigator: ViewNavigator,
    menu_requested: Arc<EventChannel<MenuRequested>>,
    menu_exit: Arc<EventChannel<MenuExit>>,
}

impl MenuController {
    pub fn new(
        navigator: ViewNavigator,
        menu_requested: Arc<EventChannel<MenuRequested>>,
        menu_exit: Arc<EventChannel<MenuExit>>,
    ) -> Self {
        Self {
            navigator,
            menu_requested,
            menu_exit,
        }
    }

    pub fn attach(self: &Arc<Self>, keys: &EventChannel<KeyInput>) -> SubscriptionId {
        let this = Arc::clone(self);
        keys.subscribe("menu-controller", move |key| this.on_key(*key))
    }

    pub fn menu_requested(&self) -> &Arc<EventChannel<MenuRequested>> {
        &self.menu_requested
    }

    pub fn menu_exit(&self) -> &Arc<EventChannel<MenuExit>> {
        &self.menu_exit
    }

    fn on_key(&self, key: KeyInput) {
        let snapshot = self.navigator.snapshot();
        if snapshot.is_terminal() {
            return;
        }
        // Views without a capture target (the blank screen) swallow keys.
        let Some(captured) = snapshot.active().and_then(|entry| entry.captured) else {
            return;
        };

        match (key, captured) {
            (KeyInput::Menu, InputTarget::Volume) => {
                debug!("menu requested");
                self.menu_requested.dispatch(&MenuRequested);
            }
            (KeyInput::Ok | KeyInput::Menu, InputTarget::Menu) => {
                debug!("menu exit");
                self.menu_exit.dispatch(&MenuExit);
                self.navigator.post(NavRequest::Back);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::navigation::{Navigable, NavigationEntry, ViewIdentity};
    use crate::test_support::{RecordingRenderer, detached_navigator};

    struct Fixture {
        navigator: ViewNavigator,
        keys: EventChannel<KeyInput>,
        requested: Arc<AtomicUsize>,
        exited: Arc<AtomicUsize>,
    }

    fn counter<E: 'static>(channel: &EventChannel<E>) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        channel.subscribe("test", move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        count
    }

    async fn fixture() -> Fixture {
        let navigator = detached_navigator(Arc::new(RecordingRenderer::default()));
        navigator.spawn(CancellationToken::new()).unwrap();
        navigator.navigate_to_player_view().await.unwrap();

        let controller = Arc::new(MenuController::new(
            navigator.clone(),
            Arc::new(EventChannel::new("menu-requested")),
            Arc::new(EventChannel::new("menu-exit")),
        ));
        let requested = counter(controller.menu_requested());
        let exited = counter(controller.menu_exit());
        let keys = EventChannel::new("keys");
        controller.attach(&keys);

        Fixture {
            navigator,
            keys,
            requested,
            exited,
        }
    }

    async fn show_menu(navigator: &ViewNavigator) {
        navigator.post(NavRequest::ShowMenu);
        navigator
            .subscribe()
            .wait_for(|s| s.active_view() == Some(ViewIdentity::Menu))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn menu_key_outside_menu_requests_it() {
        let f = fixture().await;
        f.keys.dispatch(&KeyInput::Menu);
        f.keys.dispatch(&KeyInput::Ok);

        assert_eq!(f.requested.load(Ordering::SeqCst), 1);
        assert_eq!(f.exited.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ok_in_menu_exits_and_navigates_back() {
        let f = fixture().await;
        show_menu(&f.navigator).await;

        f.keys.dispatch(&KeyInput::Up);
        f.keys.dispatch(&KeyInput::Ok);
        f.navigator
            .subscribe()
            .wait_for(|s| s.active_view() == Some(ViewIdentity::Player))
            .await
            .unwrap();

        assert_eq!(f.exited.load(Ordering::SeqCst), 1);
        assert_eq!(f.requested.load(Ordering::SeqCst), 0);
        assert_eq!(f.navigator.history(), vec![NavigationEntry::player()]);
    }

    #[tokio::test]
    async fn menu_key_in_menu_also_exits() {
        let f = fixture().await;
        show_menu(&f.navigator).await;

        f.keys.dispatch(&KeyInput::Menu);
        f.navigator
            .subscribe()
            .wait_for(|s| s.active_view() == Some(ViewIdentity::Player))
            .await
            .unwrap();
        assert_eq!(f.exited.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn keys_over_blank_screen_are_swallowed() {
        let f = fixture().await;
        f.navigator.post(NavRequest::ShowBlank);
        f.navigator
            .subscribe()
            .wait_for(|s| s.active_view() == Some(ViewIdentity::Blank))
            .await
            .unwrap();

        f.keys.dispatch(&KeyInput::Menu);
        assert_eq!(f.requested.load(Ordering::SeqCst), 0);
    }
}
