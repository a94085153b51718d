#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt};

use crate::device::ViewRenderer;
use crate::error::CoreError;
use crate::event::EventChannel;
use crate::navigation::{
    InputTarget, NavigationEntry, NavigatorEvents, ViewIdentity, ViewNavigator,
};

/// Renderer that logs every call as a short string and can be told to
/// fail.
#[derive(Default)]
pub(crate) struct RecordingRenderer {
    calls: Mutex<Vec<String>>,
    pub(crate) fail: AtomicBool,
}

impl RecordingRenderer {
    fn record(&self, call: String, view: ViewIdentity) -> BoxFuture<'_, Result<(), CoreError>> {
        let failed = self.fail.load(Ordering::SeqCst);
        if !failed {
            self.calls.lock().unwrap().push(call);
        }
        async move {
            if failed {
                Err(CoreError::Render {
                    view,
                    message: "display bus error".into(),
                })
            } else {
                Ok(())
            }
        }
        .boxed()
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ViewRenderer for RecordingRenderer {
    fn show(&self, view: ViewIdentity) -> BoxFuture<'_, Result<(), CoreError>> {
        self.record(format!("show {view}"), view)
    }

    fn navigate_to(&self, view: ViewIdentity) -> BoxFuture<'_, Result<(), CoreError>> {
        self.record(format!("to {view}"), view)
    }

    fn navigate_to_modal(
        &self,
        view: ViewIdentity,
        captured: Option<InputTarget>,
    ) -> BoxFuture<'_, Result<(), CoreError>> {
        let target = captured.map_or_else(|| "none".to_owned(), |t| t.to_string());
        self.record(format!("modal {view} ({target})"), view)
    }

    fn navigate_back(&self, restored: NavigationEntry) -> BoxFuture<'_, Result<(), CoreError>> {
        self.record(format!("back {}", restored.view), restored.view)
    }
}

/// A navigator not wired to any domain events.
pub(crate) fn detached_navigator(renderer: Arc<RecordingRenderer>) -> ViewNavigator {
    ViewNavigator::new(
        renderer,
        Duration::from_millis(1500),
        &NavigatorEvents {
            volume_changed: &EventChannel::new("volume"),
            menu_requested: &EventChannel::new("menu"),
            shutting_down: &EventChannel::new("shutdown"),
        },
    )
}
