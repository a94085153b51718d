// ── View navigator ──
//
// Single source of truth for what is on screen. All stack mutations run
// on one actor task fed by an mpsc queue, so concurrent callers are
// serialized. The volume overlay's one-shot timer is owned by the same
// task: a new overlay request moves the deadline instead of adding a
// second timer, and reaching the Shutdown view clears it.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::view::{NavigationEntry, NavigationStack, ViewIdentity};
use crate::device::ViewRenderer;
use crate::error::CoreError;
use crate::event::EventChannel;
use crate::menu::MenuRequested;
use crate::shutdown::ShuttingDown;
use crate::timer::sleep_until_some;
use crate::volume::VolumeChanged;

// ── Public types ─────────────────────────────────────────────────

/// What a navigation request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The active view changed to this entry.
    Navigated(NavigationEntry),
    /// The requested view was already active (or the request had no
    /// visible effect). The volume overlay timer may still have moved.
    Unchanged,
    /// Back navigation with only the root view left.
    AtRoot,
    /// The Shutdown view is active; nothing else may be shown.
    Absorbed,
}

/// Observable navigator state, published after every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationSnapshot {
    pub stack: NavigationStack,
    /// Deadline of the pending volume overlay auto-return, if any.
    pub overlay_deadline: Option<Instant>,
}

impl NavigationSnapshot {
    pub fn active(&self) -> Option<NavigationEntry> {
        self.stack.active()
    }

    pub fn active_view(&self) -> Option<ViewIdentity> {
        self.stack.active_view()
    }

    pub fn is_terminal(&self) -> bool {
        self.stack.is_terminal()
    }
}

/// The public navigation surface.
pub trait Navigable {
    /// Show the Player view, capturing volume keys.
    fn navigate_to_player_view(
        &self,
    ) -> impl Future<Output = Result<NavigationOutcome, CoreError>> + Send;

    /// Dismiss the active view and restore the previous one.
    fn navigate_back(&self) -> impl Future<Output = Result<NavigationOutcome, CoreError>> + Send;
}

/// Event channels the navigator reacts to.
pub struct NavigatorEvents<'a> {
    pub volume_changed: &'a EventChannel<VolumeChanged>,
    pub menu_requested: &'a EventChannel<MenuRequested>,
    pub shutting_down: &'a EventChannel<ShuttingDown>,
}

// ── Requests ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NavRequest {
    ShowPlayer,
    Back,
    ShowVolume,
    ShowMenu,
    ShowShutdown,
    ShowBlank,
    DismissBlank,
}

type Reply = oneshot::Sender<Result<NavigationOutcome, CoreError>>;

struct NavEnvelope {
    request: NavRequest,
    reply: Option<Reply>,
}

// ── ViewNavigator ────────────────────────────────────────────────

/// Handle to the navigator actor. Cheaply cloneable.
#[derive(Clone)]
pub struct ViewNavigator {
    inner: Arc<NavigatorInner>,
}

struct NavigatorInner {
    renderer: Arc<dyn ViewRenderer>,
    overlay_timeout: Duration,
    request_tx: mpsc::UnboundedSender<NavEnvelope>,
    request_rx: Mutex<Option<mpsc::UnboundedReceiver<NavEnvelope>>>,
    snapshot: watch::Sender<NavigationSnapshot>,
}

impl ViewNavigator {
    /// Build the navigator and subscribe it to the domain events it
    /// reacts to. Requests queue until [`spawn`](Self::spawn) is called.
    pub fn new(
        renderer: Arc<dyn ViewRenderer>,
        overlay_timeout: Duration,
        events: &NavigatorEvents<'_>,
    ) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (snapshot, _) = watch::channel(NavigationSnapshot::default());

        let navigator = Self {
            inner: Arc::new(NavigatorInner {
                renderer,
                overlay_timeout,
                request_tx,
                request_rx: Mutex::new(Some(request_rx)),
                snapshot,
            }),
        };

        let nav = navigator.clone();
        events
            .volume_changed
            .subscribe("view-navigator", move |_| nav.post(NavRequest::ShowVolume));
        let nav = navigator.clone();
        events
            .menu_requested
            .subscribe("view-navigator", move |_| nav.post(NavRequest::ShowMenu));
        let nav = navigator.clone();
        events
            .shutting_down
            .subscribe("view-navigator", move |_| nav.post(NavRequest::ShowShutdown));

        navigator
    }

    /// Start the actor task. Returns `None` if it was already started.
    ///
    /// The task drains queued requests before honouring `cancel`, so a
    /// Shutdown view requested just before cancellation is still shown.
    pub fn spawn(&self, cancel: CancellationToken) -> Option<JoinHandle<()>> {
        let rx = self
            .inner
            .request_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(navigator_task(inner, rx, cancel)))
    }

    /// Current navigator state.
    pub fn snapshot(&self) -> NavigationSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Subscribe to navigator state changes.
    pub fn subscribe(&self) -> watch::Receiver<NavigationSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn active(&self) -> Option<NavigationEntry> {
        self.inner.snapshot.borrow().active()
    }

    pub fn active_view(&self) -> Option<ViewIdentity> {
        self.inner.snapshot.borrow().active_view()
    }

    /// Navigation history, root first.
    pub fn history(&self) -> Vec<NavigationEntry> {
        self.inner.snapshot.borrow().stack.entries().to_vec()
    }

    pub fn is_terminal(&self) -> bool {
        self.inner.snapshot.borrow().is_terminal()
    }

    /// Queue a request without waiting for it. Safe to call from
    /// synchronous event handlers.
    pub(crate) fn post(&self, request: NavRequest) {
        let envelope = NavEnvelope {
            request,
            reply: None,
        };
        if self.inner.request_tx.send(envelope).is_err() {
            debug!(?request, "navigator stopped; request dropped");
        }
    }

    async fn request(&self, request: NavRequest) -> Result<NavigationOutcome, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .request_tx
            .send(NavEnvelope {
                request,
                reply: Some(tx),
            })
            .map_err(|_| CoreError::NavigatorClosed)?;
        rx.await.map_err(|_| CoreError::NavigatorClosed)?
    }
}

impl Navigable for ViewNavigator {
    async fn navigate_to_player_view(&self) -> Result<NavigationOutcome, CoreError> {
        self.request(NavRequest::ShowPlayer).await
    }

    async fn navigate_back(&self) -> Result<NavigationOutcome, CoreError> {
        self.request(NavRequest::Back).await
    }
}

// ── Actor ────────────────────────────────────────────────────────

enum Render {
    Show,
    Modal,
}

struct NavigatorState {
    inner: Arc<NavigatorInner>,
    stack: NavigationStack,
    overlay_deadline: Option<Instant>,
}

async fn navigator_task(
    inner: Arc<NavigatorInner>,
    mut rx: mpsc::UnboundedReceiver<NavEnvelope>,
    cancel: CancellationToken,
) {
    let mut state = NavigatorState {
        inner,
        stack: NavigationStack::new(),
        overlay_deadline: None,
    };
    debug!("navigator task started");

    loop {
        let deadline = state.overlay_deadline;
        tokio::select! {
            biased;
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = state.handle(envelope.request).await;
                match envelope.reply {
                    Some(reply) => {
                        let _ = reply.send(result);
                    }
                    None => {
                        if let Err(e) = result {
                            warn!(request = ?envelope.request, error = %e, "navigation failed");
                        }
                    }
                }
            }
            () = sleep_until_some(deadline) => {
                state.overlay_expired().await;
            }
            () = cancel.cancelled() => break,
        }
        state.publish();
    }

    debug!("navigator task stopped");
}

impl NavigatorState {
    fn renderer(&self) -> &dyn ViewRenderer {
        self.inner.renderer.as_ref()
    }

    fn publish(&self) {
        let snapshot = NavigationSnapshot {
            stack: self.stack.clone(),
            overlay_deadline: self.overlay_deadline,
        };
        self.inner.snapshot.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }

    async fn handle(&mut self, request: NavRequest) -> Result<NavigationOutcome, CoreError> {
        if self.stack.is_terminal() {
            debug!(?request, "shutdown view active; request absorbed");
            return Ok(NavigationOutcome::Absorbed);
        }

        match request {
            NavRequest::ShowPlayer => self.push(NavigationEntry::player(), Render::Modal).await,
            NavRequest::ShowMenu => self.push(NavigationEntry::menu(), Render::Modal).await,
            NavRequest::ShowBlank => self.push(NavigationEntry::blank(), Render::Show).await,
            NavRequest::ShowVolume => self.show_volume().await,
            NavRequest::ShowShutdown => self.show_shutdown().await,
            NavRequest::Back => self.back().await,
            NavRequest::DismissBlank => self.dismiss_blank().await,
        }
    }

    async fn push(
        &mut self,
        entry: NavigationEntry,
        render: Render,
    ) -> Result<NavigationOutcome, CoreError> {
        let mut next = self.stack.clone();
        if !next.push(entry) {
            return Ok(NavigationOutcome::Unchanged);
        }

        // Dropping the overlay may already have exposed `entry`.
        if next.depth() < self.stack.depth() {
            self.renderer().navigate_back(entry).await?;
        } else {
            match render {
                Render::Show => self.renderer().show(entry.view).await?,
                Render::Modal => {
                    self.renderer()
                        .navigate_to_modal(entry.view, entry.captured)
                        .await?;
                }
            }
        }

        self.commit(next);
        info!(view = %entry.view, "navigated");
        Ok(NavigationOutcome::Navigated(entry))
    }

    async fn show_volume(&mut self) -> Result<NavigationOutcome, CoreError> {
        // An out-of-range timeout leaves the overlay up until dismissed.
        let deadline = Instant::now().checked_add(self.inner.overlay_timeout);

        if self.stack.active_view() == Some(ViewIdentity::Volume) {
            self.overlay_deadline = deadline;
            debug!("volume overlay timer restarted");
            return Ok(NavigationOutcome::Unchanged);
        }

        let outcome = self.push(NavigationEntry::volume(), Render::Show).await?;
        if self.stack.active_view() == Some(ViewIdentity::Volume) {
            self.overlay_deadline = deadline;
        }
        Ok(outcome)
    }

    async fn show_shutdown(&mut self) -> Result<NavigationOutcome, CoreError> {
        // Terminal even if rendering fails: no further navigation may run.
        let mut next = self.stack.clone();
        next.terminate();
        self.stack = next;
        self.overlay_deadline = None;

        self.renderer().navigate_to(ViewIdentity::Shutdown).await?;
        info!("shutdown view shown");
        Ok(NavigationOutcome::Navigated(NavigationEntry::shutdown()))
    }

    async fn back(&mut self) -> Result<NavigationOutcome, CoreError> {
        let mut next = self.stack.clone();
        let Some(restored) = next.pop() else {
            debug!(depth = self.stack.depth(), "navigate back at root ignored");
            return Ok(NavigationOutcome::AtRoot);
        };

        self.renderer().navigate_back(restored).await?;
        self.commit(next);
        info!(view = %restored.view, "navigated back");
        Ok(NavigationOutcome::Navigated(restored))
    }

    async fn dismiss_blank(&mut self) -> Result<NavigationOutcome, CoreError> {
        if self.stack.active_view() == Some(ViewIdentity::Blank) {
            return self.back().await;
        }
        let mut next = self.stack.clone();
        if next.remove_buried(ViewIdentity::Blank) {
            debug!("removed buried blank view");
            self.commit(next);
        }
        Ok(NavigationOutcome::Unchanged)
    }

    async fn overlay_expired(&mut self) {
        self.overlay_deadline = None;
        if self.stack.active_view() != Some(ViewIdentity::Volume) {
            return;
        }
        debug!("volume overlay timed out");
        if let Err(e) = self.back().await {
            warn!(error = %e, "failed to dismiss volume overlay");
        }
    }

    /// Install a new stack, dropping the overlay timer once the overlay
    /// is no longer active.
    fn commit(&mut self, next: NavigationStack) {
        self.stack = next;
        if self.stack.active_view() != Some(ViewIdentity::Volume) {
            self.overlay_deadline = None;
        }
    }
}
