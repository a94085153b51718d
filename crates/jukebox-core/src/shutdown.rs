// ── Shutdown controller ──
//
// Arbitrates idle-triggered and power-button shutdowns against the
// "allow shutdown" policy. Every path converges on one transition,
// Running -> ShuttingDown -> Stopped, which raises `ShuttingDown` and
// cancels the session token exactly once.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::device::SystemControl;
use crate::error::CoreError;
use crate::event::{EventChannel, SubscriptionId};
use crate::idle::IdleEvent;

/// Lifecycle of the application session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ShutdownState {
    Running,
    ShuttingDown,
    Stopped,
}

/// What initiated a shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ShutdownSource {
    /// The idle monitor reported system-idle.
    SystemIdle,
    /// The power-control board started a hardware shutdown.
    PowerControl,
    /// The host application asked to stop (e.g. Ctrl-C).
    Application,
}

/// Raised once when the session starts shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShuttingDown {
    pub source: ShutdownSource,
}

type Canceller = Arc<dyn Fn() -> Result<(), CoreError> + Send + Sync>;

/// A shutdown in progress, as reported by the power-control board.
///
/// Cancellable requests carry a callback that aborts the hardware
/// shutdown sequence.
#[derive(Clone)]
pub struct ShutdownRequest {
    source: ShutdownSource,
    canceller: Option<Canceller>,
}

impl ShutdownRequest {
    /// A hardware shutdown that can be aborted through `cancel`.
    pub fn cancellable<F>(cancel: F) -> Self
    where
        F: Fn() -> Result<(), CoreError> + Send + Sync + 'static,
    {
        Self {
            source: ShutdownSource::PowerControl,
            canceller: Some(Arc::new(cancel)),
        }
    }

    /// A hardware shutdown that cannot be aborted.
    pub fn uncancellable() -> Self {
        Self {
            source: ShutdownSource::PowerControl,
            canceller: None,
        }
    }

    pub fn source(&self) -> ShutdownSource {
        self.source
    }

    pub fn is_cancellable(&self) -> bool {
        self.canceller.is_some()
    }

    /// Abort the hardware shutdown.
    pub fn cancel(&self) -> Result<(), CoreError> {
        match &self.canceller {
            Some(cancel) => cancel(),
            None => Err(CoreError::ShutdownCancel {
                message: "shutdown request is not cancellable".into(),
            }),
        }
    }
}

impl fmt::Debug for ShutdownRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownRequest")
            .field("source", &self.source)
            .field("cancellable", &self.is_cancellable())
            .finish()
    }
}

// ── ShutdownController ───────────────────────────────────────────

pub struct ShutdownController {
    allow_shutdown: AtomicBool,
    system: Arc<dyn SystemControl>,
    token: CancellationToken,
    state: watch::Sender<ShutdownState>,
    shutting_down: Arc<EventChannel<ShuttingDown>>,
}

impl ShutdownController {
    /// `token` is the session-wide cancellation token, shared with the
    /// host application.
    pub fn new(
        allow_shutdown: bool,
        system: Arc<dyn SystemControl>,
        token: CancellationToken,
        shutting_down: Arc<EventChannel<ShuttingDown>>,
    ) -> Self {
        let (state, _) = watch::channel(ShutdownState::Running);
        Self {
            allow_shutdown: AtomicBool::new(allow_shutdown),
            system,
            token,
            state,
            shutting_down,
        }
    }

    /// Subscribe to idle-monitor events and the power board's
    /// shutdown notifications.
    pub fn attach(
        self: &Arc<Self>,
        idle_events: &EventChannel<IdleEvent>,
    ) -> (SubscriptionId, SubscriptionId) {
        let this = Arc::clone(self);
        let idle = idle_events.subscribe("shutdown-controller", move |event| {
            if *event == IdleEvent::SystemIdle {
                this.on_system_idle();
            }
        });

        let this = Arc::clone(self);
        let power = self
            .system
            .shutting_down()
            .subscribe("shutdown-controller", move |request| {
                this.on_power_request(request);
            });

        (idle, power)
    }

    pub fn allow_shutdown(&self) -> bool {
        self.allow_shutdown.load(Ordering::SeqCst)
    }

    pub fn set_allow_shutdown(&self, allow: bool) {
        let previous = self.allow_shutdown.swap(allow, Ordering::SeqCst);
        if previous != allow {
            info!(allow, "shutdown policy changed");
        }
    }

    pub fn state(&self) -> ShutdownState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ShutdownState> {
        self.state.subscribe()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Raised once when shutdown begins.
    pub fn shutting_down(&self) -> &Arc<EventChannel<ShuttingDown>> {
        &self.shutting_down
    }

    /// System-idle trigger: power off if allowed, then stop the app.
    pub fn on_system_idle(&self) {
        if !self.begin(ShutdownSource::SystemIdle) {
            return;
        }
        if self.allow_shutdown() {
            info!("system idle; powering off");
            if let Err(e) = self.system.shutdown() {
                error!(error = %e, "hardware shutdown failed");
            }
        } else {
            info!("system idle; shutdown not allowed, stopping application only");
        }
        self.complete(ShutdownSource::SystemIdle);
    }

    /// Power-button trigger: let the hardware proceed if allowed,
    /// otherwise abort it. The application stops either way.
    pub fn on_power_request(&self, request: &ShutdownRequest) {
        if self.allow_shutdown() {
            info!("power control shutdown accepted");
        } else {
            warn!("power control shutdown not allowed; cancelling hardware shutdown");
            if let Err(e) = request.cancel() {
                error!(error = %e, "failed to cancel hardware shutdown");
            }
        }

        if self.begin(request.source()) {
            self.complete(request.source());
        }
    }

    /// Cooperative application shutdown without touching hardware.
    pub fn request_shutdown(&self, source: ShutdownSource) {
        if self.begin(source) {
            self.complete(source);
        }
    }

    /// Running -> ShuttingDown. Only the first caller wins.
    fn begin(&self, source: ShutdownSource) -> bool {
        let won = self.state.send_if_modified(|state| {
            if *state == ShutdownState::Running {
                *state = ShutdownState::ShuttingDown;
                true
            } else {
                false
            }
        });
        if !won {
            debug!(%source, state = %self.state(), "shutdown already in progress");
        }
        won
    }

    /// Notify, cancel the session token, then ShuttingDown -> Stopped.
    fn complete(&self, source: ShutdownSource) {
        info!(%source, "shutting down");
        self.shutting_down.dispatch(&ShuttingDown { source });
        self.token.cancel();
        self.state.send_replace(ShutdownState::Stopped);
    }
}
