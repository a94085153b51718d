// ── Idle monitor ──
//
// Classifies activity into two independently timed tiers. The input tier
// tracks user input (keys, tags); the system tier additionally tracks
// reported system activity such as audio playback. Each tier raises its
// idle event once per transition and is re-armed by activity.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::config::IdleConfig;
use crate::event::EventChannel;
use crate::timer::sleep_until_some;

/// Kind of activity fed into the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Activity {
    /// A key or tag input.
    Input,
    /// Non-input activity, e.g. audio playing.
    System,
}

/// Idle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleEvent {
    /// No input for the input timeout.
    InputIdle,
    /// Activity after input-idle. `first_activation` is set exactly once,
    /// when the monitor starts.
    Activated { first_activation: bool },
    /// No activity of any kind for the system timeout.
    SystemIdle,
}

/// State of one idle tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleState {
    pub last_activity: Instant,
    pub is_idle: bool,
}

/// Both tiers, as published by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleSnapshot {
    pub input: IdleState,
    pub system: IdleState,
}

impl IdleSnapshot {
    fn at(now: Instant) -> Self {
        let fresh = IdleState {
            last_activity: now,
            is_idle: false,
        };
        Self {
            input: fresh,
            system: fresh,
        }
    }
}

// ── IdleMonitor ──────────────────────────────────────────────────

/// Handle to the idle monitor task. Cheaply cloneable.
#[derive(Clone)]
pub struct IdleMonitor {
    inner: Arc<IdleInner>,
}

struct IdleInner {
    config: IdleConfig,
    events: Arc<EventChannel<IdleEvent>>,
    activity_tx: mpsc::UnboundedSender<Activity>,
    activity_rx: Mutex<Option<mpsc::UnboundedReceiver<Activity>>>,
    state: watch::Sender<IdleSnapshot>,
}

impl IdleMonitor {
    pub fn new(config: IdleConfig, events: Arc<EventChannel<IdleEvent>>) -> Self {
        let (activity_tx, activity_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(IdleSnapshot::at(Instant::now()));
        Self {
            inner: Arc::new(IdleInner {
                config,
                events,
                activity_tx,
                activity_rx: Mutex::new(Some(activity_rx)),
                state,
            }),
        }
    }

    /// Record activity. Never blocks; safe from event handlers.
    pub fn report(&self, activity: Activity) {
        if self.inner.activity_tx.send(activity).is_err() {
            trace!(%activity, "idle monitor stopped; activity dropped");
        }
    }

    pub fn events(&self) -> &Arc<EventChannel<IdleEvent>> {
        &self.inner.events
    }

    pub fn config(&self) -> &IdleConfig {
        &self.inner.config
    }

    pub fn state(&self) -> IdleSnapshot {
        *self.inner.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<IdleSnapshot> {
        self.inner.state.subscribe()
    }

    /// Start the monitor task. Both timers start from the moment the task
    /// first runs. Returns `None` if it was already started.
    pub fn spawn(&self, cancel: CancellationToken) -> Option<JoinHandle<()>> {
        let rx = self
            .inner
            .activity_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()?;
        let inner = Arc::clone(&self.inner);
        Some(tokio::spawn(idle_task(inner, rx, cancel)))
    }
}

// ── Task ─────────────────────────────────────────────────────────

struct Tier {
    name: &'static str,
    timeout: Duration,
    state: IdleState,
}

impl Tier {
    fn new(name: &'static str, timeout: Duration, now: Instant) -> Self {
        Self {
            name,
            timeout,
            state: IdleState {
                last_activity: now,
                is_idle: false,
            },
        }
    }

    /// `None` while idle, or when the timeout reaches past the clock's range.
    fn deadline(&self) -> Option<Instant> {
        if self.state.is_idle {
            return None;
        }
        self.state.last_activity.checked_add(self.timeout)
    }

    /// Record activity. Returns `true` if the tier was idle.
    fn touch(&mut self, now: Instant) -> bool {
        let was_idle = self.state.is_idle;
        self.state = IdleState {
            last_activity: now,
            is_idle: false,
        };
        if was_idle {
            debug!(tier = self.name, "tier active again");
        }
        was_idle
    }

    fn expire(&mut self) {
        self.state.is_idle = true;
        info!(tier = self.name, timeout = ?self.timeout, "tier idle");
    }
}

async fn idle_task(
    inner: Arc<IdleInner>,
    mut rx: mpsc::UnboundedReceiver<Activity>,
    cancel: CancellationToken,
) {
    let now = Instant::now();
    let mut input = Tier::new("input", inner.config.input_timeout, now);
    let mut system = Tier::new("system", inner.config.system_timeout, now);
    publish(&inner, &input, &system);

    debug!("idle monitor started");
    inner.events.dispatch(&IdleEvent::Activated {
        first_activation: true,
    });

    loop {
        let input_deadline = input.deadline();
        let system_deadline = system.deadline();
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            activity = rx.recv() => {
                let Some(activity) = activity else { break };
                let now = Instant::now();
                let wakes_input = match activity {
                    Activity::Input => true,
                    Activity::System => inner.config.system_activity_resets_input,
                };
                system.touch(now);
                if wakes_input && input.touch(now) {
                    inner.events.dispatch(&IdleEvent::Activated {
                        first_activation: false,
                    });
                }
            }
            () = sleep_until_some(input_deadline) => {
                input.expire();
                inner.events.dispatch(&IdleEvent::InputIdle);
            }
            () = sleep_until_some(system_deadline) => {
                system.expire();
                inner.events.dispatch(&IdleEvent::SystemIdle);
            }
        }
        publish(&inner, &input, &system);
    }

    debug!("idle monitor stopped");
}

fn publish(inner: &IdleInner, input: &Tier, system: &Tier) {
    let snapshot = IdleSnapshot {
        input: input.state,
        system: system.state,
    };
    inner.state.send_if_modified(|current| {
        if *current == snapshot {
            false
        } else {
            *current = snapshot;
            true
        }
    });
}
