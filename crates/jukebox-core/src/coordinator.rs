// ── Coordinator ──
//
// Composition root. Builds every component in dependency order, wires the
// event channels between them, and owns the background tasks for the
// lifetime of the session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::CoordinatorConfig;
use crate::device::{Display, InputSource, SystemControl, ViewRenderer, VolumeSink};
use crate::display::DisplayStateController;
use crate::error::CoreError;
use crate::event::EventChannel;
use crate::idle::{Activity, IdleEvent, IdleMonitor};
use crate::input::{KeyInput, TagInput};
use crate::interaction::InteractionController;
use crate::menu::{MenuController, MenuExit};
use crate::navigation::{Navigable, NavigatorEvents, ViewNavigator};
use crate::shutdown::{ShutdownController, ShutdownSource, ShuttingDown};
use crate::volume::{VolumeChanged, VolumeController};

/// The hardware the coordinator drives.
pub struct Devices {
    pub inputs: Vec<Arc<dyn InputSource>>,
    pub display: Arc<dyn Display>,
    pub system: Arc<dyn SystemControl>,
    pub renderer: Arc<dyn ViewRenderer>,
    /// External mixer; `None` keeps the volume level internal only.
    pub volume_sink: Option<Arc<dyn VolumeSink>>,
}

/// Cheaply cloneable handle to the running appliance session.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    config: CoordinatorConfig,
    interaction: InteractionController,
    idle: IdleMonitor,
    navigator: ViewNavigator,
    shutdown: Arc<ShutdownController>,
    volume: Arc<VolumeController>,
    menu: Arc<MenuController>,
    // Held for its subscriptions.
    _display: Arc<DisplayStateController>,
    cancel: CancellationToken,
    started: AtomicBool,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    /// Build a coordinator with its own session token.
    pub fn new(config: CoordinatorConfig, devices: Devices) -> Self {
        Self::with_token(config, devices, CancellationToken::new())
    }

    /// Build a coordinator around a session token shared with the host.
    /// The token is cancelled once, when the session shuts down.
    pub fn with_token(
        config: CoordinatorConfig,
        devices: Devices,
        cancel: CancellationToken,
    ) -> Self {
        let idle_events: Arc<EventChannel<IdleEvent>> = Arc::new(EventChannel::new("idle"));
        let volume_changed: Arc<EventChannel<VolumeChanged>> =
            Arc::new(EventChannel::new("volume-changed"));
        let menu_requested = Arc::new(EventChannel::new("menu-requested"));
        let menu_exit: Arc<EventChannel<MenuExit>> = Arc::new(EventChannel::new("menu-exit"));
        let shutting_down: Arc<EventChannel<ShuttingDown>> =
            Arc::new(EventChannel::new("shutting-down"));

        let shutdown = Arc::new(ShutdownController::new(
            config.shutdown.allow_shutdown,
            devices.system,
            cancel.clone(),
            Arc::clone(&shutting_down),
        ));

        let navigator = ViewNavigator::new(
            devices.renderer,
            config.navigation.volume_overlay_timeout,
            &NavigatorEvents {
                volume_changed: &volume_changed,
                menu_requested: &menu_requested,
                shutting_down: &shutting_down,
            },
        );

        let interaction =
            InteractionController::new(devices.inputs, config.remote_keymap.clone());
        let idle = IdleMonitor::new(config.idle.clone(), Arc::clone(&idle_events));

        // Idle activity first so the monitor sees input before any handler
        // reacts to it.
        let monitor = idle.clone();
        interaction
            .key_input()
            .subscribe("idle-monitor", move |_: &KeyInput| monitor.report(Activity::Input));
        let monitor = idle.clone();
        interaction
            .tag_input()
            .subscribe("idle-monitor", move |_: &TagInput| monitor.report(Activity::Input));

        let display = Arc::new(DisplayStateController::new(devices.display, navigator.clone()));
        display.attach(&idle_events);
        shutdown.attach(&idle_events);

        let volume = Arc::new(VolumeController::new(
            config.volume.clone(),
            devices.volume_sink,
            navigator.clone(),
            volume_changed,
        ));
        volume.attach(interaction.key_input());

        let menu = Arc::new(MenuController::new(navigator.clone(), menu_requested, menu_exit));
        menu.attach(interaction.key_input());

        debug!(
            inputs = interaction.sources().len(),
            allow_shutdown = config.shutdown.allow_shutdown,
            "coordinator wired"
        );

        Self {
            inner: Arc::new(CoordinatorInner {
                config,
                interaction,
                idle,
                navigator,
                shutdown,
                volume,
                menu,
                _display: display,
                cancel,
                started: AtomicBool::new(false),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Spawn the navigator and idle tasks, show the Player view, then
    /// start listening on the device sources. Call once; a start that
    /// failed may be retried.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return Err(CoreError::AlreadyStarted);
        }

        if let Err(e) = self.start_tasks().await {
            warn!(error = %e, "coordinator failed to start");
            self.inner.started.store(false, Ordering::SeqCst);
            return Err(e);
        }
        info!("jukebox coordinator started");
        Ok(())
    }

    /// Spawning is skipped for tasks a failed attempt already started.
    async fn start_tasks(&self) -> Result<(), CoreError> {
        let mut handles = self.inner.task_handles.lock().await;
        handles.extend(self.inner.navigator.spawn(self.inner.cancel.clone()));
        self.inner.navigator.navigate_to_player_view().await?;

        handles.extend(self.inner.idle.spawn(self.inner.cancel.clone()));
        self.inner.interaction.start()
    }

    /// Trigger the cooperative application shutdown (no hardware action).
    pub fn shutdown(&self) {
        self.inner.shutdown.request_shutdown(ShutdownSource::Application);
    }

    /// Wait for the session token, detach from the devices and join every
    /// background task.
    pub async fn wait(&self) {
        self.inner.cancel.cancelled().await;
        self.inner.interaction.stop();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task failed");
            }
        }
        info!("jukebox coordinator stopped");
    }

    /// Feed non-input activity (audio playing) into the idle monitor.
    pub fn report_system_activity(&self) {
        self.inner.idle.report(Activity::System);
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    pub fn token(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    pub fn key_input(&self) -> &Arc<EventChannel<KeyInput>> {
        self.inner.interaction.key_input()
    }

    pub fn tag_input(&self) -> &Arc<EventChannel<TagInput>> {
        self.inner.interaction.tag_input()
    }

    pub fn shutting_down(&self) -> &Arc<EventChannel<ShuttingDown>> {
        self.inner.shutdown.shutting_down()
    }

    pub fn volume_changed(&self) -> &Arc<EventChannel<VolumeChanged>> {
        self.inner.volume.volume_changed()
    }

    pub fn menu_exit(&self) -> &Arc<EventChannel<MenuExit>> {
        self.inner.menu.menu_exit()
    }

    pub fn idle_events(&self) -> &Arc<EventChannel<IdleEvent>> {
        self.inner.idle.events()
    }

    pub fn navigator(&self) -> &ViewNavigator {
        &self.inner.navigator
    }

    pub fn idle(&self) -> &IdleMonitor {
        &self.inner.idle
    }

    pub fn shutdown_controller(&self) -> &Arc<ShutdownController> {
        &self.inner.shutdown
    }

    pub fn volume(&self) -> &Arc<VolumeController> {
        &self.inner.volume
    }
}
