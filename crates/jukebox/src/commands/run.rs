//! `jukebox run`: a coordinator session driven from stdin.

use std::io::BufRead;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use jukebox_config as config;
use jukebox_core::{Coordinator, CoordinatorConfig, ShuttingDown, TagInput, VolumeChanged};

use crate::cli::{GlobalOpts, RunArgs};
use crate::commands::config_cmd::resolve_path;
use crate::console::{self, ConsoleCommand, ConsoleRig};
use crate::error::CliError;
use crate::output::{Painter, Tone};

pub async fn handle(args: &RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = resolve_path(global);
    let cfg = config::load_config(&path).map_err(|e| CliError::config(&path, e))?;
    for warning in cfg.warnings() {
        warn!("{warning}");
    }

    let mut core_config = cfg
        .to_coordinator_config()
        .map_err(|e| CliError::config(&path, e))?;
    if let Some(allow) = args.allow_shutdown {
        core_config.shutdown.allow_shutdown = allow;
    }

    let painter = Painter::new(global.color);
    let rig = Arc::new(ConsoleRig::new(painter, !args.no_backlight));
    let coordinator = Coordinator::new(core_config, rig.devices());
    echo_events(&coordinator, painter);

    let lines = spawn_stdin_reader()?;
    coordinator.start().await?;
    print_banner(coordinator.config(), painter);

    let driver = tokio::spawn(drive(Arc::clone(&rig), coordinator.clone(), painter, lines));

    tokio::select! {
        () = coordinator.token().cancelled() => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "failed to listen for ctrl-c");
            }
            coordinator.shutdown();
        }
    }

    coordinator.wait().await;
    if let Err(e) = driver.await {
        warn!(error = %e, "console driver failed");
    }
    Ok(())
}

// ── Console loop ─────────────────────────────────────────────────────

/// Read stdin on a plain thread: a blocking read must not hold the
/// runtime open at exit.
fn spawn_stdin_reader() -> Result<mpsc::UnboundedReceiver<String>, CliError> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("jukebox-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

async fn drive(
    rig: Arc<ConsoleRig>,
    coordinator: Coordinator,
    painter: Painter,
    mut lines: mpsc::UnboundedReceiver<String>,
) {
    let token = coordinator.token().clone();
    loop {
        let line = tokio::select! {
            biased;
            () = token.cancelled() => break,
            line = lines.recv() => line,
        };

        // EOF ends the session like `quit`.
        let Some(line) = line else {
            debug!("stdin closed");
            coordinator.shutdown();
            break;
        };

        match console::parse_line(&line) {
            Ok(Some(command)) => apply(&rig, &coordinator, painter, command),
            Ok(None) => {}
            Err(message) => eprintln!("{}", painter.paint(&message, Tone::Error)),
        }
    }
}

fn apply(rig: &ConsoleRig, coordinator: &Coordinator, painter: Painter, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Device(source, event) => rig.emit(source, &event),
        ConsoleCommand::Audio => coordinator.report_system_activity(),
        ConsoleCommand::Power => rig.press_power(),
        ConsoleCommand::Allow(allow) => {
            coordinator.shutdown_controller().set_allow_shutdown(allow);
        }
        ConsoleCommand::Status => print_status(coordinator, painter),
        ConsoleCommand::Help => println!("{}", console::HELP),
        ConsoleCommand::Quit => coordinator.shutdown(),
    }
}

// ── Output ───────────────────────────────────────────────────────────

fn echo_events(coordinator: &Coordinator, painter: Painter) {
    coordinator.tag_input().subscribe("console", move |tag: &TagInput| {
        println!("{} {}", painter.paint("tag", Tone::Dim), painter.paint(tag.uid(), Tone::Info));
    });
    coordinator
        .volume_changed()
        .subscribe("console", move |event: &VolumeChanged| {
            println!(
                "{} {}",
                painter.paint("volume", Tone::Dim),
                painter.paint(&event.level.to_string(), Tone::Info)
            );
        });
    coordinator
        .shutting_down()
        .subscribe("console", move |event: &ShuttingDown| {
            println!(
                "{} ({})",
                painter.paint("shutting down", Tone::Warning),
                event.source
            );
        });
}

fn print_banner(config: &CoordinatorConfig, painter: Painter) {
    let policy = if config.shutdown.allow_shutdown {
        "allowed"
    } else {
        "disabled"
    };
    println!(
        "{} input idle after {}, system idle after {}, shutdown {policy}. Type help for commands.",
        painter.paint("jukebox ready:", Tone::Accent),
        humantime::format_duration(config.idle.input_timeout),
        humantime::format_duration(config.idle.system_timeout),
    );
}

fn print_status(coordinator: &Coordinator, painter: Painter) {
    let view = coordinator
        .navigator()
        .active_view()
        .map_or_else(|| "none".to_owned(), |v| v.to_string());
    let idle = coordinator.idle().state();
    println!(
        "view {} | volume {} | shutdown {} | input idle {} | system idle {}",
        painter.paint(&view, Tone::Accent),
        coordinator.volume().level(),
        if coordinator.shutdown_controller().allow_shutdown() {
            "allowed"
        } else {
            "disabled"
        },
        idle.input.is_idle,
        idle.system.is_idle,
    );
}
