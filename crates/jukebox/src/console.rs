//! Console stand-ins for the appliance hardware.
//!
//! `jukebox run` wires these into the coordinator so the whole
//! interaction flow can be driven from stdin: each line becomes one raw
//! device notification, the renderer prints view transitions, and the
//! power board only pretends to switch the machine off.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::FutureExt;
use futures_util::future::{self, BoxFuture};
use tracing::{debug, info};

use jukebox_core::{
    Button, CoreError, DeviceEvent, Devices, Display, EventChannel, InputSource, InputTarget,
    NavigationEntry, RotaryDirection, ShutdownRequest, SystemControl, TagUid, ViewIdentity,
    ViewRenderer, VolumeSink,
};

use crate::output::{Painter, Tone};

// ── Input sources ────────────────────────────────────────────────────

/// Which simulated device a console line is routed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Buttons,
    Rotary,
    Remote,
    Rfid,
}

pub struct ConsoleInput {
    name: &'static str,
    notifications: EventChannel<DeviceEvent>,
}

impl ConsoleInput {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            notifications: EventChannel::new(name),
        }
    }

    fn emit(&self, event: &DeviceEvent) {
        debug!(source = self.name, ?event, "console device event");
        self.notifications.dispatch(event);
    }
}

impl InputSource for ConsoleInput {
    fn name(&self) -> &str {
        self.name
    }

    fn notifications(&self) -> &EventChannel<DeviceEvent> {
        &self.notifications
    }
}

// ── Display ──────────────────────────────────────────────────────────

pub struct ConsoleDisplay {
    has_backlight: bool,
    enabled: AtomicBool,
    painter: Painter,
}

impl Display for ConsoleDisplay {
    fn has_backlight(&self) -> bool {
        self.has_backlight
    }

    fn backlight_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_backlight_enabled(&self, enabled: bool) -> Result<(), CoreError> {
        if !self.has_backlight {
            return Err(CoreError::device("display", "no backlight"));
        }
        self.enabled.store(enabled, Ordering::SeqCst);
        let state = if enabled { "on" } else { "off" };
        println!(
            "{} {}",
            self.painter.paint("backlight", Tone::Dim),
            self.painter.paint(state, Tone::Warning)
        );
        Ok(())
    }
}

// ── Power board ──────────────────────────────────────────────────────

/// Power board that logs instead of switching the machine off.
pub struct DryRunSystem {
    shutting_down: EventChannel<ShutdownRequest>,
    painter: Painter,
}

impl DryRunSystem {
    /// Simulate the power button starting a hardware shutdown sequence.
    fn press_power(&self) {
        let painter = self.painter;
        let request = ShutdownRequest::cancellable(move || {
            println!(
                "{}",
                painter.paint("power-off sequence aborted", Tone::Success)
            );
            Ok(())
        });
        self.shutting_down.dispatch(&request);
    }
}

impl SystemControl for DryRunSystem {
    fn shutdown(&self) -> Result<(), CoreError> {
        info!("dry run: system power off requested");
        println!(
            "{}",
            self.painter.paint("[dry run] powering off", Tone::Error)
        );
        Ok(())
    }

    fn shutting_down(&self) -> &EventChannel<ShutdownRequest> {
        &self.shutting_down
    }
}

// ── Renderer ─────────────────────────────────────────────────────────

pub struct ConsoleRenderer {
    painter: Painter,
}

impl ConsoleRenderer {
    fn print(&self, verb: &str, view: ViewIdentity, detail: Option<String>) {
        let mut line = format!(
            "{} {}",
            self.painter.paint(verb, Tone::Dim),
            self.painter.paint(&view.to_string(), Tone::Accent)
        );
        if let Some(detail) = detail {
            line.push(' ');
            line.push_str(&self.painter.paint(&detail, Tone::Dim));
        }
        println!("{line}");
    }
}

impl ViewRenderer for ConsoleRenderer {
    fn show(&self, view: ViewIdentity) -> BoxFuture<'_, Result<(), CoreError>> {
        self.print("show", view, None);
        future::ready(Ok(())).boxed()
    }

    fn navigate_to(&self, view: ViewIdentity) -> BoxFuture<'_, Result<(), CoreError>> {
        self.print("view", view, None);
        future::ready(Ok(())).boxed()
    }

    fn navigate_to_modal(
        &self,
        view: ViewIdentity,
        captured: Option<InputTarget>,
    ) -> BoxFuture<'_, Result<(), CoreError>> {
        let detail = captured.map(|target| format!("(keys -> {target})"));
        self.print("modal", view, detail);
        future::ready(Ok(())).boxed()
    }

    fn navigate_back(&self, restored: NavigationEntry) -> BoxFuture<'_, Result<(), CoreError>> {
        self.print("back", restored.view, None);
        future::ready(Ok(())).boxed()
    }
}

// ── Mixer ────────────────────────────────────────────────────────────

pub struct ConsoleMixer;

impl VolumeSink for ConsoleMixer {
    fn set_volume(&self, level: u8) -> Result<(), CoreError> {
        debug!(level, "mixer volume set");
        Ok(())
    }
}

// ── Rig ──────────────────────────────────────────────────────────────

/// The full set of simulated devices for one session.
pub struct ConsoleRig {
    buttons: Arc<ConsoleInput>,
    rotary: Arc<ConsoleInput>,
    remote: Arc<ConsoleInput>,
    rfid: Arc<ConsoleInput>,
    display: Arc<ConsoleDisplay>,
    system: Arc<DryRunSystem>,
    renderer: Arc<ConsoleRenderer>,
}

impl ConsoleRig {
    pub fn new(painter: Painter, has_backlight: bool) -> Self {
        Self {
            buttons: Arc::new(ConsoleInput::new("buttons")),
            rotary: Arc::new(ConsoleInput::new("rotary")),
            remote: Arc::new(ConsoleInput::new("remote")),
            rfid: Arc::new(ConsoleInput::new("rfid")),
            display: Arc::new(ConsoleDisplay {
                has_backlight,
                enabled: AtomicBool::new(true),
                painter,
            }),
            system: Arc::new(DryRunSystem {
                shutting_down: EventChannel::new("power-board"),
                painter,
            }),
            renderer: Arc::new(ConsoleRenderer { painter }),
        }
    }

    pub fn devices(&self) -> Devices {
        let inputs: Vec<Arc<dyn InputSource>> = vec![
            Arc::clone(&self.buttons) as Arc<dyn InputSource>,
            Arc::clone(&self.rotary) as Arc<dyn InputSource>,
            Arc::clone(&self.remote) as Arc<dyn InputSource>,
            Arc::clone(&self.rfid) as Arc<dyn InputSource>,
        ];
        Devices {
            inputs,
            display: Arc::clone(&self.display) as Arc<dyn Display>,
            system: Arc::clone(&self.system) as Arc<dyn SystemControl>,
            renderer: Arc::clone(&self.renderer) as Arc<dyn ViewRenderer>,
            volume_sink: Some(Arc::new(ConsoleMixer)),
        }
    }

    pub fn emit(&self, source: Source, event: &DeviceEvent) {
        let input = match source {
            Source::Buttons => &self.buttons,
            Source::Rotary => &self.rotary,
            Source::Remote => &self.remote,
            Source::Rfid => &self.rfid,
        };
        input.emit(event);
    }

    pub fn press_power(&self) {
        self.system.press_power();
    }
}

// ── Line parser ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Device(Source, DeviceEvent),
    /// Report system (audio) activity.
    Audio,
    /// Press the power button.
    Power,
    /// Flip the shutdown policy.
    Allow(bool),
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  play | next | prev | menu    front panel buttons
  button <name>                any button by name (PlayPause, Next, Previous, Menu)
  cw | ccw | press             rotary encoder
  remote <code>                IR remote code, e.g. remote KEY_OK
  tag <hex>                    RFID tag, e.g. tag 04:a1:b2:c3
  audio                        report audio activity
  power                        press the power button
  allow on|off                 set the shutdown policy
  status                       print the current view and volume
  help                         show this text
  quit                         shut the session down";

/// Parse one console line. Blank lines yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let button = |b| ConsoleCommand::Device(Source::Buttons, DeviceEvent::ButtonPressed(b));
    let rotary = |e| ConsoleCommand::Device(Source::Rotary, e);

    let command = match head.to_ascii_lowercase().as_str() {
        "play" | "pause" => button(Button::PlayPause),
        "next" => button(Button::Next),
        "prev" | "previous" => button(Button::Previous),
        "menu" => button(Button::Menu),
        "button" => {
            let name = arg.ok_or("button needs a name")?;
            button(Button::from_str(name).map_err(|_| format!("unknown button '{name}'"))?)
        }
        "cw" | "+" => rotary(DeviceEvent::RotaryRotated(RotaryDirection::Clockwise)),
        "ccw" | "-" => rotary(DeviceEvent::RotaryRotated(RotaryDirection::CounterClockwise)),
        "press" => rotary(DeviceEvent::RotaryPressed),
        "remote" => {
            let code = arg.ok_or("remote needs a code")?;
            ConsoleCommand::Device(Source::Remote, DeviceEvent::RemoteCommand(code.to_owned()))
        }
        "tag" => {
            let hex = arg.ok_or("tag needs a hex uid")?;
            let uid = TagUid::parse_hex(hex).ok_or_else(|| format!("invalid tag uid '{hex}'"))?;
            ConsoleCommand::Device(Source::Rfid, DeviceEvent::TagDetected(uid))
        }
        "audio" => ConsoleCommand::Audio,
        "power" => ConsoleCommand::Power,
        "allow" => match arg.map(str::to_ascii_lowercase).as_deref() {
            Some("on" | "true" | "yes") => ConsoleCommand::Allow(true),
            Some("off" | "false" | "no") => ConsoleCommand::Allow(false),
            _ => return Err("allow needs on or off".into()),
        },
        "status" => ConsoleCommand::Status,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command '{other}' (try help)")),
    };
    Ok(Some(command))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn buttons_route_through_the_button_source() {
        assert_eq!(
            parse_line("PLAY").unwrap(),
            Some(ConsoleCommand::Device(
                Source::Buttons,
                DeviceEvent::ButtonPressed(Button::PlayPause)
            ))
        );
        assert_eq!(
            parse_line("button previous").unwrap(),
            Some(ConsoleCommand::Device(
                Source::Buttons,
                DeviceEvent::ButtonPressed(Button::Previous)
            ))
        );
    }

    #[test]
    fn rotary_and_remote_commands() {
        assert_eq!(
            parse_line("ccw").unwrap(),
            Some(ConsoleCommand::Device(
                Source::Rotary,
                DeviceEvent::RotaryRotated(RotaryDirection::CounterClockwise)
            ))
        );
        assert_eq!(
            parse_line("remote KEY_VOLUMEUP").unwrap(),
            Some(ConsoleCommand::Device(
                Source::Remote,
                DeviceEvent::RemoteCommand("KEY_VOLUMEUP".into())
            ))
        );
    }

    #[test]
    fn tag_uid_is_parsed_from_hex() {
        assert_eq!(
            parse_line("tag 04:A1").unwrap(),
            Some(ConsoleCommand::Device(
                Source::Rfid,
                DeviceEvent::TagDetected(TagUid::new(vec![0x04, 0xA1]))
            ))
        );
        assert!(parse_line("tag 0").is_err());
        assert!(parse_line("tag").is_err());
    }

    #[test]
    fn policy_and_session_commands() {
        assert_eq!(parse_line("allow off").unwrap(), Some(ConsoleCommand::Allow(false)));
        assert_eq!(parse_line("quit").unwrap(), Some(ConsoleCommand::Quit));
        assert!(parse_line("allow maybe").is_err());
        assert!(parse_line("dance").is_err());
    }
}
