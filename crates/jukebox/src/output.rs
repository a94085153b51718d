//! Terminal output: color detection and the console palette.

use std::io::{self, IsTerminal};

use owo_colors::OwoColorize;

use crate::cli::ColorMode;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
    }
}

// ── Palette (SilkCircuit) ────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum Tone {
    Accent,
    Info,
    Warning,
    Success,
    Error,
    Dim,
}

impl Tone {
    fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Accent => (225, 53, 255),  // #e135ff
            Self::Info => (128, 255, 234),   // #80ffea
            Self::Warning => (241, 250, 140), // #f1fa8c
            Self::Success => (80, 250, 123), // #50fa7b
            Self::Error => (255, 99, 99),    // #ff6363
            Self::Dim => (98, 114, 164),     // #6272a4
        }
    }
}

/// Paints text when color is enabled, passes it through otherwise.
#[derive(Debug, Clone, Copy)]
pub struct Painter {
    color: bool,
}

impl Painter {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            color: should_color(mode),
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn paint(&self, text: &str, tone: Tone) -> String {
        if !self.color {
            return text.to_owned();
        }
        let (r, g, b) = tone.rgb();
        if matches!(tone, Tone::Accent) {
            text.truecolor(r, g, b).bold().to_string()
        } else {
            text.truecolor(r, g, b).to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_mode_disables_color() {
        assert!(!should_color(ColorMode::Never));
        assert!(should_color(ColorMode::Always));
    }

    #[test]
    fn plain_painter_passes_text_through() {
        assert_eq!(Painter::plain().paint("Player", Tone::Accent), "Player");
    }

    #[test]
    fn colored_painter_emits_escape_codes() {
        let painted = Painter::new(ColorMode::Always).paint("Menu", Tone::Info);
        assert!(painted.contains("\u{1b}["));
        assert!(painted.contains("Menu"));
    }
}
