//! CLI error types with miette diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use jukebox_config::ConfigError;
use jukebox_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const DEVICE: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid configuration")]
    #[diagnostic(
        code(jukebox::config),
        help(
            "Check the config file at {path}\n\
             Show the resolved values with: jukebox config show"
        )
    )]
    Config {
        path: String,
        #[source]
        source: ConfigError,
    },

    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(jukebox::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    // ── Coordinator ──────────────────────────────────────────────────
    #[error("Coordinator failed")]
    #[diagnostic(code(jukebox::core))]
    Core(#[from] CoreError),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(jukebox::io))]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config(path: &std::path::Path, source: ConfigError) -> Self {
        Self::Config {
            path: path.display().to_string(),
            source,
        }
    }

    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config { .. } => exit_code::CONFIG,
            Self::ConfigExists { .. } => exit_code::USAGE,
            Self::Core(CoreError::Device { .. } | CoreError::Render { .. }) => exit_code::DEVICE,
            Self::Core(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_by_category() {
        let err = CliError::config(
            std::path::Path::new("/etc/jukebox.toml"),
            ConfigError::Validation {
                field: "volume.step".into(),
                reason: "must be between 1 and 100".into(),
            },
        );
        assert_eq!(err.exit_code(), exit_code::CONFIG);

        let err = CliError::ConfigExists {
            path: "/etc/jukebox.toml".into(),
        };
        assert_eq!(err.exit_code(), exit_code::USAGE);

        let err = CliError::from(CoreError::device("display", "i2c nack"));
        assert_eq!(err.exit_code(), exit_code::DEVICE);

        assert_eq!(
            CliError::from(CoreError::NavigatorClosed).exit_code(),
            exit_code::GENERAL
        );
    }
}
