//! Config subcommand handlers.

use std::path::PathBuf;

use jukebox_config::{self as config, Config, ConfigError};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;

/// The config file in effect: `--config` / `JUKEBOX_CONFIG`, else the
/// platform default.
pub fn resolve_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config::config_path)
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = resolve_path(global);

    match args.command {
        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config(&path).map_err(|e| CliError::config(&path, e))?;
            let rendered = toml::to_string_pretty(&cfg)
                .map_err(|e| CliError::config(&path, ConfigError::Serialization(e)))?;
            print!("{rendered}");
            for warning in cfg.warnings() {
                eprintln!("warning: {warning}");
            }
            Ok(())
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            config::save_config(&Config::default(), &path)
                .map_err(|e| CliError::config(&path, e))?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
    }
}
