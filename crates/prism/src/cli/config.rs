//! The `prism config` command.

use clap::{Args, Subcommand};
use prism_core::Config;
use std::path::Path;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,

    /// Show config file path
    Path,

    /// Write a config file with defaults
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

pub fn execute(args: ConfigArgs) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let config = Config::load()?;
            println!("{}", config.to_toml()?);
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_path().display());
        }
        ConfigCommand::Init { force } => {
            let path = Config::default_path();
            write_default(&path, force)?;
            tracing::info!("Config file created at: {}", path.display());
            println!("Configuration initialized at: {}", path.display());
        }
    }
    Ok(())
}

fn write_default(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at: {}\nUse --force to overwrite.",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, Config::default().to_toml()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        write_default(&path, false).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.processing.parallel_workers, 4);
    }

    #[test]
    fn test_init_refuses_to_clobber_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\nenabled = false\n").unwrap();

        assert!(write_default(&path, false).is_err());
        write_default(&path, true).unwrap();
        assert!(Config::load_from(&path).unwrap().cache.enabled);
    }
}
