use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use upkeep::config::default_config_path;
use upkeep::monitoring::sink::DEFAULT_LOG_FILE;

#[derive(Debug, Parser)]
#[command(version, about = "UpKeep - Server Uptime Monitor")]
pub struct Cli {
    /// Config file, `.toml` files are read as TOML, anything else as JSON
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// History log file, defaults to upkeep_log.txt next to the config
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Probe timeout in seconds, a ping still running then is killed
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u64).range(1..=60))]
    pub timeout: u64,

    /// Probe servers one after another instead of all at once
    #[arg(long)]
    pub sequential: bool,

    /// Write alerts to the log instead of sending desktop notifications
    #[arg(long)]
    pub no_desktop_alerts: bool,

    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Monitor until Ctrl+C (default)
    Run,
    /// Run a single cycle and print the result
    Check,
    /// Add a server (IP or domain)
    Add { id: String },
    /// Remove a server
    Remove { id: String },
    /// Remove all servers
    Clear,
    /// Set the ping interval in seconds (1-3600)
    Interval { seconds: u64 },
    /// Toggle dark mode
    Theme,
    /// List monitored servers
    List,
    /// Show the current configuration
    Config,
}

impl Cli {
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }

    pub fn log_path(&self) -> PathBuf {
        match &self.log_file {
            Some(path) => path.clone(),
            None => self.config_path().with_file_name(DEFAULT_LOG_FILE),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}
