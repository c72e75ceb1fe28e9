use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing::{error, info, warn};
use upkeep::monitoring::{CommandNotifier, FileHistoryLog, LogNotifier, Notifier, PingProbe};
use upkeep::{
    ConfigStore, CoreOptions, EventSink, MonitorCore, ProbeMode, StatusSnapshot, TickOutcome,
};

use crate::board::{STATUS_REFRESHING, StatusBoard};
use crate::cli::{Cli, Command};

/// Wire a core to the system ping, the history file and desktop alerts
pub fn build_core(cli: &Cli) -> MonitorCore {
    let store = ConfigStore::new(cli.config_path());
    let history = Arc::new(FileHistoryLog::new(cli.log_path()));
    let notifier: Arc<dyn Notifier> = if cli.no_desktop_alerts {
        Arc::new(LogNotifier)
    } else {
        Arc::new(CommandNotifier::new())
    };

    let options = CoreOptions {
        probe_timeout: Duration::from_secs(cli.timeout),
        probe_mode: if cli.sequential { ProbeMode::Sequential } else { ProbeMode::Concurrent },
    };

    MonitorCore::load(store, Arc::new(PingProbe::new()), EventSink::new(history, notifier), options)
}

pub async fn execute(cli: Cli) -> Result<()> {
    let core = build_core(&cli);

    match cli.command.clone().unwrap_or(Command::Run) {
        Command::Run => run(Arc::new(core)).await,
        Command::Check => {
            if let TickOutcome::Completed(snapshot) = core.trigger_manual_cycle().await {
                println!("{snapshot}");
            }
            Ok(())
        }
        command => {
            let output = apply(&core, ShellCommand::from(command)).await?;
            if let Some(output) = output {
                println!("{output}");
            }
            Ok(())
        }
    }
}

/// Commands accepted on stdin while monitoring
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Refresh,
    Add(String),
    Remove(String),
    Clear,
    Interval(u64),
    Theme,
    List,
    Config,
    Help,
    Quit,
}

impl From<Command> for ShellCommand {
    fn from(command: Command) -> Self {
        match command {
            Command::Run | Command::Check => ShellCommand::Refresh,
            Command::Add { id } => ShellCommand::Add(id),
            Command::Remove { id } => ShellCommand::Remove(id),
            Command::Clear => ShellCommand::Clear,
            Command::Interval { seconds } => ShellCommand::Interval(seconds),
            Command::Theme => ShellCommand::Theme,
            Command::List => ShellCommand::List,
            Command::Config => ShellCommand::Config,
        }
    }
}

impl FromStr for ShellCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let verb = parts.next().unwrap_or_default().to_ascii_lowercase();
        let arg = parts.next();

        let command = match (verb.as_str(), arg) {
            ("r" | "refresh", None) => ShellCommand::Refresh,
            ("add", Some(id)) => ShellCommand::Add(id.to_string()),
            ("remove" | "rm", Some(id)) => ShellCommand::Remove(id.to_string()),
            ("clear", None) => ShellCommand::Clear,
            ("interval", Some(seconds)) => ShellCommand::Interval(
                seconds.parse().with_context(|| format!("Invalid interval `{seconds}`"))?,
            ),
            ("theme", None) => ShellCommand::Theme,
            ("list" | "ls", None) => ShellCommand::List,
            ("config", None) => ShellCommand::Config,
            ("help" | "?", None) => ShellCommand::Help,
            ("q" | "quit" | "exit", None) => ShellCommand::Quit,
            _ => return Err(anyhow!("Unknown command `{}`, type `help`", line.trim())),
        };

        if parts.next().is_some() {
            return Err(anyhow!("Too many arguments in `{}`", line.trim()));
        }
        Ok(command)
    }
}

const HELP: &str = "Commands: refresh | add <host> | remove <host> | clear | interval <seconds> \
                    | theme | list | config | quit";

/// Apply a command that does not need the monitoring loop
pub async fn apply(core: &MonitorCore, command: ShellCommand) -> Result<Option<String>> {
    let output = match command {
        ShellCommand::Add(id) => {
            let endpoint = core.add_endpoint(&id).await?;
            Some(format!("Added {endpoint}"))
        }
        ShellCommand::Remove(id) => {
            if core.remove_endpoint(&id).await {
                Some(format!("Removed {}", id.trim()))
            } else {
                Some(format!("{} is not monitored", id.trim()))
            }
        }
        ShellCommand::Clear => {
            core.remove_all_endpoints().await;
            Some("Removed all servers".into())
        }
        ShellCommand::Interval(seconds) => {
            core.set_interval(seconds).await?;
            Some(format!("Ping interval set to {seconds}s"))
        }
        ShellCommand::Theme => {
            let dark = core.toggle_dark_mode().await;
            Some(format!("Dark mode {}", if dark { "on" } else { "off" }))
        }
        ShellCommand::List => {
            let endpoints = core.endpoints().await;
            if endpoints.is_empty() {
                Some("No servers".into())
            } else {
                Some(endpoints.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n"))
            }
        }
        ShellCommand::Config => Some(core.config().await.to_string().trim_end().to_string()),
        ShellCommand::Help => Some(HELP.into()),
        ShellCommand::Refresh | ShellCommand::Quit => None,
    };
    Ok(output)
}

/// Read stdin lines into a channel until EOF
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}

fn report_offline(snapshot: &StatusSnapshot) {
    for outcome in snapshot.outcomes.iter().filter(|outcome| !outcome.reachable) {
        error!(endpoint = %outcome.endpoint, "Server down");
    }
}

/// Monitor until Ctrl+C or `quit`, rendering every snapshot
async fn run(core: Arc<MonitorCore>) -> Result<()> {
    let mut board = StatusBoard::new(&core.endpoints().await);
    println!("{}", board.render());

    let mut snapshots = core.subscribe();
    let driver = core.start();
    let mut input = spawn_stdin_reader();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            received = snapshots.recv() => match received {
                Ok(snapshot) => {
                    report_offline(&snapshot);
                    board.set_endpoints(&core.endpoints().await);
                    board.apply(&snapshot);
                    println!("{}", board.render());
                }
                Err(RecvError::Lagged(skipped)) => warn!("Skipped {} status updates", skipped),
                Err(RecvError::Closed) => break,
            },
            line = input.recv(), if stdin_open => {
                let Some(line) = line else {
                    stdin_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }

                match line.parse::<ShellCommand>() {
                    Ok(ShellCommand::Quit) => break,
                    Ok(ShellCommand::Refresh) => {
                        board.set_status(STATUS_REFRESHING);
                        println!("{}", board.render());
                        let core = Arc::clone(&core);
                        tokio::spawn(async move {
                            if core.trigger_manual_cycle().await.is_already_running() {
                                println!("Ping already running.");
                            }
                        });
                    }
                    Ok(command) => match apply(&core, command).await {
                        Ok(output) => {
                            if let Some(output) = output {
                                println!("{output}");
                            }
                            board.set_endpoints(&core.endpoints().await);
                        }
                        Err(e) => println!("{e}"),
                    },
                    Err(e) => println!("{e}"),
                }
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    core.shutdown().await;
    driver.await.context("Monitoring driver panicked")?;
    Ok(())
}
