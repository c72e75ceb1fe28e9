use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use super::types::Endpoint;

/// Reference probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Probe trait for reachability checks
///
/// Implementations never fail: every error is reported as unreachable.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    /// Check whether `endpoint` answers within `timeout`, never blocking longer
    async fn check(&self, endpoint: &Endpoint, timeout: Duration) -> bool;
}

/// ICMP checker backed by the system `ping` binary
#[derive(Debug, Clone)]
pub struct PingProbe {
    program: String,
}

impl Default for PingProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl PingProbe {
    pub fn new() -> Self {
        Self { program: "ping".into() }
    }

    /// Use a different executable, it receives the same arguments as `ping`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    fn command(&self, target: &str, wait: Duration) -> Command {
        let mut command = Command::new(&self.program);
        command.args(ping_args(target, wait));
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        command
    }
}

/// Single echo request waiting at most `wait`
fn ping_args(target: &str, wait: Duration) -> Vec<String> {
    let seconds = wait.as_secs().max(1).to_string();

    if cfg!(windows) {
        let millis = wait.as_millis().max(1).to_string();
        vec!["-n".into(), "1".into(), "-w".into(), millis, target.into()]
    } else if cfg!(target_os = "macos") {
        vec!["-c".into(), "1".into(), "-t".into(), seconds, target.into()]
    } else {
        vec!["-c".into(), "1".into(), "-W".into(), seconds, target.into()]
    }
}

#[async_trait::async_trait]
impl Probe for PingProbe {
    async fn check(&self, endpoint: &Endpoint, wait: Duration) -> bool {
        let mut child = match self.command(endpoint.as_str(), wait).spawn() {
            Ok(child) => child,
            Err(e) => {
                debug!(endpoint = %endpoint, "Failed to spawn {}: {}", self.program, e);
                return false;
            }
        };

        match timeout(wait, child.wait()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                debug!(endpoint = %endpoint, "Waiting for {} failed: {}", self.program, e);
                false
            }
            Err(_) => {
                debug!(endpoint = %endpoint, "Probe timed out after {:?}", wait);
                let _ = child.start_kill();
                false
            }
        }
    }
}
