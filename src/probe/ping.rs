//! System-ping invocation with platform command strategies.

use crate::core::Probe;
use crate::probe::ProbeError;
use async_trait::async_trait;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, trace};

/// Builds the platform-specific ping invocation. Selected once at startup;
/// probe calls never branch on the OS.
pub trait PingCommand: Send + Sync {
    /// One echo request to `host` with a wait bounded by `timeout`.
    fn build(&self, ping_path: &Path, host: &str, timeout: Duration) -> Command;
}

/// `ping -c 1 -W <secs>` as on Linux, macOS and the BSDs.
pub struct UnixPing;

impl PingCommand for UnixPing {
    fn build(&self, ping_path: &Path, host: &str, timeout: Duration) -> Command {
        let mut cmd = Command::new(ping_path);
        // -W takes whole seconds; never pass 0 or the wait becomes unbounded.
        let secs = timeout.as_secs().max(1);
        cmd.arg("-c").arg("1").arg("-W").arg(secs.to_string()).arg(host);
        cmd
    }
}

/// `ping -n 1 -w <millis>` as on Windows.
pub struct WindowsPing;

impl PingCommand for WindowsPing {
    fn build(&self, ping_path: &Path, host: &str, timeout: Duration) -> Command {
        let mut cmd = Command::new(ping_path);
        cmd.arg("-n")
            .arg("1")
            .arg("-w")
            .arg(timeout.as_millis().max(1).to_string())
            .arg(host);
        cmd
    }
}

/// [`Probe`] implementation that shells out to the OS `ping` binary.
pub struct PingProbe {
    ping_path: PathBuf,
    command: Box<dyn PingCommand>,
}

impl PingProbe {
    /// Locates the `ping` binary and selects the platform command strategy.
    ///
    /// Absence of the binary is the one fatal probe error: without it no
    /// measurement is possible, so the run must not start.
    pub fn detect() -> Result<Self, ProbeError> {
        let ping_path = find_on_path("ping").ok_or(ProbeError::PingUnavailable)?;
        debug!(path = %ping_path.display(), "Found ping executable.");
        Ok(Self {
            ping_path,
            command: platform_ping_command(),
        })
    }

    #[cfg(test)]
    fn with_command(ping_path: PathBuf, command: Box<dyn PingCommand>) -> Self {
        Self { ping_path, command }
    }
}

#[async_trait]
impl Probe for PingProbe {
    async fn probe(&self, host: &str, timeout: Duration) -> bool {
        // A host that could be parsed as an option would change the command's
        // meaning; treat it as malformed and fail closed.
        if host.is_empty() || host.starts_with('-') || host.chars().any(char::is_whitespace) {
            trace!(host, "Refusing to probe malformed host.");
            return false;
        }

        let mut cmd = self.command.build(&self.ping_path, host, timeout);
        cmd.stdout(Stdio::null()).stderr(Stdio::null()).kill_on_drop(true);

        // ping bounds its own wait; the outer timeout only catches a binary
        // that ignores its flag or hangs on name resolution.
        let hard_limit = timeout.saturating_mul(2) + Duration::from_secs(1);
        match tokio::time::timeout(hard_limit, cmd.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(error)) => {
                trace!(host, %error, "Ping invocation failed.");
                false
            }
            Err(_) => {
                trace!(host, "Ping exceeded its hard time limit.");
                false
            }
        }
    }
}

fn platform_ping_command() -> Box<dyn PingCommand> {
    if cfg!(windows) {
        Box::new(WindowsPing)
    } else {
        Box::new(UnixPing)
    }
}

/// Resolves an executable name against PATH, like `which`.
fn find_on_path(name: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            let with_ext = dir.join(format!("{name}.exe"));
            if with_ext.is_file() {
                return Some(with_ext);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_of(cmd: &Command) -> Vec<String> {
        cmd.as_std()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn unix_command_sends_one_echo_with_second_timeout() {
        let cmd = UnixPing.build(Path::new("/bin/ping"), "203.0.113.7", Duration::from_secs(2));
        assert_eq!(args_of(&cmd), vec!["-c", "1", "-W", "2", "203.0.113.7"]);
    }

    #[test]
    fn unix_timeout_rounds_up_to_one_second() {
        let cmd = UnixPing.build(Path::new("/bin/ping"), "203.0.113.7", Duration::from_millis(250));
        assert_eq!(args_of(&cmd), vec!["-c", "1", "-W", "1", "203.0.113.7"]);
    }

    #[test]
    fn windows_command_uses_milliseconds() {
        let cmd = WindowsPing.build(Path::new("ping"), "203.0.113.7", Duration::from_millis(1500));
        assert_eq!(args_of(&cmd), vec!["-n", "1", "-w", "1500", "203.0.113.7"]);
    }

    #[tokio::test]
    async fn malformed_hosts_fail_closed() {
        let probe =
            PingProbe::with_command(PathBuf::from("/bin/ping"), platform_ping_command());
        assert!(!probe.probe("", Duration::from_secs(1)).await);
        assert!(!probe.probe("-c 100", Duration::from_secs(1)).await);
        assert!(!probe.probe("host name", Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn missing_binary_fails_closed_per_call() {
        let probe = PingProbe::with_command(
            PathBuf::from("/nonexistent/ping"),
            platform_ping_command(),
        );
        assert!(!probe.probe("203.0.113.7", Duration::from_secs(1)).await);
    }
}
