//! Child processes with a deadline.
//!
//! Used for `git`. A command either exits zero within its timeout and yields
//! its output, or the call fails with a message naming the command.

use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

/// Output of a command that exited zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `cmd` with no stdin, killing it after `timeout`.
///
/// Each stream keeps at most `output_limit_bytes`; the rest is drained and
/// dropped so a chatty child cannot block on a full pipe. `label` names the
/// command in errors.
#[instrument(skip_all, fields(command = label, timeout_secs = timeout.as_secs()))]
pub fn run_with_timeout(
    mut cmd: Command,
    label: &str,
    timeout: Duration,
    output_limit_bytes: usize,
) -> Result<CapturedOutput> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().with_context(|| format!("spawn {label}"))?;

    let stdout = child
        .stdout
        .take()
        .map(|out| drain_limited(out, output_limit_bytes));
    let stderr = child
        .stderr
        .take()
        .map(|err| drain_limited(err, output_limit_bytes));

    let status = match child.wait_timeout(timeout).with_context(|| format!("wait for {label}"))? {
        Some(status) => status,
        None => {
            warn!("command timed out, killing");
            child.kill().with_context(|| format!("kill {label}"))?;
            child.wait().with_context(|| format!("reap {label}"))?;
            bail!("{label} timed out after {}s", timeout.as_secs());
        }
    };

    let output = CapturedOutput {
        stdout: collect(stdout, "stdout")?,
        stderr: collect(stderr, "stderr")?,
    };
    debug!(exit_code = ?status.code(), "command finished");
    if !status.success() {
        bail!("{label} failed: {}", output.stderr.trim());
    }
    Ok(output)
}

fn drain_limited<R: Read + Send + 'static>(mut reader: R, limit: usize) -> JoinHandle<io::Result<String>> {
    thread::spawn(move || {
        let mut kept = Vec::new();
        (&mut reader).take(limit as u64).read_to_end(&mut kept)?;
        let dropped = io::copy(&mut reader, &mut io::sink())?;
        if dropped > 0 {
            debug!(dropped, "output truncated");
        }
        Ok(String::from_utf8_lossy(&kept).into_owned())
    })
}

fn collect(handle: Option<JoinHandle<io::Result<String>>>, stream: &str) -> Result<String> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    handle
        .join()
        .map_err(|_| anyhow!("{stream} reader panicked"))?
        .with_context(|| format!("read {stream}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", script]);
        cmd
    }

    #[test]
    fn captures_output_of_successful_command() {
        let out = run_with_timeout(sh("echo out; echo err >&2"), "sh", Duration::from_secs(10), 1024)
            .expect("run");
        assert_eq!(out.stdout, "out\n");
        assert_eq!(out.stderr, "err\n");
    }

    #[test]
    fn output_is_capped_at_limit() {
        let out = run_with_timeout(sh("printf 0123456789"), "sh", Duration::from_secs(10), 4)
            .expect("run");
        assert_eq!(out.stdout, "0123");
    }

    #[test]
    fn nonzero_exit_reports_stderr() {
        let err = run_with_timeout(sh("echo nope >&2; exit 3"), "sh check", Duration::from_secs(10), 1024)
            .unwrap_err();
        assert_eq!(err.to_string(), "sh check failed: nope");
    }

    #[test]
    fn slow_command_times_out() {
        let err = run_with_timeout(sh("exec sleep 5"), "sleeper", Duration::from_millis(200), 1024)
            .unwrap_err();
        assert!(err.to_string().contains("sleeper timed out"));
    }
}
