//! Spawn, supervise and kill child processes.
//!
//! Both runners funnel through [`supervise`]: the child's pipes are drained
//! line by line while a single `select!` races process exit against the
//! deadline and an optional cancellation token. Whichever branch wins decides
//! the outcome; the losing futures are dropped before anything is reported,
//! so a late exit can never overwrite a timeout (or the reverse).

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Split};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Which pipe a captured line arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

/// Output captured from a process that exited successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit code, `None` if the process was ended by a signal.
    pub code: Option<i32>,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
    /// Both streams interleaved in arrival order.
    pub combined: String,
}

impl ToolOutput {
    fn push(&mut self, stream: Stream, line: &str) {
        let target = match stream {
            Stream::Stdout => &mut self.stdout,
            Stream::Stderr => &mut self.stderr,
        };
        target.push_str(line);
        target.push('\n');
        self.combined.push_str(line);
        self.combined.push('\n');
    }
}

enum Outcome {
    Exited(std::io::Result<ExitStatus>),
    TimedOut,
    Cancelled,
}

/// Prepare a command for supervision: piped output, no stdin, and (on unix)
/// its own process group so a kill reaches grandchildren too.
pub(crate) fn detach(cmd: &mut Command, capture_output: bool) {
    let output = || {
        if capture_output {
            Stdio::piped()
        } else {
            Stdio::null()
        }
    };
    cmd.stdin(Stdio::null())
        .stdout(output())
        .stderr(output())
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);
}

/// Spawn `cmd` and wait for it, bounded by `timeout` and `cancel`.
pub(crate) async fn supervise<F>(
    mut cmd: Command,
    tool: &str,
    timeout: Duration,
    cancel: Option<&CancellationToken>,
    mut on_line: F,
) -> Result<ToolOutput>
where
    F: FnMut(Stream, &str),
{
    detach(&mut cmd, true);

    let mut child = cmd.spawn().map_err(|e| Error::spawn(tool, e))?;
    tracing::debug!(tool, pid = ?child.id(), timeout_secs = timeout.as_secs(), "process spawned");

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let mut captured = ToolOutput::default();

    // A token nobody cancels stands in when the caller did not pass one.
    let idle = CancellationToken::new();
    let cancel = cancel.unwrap_or(&idle);

    let outcome = tokio::select! {
        status = drain_and_wait(&mut child, stdout, stderr, &mut captured, &mut on_line) => {
            Outcome::Exited(status)
        }
        _ = tokio::time::sleep(timeout) => Outcome::TimedOut,
        _ = cancel.cancelled() => Outcome::Cancelled,
    };

    match outcome {
        Outcome::Exited(status) => {
            let status = status?;
            captured.code = status.code();
            if status.success() {
                tracing::debug!(tool, "process exited successfully");
                Ok(captured)
            } else {
                tracing::debug!(tool, code = ?status.code(), "process exited with failure");
                Err(Error::Execution {
                    tool: tool.to_string(),
                    code: status.code(),
                    output: captured.combined,
                })
            }
        }
        Outcome::TimedOut => {
            tracing::warn!(tool, timeout_secs = timeout.as_secs(), "process timed out, killing");
            kill(&mut child).await;
            Err(Error::Timeout {
                tool: tool.to_string(),
                after: timeout,
            })
        }
        Outcome::Cancelled => {
            tracing::info!(tool, "process cancelled, killing");
            kill(&mut child).await;
            Err(Error::Cancelled {
                tool: tool.to_string(),
            })
        }
    }
}

async fn drain_and_wait<F>(
    child: &mut Child,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    captured: &mut ToolOutput,
    on_line: &mut F,
) -> std::io::Result<ExitStatus>
where
    F: FnMut(Stream, &str),
{
    let mut out = stdout.map(|pipe| BufReader::new(pipe).split(b'\n'));
    let mut err = stderr.map(|pipe| BufReader::new(pipe).split(b'\n'));

    while out.is_some() || err.is_some() {
        tokio::select! {
            segment = next_segment(&mut out), if out.is_some() => match segment {
                Some(bytes) => record(captured, Stream::Stdout, &bytes, on_line),
                None => out = None,
            },
            segment = next_segment(&mut err), if err.is_some() => match segment {
                Some(bytes) => record(captured, Stream::Stderr, &bytes, on_line),
                None => err = None,
            },
        }
    }

    child.wait().await
}

async fn next_segment<R>(split: &mut Option<Split<R>>) -> Option<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    match split {
        // A read error ends the stream the same way EOF does.
        Some(split) => split.next_segment().await.ok().flatten(),
        None => None,
    }
}

fn record<F>(captured: &mut ToolOutput, stream: Stream, bytes: &[u8], on_line: &mut F)
where
    F: FnMut(Stream, &str),
{
    let line = String::from_utf8_lossy(bytes);
    let line = line.strip_suffix('\r').unwrap_or(&line);
    on_line(stream, line);
    captured.push(stream, line);
}

/// Forcefully kill a child (and its process group on unix), then reap it.
pub(crate) async fn kill(child: &mut Child) {
    #[cfg(unix)]
    signal_group(child, nix::sys::signal::Signal::SIGKILL);

    if let Err(e) = child.kill().await {
        tracing::debug!(error = %e, "kill after group signal failed");
    }
}

/// Ask a child to exit with SIGTERM, escalating to SIGKILL after `grace`.
pub(crate) async fn terminate(child: &mut Child, grace: Duration) {
    #[cfg(unix)]
    {
        if signal_group(child, nix::sys::signal::Signal::SIGTERM) {
            match tokio::time::timeout(grace, child.wait()).await {
                Ok(_) => return,
                Err(_) => {
                    tracing::warn!(pid = ?child.id(), "process ignored SIGTERM, killing");
                }
            }
        }
    }

    #[cfg(not(unix))]
    let _ = grace;

    kill(child).await;
}

#[cfg(unix)]
fn signal_group(child: &Child, signal: nix::sys::signal::Signal) -> bool {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        // Already reaped.
        return false;
    };

    match killpg(Pid::from_raw(pid as i32), signal) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(pid, ?signal, error = %e, "killpg failed");
            false
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[tokio::test]
    async fn captures_both_streams() {
        let output = supervise(
            sh("echo out; echo err 1>&2"),
            "sh",
            Duration::from_secs(10),
            None,
            |_, _| {},
        )
        .await
        .unwrap();

        assert_eq!(output.code, Some(0));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert!(output.combined.contains("out\n"));
        assert!(output.combined.contains("err\n"));
    }

    #[tokio::test]
    async fn preserves_order_within_a_stream() {
        let output = supervise(
            sh("for i in 1 2 3 4 5; do echo line$i; done"),
            "sh",
            Duration::from_secs(10),
            None,
            |_, _| {},
        )
        .await
        .unwrap();

        assert_eq!(output.combined, "line1\nline2\nline3\nline4\nline5\n");
    }

    #[tokio::test]
    async fn line_callback_sees_every_line() {
        let mut seen = Vec::new();
        supervise(
            sh("echo a; echo b 1>&2"),
            "sh",
            Duration::from_secs(10),
            None,
            |stream, line| seen.push((stream, line.to_string())),
        )
        .await
        .unwrap();

        assert_eq!(seen.len(), 2);
        assert!(seen.contains(&(Stream::Stdout, "a".to_string())));
        assert!(seen.contains(&(Stream::Stderr, "b".to_string())));
    }

    #[tokio::test]
    async fn timeout_kills_the_process_group() {
        let started = Instant::now();
        let result = supervise(
            sh("echo partial; sleep 30"),
            "sh",
            Duration::from_millis(200),
            None,
            |_, _| {},
        )
        .await;

        assert!(matches!(result, Err(Error::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn cancellation_kills_the_process() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let result = supervise(
            sh("sleep 30"),
            "sh",
            Duration::from_secs(60),
            Some(&token),
            |_, _| {},
        )
        .await;

        assert!(matches!(result, Err(Error::Cancelled { .. })));
    }

    #[tokio::test]
    async fn terminate_stops_a_running_child() {
        let mut cmd = sh("sleep 30");
        detach(&mut cmd, false);
        let mut child = cmd.spawn().unwrap();

        terminate(&mut child, Duration::from_secs(2)).await;
        assert!(child.try_wait().unwrap().is_some());
    }
}
