use crate::model::ProcessExit;
use anyhow::Context;
use nix::fcntl::OFlag;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::ffi::OsString;
use std::io::Read;
use std::os::unix::process::ExitStatusExt;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

/// How long to wait for the output pipe to drain once the child is gone.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// A fully described child process: program, arguments and the variables
/// added on top of the inherited environment.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub env: Vec<(String, String)>,
}

#[derive(Debug)]
pub struct ProcessReport {
    pub exit: ProcessExit,
    /// stdout and stderr, interleaved as the child wrote them.
    pub output: Vec<u8>,
    pub elapsed: Duration,
}

/// Runs the invocation to completion or until `limit` elapses, whichever
/// comes first. A timed-out child is killed together with its process group.
///
/// Errors are reserved for the harness failing to start the process; any
/// behaviour of the process itself is reported through [`ProcessExit`].
pub async fn invoke(inv: &Invocation, limit: Duration) -> anyhow::Result<ProcessReport> {
    let start = Instant::now();
    // Close-on-exec keeps concurrently spawned children from inheriting this
    // pipe; the child's own stdout/stderr copies are made by dup2 and survive.
    let (reader, writer) =
        nix::unistd::pipe2(OFlag::O_CLOEXEC).context("failed to create output pipe")?;
    let writer_err = writer
        .try_clone()
        .context("failed to duplicate output pipe")?;

    // The Command owns the parent's copies of the write end; it must be dropped
    // right after spawning so the reader sees EOF when the child exits.
    let mut child = {
        let mut cmd = Command::new(&inv.program);
        cmd.args(&inv.args)
            .envs(inv.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::from(writer))
            .stderr(Stdio::from(writer_err))
            .process_group(0)
            .kill_on_drop(true);
        cmd.spawn()
            .with_context(|| format!("failed to spawn {}", inv.program.display()))?
    };
    let mut group = GroupKill(child.id());

    let drain = tokio::task::spawn_blocking(move || {
        let mut f = std::fs::File::from(reader);
        let mut buf = Vec::new();
        // A read error just truncates the captured output.
        let _ = f.read_to_end(&mut buf);
        buf
    });

    let exit = match timeout(limit, child.wait()).await {
        Ok(status) => {
            group.disarm();
            ProcessExit::Completed(exit_code(status.context("failed to wait on child")?))
        }
        Err(_) => {
            group.kill();
            let _ = child.kill().await;
            ProcessExit::TimedOut
        }
    };

    let output = match timeout(DRAIN_GRACE, drain).await {
        Ok(Ok(buf)) => buf,
        Ok(Err(e)) => {
            tracing::warn!(event = "output_drain_failed", error = %e);
            Vec::new()
        }
        Err(_) => {
            // A descendant outside the process group still holds the pipe.
            tracing::warn!(
                event = "output_drain_timeout",
                program = %inv.program.display()
            );
            Vec::new()
        }
    };

    Ok(ProcessReport {
        exit,
        output,
        elapsed: start.elapsed(),
    })
}

/// SIGKILLs the child's process group when dropped while armed, so a
/// cancelled invocation never leaves the group running.
struct GroupKill(Option<u32>);

impl GroupKill {
    fn kill(&mut self) {
        if let Some(pid) = self.0.take() {
            if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                tracing::debug!(event = "killpg_failed", pid, error = %e);
            }
        }
    }

    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for GroupKill {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Exit status, or the negated signal number for signal deaths.
fn exit_code(status: ExitStatus) -> i32 {
    match (status.code(), status.signal()) {
        (Some(code), _) => code,
        (None, Some(sig)) => -sig,
        (None, None) => -1,
    }
}
