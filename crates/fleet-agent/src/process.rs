use std::process::Stdio;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::types::{RunConfig, RunResult};
use crate::{AgentError, Result};

/// Bytes of each output stream retained while the runtime is running.
const CAPTURE_LIMIT: usize = 16 * 1024;

// ─── RuntimeProcess ───────────────────────────────────────────────────────

/// A running `<runtime> agent -m <instruction>` subprocess.
///
/// Stdout and stderr are drained by background tasks into bounded buffers so
/// a chatty runtime can never block on a full pipe. The child is killed when
/// this value is dropped, which is how a timed-out action is stopped.
pub(crate) struct RuntimeProcess {
    child: Child,
    stdout_buf: Arc<Mutex<String>>,
    stderr_buf: Arc<Mutex<String>>,
    readers: Vec<JoinHandle<()>>,
}

impl RuntimeProcess {
    pub(crate) fn spawn(config: &RunConfig) -> Result<Self> {
        let cmd = build_command(config);
        Self::from_command(cmd).map_err(|e| match e {
            AgentError::Io(source) => AgentError::Spawn {
                program: config.program.clone(),
                source,
            },
            other => other,
        })
    }

    /// Spawn an arbitrary command in place of the runtime.
    #[cfg(test)]
    pub(crate) fn spawn_command(cmd: Command) -> Result<Self> {
        Self::from_command(cmd)
    }

    fn from_command(mut cmd: Command) -> Result<Self> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Process("stdout not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AgentError::Process("stderr not captured".into()))?;

        let stdout_buf = Arc::new(Mutex::new(String::new()));
        let stderr_buf = Arc::new(Mutex::new(String::new()));
        let readers = vec![
            drain(stdout, Arc::clone(&stdout_buf)),
            drain(stderr, Arc::clone(&stderr_buf)),
        ];

        Ok(Self {
            child,
            stdout_buf,
            stderr_buf,
            readers,
        })
    }

    /// Wait for the child to exit and collect what it printed.
    pub(crate) async fn wait(mut self) -> Result<RunResult> {
        let status = self.child.wait().await?;

        // Pipes close on exit; let the readers flush their last lines.
        for reader in self.readers.drain(..) {
            let _ = reader.await;
        }

        Ok(RunResult {
            exit_code: status.code(),
            stdout_tail: snapshot(&self.stdout_buf),
            stderr_tail: snapshot(&self.stderr_buf),
        })
    }
}

impl Drop for RuntimeProcess {
    fn drop(&mut self) {
        for reader in &self.readers {
            reader.abort();
        }
    }
}

fn drain<R>(stream: R, buf: Arc<Mutex<String>>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream).lines();
        while let Ok(Some(line)) = reader.next_line().await {
            if let Ok(mut b) = buf.lock() {
                append_capped(&mut b, &line, CAPTURE_LIMIT);
            }
        }
    })
}

/// Append `line` to `buf`, dropping the oldest text beyond `limit` bytes.
fn append_capped(buf: &mut String, line: &str, limit: usize) {
    if !buf.is_empty() {
        buf.push('\n');
    }
    buf.push_str(line);
    if buf.len() > limit {
        let mut cut = buf.len() - limit;
        while !buf.is_char_boundary(cut) {
            cut += 1;
        }
        buf.drain(..cut);
    }
}

fn snapshot(buf: &Arc<Mutex<String>>) -> String {
    buf.lock().map(|b| b.clone()).unwrap_or_default()
}

// ─── Command construction ─────────────────────────────────────────────────

fn build_command(config: &RunConfig) -> Command {
    let mut cmd = Command::new(&config.program);
    cmd.arg("agent").arg("-m").arg(&config.instruction);
    for (k, v) in &config.env {
        cmd.env(k, v);
    }
    if let Some(cwd) = &config.cwd {
        cmd.current_dir(cwd);
    }
    cmd
}
