use std::path::{Path, PathBuf};

use tracing::debug;

use crate::process::RuntimeProcess;
use crate::types::{RunConfig, RunResult};
use crate::Result;

// ─── Public API ───────────────────────────────────────────────────────────

/// Run the agent runtime once and wait for it to exit.
///
/// A non-zero exit is not an error here; inspect [`RunResult::success`].
/// `Err` means the runtime could not be started or waited on. Dropping the
/// returned future kills the runtime, so callers bound it with
/// `tokio::time::timeout`.
///
/// # Example
///
/// ```rust,ignore
/// use fleet_agent::{run, RunConfig};
///
/// let result = run(RunConfig {
///     program: "nanobot".into(),
///     instruction: "Say hello".into(),
///     ..Default::default()
/// }).await?;
/// println!("{}", result.stdout_tail);
/// ```
pub async fn run(config: RunConfig) -> Result<RunResult> {
    debug!(program = %config.program, cwd = ?config.cwd, "starting runtime");
    let process = RuntimeProcess::spawn(&config)?;
    let result = process.wait().await?;
    debug!(exit_code = ?result.exit_code, "runtime exited");
    Ok(result)
}

/// Resolve `program` on `PATH` (or as a path), if it exists.
pub fn locate_runtime(program: impl AsRef<Path>) -> Option<PathBuf> {
    which::which(program.as_ref()).ok()
}

pub fn runtime_available(program: impl AsRef<Path>) -> bool {
    locate_runtime(program).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn sh_is_available_but_nonsense_is_not() {
        assert!(runtime_available("sh"));
        assert!(!runtime_available("definitely-not-a-real-runtime-binary"));
    }

    /// Stand-in runtime: a script that accepts `agent -m <text>` and echoes
    /// the message plus one env var.
    #[cfg(unix)]
    fn fake_runtime(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-runtime");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_passes_message_and_env() {
        let dir = std::env::temp_dir().join(format!("fleet-agent-run-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let program = fake_runtime(&dir, r#"echo "$1 $2 $3"; echo "id=$CLAWCOMBAT_AGENT_ID""#);

        let mut env = BTreeMap::new();
        env.insert("CLAWCOMBAT_AGENT_ID".to_string(), "ag_7".to_string());
        let result = run(RunConfig {
            program: program.display().to_string(),
            instruction: "go fight".into(),
            env,
            cwd: Some(dir.clone()),
        })
        .await
        .unwrap();

        assert!(result.success());
        assert_eq!(result.stdout_tail, "agent -m go fight\nid=ag_7");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_runtime_is_reported_not_raised() {
        let dir = std::env::temp_dir().join(format!("fleet-agent-fail-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let program = fake_runtime(&dir, "echo 'no credits' >&2; exit 1");

        let result = run(RunConfig {
            program: program.display().to_string(),
            instruction: "x".into(),
            env: BTreeMap::new(),
            cwd: None,
        })
        .await
        .unwrap();

        assert!(!result.success());
        assert!(result.failure_reason().contains("no credits"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
