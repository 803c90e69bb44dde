use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

// ─── RunConfig ────────────────────────────────────────────────────────────

/// Everything needed to start the runtime for one battle.
///
/// Secrets belong in `env`, which is handed to the child process only and
/// never logged. `instruction` is passed on the command line and must not
/// contain any.
#[derive(Clone, Default)]
pub struct RunConfig {
    /// Runtime executable (e.g. `"nanobot"`)
    pub program: String,
    /// Natural-language task for the runtime (`-m <instruction>`)
    pub instruction: String,
    /// Environment variables added to the inherited environment
    pub env: BTreeMap<String, String>,
    /// Working directory for the subprocess (default: current dir)
    pub cwd: Option<PathBuf>,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("program", &self.program)
            .field("instruction", &self.instruction)
            .field("env", &self.env.keys().collect::<Vec<_>>())
            .field("cwd", &self.cwd)
            .finish()
    }
}

// ─── RunResult ────────────────────────────────────────────────────────────

/// How the runtime process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Last bytes of stdout, decoded lossily.
    pub stdout_tail: String,
    /// Last bytes of stderr, decoded lossily.
    pub stderr_tail: String,
}

impl RunResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Human-readable reason for a non-successful exit.
    pub fn failure_reason(&self) -> String {
        let status = match self.exit_code {
            Some(code) => format!("runtime exited with code {code}"),
            None => "runtime terminated by signal".to_string(),
        };
        let stderr = self.stderr_tail.trim();
        if stderr.is_empty() {
            status
        } else {
            format!("{status}\nstderr: {}", last_chars(stderr, 500))
        }
    }
}

/// The last `n` characters of `s`.
pub fn last_chars(s: &str, n: usize) -> &str {
    match s.char_indices().rev().nth(n.saturating_sub(1)) {
        Some((i, _)) if n > 0 => &s[i..],
        _ if n == 0 => "",
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_chars_takes_suffix() {
        assert_eq!(last_chars("abcdef", 3), "def");
        assert_eq!(last_chars("ab", 5), "ab");
        assert_eq!(last_chars("abc", 0), "");
        assert_eq!(last_chars("héllo", 4), "éllo");
    }

    #[test]
    fn failure_reason_includes_code_and_stderr() {
        let r = RunResult {
            exit_code: Some(2),
            stdout_tail: String::new(),
            stderr_tail: "boom\n".into(),
        };
        assert!(!r.success());
        assert_eq!(r.failure_reason(), "runtime exited with code 2\nstderr: boom");
    }

    #[test]
    fn signal_exit_is_not_success() {
        let r = RunResult {
            exit_code: None,
            stdout_tail: String::new(),
            stderr_tail: String::new(),
        };
        assert!(!r.success());
        assert_eq!(r.failure_reason(), "runtime terminated by signal");
    }

    #[test]
    fn debug_lists_env_keys_only() {
        let mut env = BTreeMap::new();
        env.insert("CLAWCOMBAT_API_KEY".to_string(), "ck_secret".to_string());
        let cfg = RunConfig {
            program: "nanobot".into(),
            env,
            ..Default::default()
        };
        let shown = format!("{cfg:?}");
        assert!(shown.contains("CLAWCOMBAT_API_KEY"));
        assert!(!shown.contains("ck_secret"));
    }
}
