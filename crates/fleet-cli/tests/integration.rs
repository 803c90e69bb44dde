#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Variables that would leak the caller's setup into a test run.
const ISOLATED_ENV: &[&str] = &[
    "FLEET_CONFIG",
    "BOT_COUNT",
    "CLAWCOMBAT_API_URL",
    "FLEET_MANIFEST",
    "FLEET_COOLDOWN_MINUTES",
    "FLEET_CYCLE_INTERVAL_SECS",
    "FLEET_ACTION_TIMEOUT_SECS",
    "FLEET_AGENT_DELAY_SECS",
    "FLEET_REGISTRATION_DELAY_SECS",
    "FLEET_RUNTIME_BIN",
    "FLEET_WORKDIR",
    "FLEET_MODEL",
    "DEEPSEEK_API_KEY",
    "OPENROUTER_API_KEY",
    "RUST_LOG",
];

/// Nothing listens on the discard port, so every remote call fails fast.
const DEAD_URL: &str = "http://127.0.0.1:9";

fn fleet(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fleet").unwrap();
    cmd.current_dir(dir.path());
    for var in ISOLATED_ENV {
        cmd.env_remove(var);
    }
    cmd
}

fn write_legacy_manifest(dir: &TempDir) {
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    std::fs::write(
        dir.path().join("data/fleet-manifest.json"),
        r#"{
  "bots": [
    {"index": 0, "agent_id": "ag_0", "api_key": "ck_secret_0", "name": "ThunderClaw",
     "registered": "2025-01-01T00:00:00", "last_battle": "2025-01-02T10:00:00", "battles": 4},
    {"index": 1, "agent_id": "ag_1", "api_key": "ck_secret_1", "name": "ShadowHunter",
     "registered": "2025-01-01T00:00:01", "last_battle": null, "battles": 0}
  ],
  "created": "2025-01-01T00:00:00"
}"#,
    )
    .unwrap();
}

// ---------------------------------------------------------------------------
// fleet status
// ---------------------------------------------------------------------------

#[test]
fn status_on_empty_directory_reports_no_agents() {
    let dir = TempDir::new().unwrap();
    fleet(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fleet: 0/10 agents"))
        .stdout(predicate::str::contains("No agents registered"));
}

#[test]
fn status_reads_legacy_manifest_without_leaking_keys() {
    let dir = TempDir::new().unwrap();
    write_legacy_manifest(&dir);

    fleet(&dir)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("ThunderClaw"))
        .stdout(predicate::str::contains("ShadowHunter"))
        .stdout(predicate::str::contains("never"))
        .stdout(predicate::str::contains("ck_secret").not());
}

#[test]
fn status_json_lists_progress() {
    let dir = TempDir::new().unwrap();
    write_legacy_manifest(&dir);

    let output = fleet(&dir).args(["status", "--json"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(!stdout.contains("ck_secret"));

    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let agents = value["agents"].as_array().unwrap();
    assert_eq!(agents.len(), 2);
    assert_eq!(agents[0]["agent_id"], "ag_0");
    assert_eq!(agents[0]["action_count"], 4);
    assert!(agents[1]["last_action_at"].is_null());
}

#[test]
fn status_reports_corrupt_manifest_without_moving_it() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    std::fs::write(dir.path().join("data/fleet-manifest.json"), "{ not json").unwrap();

    fleet(&dir)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: cannot read manifest"));

    assert!(dir.path().join("data/fleet-manifest.json").exists());
    assert!(!dir.path().join("data/fleet-manifest.json.corrupt").exists());
}

#[test]
fn register_moves_corrupt_manifest_aside() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    std::fs::write(dir.path().join("data/fleet-manifest.json"), b"{\"bots\": [\xff]}").unwrap();

    fleet(&dir)
        .args(["register", "--bots", "1", "--api-url", DEAD_URL])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fleet: 0/1 agents"));

    let aside = std::fs::read(dir.path().join("data/fleet-manifest.json.corrupt")).unwrap();
    assert_eq!(aside, b"{\"bots\": [\xff]}");
}

#[test]
fn run_refuses_manifest_it_cannot_read() {
    let dir = TempDir::new().unwrap();
    // a directory in place of the manifest file
    std::fs::create_dir_all(dir.path().join("data/fleet-manifest.json")).unwrap();

    fleet(&dir)
        .args(["run", "--once", "--api-url", DEAD_URL])
        .env("OPENROUTER_API_KEY", "sk_test")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("refusing to run without a writable manifest"));

    assert!(dir.path().join("data/fleet-manifest.json").is_dir());
}

// ---------------------------------------------------------------------------
// fleet config
// ---------------------------------------------------------------------------

#[test]
fn config_prints_defaults_with_env_overrides() {
    let dir = TempDir::new().unwrap();
    fleet(&dir)
        .arg("config")
        .env("BOT_COUNT", "3")
        .env("DEEPSEEK_API_KEY", "sk_do_not_print")
        .assert()
        .success()
        .stdout(predicate::str::contains("target_size: 3"))
        .stdout(predicate::str::contains("cooldown_minutes: 55"))
        .stdout(predicate::str::contains("deepseek (deepseek-chat)"))
        .stdout(predicate::str::contains("sk_do_not_print").not());
}

#[test]
fn config_file_values_are_used() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("fleet.yaml"),
        "target_size: 25\nruntime_bin: my-runtime\n",
    )
    .unwrap();

    fleet(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("target_size: 25"))
        .stdout(predicate::str::contains("runtime_bin: my-runtime"));
}

#[test]
fn malformed_config_file_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("fleet.yaml"), "target_size: [unclosed\n").unwrap();

    fleet(&dir)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: failed to load config"));
}

#[test]
fn zero_action_timeout_is_rejected() {
    let dir = TempDir::new().unwrap();
    fleet(&dir)
        .args(["config", "--action-timeout-secs", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

// ---------------------------------------------------------------------------
// fleet register / run
// ---------------------------------------------------------------------------

#[test]
fn register_against_unreachable_service_keeps_empty_fleet() {
    let dir = TempDir::new().unwrap();
    fleet(&dir)
        .args(["register", "--bots", "2", "--api-url", DEAD_URL])
        .assert()
        .success()
        .stdout(predicate::str::contains("Fleet: 0/2 agents"))
        .stdout(predicate::str::contains("Growth stopped"));

    assert!(!dir.path().join("data/fleet-manifest.json").exists());
}

#[test]
fn run_without_provider_key_exits_1() {
    let dir = TempDir::new().unwrap();
    fleet(&dir)
        .args(["run", "--once"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error: no LLM provider key"));
}

#[test]
fn run_once_skips_agents_whose_limits_cannot_be_checked() {
    let dir = TempDir::new().unwrap();
    write_legacy_manifest(&dir);

    let output = fleet(&dir)
        .args(["run", "--once", "--json", "--bots", "2", "--api-url", DEAD_URL])
        .env("OPENROUTER_API_KEY", "sk_test")
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["attempted"], 0);
    assert_eq!(report["skipped"], 2);

    // Nothing succeeded, so the manifest keeps its recorded progress.
    let saved = std::fs::read_to_string(dir.path().join("data/fleet-manifest.json")).unwrap();
    assert!(saved.contains("\"battles\": 4"));
}
