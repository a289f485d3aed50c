//! Integration tests for the `train` binary.
//!
//! These tests verify end-to-end behavior including:
//! - Running a protocol unattended and interactively
//! - XP records landing in the WAL
//! - History and CSV rollup over those records

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PROTOCOL: &str = r#"
[[blocks]]
type = "checklist"
name = "Warm-up"
section = "Prep"
xp_value = 10
items = [
    { kind = "header", text = "Hips" },
    { kind = "item", text = "Leg swings" },
    { kind = "item", text = "Cossack squats", details = ["5 each side"] },
]

[[blocks]]
type = "exercise"
name = "Back Squat"
section = "Strength"
xp_value = 30
sets = 3
reps_per_set = 5
rest_seconds = 120

[[blocks]]
type = "superset"
name = "Accessories"
section = "Strength"
xp_value = 20
sets = 2
exercises = [
    { name = "Dips", reps = "8-10" },
    { name = "Chin-up", reps = 6 },
]

[[blocks]]
type = "timed"
name = "Finisher"
section = "Conditioning"
intervals = [
    { kind = "card", text = "Get on the bike" },
    { seconds = 30, zone = "sprint" },
    { seconds = 90, zone = "easy" },
]
"#;

/// Warm-up 10 + squat 30 + superset 20 + sprint 10 + easy 8
const PROTOCOL_XP: u32 = 78;

struct TestEnv {
    _temp_dir: TempDir,
    data_dir: PathBuf,
    config: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join("data");
        let config = temp_dir.path().join("config.toml");
        fs::write(&config, "").unwrap();
        fs::create_dir_all(data_dir.join("protocols")).unwrap();
        Self {
            _temp_dir: temp_dir,
            data_dir,
            config,
        }
    }

    fn with_protocol(day: &str, contents: &str) -> Self {
        let env = Self::new();
        fs::write(env.protocol_path(day), contents).unwrap();
        env
    }

    fn protocol_path(&self, day: &str) -> PathBuf {
        self.data_dir.join("protocols").join(format!("{}.toml", day))
    }

    fn wal_path(&self) -> PathBuf {
        self.data_dir.join("wal").join("xp_log.wal")
    }

    /// `train` with this environment's config and data directory
    fn cli(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("train"));
        cmd.arg("--config")
            .arg(&self.config)
            .arg("--data-dir")
            .arg(&self.data_dir);
        cmd
    }
}

fn wal_lines(path: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .expect("Failed to read WAL")
        .lines()
        .map(|line| serde_json::from_str(line).expect("Invalid WAL line"))
        .collect()
}

#[test]
fn test_cli_help() {
    Command::new(assert_cmd::cargo::cargo_bin!("train"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Workout session runner"));
}

#[test]
fn test_auto_run_records_every_award() {
    let env = TestEnv::with_protocol("monday", PROTOCOL);

    env.cli()
        .args(["run", "--day", "monday", "--auto"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Session complete"))
        .stdout(predicate::str::contains(format!("Total XP: {}", PROTOCOL_XP)));

    let records = wal_lines(&env.wal_path());
    // Three lump blocks plus two countdown intervals
    assert_eq!(records.len(), 5);
    let total: u64 = records.iter().map(|r| r["xp"].as_u64().unwrap()).sum();
    assert_eq!(total, PROTOCOL_XP as u64);

    let squat = records
        .iter()
        .find(|r| r["label"] == "Back Squat")
        .expect("squat record");
    assert_eq!(squat["category"], "strength");
    assert_eq!(squat["payload"][0]["sets"].as_array().unwrap().len(), 3);

    let intervals = records.iter().filter(|r| r["category"] == "interval").count();
    assert_eq!(intervals, 2);
}

#[test]
fn test_auto_skip_awards_nothing() {
    let env = TestEnv::with_protocol("monday", PROTOCOL);

    env.cli()
        .args(["run", "--day", "mon", "--auto-skip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Session complete"))
        .stdout(predicate::str::contains("Total XP: 0"));

    assert!(!env.wal_path().exists());
}

#[test]
fn test_run_from_file() {
    let env = TestEnv::new();
    let file = env.data_dir.join("custom.toml");
    fs::write(&file, PROTOCOL).unwrap();

    env.cli()
        .arg("run")
        .arg("--file")
        .arg(&file)
        .arg("--auto")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Total XP: {}", PROTOCOL_XP)));
}

#[test]
fn test_json_protocol() {
    let env = TestEnv::new();
    let json = r#"{"blocks": [
        {"type": "exercise", "name": "Bench Press", "xp_value": 15, "sets": 2, "reps_list": [8, "6"]},
        {"type": "checklist", "name": "Cool-down", "xp_value": 5, "items": []}
    ]}"#;
    fs::write(env.data_dir.join("protocols").join("push.json"), json).unwrap();

    env.cli()
        .args(["run", "--day", "push", "--auto"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total XP: 20"));
}

#[test]
fn test_missing_protocol_means_no_workout() {
    let env = TestEnv::new();

    env.cli()
        .args(["run", "--day", "sunday", "--auto"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No workout scheduled"));

    assert!(!env.wal_path().exists());
}

#[test]
fn test_malformed_protocol_fails() {
    let env = TestEnv::with_protocol("broken", "[[blocks]]\ntype = \"yoga\"\nname = \"Flow\"\n");

    env.cli()
        .args(["run", "--day", "broken", "--auto"])
        .assert()
        .failure();
}

#[test]
fn test_protocol_warnings_do_not_stop_the_session() {
    let env = TestEnv::with_protocol(
        "odd",
        "[[blocks]]\ntype = \"timed\"\nname = \"Empty\"\nintervals = []\n",
    );

    env.cli()
        .args(["run", "--day", "odd", "--auto"])
        .assert()
        .success()
        .stderr(predicate::str::contains("no intervals"))
        .stdout(predicate::str::contains("Session complete"))
        .stdout(predicate::str::contains("Total XP: 0"));
}

#[test]
fn test_auto_flags_conflict() {
    let env = TestEnv::with_protocol("monday", PROTOCOL);

    env.cli()
        .args(["run", "--day", "monday", "--auto", "--auto-skip"])
        .assert()
        .failure();
}

#[test]
fn test_interactive_hub_and_quit() {
    let env = TestEnv::with_protocol("monday", PROTOCOL);

    // Select the first section, finish its only block, then quit from the hub
    env.cli()
        .args(["run", "--day", "monday"])
        .write_stdin("1\nt 2\nd\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("TODAY'S SESSION"))
        .stdout(predicate::str::contains("Warm-up"))
        .stdout(predicate::str::contains("Session ended early"))
        .stdout(predicate::str::contains("Total XP: 10"));

    assert_eq!(wal_lines(&env.wal_path()).len(), 1);
}

#[test]
fn test_interactive_rejects_bad_intent() {
    let env = TestEnv::with_protocol("monday", PROTOCOL);

    // Completing the squat with sets left is refused; the session carries on
    env.cli()
        .args(["run", "--day", "monday"])
        .write_stdin("Strength\nd\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Back Squat"))
        .stdout(predicate::str::contains("! "))
        .stdout(predicate::str::contains("Total XP: 0"));
}

#[test]
fn test_interactive_shows_last_superset_sets() {
    let env = TestEnv::with_protocol("monday", PROTOCOL);

    env.cli()
        .args(["run", "--day", "monday", "--auto"])
        .assert()
        .success();

    // Finish the squat so the superset is mounted, then quit
    env.cli()
        .args(["run", "--day", "monday"])
        .write_stdin("Strength\nt 1\nt 2\nt 3\nd\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Last sets: 0x5, 0x5, 0x5"))
        .stdout(predicate::str::contains("Dips x 8-10"))
        .stdout(predicate::str::contains("last: 0x8, 0x8"));
}

#[test]
fn test_interactive_unknown_section_is_reported() {
    let env = TestEnv::with_protocol("monday", PROTOCOL);

    env.cli()
        .args(["run", "--day", "monday"])
        .write_stdin("Yoga\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("! No section 'Yoga'"));
}

#[test]
fn test_sections_lists_hub() {
    let env = TestEnv::with_protocol("monday", PROTOCOL);

    env.cli()
        .args(["sections", "--day", "monday"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Prep (1 blocks)"))
        .stdout(predicate::str::contains("2. Strength (2 blocks)"))
        .stdout(predicate::str::contains("Accessories [superset]"));
}

#[test]
fn test_days_lists_protocols() {
    let env = TestEnv::with_protocol("monday", PROTOCOL);
    fs::write(env.protocol_path("thursday"), "").unwrap();

    env.cli()
        .arg("days")
        .assert()
        .success()
        .stdout(predicate::str::contains("monday"))
        .stdout(predicate::str::contains("thursday"));
}

#[test]
fn test_history_after_run() {
    let env = TestEnv::with_protocol("monday", PROTOCOL);

    env.cli()
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("No records"));

    env.cli()
        .args(["run", "--day", "monday", "--auto"])
        .assert()
        .success();

    env.cli()
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Total: {} XP over 5 record(s)",
            PROTOCOL_XP
        )));
}

#[test]
fn test_rollup_archives_wal() {
    let env = TestEnv::with_protocol("monday", PROTOCOL);

    env.cli()
        .arg("rollup")
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to roll up"));

    env.cli()
        .args(["run", "--day", "monday", "--auto"])
        .assert()
        .success();

    env.cli()
        .arg("rollup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 5 records"));

    assert!(env.data_dir.join("history.csv").exists());
    assert!(!env.wal_path().exists());
    assert!(env.wal_path().with_extension("wal.processed").exists());

    // Archived records still count toward history
    env.cli()
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Total: {} XP", PROTOCOL_XP)));
}

#[test]
fn test_rollup_cleanup() {
    let env = TestEnv::with_protocol("monday", PROTOCOL);

    env.cli()
        .args(["run", "--day", "monday", "--auto"])
        .assert()
        .success();

    env.cli()
        .args(["rollup", "--cleanup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned up 1 processed WAL files"));

    assert!(!env.wal_path().with_extension("wal.processed").exists());
}
