//! End-to-end tests driving the `ht` binary against an isolated home directory.
//!
//! Tests the full pipeline: log → guard → storage → report

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn ht_binary() -> String {
    env!("CARGO_BIN_EXE_ht").to_string()
}

fn ht(home: &Path, args: &[&str]) -> Output {
    Command::new(ht_binary())
        .env("HOME", home)
        .env_remove("XDG_DATA_HOME")
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("HT_DATABASE_PATH")
        .env_remove("HT_TRAINING_START_DATE")
        .args(args)
        .output()
        .expect("failed to run ht")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "ht should succeed: {}",
        stderr(output)
    );
}

#[test]
fn test_log_then_report_progress() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();

    let output = ht(
        home,
        &[
            "log",
            "--day",
            "2024-01-10",
            "--category",
            "clinical",
            "--subtype",
            "couple",
            "--hours",
            "2",
        ],
    );
    assert_success(&output);
    assert_eq!(
        stdout(&output),
        "Logged 2 h clinical (couple) on 2024-01-10 as #0\n"
    );

    let output = ht(
        home,
        &[
            "log",
            "--day",
            "2024-01-10",
            "--category",
            "supervision",
            "--subtype",
            "individual",
            "--hours",
            "1",
            "--video",
        ],
    );
    assert_success(&output);

    let output = ht(home, &["progress", "--json"]);
    assert_success(&output);
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["totals"]["total_clinical_hours"], 2.0);
    assert_eq!(json["totals"]["relational_hours"], 2.0);
    assert_eq!(json["totals"]["review_method_hours"], 1.0);

    let db_path = home.join(".local/share/ht/ht.db");
    assert!(db_path.exists(), "database should be created under HOME");
}

#[test]
fn test_conflicting_marker_is_rejected() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();

    let output = ht(home, &["away", "--day", "2024-02-01", "--reason", "vacation"]);
    assert_success(&output);

    let output = ht(
        home,
        &[
            "log",
            "--day",
            "2024-02-01",
            "--category",
            "clinical",
            "--subtype",
            "individual",
            "--hours",
            "1",
        ],
    );
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("cannot log hours on 2024-02-01: day marked unavailable"),
        "{}",
        stderr(&output)
    );

    let output = ht(home, &["back", "--day", "2024-02-01"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "2024-02-01 is available again\n");
}

#[test]
fn test_long_entry_requires_yes_without_terminal() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();
    let args = [
        "log",
        "--day",
        "2024-03-04",
        "--category",
        "clinical",
        "--subtype",
        "individual",
        "--hours",
        "17",
    ];

    let output = ht(home, &args);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("re-run with --yes"), "{}", stderr(&output));

    let mut confirmed = args.to_vec();
    confirmed.push("--yes");
    let output = ht(home, &confirmed);
    assert_success(&output);

    let output = ht(home, &["day", "--day", "2024-03-04", "--json"]);
    assert_success(&output);
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["entries"][0]["hours"], 17.0);
}

#[test]
fn test_config_file_sets_database_path() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();
    let db_path = home.join("custom/hours.db");
    let config_path = home.join("ht.toml");
    std::fs::write(
        &config_path,
        format!("database_path = \"{}\"\n", db_path.display()),
    )
    .unwrap();

    let output = Command::new(ht_binary())
        .env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("HT_DATABASE_PATH")
        .args(["--config", config_path.to_str().unwrap(), "status"])
        .output()
        .unwrap();
    assert_success(&output);
    assert!(stdout(&output).contains("Entries: 0 across 0 days"));
    assert!(db_path.exists());
}

#[test]
fn test_invalid_day_is_reported() {
    let temp = TempDir::new().unwrap();
    let output = ht(temp.path(), &["day", "--day", "next tuesday"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid day: next tuesday"));
}

#[test]
fn test_recent_and_events_flow() {
    let temp = TempDir::new().unwrap();
    let home = temp.path();

    for (day, subtype) in [("2024-05-01", "individual"), ("2024-05-03", "family")] {
        let output = ht(
            home,
            &[
                "log", "--day", day, "--category", "clinical", "--subtype", subtype, "--hours", "1",
            ],
        );
        assert_success(&output);
    }

    let output = ht(home, &["recent", "--limit", "1", "--json"]);
    assert_success(&output);
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["day"], "2024-05-03");
    assert_eq!(json[0]["subtype"], "family");

    let output = ht(
        home,
        &[
            "event", "add", "--title", "Supervisor check-in", "--date", "2024-05-03", "--kind",
            "appointment", "--repeat", "weekly", "--every", "2",
        ],
    );
    assert_success(&output);
    assert_eq!(
        stdout(&output),
        "Added event #1: Supervisor check-in on 2024-05-03 (every 2 weeks)\n"
    );

    let output = ht(home, &["day", "--day", "2024-05-17"]);
    assert_success(&output);
    assert!(stdout(&output).contains("Event: Supervisor check-in (appointment)"));

    let output = ht(home, &["event", "list", "--day", "2024-05-10"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "No events on 2024-05-10.\n");
}
