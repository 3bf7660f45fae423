use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use std::fs;
mod test_env;

fn setup_test_env() -> (TempDir, std::sync::MutexGuard<'static, ()>) {
    let guard = test_env::lock_test_env();
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let config_dir = temp_dir.path().join(".pipetrack");
    fs::create_dir_all(&config_dir).unwrap();
    let config_file = config_dir.join("rc");
    fs::write(&config_file, format!("data.location={}\n", db_path.display())).unwrap();
    std::env::set_var("HOME", temp_dir.path().to_str().unwrap());
    (temp_dir, guard)
}

fn get_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pipetrack").unwrap();
    cmd.env("HOME", temp_dir.path());
    cmd
}

/// Parse `board --json` output into (contact, position) pairs per stage
fn board_json(temp_dir: &TempDir) -> serde_json::Value {
    let output = get_cmd(temp_dir).args(&["board", "--json"]).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    serde_json::from_str(&stdout).unwrap()
}

fn column(board: &serde_json::Value, stage: &str) -> Vec<(String, i64)> {
    board[stage]
        .as_array()
        .unwrap()
        .iter()
        .map(|lead| {
            (
                lead["contact"].as_str().unwrap().to_string(),
                lead["position"].as_i64().unwrap(),
            )
        })
        .collect()
}

#[test]
fn test_empty_board_shows_all_stages() {
    let (temp_dir, _guard) = setup_test_env();

    let output = get_cmd(&temp_dir).args(&["board"]).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();

    for label in ["Lead (0)", "Quotation (0)", "Negotiation (0)", "Close Won (0)", "Lost (0)"] {
        assert!(stdout.contains(label), "missing column header: {}", label);
    }

    drop(temp_dir);
}

#[test]
fn test_add_appends_to_lead_stage() {
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir).args(&["add", "Ana", "Soto", "company=Soto Ltd"]).assert().success()
        .stdout(predicates::str::contains("lead[0]"));
    get_cmd(&temp_dir).args(&["add", "Ben", "Ito", "company=Ito Inc"]).assert().success()
        .stdout(predicates::str::contains("lead[1]"));

    let board = board_json(&temp_dir);
    assert_eq!(
        column(&board, "lead"),
        vec![("Ana Soto".to_string(), 0), ("Ben Ito".to_string(), 1)]
    );

    drop(temp_dir);
}

#[test]
fn test_add_into_named_stage() {
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir)
        .args(&["add", "Cara", "company=Core", "stage=quotation"])
        .assert()
        .success()
        .stdout(predicates::str::contains("quotation[0]"));

    let board = board_json(&temp_dir);
    assert_eq!(column(&board, "quotation"), vec![("Cara".to_string(), 0)]);
    assert!(column(&board, "lead").is_empty());

    drop(temp_dir);
}

#[test]
fn test_reorder_within_stage() {
    // Quotation holds A(0), B(1), C(2); moving B to 0 yields B(0), A(1), C(2)
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir).args(&["add", "A", "company=Co", "stage=quotation"]).assert().success();
    get_cmd(&temp_dir).args(&["add", "B", "company=Co", "stage=quotation"]).assert().success();
    get_cmd(&temp_dir).args(&["add", "C", "company=Co", "stage=quotation"]).assert().success();

    get_cmd(&temp_dir).args(&["move", "2", "--to", "0"]).assert().success()
        .stdout(predicates::str::contains("quotation[0]"));

    let board = board_json(&temp_dir);
    assert_eq!(
        column(&board, "quotation"),
        vec![
            ("B".to_string(), 0),
            ("A".to_string(), 1),
            ("C".to_string(), 2),
        ]
    );

    drop(temp_dir);
}

#[test]
fn test_cross_stage_move_at_position() {
    // Lead holds A(0), B(1); Quotation holds C(0). Moving A to quotation[0]
    // leaves Lead = {B(0)} and Quotation = {A(0), C(1)}.
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir).args(&["add", "A", "company=Co"]).assert().success();
    get_cmd(&temp_dir).args(&["add", "B", "company=Co"]).assert().success();
    get_cmd(&temp_dir).args(&["add", "C", "company=Co", "stage=quotation"]).assert().success();

    get_cmd(&temp_dir).args(&["move", "1", "quotation", "--to", "0"]).assert().success();

    let board = board_json(&temp_dir);
    assert_eq!(column(&board, "lead"), vec![("B".to_string(), 0)]);
    assert_eq!(
        column(&board, "quotation"),
        vec![("A".to_string(), 0), ("C".to_string(), 1)]
    );

    drop(temp_dir);
}

#[test]
fn test_cross_stage_move_appends_by_default() {
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir).args(&["add", "A", "company=Co"]).assert().success();
    get_cmd(&temp_dir).args(&["add", "B", "company=Co", "stage=negotiation"]).assert().success();

    get_cmd(&temp_dir).args(&["move", "1", "negotiation"]).assert().success()
        .stdout(predicates::str::contains("negotiation[1]"));

    drop(temp_dir);
}

#[test]
fn test_show_displays_stage_durations() {
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir).args(&["add", "Ana", "company=Acme", "value=9000"]).assert().success();
    get_cmd(&temp_dir).args(&["move", "1", "close_won"]).assert().success();

    let output = get_cmd(&temp_dir).args(&["show", "1"]).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();

    assert!(stdout.contains("Time in stage"));
    assert!(stdout.contains("Close Won"));
    assert!(stdout.contains("$9000"));

    drop(temp_dir);
}

#[test]
fn test_bare_id_defaults_to_show() {
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir).args(&["add", "Ana", "company=Acme"]).assert().success();

    get_cmd(&temp_dir).args(&["1"]).assert().success()
        .stdout(predicates::str::contains("Lead #1: Ana"));

    drop(temp_dir);
}

#[test]
fn test_command_abbreviations() {
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir).args(&["add", "Ana", "company=Acme"]).assert().success();

    // "bo" expands to board, "sh" to show
    get_cmd(&temp_dir).args(&["bo"]).assert().success()
        .stdout(predicates::str::contains("Lead (1)"));
    get_cmd(&temp_dir).args(&["sh", "1"]).assert().success()
        .stdout(predicates::str::contains("Ana"));

    drop(temp_dir);
}

#[test]
fn test_list_shows_stage_column() {
    let (temp_dir, _guard) = setup_test_env();

    get_cmd(&temp_dir).args(&["add", "Ana", "company=Acme", "stage=negotiation"]).assert().success();

    let output = get_cmd(&temp_dir).args(&["list"]).assert().success();
    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();

    assert!(stdout.contains("Stage"));
    assert!(stdout.contains("Negotiation"));

    drop(temp_dir);
}
