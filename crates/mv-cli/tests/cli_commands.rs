//! Integration tests for the `mossvale` CLI binary.

#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mossvale(saves: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mossvale").unwrap();
    cmd.env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .args(["--save-dir", saves.path().to_str().unwrap()]);
    cmd
}

const NEW_GAME: &str = "TITLE_NEW\nTITLE_NAME:Ada\nFORTUNE_POOR\nTITLE_START_CONFIRM_YES\n";

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

#[test]
fn help_lists_subcommands() {
    let saves = TempDir::new().unwrap();
    mossvale(&saves)
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("play")
                .and(predicate::str::contains("keys"))
                .and(predicate::str::contains("slots"))
                .and(predicate::str::contains("catalog")),
        );
}

// ---------------------------------------------------------------------------
// play
// ---------------------------------------------------------------------------

#[test]
fn play_starts_a_new_game() {
    let saves = TempDir::new().unwrap();
    mossvale(&saves)
        .arg("play")
        .write_stdin(format!("{NEW_GAME}status\n"))
        .assert()
        .success()
        .stdout(
            predicate::str::contains("TITLE_NEW")
                .and(predicate::str::contains("You arrive in town."))
                .and(predicate::str::contains("Ada Lv 1"))
                .and(predicate::str::contains("10 GP")),
        );
}

#[test]
fn play_reports_unavailable_commands() {
    let saves = TempDir::new().unwrap();
    mossvale(&saves)
        .arg("play")
        .write_stdin("ATTACK\nDANCE\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("not available right now: ATTACK")
                .and(predicate::str::contains("unknown command")),
        );
}

#[test]
fn play_stops_on_quit() {
    let saves = TempDir::new().unwrap();
    mossvale(&saves)
        .arg("play")
        .write_stdin("QUIT\nstatus\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Farewell.").and(predicate::str::contains("Lv").not()));
}

#[test]
fn logs_go_to_stderr() {
    let saves = TempDir::new().unwrap();
    mossvale(&saves)
        .args(["-v", "play"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("session started").not())
        .stderr(predicate::str::contains("session started"));
}

// ---------------------------------------------------------------------------
// slots
// ---------------------------------------------------------------------------

#[test]
fn slots_empty() {
    let saves = TempDir::new().unwrap();
    mossvale(&saves)
        .arg("slots")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saves found."));
}

#[test]
fn slots_after_playing() {
    let saves = TempDir::new().unwrap();
    mossvale(&saves).arg("play").write_stdin(NEW_GAME).assert().success();

    mossvale(&saves)
        .arg("slots")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ada").and(predicate::str::contains("1 of 100 slots used")));
}

#[test]
fn no_save_keeps_nothing_on_disk() {
    let saves = TempDir::new().unwrap();
    mossvale(&saves)
        .args(["--no-save", "play"])
        .write_stdin(NEW_GAME)
        .assert()
        .success();

    mossvale(&saves)
        .arg("slots")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saves found."));
}

// ---------------------------------------------------------------------------
// catalog
// ---------------------------------------------------------------------------

#[test]
fn catalog_items() {
    let saves = TempDir::new().unwrap();
    mossvale(&saves)
        .args(["catalog", "items"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Potion").and(predicate::str::contains("entries")));
}

#[test]
fn catalog_quests() {
    let saves = TempDir::new().unwrap();
    mossvale(&saves)
        .args(["catalog", "quests"])
        .assert()
        .success()
        .stdout(predicate::str::contains("into_the_woods"));
}

#[test]
fn catalog_unknown_kind_fails() {
    let saves = TempDir::new().unwrap();
    mossvale(&saves)
        .args(["catalog", "dragons"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown catalog 'dragons'"));
}

#[test]
fn catalog_override_must_parse() {
    let saves = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    std::fs::write(data.path().join("items.json"), "{ not json").unwrap();
    mossvale(&saves)
        .args(["--data-dir", data.path().to_str().unwrap(), "catalog", "items"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load catalogs"));
}
