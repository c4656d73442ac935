//! Integration tests for the arcana-bot CLI.
#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Create a temp directory holding a small deck and two spreads.
fn test_store() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("Cards.csv"),
        "id,name,type,meaning,imageRef
0,The Fool,Major Arcana,\"Beginnings, innocence\",
1,The Magician,Major Arcana,Willpower and skill,
2,The High Priestess,Major Arcana,Intuition,
3,The Empress,Major Arcana,Abundance,
4,The Emperor,Major Arcana,Structure,
5,The Hierophant,Major Arcana,Tradition,
6,The Lovers,Major Arcana,Choices of the heart,
7,The Chariot,Major Arcana,Determination,
",
    )
    .unwrap();
    fs::write(
        dir.path().join("Spreads.csv"),
        "key,positions
one,Answer
three,Past,Present,Future
",
    )
    .unwrap();
    dir
}

fn arcana() -> Command {
    let mut cmd = Command::cargo_bin("arcana").unwrap();
    cmd.env("RUST_LOG", "off");
    cmd
}

#[test]
fn help_lists_modes() {
    arcana()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("console"));
}

#[test]
fn console_without_store_fails() {
    arcana()
        .arg("console")
        .env_remove("ARCANA_STORE_DIR")
        .env_remove("ARCANA_SHEETS_DOCUMENT_ID")
        .write_stdin("tarot help\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no store configured"));
}

#[test]
fn console_lists_spreads() {
    let store = test_store();
    arcana()
        .args(["console", "--store-dir"])
        .arg(store.path())
        .write_stdin("tarot spreads\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Three Card Spread (3 cards)"))
        .stdout(predicate::str::contains("One Card Oracle (1 cards)"));
}

#[test]
fn console_reading_writes_image_and_saves() {
    let store = test_store();
    let images = TempDir::new().unwrap();
    arcana()
        .args(["console", "--seed", "42", "--user", "tester", "--store-dir"])
        .arg(store.path())
        .arg("--image-dir")
        .arg(images.path())
        .write_stdin("tarot three Where am I headed?\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Three Card Spread"))
        .stdout(predicate::str::contains("Question: Where am I headed?"))
        .stdout(predicate::str::contains("image:"));

    let pngs: Vec<_> = fs::read_dir(images.path()).unwrap().collect();
    assert_eq!(pngs.len(), 1);

    let saved = fs::read_to_string(store.path().join("Readings.csv")).unwrap();
    let lines: Vec<&str> = saved.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("timestamp,requesterId"));
    assert!(lines[1].contains("tester"));
    assert!(lines[1].contains("Where am I headed?"));
}

#[test]
fn console_ignores_other_chatter_and_reports_unknown_spreads() {
    let store = test_store();
    arcana()
        .args(["console", "--store-dir"])
        .arg(store.path())
        .write_stdin("hello there\ntarot moon\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("no spread called `moon`"))
        .stdout(predicate::str::contains("hello").not());
}

#[test]
fn custom_keyword() {
    let store = test_store();
    arcana()
        .args(["console", "--keyword", "oracle", "--store-dir"])
        .arg(store.path())
        .write_stdin("tarot status\noracle status\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Cards loaded: 8"))
        .stdout(predicate::str::contains("Spreads loaded: 2"));
}
