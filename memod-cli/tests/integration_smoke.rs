//! Smoke tests to verify command wiring

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn memod(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("memod").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("DATABASE_URL")
        .env_remove("MEMOD_CONFIG")
        .env_remove("MEMOD_USER_PASSWORD");
    cmd
}

fn database_url(dir: &TempDir) -> String {
    format!("sqlite://{}", dir.path().join("memo.db").display())
}

// === Help Tests ===

#[test]
fn test_serve_help() {
    let dir = TempDir::new().unwrap();
    memod(&dir)
        .arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Number of pooled database connections"));
}

#[test]
fn test_user_add_help() {
    let dir = TempDir::new().unwrap();
    memod(&dir)
        .args(["user", "add", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Login name"));
}

// === Database Command Tests ===

#[test]
fn test_migrate_creates_database() {
    let dir = TempDir::new().unwrap();
    memod(&dir)
        .args(["migrate", "--database-url", &database_url(&dir)])
        .assert()
        .success();

    assert!(dir.path().join("memo.db").exists());
}

#[test]
fn test_user_add_rejects_duplicates() {
    let dir = TempDir::new().unwrap();
    let url = database_url(&dir);

    memod(&dir)
        .args(["user", "add", "alice", "--password", "pw", "--database-url", &url])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created user alice"));

    memod(&dir)
        .args(["user", "add", "alice", "--password", "pw", "--database-url", &url])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to create user 'alice'"));
}

#[test]
fn test_user_add_rejects_invalid_username() {
    let dir = TempDir::new().unwrap();
    memod(&dir)
        .args(["user", "add", "al ice", "--password", "pw"])
        .args(["--database-url", &database_url(&dir)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid username"));
}

#[test]
fn test_bad_config_file_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("memod.toml"), "pool_size = \"many\"").unwrap();

    memod(&dir)
        .args(["--config", "memod.toml", "migrate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("memod.toml"));
}
