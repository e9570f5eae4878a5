//! Binary tests: configuration errors and a full run against a scratch root.

use assert_cmd::Command;
use doliboot_test_utils::{BundleBuilder, ScratchRoot};
use predicates::prelude::*;
use std::time::Duration;

const ENV_VARS: &[&str] = &[
    "DOLI_VERSION",
    "WWW_USER_ID",
    "WWW_GROUP_ID",
    "DOLI_DB_TYPE",
    "DOLI_DB_HOST",
    "DOLI_DB_PORT",
    "DOLI_DB_NAME",
    "DOLI_DB_USER",
    "DOLI_DB_PASSWORD",
    "DOLI_URL_ROOT",
    "DOLI_ADMIN_LOGIN",
    "DOLI_ADMIN_PASSWORD",
    "DOLI_INSTALL_AUTO",
    "DOLI_PROD",
    "PHP_INI_DATE_TIMEZONE",
];

/// The binary with a clean bootstrap environment.
fn doliboot() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_doliboot"));
    cmd.timeout(Duration::from_secs(30));
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_missing_version_is_rejected() {
    doliboot()
        .env("DOLI_DB_TYPE", "mariadb")
        .assert()
        .failure()
        .stderr(predicate::str::contains("doli-version"));
}

#[test]
fn test_invalid_db_type_is_rejected() {
    let scratch = ScratchRoot::new();
    doliboot()
        .env("DOLI_VERSION", "20.0.1")
        .env("DOLI_DB_TYPE", "postgres")
        .arg("--root")
        .arg(scratch.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("DOLI_DB_TYPE"));

    // Rejected before any stage touched the root
    assert!(!scratch.layout().www_root().exists());
}

#[test]
fn test_auto_install_without_admin_is_rejected() {
    let scratch = ScratchRoot::new();
    doliboot()
        .env("DOLI_VERSION", "20.0.1")
        .env("DOLI_DB_TYPE", "mysql")
        .env("DOLI_DB_HOST", "db")
        .env("DOLI_DB_NAME", "dolibarr")
        .env("DOLI_DB_USER", "doli")
        .env("DOLI_INSTALL_AUTO", "1")
        .arg("--root")
        .arg(scratch.path())
        .assert()
        .failure();
}

#[test]
fn test_boot_hands_off_to_command() {
    let scratch = ScratchRoot::new();
    let layout = scratch.layout();
    BundleBuilder::release("20.0.1").write_to(&layout.bundle_archive());
    let id = ScratchRoot::identity();

    doliboot()
        .env("DOLI_VERSION", "20.0.1")
        .env("DOLI_DB_TYPE", "mariadb")
        .env("WWW_USER_ID", id.uid.to_string())
        .env("WWW_GROUP_ID", id.gid.to_string())
        .env("DOLI_URL_ROOT", "http://localhost")
        .arg("--root")
        .arg(scratch.path())
        .args(["--", "sh", "-c", "echo handed-off"])
        .assert()
        .success()
        .stdout(predicate::str::contains("handed-off"));

    assert!(layout.app_conf().is_file());
    assert!(layout.html_version_marker().is_file());
}
