//! End-to-end boot tests on a scratch root.
//!
//! Covers the whole stage sequence plus idempotence of a second start.

use doliboot::BootPipeline;
use doliboot::identity::Reassignment;
use doliboot::install::{InstallOutcome, SkipReason};
use doliboot::storage::owned_by;
use doliboot_test_utils::{BundleBuilder, FakeConnector, RecordingScripts, ScratchRoot};
use nix::unistd::{Gid, Uid, chown};
use std::time::Duration;

const VERSION: &str = "20.0.1";

#[tokio::test]
async fn test_full_boot_provisions_everything() {
    let scratch = ScratchRoot::new();
    let layout = scratch.layout();
    BundleBuilder::release(VERSION).write_to(&layout.bundle_archive());
    let config = scratch.config(VERSION, &["--timezone", "Europe/Paris"]);

    let report = BootPipeline::new(layout, &config)
        .run(&FakeConnector::empty(), &RecordingScripts::new())
        .await
        .unwrap();

    assert!(!report.identity.changed());
    assert!(report.swept.is_empty());
    assert!(report.bundle.extracted);
    assert!(report.compat_link_created);
    assert!(report.app_conf_written);
    assert_eq!(report.install, None);
    assert_eq!(report.handoff.program(), "apache2-foreground");

    for dir in layout.provisioned_dirs() {
        assert!(dir.is_dir());
    }
    assert_eq!(
        std::fs::read_link(layout.htdocs_compat_link()).unwrap(),
        layout.html_dir()
    );

    let php_ini = std::fs::read_to_string(layout.php_ini()).unwrap();
    assert!(php_ini.contains("date.timezone = Europe/Paris"));
    assert!(php_ini.contains("sendmail_path = /usr/sbin/sendmail -t -i"));

    let conf = std::fs::read_to_string(layout.app_conf()).unwrap();
    assert!(conf.starts_with("<?php\n"));
    assert!(conf.contains("$dolibarr_main_url_root='http://localhost';"));
    assert!(conf.contains("$dolibarr_main_db_type='mysqli';"));
    assert!(conf.contains("$dolibarr_main_db_pass='dbpass';"));
}

#[tokio::test]
async fn test_second_boot_is_idempotent() {
    let scratch = ScratchRoot::new();
    let layout = scratch.layout();
    BundleBuilder::release(VERSION).write_to(&layout.bundle_archive());
    let config = scratch.config(VERSION, &[]);
    let connector = FakeConnector::empty();
    let scripts = RecordingScripts::new();

    BootPipeline::new(layout, &config)
        .run(&connector, &scripts)
        .await
        .unwrap();
    let conf_before = std::fs::read(layout.app_conf()).unwrap();
    let passwd_before = std::fs::read(layout.passwd_file()).unwrap();

    let report = BootPipeline::new(layout, &config)
        .run(&connector, &scripts)
        .await
        .unwrap();

    assert!(!report.bundle.extracted);
    assert!(!report.compat_link_created);
    assert!(!report.app_conf_written);
    assert_eq!(std::fs::read(layout.app_conf()).unwrap(), conf_before);
    assert_eq!(std::fs::read(layout.passwd_file()).unwrap(), passwd_before);
}

#[tokio::test]
async fn test_boot_with_auto_install() {
    let scratch = ScratchRoot::new();
    let layout = scratch.layout();
    BundleBuilder::release(VERSION).write_to(&layout.bundle_archive());
    let config = scratch.install_config(VERSION);
    let scripts = RecordingScripts::new();

    let report = BootPipeline::new(layout, &config)
        .with_retry_interval(Duration::from_millis(1))
        .run(&FakeConnector::empty().failing_first(1), &scripts)
        .await
        .unwrap();
    assert!(matches!(
        report.install,
        Some(InstallOutcome::Installed { scripts: 7 })
    ));
    assert!(layout.install_lock().exists());

    let again = BootPipeline::new(layout, &config)
        .run(&FakeConnector::empty(), &scripts)
        .await
        .unwrap();
    assert_eq!(
        again.install,
        Some(InstallOutcome::Skipped(SkipReason::LockPresent))
    );
}

#[tokio::test]
async fn test_failed_stage_stops_before_handoff() {
    let scratch = ScratchRoot::new();
    let layout = scratch.layout();
    // No archive: the bundle stage fails
    let config = scratch.config(VERSION, &[]);

    let result = BootPipeline::new(layout, &config)
        .run(&FakeConnector::empty(), &RecordingScripts::new())
        .await;

    assert!(result.is_err());
    assert!(!layout.app_conf().exists());
}

// ============================================================================
// OWNERSHIP SWEEPS
// ============================================================================

#[tokio::test]
async fn test_uid_change_sweeps_whole_web_root() {
    let scratch = ScratchRoot::new();
    let layout = scratch.layout();
    BundleBuilder::release(VERSION).write_to(&layout.bundle_archive());
    let id = ScratchRoot::identity();
    let stale_uid = if id.uid == 5000 { 5001 } else { 5000 };
    std::fs::write(
        layout.passwd_file(),
        format!("www-data:x:{stale_uid}:{}:www-data:/var/www:/usr/sbin/nologin\n", id.gid),
    )
    .unwrap();
    let config = scratch.config(VERSION, &[]);

    let report = BootPipeline::new(layout, &config)
        .run(&FakeConnector::empty(), &RecordingScripts::new())
        .await
        .unwrap();

    assert_eq!(
        report.identity.uid,
        Reassignment::Changed {
            previous: stale_uid.to_string()
        }
    );
    assert_eq!(report.swept, vec![layout.www_root()]);
    let passwd = std::fs::read_to_string(layout.passwd_file()).unwrap();
    assert!(passwd.starts_with(&format!("www-data:x:{}:", id.uid)));
}

/// A group the test process may hand a directory to, other than its own.
fn foreign_gid() -> Option<u32> {
    let own = ScratchRoot::identity().gid;
    if Uid::effective().is_root() {
        return Some(if own == 4242 { 4243 } else { 4242 });
    }
    nix::unistd::getgroups()
        .ok()?
        .into_iter()
        .map(|g| g.as_raw())
        .find(|g| *g != own)
}

#[tokio::test]
async fn test_drifted_root_is_swept_alone() {
    let Some(gid) = foreign_gid() else {
        eprintln!("no second group available, skipping");
        return;
    };
    let scratch = ScratchRoot::new();
    let layout = scratch.layout();
    BundleBuilder::release(VERSION).write_to(&layout.bundle_archive());
    let config = scratch.config(VERSION, &[]);

    std::fs::create_dir_all(layout.documents_dir()).unwrap();
    chown(&layout.documents_dir(), None, Some(Gid::from_raw(gid))).unwrap();
    assert!(!owned_by(&layout.documents_dir(), config.identity).unwrap());

    let report = BootPipeline::new(layout, &config)
        .run(&FakeConnector::empty(), &RecordingScripts::new())
        .await
        .unwrap();

    assert!(!report.identity.changed());
    assert_eq!(report.swept, vec![layout.documents_dir()]);
    assert!(owned_by(&layout.documents_dir(), config.identity).unwrap());
}
