use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::ZipWriter;
use zip::write::FileOptions;

/// Builds a release zip: `dolibarr-<version>/{htdocs,scripts}/...`.
pub struct BundleBuilder {
    version: String,
    files: Vec<(String, Vec<u8>, u32)>,
}

impl BundleBuilder {
    /// A release with a minimal web root, scripts and SQL install sources.
    pub fn release(version: &str) -> Self {
        Self {
            version: version.to_string(),
            files: Vec::new(),
        }
        .file("htdocs/index.php", b"<?php require 'main.inc.php';", 0o644)
        .file("htdocs/core/lib/admin.lib.php", b"<?php", 0o644)
        .file(
            "htdocs/install/mysql/tables/llx_user.sql",
            b"CREATE TABLE llx_user (rowid integer);",
            0o644,
        )
        .file(
            "htdocs/install/mysql/tables/llx_user.key.sql",
            b"ALTER TABLE llx_user ADD PRIMARY KEY (rowid);",
            0o644,
        )
        .file(
            "htdocs/install/mysql/tables/llx_const.sql",
            b"CREATE TABLE llx_const (rowid integer);",
            0o644,
        )
        .file(
            "htdocs/install/mysql/tables/llx_const.key.sql",
            b"ALTER TABLE llx_const ADD PRIMARY KEY (rowid);",
            0o644,
        )
        .file("htdocs/install/mysql/functions/functions.sql", b"-- functions", 0o644)
        .file("htdocs/install/mysql/data/llx_10_c_regions.sql", b"-- regions", 0o644)
        .file("htdocs/install/mysql/data/llx_00_c_country.sql", b"-- countries", 0o644)
        .file("scripts/cron/cron_run_jobs.php", b"#!/usr/bin/env php\n<?php", 0o755)
    }

    /// Add a file relative to the release directory.
    pub fn file(mut self, path: &str, contents: &[u8], mode: u32) -> Self {
        self.files.push((path.to_string(), contents.to_vec(), mode));
        self
    }

    /// Write the zip to `archive`.
    pub fn write_to(&self, archive: &Path) {
        let mut zip = ZipWriter::new(File::create(archive).expect("create bundle"));
        let prefix = format!("dolibarr-{}", self.version);
        for (path, contents, mode) in &self.files {
            zip.start_file(
                format!("{prefix}/{path}"),
                FileOptions::default().unix_permissions(*mode),
            )
            .expect("start bundle entry");
            zip.write_all(contents).expect("write bundle entry");
        }
        zip.finish().expect("finish bundle");
    }
}
