//! Filesystem layout of the container.
//!
//! `BootLayout` maps every fixed path of the image onto a root prefix.
//! In the container the root is `/`; tests point it at a scratch directory.
//!
//! ```text
//! {root}/
//! ├── etc/{passwd,group}
//! ├── tmp/
//! │   ├── dolibarr.zip          # bundle archive
//! │   └── dolibarr/             # staging (transient)
//! ├── usr/local/etc/php/{php.ini,php.ini-production}
//! └── var/www/
//!     ├── documents/install.lock
//!     ├── html/{version,conf/conf.php,install/mysql/...}
//!     ├── htdocs -> html
//!     └── scripts/version
//! ```

use crate::constants::{bundle, filenames, identity, paths};
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct BootLayout {
    root: PathBuf,
    archive: Option<PathBuf>,
}

impl BootLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            archive: None,
        }
    }

    /// The container root (`/` in production).
    pub fn system() -> Self {
        Self::new("/")
    }

    /// Use a bundle archive outside the default location.
    ///
    /// Relative and absolute paths are used as given, not re-rooted.
    pub fn with_archive(mut self, archive: impl Into<PathBuf>) -> Self {
        self.archive = Some(archive.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Re-root an absolute container path under this layout's root.
    pub fn resolve(&self, absolute: &str) -> PathBuf {
        self.root.join(absolute.trim_start_matches('/'))
    }

    // ========================================================================
    // IDENTITY TABLES
    // ========================================================================

    pub fn passwd_file(&self) -> PathBuf {
        self.resolve(identity::PASSWD_FILE)
    }

    pub fn group_file(&self) -> PathBuf {
        self.resolve(identity::GROUP_FILE)
    }

    // ========================================================================
    // WEB DIRECTORIES
    // ========================================================================

    /// Parent of all web directories: /var/www
    pub fn www_root(&self) -> PathBuf {
        self.resolve(paths::WWW_ROOT)
    }

    /// Application data directory: /var/www/documents
    pub fn documents_dir(&self) -> PathBuf {
        self.resolve(paths::DOCUMENTS)
    }

    /// Web root: /var/www/html
    pub fn html_dir(&self) -> PathBuf {
        self.resolve(paths::HTML)
    }

    /// Scripts root: /var/www/scripts
    pub fn scripts_dir(&self) -> PathBuf {
        self.resolve(paths::SCRIPTS)
    }

    /// Legacy symlink location: /var/www/htdocs
    pub fn htdocs_compat_link(&self) -> PathBuf {
        self.resolve(paths::HTDOCS_COMPAT)
    }

    /// Directories ensured at every start, in creation order.
    pub fn provisioned_dirs(&self) -> [PathBuf; 3] {
        [self.documents_dir(), self.html_dir(), self.scripts_dir()]
    }

    // ========================================================================
    // MARKERS
    // ========================================================================

    pub fn html_version_marker(&self) -> PathBuf {
        self.html_dir().join(filenames::VERSION_MARKER)
    }

    pub fn scripts_version_marker(&self) -> PathBuf {
        self.scripts_dir().join(filenames::VERSION_MARKER)
    }

    /// Zero-byte sentinel written after the schema load.
    pub fn install_lock(&self) -> PathBuf {
        self.documents_dir().join(filenames::INSTALL_LOCK)
    }

    // ========================================================================
    // BUNDLE
    // ========================================================================

    pub fn bundle_archive(&self) -> PathBuf {
        match &self.archive {
            Some(archive) => archive.clone(),
            None => self.resolve(paths::BUNDLE_ARCHIVE),
        }
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.resolve(paths::STAGING)
    }

    /// Extracted release directory: /tmp/dolibarr/dolibarr-{version}
    pub fn staged_release(&self, version: &str) -> PathBuf {
        self.staging_dir().join(bundle::release_dir(version))
    }

    // ========================================================================
    // CONFIG FILES
    // ========================================================================

    pub fn php_ini(&self) -> PathBuf {
        self.resolve(paths::PHP_INI)
    }

    pub fn php_ini_production(&self) -> PathBuf {
        self.resolve(paths::PHP_INI_PRODUCTION)
    }

    /// Application config: /var/www/html/conf/conf.php
    pub fn app_conf(&self) -> PathBuf {
        self.html_dir().join(filenames::APP_CONF)
    }

    /// Custom modules directory, referenced from the application config.
    pub fn custom_dir(&self) -> PathBuf {
        self.html_dir().join(filenames::CUSTOM_DIR)
    }

    /// SQL install sources: /var/www/html/install/mysql
    pub fn sql_install_dir(&self) -> PathBuf {
        self.html_dir().join(filenames::SQL_INSTALL_DIR)
    }
}

impl Default for BootLayout {
    fn default() -> Self {
        Self::system()
    }
}
