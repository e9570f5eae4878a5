//! Fixed constants of the container image.
//!
//! Paths here are absolute inside the container; `BootLayout` re-roots them
//! under a prefix so the same code runs against a scratch directory.

/// Environment variable names read at startup.
pub mod envs {
    pub const DOLI_VERSION: &str = "DOLI_VERSION";
    pub const WWW_USER_ID: &str = "WWW_USER_ID";
    pub const WWW_GROUP_ID: &str = "WWW_GROUP_ID";

    pub const DB_TYPE: &str = "DOLI_DB_TYPE";
    pub const DB_HOST: &str = "DOLI_DB_HOST";
    pub const DB_PORT: &str = "DOLI_DB_PORT";
    pub const DB_NAME: &str = "DOLI_DB_NAME";
    pub const DB_USER: &str = "DOLI_DB_USER";
    pub const DB_PASSWORD: &str = "DOLI_DB_PASSWORD";

    pub const URL_ROOT: &str = "DOLI_URL_ROOT";
    pub const ADMIN_LOGIN: &str = "DOLI_ADMIN_LOGIN";
    pub const ADMIN_PASSWORD: &str = "DOLI_ADMIN_PASSWORD";
    pub const INSTALL_AUTO: &str = "DOLI_INSTALL_AUTO";
    pub const PROD: &str = "DOLI_PROD";

    pub const PHP_TIMEZONE: &str = "PHP_INI_DATE_TIMEZONE";
}

/// Service identity the web server runs as.
pub mod identity {
    /// Account name in both /etc/passwd and /etc/group
    pub const SERVICE_ACCOUNT: &str = "www-data";

    /// Debian default for www-data
    pub const DEFAULT_ID: u32 = 33;

    pub const PASSWD_FILE: &str = "/etc/passwd";
    pub const GROUP_FILE: &str = "/etc/group";
}

/// Absolute paths inside the container.
pub mod paths {
    /// Parent of every web directory; swept when the identity changes
    pub const WWW_ROOT: &str = "/var/www";

    /// Application data directory (uploads, install.lock)
    pub const DOCUMENTS: &str = "/var/www/documents";

    /// Document root served by the web server
    pub const HTML: &str = "/var/www/html";

    pub const SCRIPTS: &str = "/var/www/scripts";

    /// Legacy document root, kept as a symlink to `HTML`
    pub const HTDOCS_COMPAT: &str = "/var/www/htdocs";

    /// Bundled application archive
    pub const BUNDLE_ARCHIVE: &str = "/tmp/dolibarr.zip";

    /// Extraction target for the bundle, removed after install
    pub const STAGING: &str = "/tmp/dolibarr";

    pub const PHP_INI: &str = "/usr/local/etc/php/php.ini";
    pub const PHP_INI_PRODUCTION: &str = "/usr/local/etc/php/php.ini-production";
}

/// File names relative to the layout directories.
pub mod filenames {
    /// Version marker inside the web root and scripts root
    pub const VERSION_MARKER: &str = "version";

    /// Install lock inside the documents directory
    pub const INSTALL_LOCK: &str = "install.lock";

    /// Application config, relative to the web root
    pub const APP_CONF: &str = "conf/conf.php";

    /// Custom modules directory, relative to the web root
    pub const CUSTOM_DIR: &str = "custom";

    /// SQL install sources, relative to the web root
    pub const SQL_INSTALL_DIR: &str = "install/mysql";
}

/// Bundle archive internals.
pub mod bundle {
    /// Top-level directory inside the archive: `dolibarr-<version>`
    pub fn release_dir(version: &str) -> String {
        format!("dolibarr-{version}")
    }

    pub const HTDOCS_SUBTREE: &str = "htdocs";
    pub const SCRIPTS_SUBTREE: &str = "scripts";
}

/// Database schema constants.
pub mod sql {
    /// Table name prefix written to the application config
    pub const TABLE_PREFIX: &str = "llx_";

    /// Table probed to detect an existing installation
    pub const PROBE_TABLE: &str = "llx_const";

    /// Driver name the application expects for MySQL and MariaDB
    pub const MYSQL_DRIVER: &str = "mysqli";

    pub const DEFAULT_PORT: u16 = 3306;

    /// Client binary used to feed schema scripts
    pub const CLIENT_BINARY: &str = "mariadb";

    /// Const rows cleared and rewritten on install
    pub const RESET_CONSTS: &[&str] = &[
        "MAIN_VERSION_LAST_INSTALL",
        "MAIN_NOT_INSTALLED",
        "MAIN_LANG_DEFAULT",
    ];
}

/// Server runtime.
pub mod server {
    /// Foreground command the bootstrap hands off to
    pub const FOREGROUND_COMMAND: &str = "apache2-foreground";

    pub const SENDMAIL_PATH: &str = "/usr/sbin/sendmail -t -i";
}
