use clap::Parser;
use doliboot::{BootArgs, BootConfig, BootLayout, ServiceIdentity};
use std::path::Path;
use tempfile::TempDir;

/// Production php.ini shipped with the PHP image, trimmed.
pub const PHP_INI_TEMPLATE: &str = "[PHP]\n\
engine = On\n\
memory_limit = 128M\n\
[Date]\n\
;date.timezone =\n\
[mail function]\n\
;sendmail_path =\n";

/// A container root inside a temp directory.
///
/// www-data is mapped to the uid/gid running the tests so every chown the
/// bootstrap performs succeeds without privileges.
pub struct ScratchRoot {
    temp: TempDir,
    layout: BootLayout,
}

impl ScratchRoot {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create scratch root");
        let layout = BootLayout::new(temp.path());
        let scratch = Self { temp, layout };
        scratch.seed_system_files();
        scratch
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn layout(&self) -> &BootLayout {
        &self.layout
    }

    /// uid/gid of the test process.
    pub fn identity() -> ServiceIdentity {
        ServiceIdentity {
            uid: nix::unistd::getuid().as_raw(),
            gid: nix::unistd::getgid().as_raw(),
        }
    }

    fn seed_system_files(&self) {
        let id = Self::identity();
        // A peer id that collides with neither test id
        let other = (4242..).find(|n| *n != id.uid && *n != id.gid).unwrap();

        let etc = self.layout.passwd_file();
        std::fs::create_dir_all(etc.parent().unwrap()).unwrap();
        std::fs::write(
            self.layout.passwd_file(),
            format!(
                "daemon:x:{other}:{other}:daemon:/usr/sbin:/usr/sbin/nologin\n\
                 www-data:x:{}:{}:www-data:/var/www:/usr/sbin/nologin\n",
                id.uid, id.gid
            ),
        )
        .unwrap();
        std::fs::write(
            self.layout.group_file(),
            format!("daemon:x:{other}:\nwww-data:x:{}:\n", id.gid),
        )
        .unwrap();

        let php_ini = self.layout.php_ini_production();
        std::fs::create_dir_all(php_ini.parent().unwrap()).unwrap();
        std::fs::write(php_ini, PHP_INI_TEMPLATE).unwrap();

        std::fs::create_dir_all(self.layout.staging_dir().parent().unwrap()).unwrap();
    }

    /// A config for this root; `extra` are additional long flags.
    pub fn config(&self, version: &str, extra: &[&str]) -> BootConfig {
        let id = Self::identity();
        let uid = id.uid.to_string();
        let gid = id.gid.to_string();
        let mut argv = vec![
            "doliboot",
            "--doli-version",
            version,
            "--db-type",
            "mariadb",
            "--www-user-id",
            uid.as_str(),
            "--www-group-id",
            gid.as_str(),
            "--url-root",
            "http://localhost",
            "--db-host",
            "db",
            "--db-name",
            "dolibarr",
            "--db-user",
            "doli",
            "--db-password",
            "dbpass",
        ];
        argv.extend_from_slice(extra);
        let args = BootArgs::try_parse_from(argv).expect("parse test args");
        BootConfig::from_args(args).expect("valid test config")
    }

    /// Config with auto-install enabled and admin credentials set.
    pub fn install_config(&self, version: &str) -> BootConfig {
        self.config(
            version,
            &[
                "--install-auto",
                "1",
                "--admin-login",
                "admin",
                "--admin-password",
                "admin",
            ],
        )
    }
}

impl Default for ScratchRoot {
    fn default() -> Self {
        Self::new()
    }
}
