//! Startup configuration.
//!
//! `BootArgs` is what clap parses (environment first, flags as override).
//! `BootConfig` is the validated, immutable snapshot handed to every stage.

use clap::Parser;
use doliboot_shared::constants::{envs, identity, server, sql};
use doliboot_shared::errors::{BootError, BootResult};
use std::fmt;
use std::path::PathBuf;

/// Dolibarr container bootstrap
///
/// Provisions /var/www, reconciles the www-data identity, installs the bundled
/// release, renders php.ini and conf.php, optionally loads the database schema,
/// then execs the web server.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct BootArgs {
    /// Release version the container should run
    #[arg(long, env = envs::DOLI_VERSION)]
    pub doli_version: String,

    /// Numeric UID for www-data
    #[arg(long, env = envs::WWW_USER_ID, default_value_t = identity::DEFAULT_ID)]
    pub www_user_id: u32,

    /// Numeric GID for www-data
    #[arg(long, env = envs::WWW_GROUP_ID, default_value_t = identity::DEFAULT_ID)]
    pub www_group_id: u32,

    /// Database flavour (mysql or mariadb)
    #[arg(long, env = envs::DB_TYPE)]
    pub db_type: String,

    #[arg(long, env = envs::DB_HOST)]
    pub db_host: Option<String>,

    #[arg(long, env = envs::DB_PORT, default_value_t = sql::DEFAULT_PORT)]
    pub db_port: u16,

    #[arg(long, env = envs::DB_NAME)]
    pub db_name: Option<String>,

    #[arg(long, env = envs::DB_USER)]
    pub db_user: Option<String>,

    #[arg(long, env = envs::DB_PASSWORD, hide_env_values = true)]
    pub db_password: Option<String>,

    /// Public URL root written to conf.php
    #[arg(long, env = envs::URL_ROOT)]
    pub url_root: Option<String>,

    #[arg(long, env = envs::ADMIN_LOGIN)]
    pub admin_login: Option<String>,

    #[arg(long, env = envs::ADMIN_PASSWORD, hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Load the database schema on first start when set to 1
    #[arg(long, env = envs::INSTALL_AUTO)]
    pub install_auto: Option<String>,

    /// Value for php.ini date.timezone
    #[arg(long, env = envs::PHP_TIMEZONE)]
    pub timezone: Option<String>,

    /// Value for $dolibarr_main_prod
    #[arg(long, env = envs::PROD)]
    pub prod: Option<String>,

    /// Filesystem root the container layout lives under
    #[arg(long, default_value = "/")]
    pub root: PathBuf,

    /// Bundle archive (defaults to /tmp/dolibarr.zip under the root)
    #[arg(long)]
    pub archive: Option<PathBuf>,

    /// Command that replaces the bootstrap once provisioning is done
    #[arg(last = true, default_value = server::FOREGROUND_COMMAND)]
    pub command: Vec<String>,
}

/// Supported database flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Mysql,
    Mariadb,
}

impl DbKind {
    pub fn parse(value: &str) -> BootResult<Self> {
        match value {
            "mysql" => Ok(Self::Mysql),
            "mariadb" => Ok(Self::Mariadb),
            other => Err(BootError::Config(format!(
                "invalid {}: '{}' (expected mysql or mariadb)",
                envs::DB_TYPE,
                other
            ))),
        }
    }

    /// Driver name written to `$dolibarr_main_db_type`.
    pub fn driver(&self) -> &'static str {
        match self {
            Self::Mysql | Self::Mariadb => sql::MYSQL_DRIVER,
        }
    }
}

/// Database connection parameters.
///
/// Fields are kept as given; an unset value renders as an empty string in
/// conf.php and is rejected only when auto-install needs it.
#[derive(Clone, PartialEq, Eq)]
pub struct DbSettings {
    pub kind: DbKind,
    pub host: Option<String>,
    pub port: u16,
    pub name: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for DbSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbSettings")
            .field("kind", &self.kind)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Owner of the web tree and of the files the bootstrap writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub uid: u32,
    pub gid: u32,
}

/// Initial administrator account.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSettings {
    pub login: String,
    pub password: String,
}

impl fmt::Debug for AdminSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSettings")
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

/// Validated startup configuration.
#[derive(Debug, Clone)]
pub struct BootConfig {
    pub desired_version: String,
    pub identity: ServiceIdentity,
    pub db: DbSettings,
    pub url_root: Option<String>,
    /// Present only when auto-install is enabled
    pub admin: Option<AdminSettings>,
    pub install_auto: bool,
    pub timezone: Option<String>,
    pub production: Option<String>,
    pub command: Vec<String>,
}

impl BootConfig {
    /// Validate parsed arguments.
    pub fn from_args(args: BootArgs) -> BootResult<Self> {
        let desired_version = args.doli_version.trim().to_string();
        if desired_version.is_empty() {
            return Err(BootError::Config(format!(
                "{} must not be empty",
                envs::DOLI_VERSION
            )));
        }

        let kind = DbKind::parse(&args.db_type)?;
        let install_auto = args.install_auto.as_deref() == Some("1");

        let db = DbSettings {
            kind,
            host: args.db_host,
            port: args.db_port,
            name: args.db_name,
            user: args.db_user,
            password: args.db_password,
        };

        let admin = if install_auto {
            require(&db.host, envs::DB_HOST)?;
            require(&db.name, envs::DB_NAME)?;
            require(&db.user, envs::DB_USER)?;
            Some(AdminSettings {
                login: require(&args.admin_login, envs::ADMIN_LOGIN)?.to_string(),
                password: require(&args.admin_password, envs::ADMIN_PASSWORD)?.to_string(),
            })
        } else {
            None
        };

        if args.command.is_empty() {
            return Err(BootError::Config("handoff command is empty".to_string()));
        }

        Ok(Self {
            desired_version,
            identity: ServiceIdentity {
                uid: args.www_user_id,
                gid: args.www_group_id,
            },
            db,
            url_root: args.url_root,
            admin,
            install_auto,
            timezone: args.timezone.filter(|tz| !tz.trim().is_empty()),
            production: args.prod,
            command: args.command,
        })
    }
}

fn require<'a>(value: &'a Option<String>, name: &str) -> BootResult<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(BootError::Config(format!(
            "{name} is required when {} is 1",
            envs::INSTALL_AUTO
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> BootResult<BootConfig> {
        let mut argv = vec!["doliboot", "--doli-version", "20.0.1", "--db-type", "mariadb"];
        argv.extend_from_slice(extra);
        BootConfig::from_args(BootArgs::try_parse_from(argv).unwrap())
    }

    #[test]
    fn test_defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.desired_version, "20.0.1");
        assert_eq!(config.identity, ServiceIdentity { uid: 33, gid: 33 });
        assert_eq!(config.db.port, 3306);
        assert_eq!(config.db.kind.driver(), "mysqli");
        assert!(!config.install_auto);
        assert!(config.admin.is_none());
        assert_eq!(config.command, vec!["apache2-foreground".to_string()]);
    }

    #[test]
    fn test_unsupported_db_type_is_config_error() {
        let args =
            BootArgs::try_parse_from(["doliboot", "--doli-version", "1", "--db-type", "pgsql"])
                .unwrap();
        let err = BootConfig::from_args(args).unwrap_err();
        assert!(matches!(err, BootError::Config(_)));
        assert!(err.to_string().contains("pgsql"));
    }

    #[test]
    fn test_install_auto_requires_admin() {
        let err = parse(&[
            "--install-auto",
            "1",
            "--db-host",
            "db",
            "--db-name",
            "dolibarr",
            "--db-user",
            "doli",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("DOLI_ADMIN_LOGIN"));
    }

    #[test]
    fn test_install_auto_only_for_literal_one() {
        let config = parse(&["--install-auto", "yes"]).unwrap();
        assert!(!config.install_auto);
    }

    #[test]
    fn test_trailing_command_overrides_default() {
        let config = parse(&["--", "httpd", "-DFOREGROUND"]).unwrap();
        assert_eq!(config.command, vec!["httpd", "-DFOREGROUND"]);
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let config = parse(&[
            "--install-auto",
            "1",
            "--db-host",
            "db",
            "--db-name",
            "dolibarr",
            "--db-user",
            "doli",
            "--db-password",
            "s3cret",
            "--admin-login",
            "admin",
            "--admin-password",
            "hunter2",
        ])
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(!rendered.contains("hunter2"));
    }
}
