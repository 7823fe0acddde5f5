use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::error::Result;
use crate::models::{DatatypeSpec, RetentionWindow};
use crate::utils::constants::{ARCHIVE_DIR, DEFAULT_DB_PORT, RETENTION_HOURS};

/// Environment variables read into [`Settings`]; everything else is ignored
const ENV_KEYS: &[&str] = &[
    "WORKERQUEUE",
    "RESULTSQUEUE",
    "RABBITHOST",
    "RABBITUSER",
    "RABBITPASS",
    "RETENTION_HOURS",
    "ARCHIVE_DIR_NAME",
];

/// Process configuration, read once at start and passed to the orchestrator.
///
/// Sources in increasing precedence: built-in defaults, an optional TOML
/// file, then the environment (`WORKERQUEUE`, `RESULTSQUEUE`, `RABBITHOST`,
/// `RABBITUSER`, `RABBITPASS`, and `PGHOST`/`PGPORT`/`PGUSER`/`PGPASSWORD`/
/// `PGDATABASE` for the database).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Settings {
    #[serde(default, alias = "workerqueue")]
    pub worker_queue: Option<String>,

    #[serde(default, alias = "resultsqueue")]
    pub results_queue: Option<String>,

    #[serde(default, alias = "rabbithost")]
    pub rabbit_host: Option<String>,

    #[serde(default, alias = "rabbituser")]
    pub rabbit_user: Option<String>,

    #[serde(default, alias = "rabbitpass", skip_serializing)]
    pub rabbit_pass: Option<String>,

    /// At most a century
    #[validate(range(min = 1, max = 876000))]
    pub retention_hours: i64,

    #[validate(length(min = 1))]
    pub archive_dir_name: String,

    #[serde(default = "DatatypeSpec::defaults")]
    #[validate(length(min = 1))]
    pub datatypes: Vec<DatatypeSpec>,

    #[serde(default)]
    pub database: DatabaseSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub database: Option<String>,
}

/// `PG*` variables, each overriding the matching [`DatabaseSettings`] field
#[derive(Debug, Default, Deserialize)]
struct DatabaseOverrides {
    host: Option<String>,
    port: Option<u16>,
    user: Option<String>,
    password: Option<String>,
    database: Option<String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_DB_PORT,
            user: "postgres".to_string(),
            password: None,
            database: None,
        }
    }
}

impl DatabaseSettings {
    pub fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user);
        let options = match &self.password {
            Some(password) => options.password(password),
            None => options,
        };
        match &self.database {
            Some(database) => options.database(database),
            None => options,
        }
    }

    fn apply(&mut self, overrides: DatabaseOverrides) {
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(user) = overrides.user {
            self.user = user;
        }
        if overrides.password.is_some() {
            self.password = overrides.password;
        }
        if overrides.database.is_some() {
            self.database = overrides.database;
        }
    }
}

impl Settings {
    /// Load from an optional file and the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, None)
    }

    /// Load with an explicit environment map instead of the process environment
    pub fn load_from(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("retention_hours", RETENTION_HOURS)?
            .set_default("archive_dir_name", ARCHIVE_DIR)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings = builder
            .add_source(Environment::default().source(Some(known_env(env.as_ref()))))
            .build()?;
        let mut settings: Settings = settings.try_deserialize()?;

        let overrides: DatabaseOverrides = Config::builder()
            .add_source(
                Environment::with_prefix("PG")
                    .prefix_separator("")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;
        settings.database.apply(overrides);

        settings.validate()?;
        for datatype in &settings.datatypes {
            datatype.validate()?;
        }

        Ok(settings)
    }

    pub fn retention(&self) -> RetentionWindow {
        RetentionWindow::from_hours(self.retention_hours)
    }

    /// `<data_dir>/<archive_dir_name>`
    pub fn archive_dir(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.archive_dir_name)
    }

    /// Datatype whose directory holds the snapshot copied into the archive
    pub fn source_datatype(&self) -> Option<&DatatypeSpec> {
        self.datatypes.iter().find(|d| d.on_disk)
    }
}

/// The [`ENV_KEYS`] subset of `env`, or of the process environment
fn known_env(env: Option<&Map<String, String>>) -> Map<String, String> {
    let known = |key: &str| ENV_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key));
    match env {
        Some(env) => env
            .iter()
            .filter(|(k, _)| known(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        None => std::env::vars().filter(|(k, _)| known(k.as_str())).collect(),
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            worker_queue: None,
            results_queue: None,
            rabbit_host: None,
            rabbit_user: None,
            rabbit_pass: None,
            retention_hours: RETENTION_HOURS,
            archive_dir_name: ARCHIVE_DIR.to_string(),
            datatypes: DatatypeSpec::defaults(),
            database: DatabaseSettings::default(),
        }
    }
}
