use std::env;
use std::path::PathBuf;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "PORT";
    /// Directory holding the SQLite state file and `notes_config.ron`
    pub const DATA_DIR: &str = "NOTES_DATA_DIR";
    pub const DB_FILE: &str = "NOTES_DB_FILE";
    /// Optional path to a built frontend to serve at `/`
    pub const FRONTEND_DIST: &str = "FRONTEND_DIST";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 8080;
    pub const DATA_DIR: &str = "./.data";
    pub const DB_FILE: &str = "notes.db";
    pub const NOTES_CONFIG_FILE: &str = "notes_config.ron";
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub db_file: String,
    pub frontend_dist: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Self {
        let port = match env::var(env_vars::PORT) {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("PORT={} is not a valid port, using {}", raw, defaults::PORT);
                defaults::PORT
            }),
            Err(_) => defaults::PORT,
        };

        Self {
            port,
            data_dir: env::var(env_vars::DATA_DIR)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(defaults::DATA_DIR)),
            db_file: env::var(env_vars::DB_FILE)
                .unwrap_or_else(|_| defaults::DB_FILE.to_string()),
            frontend_dist: env::var(env_vars::FRONTEND_DIST)
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Path of the SQLite file backing the persistent store
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }

    /// Path of the RON tunables file
    pub fn notes_config_path(&self) -> PathBuf {
        self.data_dir.join(defaults::NOTES_CONFIG_FILE)
    }
}
