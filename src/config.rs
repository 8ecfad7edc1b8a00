//! JSON configuration tree.
//!
//! The file is a single JSON object whose top-level keys are sections:
//!
//! ```json
//! {
//!     "database": { "path": "quay.db" },
//!     "http": { "bind": "0.0.0.0", "port": 8080 }
//! }
//! ```
//!
//! A missing file is recoverable ([`Config::load_or_init`] writes the
//! defaults); a file that exists but does not parse is not.

use std::fs;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

/// Errors raised while loading, saving or reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file `{}` not found", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config file `{}`: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write config file `{}`: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config key not found: {0}")]
    KeyNotFound(String),

    #[error("invalid `{key}` section: {source}")]
    Invalid {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A configuration tree addressable by top-level key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    tree: Map<String, Value>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration written when no file exists yet.
    pub fn defaults() -> Self {
        let mut config = Self::new();
        let settings = Settings::default();
        config.set("http", serde_json::json!({
            "bind": settings.http.bind.to_string(),
            "port": settings.http.port,
        }));
        config.set("database", serde_json::json!({
            "path": settings.database.path,
        }));
        config
    }

    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    /// [`ConfigError::NotFound`] if there is no file, [`ConfigError::Read`]
    /// if it cannot be read, [`ConfigError::Parse`] if it is not a JSON object.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
            _ => ConfigError::Read { path: path.to_path_buf(), source },
        })?;
        let tree = serde_json::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        Ok(Self { tree })
    }

    /// Loads `path`, or writes and returns [`Config::defaults`] if it does not exist.
    pub fn load_or_init(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match Self::load(path) {
            Err(ConfigError::NotFound(_)) => {
                warn!(path = %path.display(), "config file not found, writing defaults");
                let config = Self::defaults();
                config.save(path)?;
                Ok(config)
            }
            other => other,
        }
    }

    /// Writes the tree to `path` as JSON indented by four spaces.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let write_err = |source| ConfigError::Write { path: path.to_path_buf(), source };
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.tree.serialize(&mut serializer)
            .map_err(|e| write_err(io::Error::other(e)))?;
        out.push(b'\n');
        fs::write(path, out).map_err(write_err)
    }

    pub fn get(&self, key: &str) -> Result<&Value, ConfigError> {
        self.tree.get(key).ok_or_else(|| ConfigError::KeyNotFound(key.to_owned()))
    }

    /// Inserts or replaces `key`.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.tree.insert(key.into(), value);
    }

    /// Typed view of the sections this backend reads. Absent sections and
    /// absent fields fall back to their defaults.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        Ok(Settings {
            http: self.section("http")?,
            database: self.section("database")?,
        })
    }

    fn section<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: for<'de> Deserialize<'de> + Default,
    {
        match self.tree.get(key) {
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|source| ConfigError::Invalid { key: key.to_owned(), source }),
            None => Ok(T::default()),
        }
    }
}

// ── Settings ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub http: HttpSettings,
    pub database: DatabaseSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub bind: IpAddr,
    pub port: u16,
}

impl HttpSettings {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 8080 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self { path: PathBuf::from("quay.db") }
    }
}
