use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::WikiError;

/// Which backend holds the pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// One `<title>.txt` file per page
    Files,
    /// One document per page in a SQLite database
    Database,
}

impl FromStr for StorageKind {
    type Err = WikiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fs" | "file" | "files" => Ok(StorageKind::Files),
            "db" | "database" => Ok(StorageKind::Database),
            other => Err(WikiError::Config(format!(
                "unknown storage backend {:?} (expected \"fs\" or \"db\")",
                other
            ))),
        }
    }
}

/// Application configuration and constants
#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub storage: StorageKind,
    pub pages_dir: PathBuf,
    pub templates_dir: PathBuf,
    pub database_url: String,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8080,
            storage: StorageKind::Files,
            pages_dir: PathBuf::from("pages"),
            templates_dir: PathBuf::from("templates"),
            database_url: "sqlite://folio.db".to_string(),
        }
    }

    /// Defaults overridden by `FOLIO_*` environment variables
    pub fn from_env() -> Result<Self, WikiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `FOLIO_*` key
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, WikiError> {
        let mut config = Self::new();
        if let Some(host) = lookup("FOLIO_HOST") {
            config.host = parse_value("FOLIO_HOST", &host)?;
        }
        if let Some(port) = lookup("FOLIO_PORT") {
            config.port = parse_value("FOLIO_PORT", &port)?;
        }
        if let Some(storage) = lookup("FOLIO_STORAGE") {
            config.storage = storage.parse()?;
        }
        if let Some(dir) = lookup("FOLIO_PAGES_DIR") {
            config.pages_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("FOLIO_TEMPLATES_DIR") {
            config.templates_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("FOLIO_DATABASE_URL") {
            config.database_url = url;
        }
        Ok(config)
    }

    /// Get the socket address for binding
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, WikiError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| WikiError::Config(format!("{}={:?}: {}", key, raw, e)))
}
