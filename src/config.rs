//! # Configuration Module
//!
//! Resolves the handful of environment variables (§6.4) that every binary
//! needs, into a single explicit value constructed once in `main` and passed
//! down. There is deliberately no process-wide `ConfigValues` singleton.

use std::path::{Path, PathBuf};

/// Default install directory used when `KDB_INSTALL_DIR` is unset.
const DEFAULT_INSTALL_DIR: &str = ".";

/// Default bind address used when `KDB_INET_ADDRESS` is unset.
const DEFAULT_INET_ADDRESS: &str = "0.0.0.0";

/// Default bind port used when `KDB_INET_PORT` is unset.
const DEFAULT_INET_PORT: &str = "7500";

/// Resolved environment for a single process: where schemas and backing
/// files live, and where the daemon binds by default.
#[derive(Clone, Debug)]
pub struct Environment {
    install_dir: PathBuf,
    inet_address: String,
    inet_port: String,
}

impl Environment {
    /// Reads `KDB_INSTALL_DIR`, `KDB_INET_ADDRESS`, and `KDB_INET_PORT` from
    /// the process environment, falling back to documented defaults.
    pub fn from_env() -> Self {
        Environment {
            install_dir: std::env::var("KDB_INSTALL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_INSTALL_DIR)),
            inet_address: std::env::var("KDB_INET_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_INET_ADDRESS.to_string()),
            inet_port: std::env::var("KDB_INET_PORT")
                .unwrap_or_else(|_| DEFAULT_INET_PORT.to_string()),
        }
    }

    /// The directory holding `db/skm` and `db/db` (§6.2).
    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    /// Directory holding compiled schema text files (`<install>/db/skm`).
    pub fn schema_dir(&self) -> PathBuf {
        self.install_dir.join("db").join("skm")
    }

    /// Directory holding backing `.db` files (`<install>/db/db`).
    pub fn db_dir(&self) -> PathBuf {
        self.install_dir.join("db").join("db")
    }

    /// Path to the registry manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.install_dir.join("db").join("manifest")
    }

    /// Default daemon bind address.
    pub fn inet_address(&self) -> &str {
        &self.inet_address
    }

    /// Default daemon bind port.
    pub fn inet_port(&self) -> &str {
        &self.inet_port
    }
}
