//! # Configuration
//!
//! Optional TOML file read at startup:
//!
//! ```toml
//! catalog = "my-catalog.toml"
//!
//! [server]
//! host = "127.0.0.1"
//! port = 8080
//! cors_origins = ["http://localhost:3000"]
//! body_limit_bytes = 262144
//! ```
//!
//! Every key is optional. Without `--config`, `essa.toml` in the working
//! directory is used when present; otherwise built-in defaults apply.

use essa_core::{Catalog, EssaError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File looked up when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "essa.toml";

/// Largest config or catalog file accepted (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

// =============================================================================
// TYPES
// =============================================================================

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    /// Custom reference catalog. Relative paths resolve against the config
    /// file's directory.
    pub catalog: Option<PathBuf>,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins. `["*"]` allows any origin; empty means localhost only.
    pub cors_origins: Vec<String>,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
            body_limit_bytes: 256 * 1024,
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl Config {
    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_FILE`]
    /// is read if present.
    pub fn load(path: Option<&Path>) -> Result<Self, EssaError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<Self, EssaError> {
        let text = read_limited(path)?;
        let mut config = Self::parse(&text)?;
        if let Some(catalog) = config.catalog.take() {
            let base = path.parent().unwrap_or(Path::new("."));
            config.catalog = Some(base.join(catalog));
        }
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parse config text.
    pub fn parse(text: &str) -> Result<Self, EssaError> {
        let config: Self =
            toml::from_str(text).map_err(|e| EssaError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), EssaError> {
        if self.server.host.trim().is_empty() {
            return Err(EssaError::InvalidConfig("server.host must not be empty".to_string()));
        }
        if self.server.body_limit_bytes == 0 {
            return Err(EssaError::InvalidConfig(
                "server.body_limit_bytes must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The reference catalog: the configured file, or the built-in tables.
    pub fn catalog(&self) -> Result<Catalog, EssaError> {
        match &self.catalog {
            Some(path) => load_catalog(path),
            None => Ok(Catalog::standard()),
        }
    }
}

/// Load and validate a catalog from a TOML file.
pub fn load_catalog(path: &Path) -> Result<Catalog, EssaError> {
    let text = read_limited(path)?;
    let catalog = parse_catalog(&text)?;
    tracing::info!(
        path = %path.display(),
        factors = catalog.factors.len(),
        "Loaded custom reference catalog"
    );
    Ok(catalog)
}

/// Parse and validate catalog text.
pub fn parse_catalog(text: &str) -> Result<Catalog, EssaError> {
    let catalog: Catalog =
        toml::from_str(text).map_err(|e| EssaError::InvalidCatalog(e.to_string()))?;
    catalog.validate()?;
    Ok(catalog)
}

fn read_limited(path: &Path) -> Result<String, EssaError> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        EssaError::IoError(format!("Cannot read '{}': {}", path.display(), e))
    })?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(EssaError::InvalidConfig(format!(
            "'{}' is {} bytes, maximum is {}",
            path.display(),
            metadata.len(),
            MAX_CONFIG_FILE_SIZE
        )));
    }
    std::fs::read_to_string(path)
        .map_err(|e| EssaError::IoError(format!("Cannot read '{}': {}", path.display(), e)))
}

// =============================================================================
// TESTS
// =============================================================================
