//! Pixcall Configuration
//!
//! Handles parsing of pixcall.toml and the `LIB` / `NF` environment
//! overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::registry::{default_search_paths, find_library};

/// Default number of cached names per arity
pub const DEFAULT_CAPACITY: usize = 128;

/// Largest accepted per-arity capacity
pub const MAX_CAPACITY: usize = 0xffff;

/// Name of the configuration file searched for
pub const CONFIG_FILE: &str = "pixcall.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("capacity must be from 1-{max} range, got '{value}'", max = MAX_CAPACITY)]
    InvalidCapacity { value: String },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Root configuration structure matching pixcall.toml.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct PixcallConfig {
    /// Function library settings
    #[serde(default)]
    pub library: LibraryConfig,

    /// Formula evaluation settings
    #[serde(default)]
    pub formula: FormulaConfig,
}

impl PixcallConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: PixcallConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the current directory or parents.
    pub fn load_from_cwd() -> ConfigResult<Self> {
        let cwd = std::env::current_dir().map_err(ConfigError::Io)?;
        Self::find_and_load(&cwd)
    }

    /// Find and load configuration by searching up from the given directory.
    pub fn find_and_load(start_dir: &Path) -> ConfigResult<Self> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return Self::load(&config_path);
            }
            if !dir.pop() {
                return Ok(Self::default());
            }
        }
    }

    /// Apply the `LIB` and `NF` environment variables, if set.
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        let lib = std::env::var("LIB").ok();
        let nf = std::env::var("NF").ok();
        self.apply_overrides(lib.as_deref(), nf.as_deref())
    }

    /// Override the library path and capacity.
    ///
    /// Empty strings are treated as unset.
    pub fn apply_overrides(&mut self, lib: Option<&str>, nf: Option<&str>) -> ConfigResult<()> {
        if let Some(lib) = lib.filter(|s| !s.is_empty()) {
            self.library.path = Some(PathBuf::from(lib));
        }
        if let Some(nf) = nf.filter(|s| !s.is_empty()) {
            self.library.capacity = parse_capacity(nf)?;
        }
        Ok(())
    }

    fn validate(&self) -> ConfigResult<()> {
        if !(1..=MAX_CAPACITY).contains(&self.library.capacity) {
            return Err(ConfigError::InvalidCapacity {
                value: self.library.capacity.to_string(),
            });
        }
        Ok(())
    }
}

/// Parse a capacity from text, enforcing `1..=MAX_CAPACITY`.
pub fn parse_capacity(value: &str) -> ConfigResult<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if (1..=MAX_CAPACITY).contains(&n) => Ok(n),
        _ => Err(ConfigError::InvalidCapacity {
            value: value.to_string(),
        }),
    }
}

/// Function library settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LibraryConfig {
    /// Library path or bare name (`pixcall_kernel` → `libpixcall_kernel.so`)
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Cached names per arity
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Extra directories searched before the platform defaults
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            path: None,
            capacity: DEFAULT_CAPACITY,
            search_paths: Vec::new(),
        }
    }
}

impl LibraryConfig {
    /// Path to hand to the loader.
    ///
    /// Searches the configured directories, then the platform defaults. When
    /// nothing matches, the configured value is returned unchanged so the OS
    /// loader can apply its own search rules.
    pub fn resolve_path(&self) -> Option<PathBuf> {
        let path = self.path.as_ref()?;
        let name = path.to_string_lossy();

        let mut search_paths = self.search_paths.clone();
        search_paths.extend(default_search_paths());
        Some(find_library(&name, &search_paths).unwrap_or_else(|| path.clone()))
    }
}

/// Numeric domain formulas are evaluated in.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Real,
    #[default]
    Complex,
}

/// Formula evaluation settings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct FormulaConfig {
    /// Numeric domain
    #[serde(default)]
    pub domain: Domain,
}
