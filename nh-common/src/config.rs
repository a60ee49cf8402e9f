//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `NH_ROOT_FOLDER`, then `NH_ROOT` environment variable
//! 3. Module TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never terminates the service: a warning is
//! logged and compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "neuroharmony.db";

/// Default number of tracks in a generated playlist
pub const DEFAULT_PLAYLIST_SIZE: usize = 6;

/// Default bound on every storage call
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 30_000;

/// Default HTTP port of the music therapy service
pub const DEFAULT_PORT: u16 = 5740;

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default tracing level (overridden by `RUST_LOG`)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_playlist_size() -> usize {
    DEFAULT_PLAYLIST_SIZE
}

fn default_store_timeout_ms() -> u64 {
    DEFAULT_STORE_TIMEOUT_MS
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_true() -> bool {
    true
}

/// Per-module TOML configuration
///
/// Every field has a default so partial files (or files written by older
/// versions) still deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Pre-trained model artifact (JSON). Absent means no classifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_path: Option<PathBuf>,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Target playlist size N
    #[serde(default = "default_playlist_size")]
    pub playlist_size: usize,

    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Renormalize ranking scores after dropping categories missing from the
    /// catalog. Off by default (matches historical behaviour).
    #[serde(default)]
    pub renormalize_after_filter: bool,

    /// Seed the default catalog when the song table is empty
    #[serde(default = "default_true")]
    pub seed_catalog: bool,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            logging: LoggingConfig::default(),
            model_path: None,
            port: DEFAULT_PORT,
            playlist_size: DEFAULT_PLAYLIST_SIZE,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            renormalize_after_filter: false,
            seed_catalog: true,
        }
    }
}

/// OS-dependent compiled defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/neuroharmony (or /var/lib/neuroharmony for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("neuroharmony"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/neuroharmony"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/neuroharmony
        dirs::data_dir()
            .map(|d| d.join("neuroharmony"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/neuroharmony"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\neuroharmony
        dirs::data_local_dir()
            .map(|d| d.join("neuroharmony"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\neuroharmony"))
    } else {
        PathBuf::from("./neuroharmony_data")
    }
}

/// Path of the TOML file for a module: `<config dir>/neuroharmony/<module>.toml`
pub fn config_file_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("neuroharmony").join(format!("{}.toml", module_name)))
}

/// Load a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Write a TOML config file, creating parent directories
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load the module config with graceful degradation
///
/// Missing file: defaults, logged at debug. Unreadable or malformed file:
/// defaults, logged as a warning.
pub fn load_module_config(module_name: &str) -> TomlConfig {
    let Some(path) = config_file_path(module_name) else {
        return TomlConfig::default();
    };
    if !path.exists() {
        debug!("No config file at {}, using defaults", path.display());
        return TomlConfig::default();
    }
    match load_toml_config(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("{}; using defaults", e);
            TomlConfig::default()
        }
    }
}

/// Resolves the root folder for a module
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
        }
    }

    /// Highest-priority override from the command line
    pub fn with_cli_arg(mut self, cli_arg: Option<PathBuf>) -> Self {
        self.cli_arg = cli_arg;
        self
    }

    /// Resolve the root folder; never fails
    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var("NH_ROOT_FOLDER") {
            return PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("NH_ROOT") {
            return PathBuf::from(path);
        }

        if let Some(root) = load_module_config(&self.module_name).root_folder {
            return root;
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates the database inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder (and parents) if missing; idempotent
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}
