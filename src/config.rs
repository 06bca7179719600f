//! Configuration for memoflow paths and backends.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (MEMOFLOW_HOME)
//! 2. Config file (.memoflow/config.yaml)
//! 3. Defaults (~/.memoflow)
//!
//! Config file discovery:
//! - Searches current directory and parents for .memoflow/config.yaml
//! - Paths in the config file are relative to its parent directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub whisper: Option<WhisperConfig>,
    #[serde(default)]
    pub fabric: Option<FabricConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// App state directory (relative to the config file)
    pub home: Option<String>,
    /// Where captured audio is written (relative to the config file)
    pub recordings: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhisperConfig {
    pub binary: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FabricConfig {
    pub binary: Option<String>,
    pub summarize_pattern: Option<String>,
    pub classify_pattern: Option<String>,
    pub timeout_seconds: Option<u64>,
}

/// Resolved configuration with absolute paths and backend settings
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to memoflow home (app state)
    pub home: PathBuf,
    /// Absolute path to the recordings directory
    pub recordings_dir: PathBuf,
    /// Path to the record catalog file
    pub catalog_path: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Whisper settings
    pub whisper: WhisperSettings,
    /// Fabric settings
    pub fabric: FabricSettings,
}

#[derive(Debug, Clone)]
pub struct WhisperSettings {
    pub binary: String,
    pub model: String,
}

impl Default for WhisperSettings {
    fn default() -> Self {
        Self {
            binary: "whisper".to_string(),
            model: "base".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FabricSettings {
    pub binary: String,
    pub summarize_pattern: String,
    pub classify_pattern: String,
    pub timeout: Duration,
}

impl Default for FabricSettings {
    fn default() -> Self {
        Self {
            binary: "fabric".to_string(),
            summarize_pattern: "summarize".to_string(),
            classify_pattern: "categorize_para".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".memoflow").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".memoflow");

    let config_file = find_config_file();

    let (mut config, base_dir) = if let Some(ref config_path) = config_file {
        let parsed = load_config_file(config_path)?;
        let base = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        (parsed, base)
    } else {
        (ConfigFile::default(), PathBuf::from("."))
    };

    let home = if let Ok(env_home) = std::env::var("MEMOFLOW_HOME") {
        PathBuf::from(env_home)
    } else if let Some(home_path) = config.paths.home.take() {
        resolve_path(&base_dir, &home_path)
    } else {
        default_home
    };

    let recordings_dir = if let Some(recordings) = config.paths.recordings.take() {
        resolve_path(&base_dir, &recordings)
    } else {
        home.join("recordings")
    };

    let whisper_defaults = WhisperSettings::default();
    let whisper = WhisperSettings {
        binary: config
            .whisper
            .as_ref()
            .and_then(|w| w.binary.clone())
            .unwrap_or(whisper_defaults.binary),
        model: config
            .whisper
            .as_ref()
            .and_then(|w| w.model.clone())
            .unwrap_or(whisper_defaults.model),
    };

    let fabric_defaults = FabricSettings::default();
    let fabric = FabricSettings {
        binary: config
            .fabric
            .as_ref()
            .and_then(|f| f.binary.clone())
            .unwrap_or(fabric_defaults.binary),
        summarize_pattern: config
            .fabric
            .as_ref()
            .and_then(|f| f.summarize_pattern.clone())
            .unwrap_or(fabric_defaults.summarize_pattern),
        classify_pattern: config
            .fabric
            .as_ref()
            .and_then(|f| f.classify_pattern.clone())
            .unwrap_or(fabric_defaults.classify_pattern),
        timeout: config
            .fabric
            .as_ref()
            .and_then(|f| f.timeout_seconds)
            .map(Duration::from_secs)
            .unwrap_or(fabric_defaults.timeout),
    };

    let catalog_path = home.join("records.json");

    Ok(ResolvedConfig {
        home,
        recordings_dir,
        catalog_path,
        config_file,
        whisper,
        fabric,
    })
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
