//! Configuration for portal paths, sync limits and derivation rules.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (PORTAL_HOME, PORTAL_CONTENT_DIR, PORTAL_CATALOG)
//! 2. Config file (.portal/config.yaml)
//! 3. Defaults (~/.portal)
//!
//! Config file discovery:
//! - Searches current directory and parents for .portal/config.yaml
//! - `paths.home` is relative to the .portal/ directory; `paths.content` and
//!   `paths.catalog` are relative to the project root (parent of .portal/)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::derive::DerivationRules;
use crate::core::limits::SyncLimits;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub sync: SyncLimits,
    #[serde(default)]
    pub derivation: DerivationRules,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// Portal state directory (relative to .portal/)
    pub home: Option<String>,
    /// Content document directory (relative to project root)
    pub content: Option<String>,
    /// Catalog snapshot file (relative to project root)
    pub catalog: Option<String>,
}

/// Path overrides read from the environment
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub home: Option<PathBuf>,
    pub content: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
}

impl EnvOverrides {
    /// Read PORTAL_HOME, PORTAL_CONTENT_DIR and PORTAL_CATALOG
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().map(PathBuf::from);
        Self {
            home: var("PORTAL_HOME"),
            content: var("PORTAL_CONTENT_DIR"),
            catalog: var("PORTAL_CATALOG"),
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Portal state directory
    pub home: PathBuf,
    /// Directory of `<slug>.json` content documents
    pub content_dir: PathBuf,
    /// Catalog snapshot file
    pub catalog_path: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Reconciliation limits
    pub limits: SyncLimits,
    /// Card derivation rules
    pub rules: DerivationRules,
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".portal").join("config.yaml");
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

/// Resolve a path that may be relative to a base directory
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

/// Merge defaults, an optional config file and env overrides
fn resolve(
    default_home: PathBuf,
    config: Option<(&Path, ConfigFile)>,
    env: EnvOverrides,
) -> ResolvedConfig {
    let Some((config_path, config)) = config else {
        let home = env.home.unwrap_or(default_home);
        return ResolvedConfig {
            content_dir: env.content.unwrap_or_else(|| home.join("tutorials")),
            catalog_path: env.catalog.unwrap_or_else(|| home.join("catalog.json")),
            home,
            config_file: None,
            limits: SyncLimits::default(),
            rules: DerivationRules::default(),
        };
    };

    let portal_dir = config_path.parent().unwrap_or(Path::new("."));
    let base_dir = portal_dir.parent().unwrap_or(Path::new("."));

    let home = env.home.unwrap_or_else(|| match config.paths.home {
        Some(ref home) => resolve_path(portal_dir, home),
        None => default_home,
    });

    let content_dir = env.content.unwrap_or_else(|| match config.paths.content {
        Some(ref content) => resolve_path(base_dir, content),
        None => home.join("tutorials"),
    });

    let catalog_path = env.catalog.unwrap_or_else(|| match config.paths.catalog {
        Some(ref catalog) => resolve_path(base_dir, catalog),
        None => home.join("catalog.json"),
    });

    ResolvedConfig {
        home,
        content_dir,
        catalog_path,
        config_file: Some(config_path.to_path_buf()),
        limits: config.sync,
        rules: config.derivation,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".portal");

    let config_file = find_config_file();
    let config = match config_file {
        Some(ref path) => Some((path.as_path(), load_config_file(path)?)),
        None => None,
    };

    Ok(resolve(default_home, config, EnvOverrides::from_env()))
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
