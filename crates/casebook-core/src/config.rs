use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Directory, relative to the project root, holding the store and config.
pub const CASEBOOK_DIR: &str = ".casebook";
pub const CONFIG_FILE: &str = "config.toml";
/// Environment override for the store path.
pub const DB_ENV: &str = "CASEBOOK_DB";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasebookConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cases: CasesConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Relative paths resolve against the project root.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasesConfig {
    #[serde(default = "default_case_number_prefix")]
    pub case_number_prefix: String,
    #[serde(default)]
    pub require_category: bool,
}

impl Default for CasesConfig {
    fn default() -> Self {
        Self {
            case_number_prefix: default_case_number_prefix(),
            require_category: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

#[must_use]
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(CASEBOOK_DIR).join(CONFIG_FILE)
}

/// Load `.casebook/config.toml`, falling back to defaults when it is absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(project_root: &Path) -> Result<CasebookConfig> {
    let path = config_path(project_root);
    if !path.exists() {
        return Ok(CasebookConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<CasebookConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write the default config unless one is already present.
/// Returns whether a file was written.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_default_config(project_root: &Path) -> Result<bool> {
    let path = config_path(project_root);
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(&CasebookConfig::default())
        .context("Failed to serialize default config")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

/// Store path: `CASEBOOK_DB` wins, then the config, relative to `project_root`.
#[must_use]
pub fn resolve_db_path(project_root: &Path, config: &CasebookConfig) -> PathBuf {
    resolve_db_path_with(project_root, config, env::var_os(DB_ENV).map(PathBuf::from))
}

fn resolve_db_path_with(
    project_root: &Path,
    config: &CasebookConfig,
    env_override: Option<PathBuf>,
) -> PathBuf {
    let chosen = env_override
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| config.store.path.clone());
    if chosen.is_absolute() {
        chosen
    } else {
        project_root.join(chosen)
    }
}

const fn default_true() -> bool {
    true
}

fn default_store_path() -> PathBuf {
    PathBuf::from(CASEBOOK_DIR).join("casebook.sqlite3")
}

fn default_case_number_prefix() -> String {
    "CASE".to_string()
}
