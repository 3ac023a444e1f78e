//! Configuration loading and root folder resolution

use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Database file name inside the root folder.
const DB_FILE_NAME: &str = "warera_tax.db";

/// Runtime configuration for the engine binary.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Folder holding the ledger database
    pub root_folder: PathBuf,
    /// WarEra API base URL
    pub base_url: String,
    /// WarEra API token, sent as the authorization header
    pub api_token: String,
    /// Country whose members are tracked
    pub country_id: String,
    /// Delay between periodic reconciliation passes
    pub sync_interval: Duration,
    /// Minimum level shown on the rendered dashboard
    pub dashboard_min_level: i64,
}

impl EngineConfig {
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DB_FILE_NAME)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_token.trim().is_empty() {
            return Err(Error::Config(
                "API token not set (flag --token or env WARERA_API_TOKEN)".to_string(),
            ));
        }
        if self.country_id.trim().is_empty() {
            return Err(Error::Config("country id must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&str>, env_var_name: &str) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return PathBuf::from(path);
    }

    // Priority 3: TOML config file
    if let Some(config_path) = default_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(root_folder) = config.get("root_folder").and_then(|v| v.as_str()) {
                    return PathBuf::from(root_folder);
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Platform config file path (~/.config/warera-tax/config.toml), if one
/// exists.
fn default_config_file() -> Option<PathBuf> {
    let path = dirs::config_dir()?.join("warera-tax").join("config.toml");
    path.exists().then_some(path)
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("warera-tax"))
        .unwrap_or_else(|| PathBuf::from("./warera_tax_data"))
}
