use std::fs;
use std::path::{Path, PathBuf};

use crate::types::Config;

/// Environment variable that overrides the config location.
pub const CONFIG_PATH_ENV: &str = "ORGCHART_CONFIG";

/// Get the canonical config file path (~/.orgchart/config.json)
pub fn config_path() -> Result<PathBuf, String> {
    if let Ok(custom) = std::env::var(CONFIG_PATH_ENV) {
        if !custom.trim().is_empty() {
            return Ok(PathBuf::from(custom));
        }
    }
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".orgchart").join("config.json"))
}

pub fn load_config_from(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        return Err(format!(
            "Config file not found at {}. Create it with: {{ \"rootUserEmail\": \"ceo@example.com\" }}",
            path.display()
        ));
    }

    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;
    let config: Config =
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))?;

    if let Some(snapshot) = config.snapshot_path.as_deref() {
        if snapshot.trim().is_empty() {
            return Err("snapshotPath is set but empty".to_string());
        }
    }

    Ok(config)
}

/// First run has no config file; that is not an error.
pub fn load_config_or_default(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        log::info!("OrgChart: no config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    load_config_from(path)
}

pub fn save_config(path: &Path, config: &Config) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config dir: {}", e))?;
        }
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;

    // Write beside the target and rename over it so readers never see half a file.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).map_err(|e| format!("Failed to write config: {}", e))?;
    fs::rename(&tmp, path).map_err(|e| format!("Failed to replace config: {}", e))?;
    Ok(())
}

/// Create or update the config file.
///
/// Reads the existing file (or starts from defaults on first run), applies
/// the mutator, and writes the result back atomically.
pub fn create_or_update_config(
    path: &Path,
    mutator: impl FnOnce(&mut Config),
) -> Result<Config, String> {
    let mut config = load_config_or_default(path)?;
    mutator(&mut config);
    save_config(path, &config)?;
    log::info!("OrgChart: config written to {}", path.display());
    Ok(config)
}
