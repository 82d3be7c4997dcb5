use crate::{AppConfig, DirCmpError};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "dircmp.toml";

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: Option<PathBuf>,
    pub exists: bool,
}

/// Load the configuration from `explicit`, or from the user config directory.
///
/// A missing default file yields the defaults. A missing explicit file is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, DirCmpError> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(DirCmpError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let config = read_config(path)?;
        return Ok(LoadedConfig {
            config,
            path: Some(path.to_path_buf()),
            exists: true,
        });
    }

    let path = default_config_path();
    let exists = path.as_deref().map_or(false, Path::is_file);

    let config = match path.as_deref() {
        Some(path) if exists => read_config(path)?,
        _ => AppConfig::default(),
    };

    Ok(LoadedConfig {
        config,
        path,
        exists,
    })
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), DirCmpError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = toml::to_string_pretty(config)
        .map_err(|e| DirCmpError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "dircmp").map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn read_config(path: &Path) -> Result<AppConfig, DirCmpError> {
    let data = fs::read_to_string(path)?;
    toml::from_str(&data)
        .map_err(|e| DirCmpError::Config(format!("{}: {}", path.display(), e)))
}
