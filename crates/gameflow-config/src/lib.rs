pub mod error;
pub mod manifest;

pub use error::*;
pub use manifest::{Manifest, ProviderSettings, ResourceBody, load_manifest};

use std::path::PathBuf;

const CANDIDATES: [&str; 4] = [
    "gameflow.local.yaml",
    ".gameflow.local.yaml",
    "gameflow.yaml",
    ".gameflow.yaml",
];

/// Get the GameFlow config directory, creating it if needed
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("gameflow");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Locate the project manifest
///
/// Search order:
/// 1. `GAMEFLOW_CONFIG_PATH` (direct path)
/// 2. current directory: gameflow.local.yaml, .gameflow.local.yaml, gameflow.yaml, .gameflow.yaml
/// 3. the same names inside `./.gameflow/`
/// 4. `~/.config/gameflow/gameflow.yaml` (global)
pub fn find_manifest_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var("GAMEFLOW_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;

    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    let project_dir = current_dir.join(".gameflow");
    if project_dir.is_dir() {
        for filename in &CANDIDATES {
            let path = project_dir.join(filename);
            if path.exists() {
                return Ok(path);
            }
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("gameflow").join("gameflow.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ManifestNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;

    #[test]
    fn test_get_config_dir() {
        let config_dir = get_config_dir().unwrap();
        assert!(config_dir.ends_with("gameflow"));
        assert!(config_dir.exists());
    }

    #[test]
    #[serial]
    fn test_find_manifest_in_current_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("gameflow.yaml"), "resources: {}").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_manifest_file();

        std::env::set_current_dir(original_dir).unwrap();
        assert!(result.unwrap().ends_with("gameflow.yaml"));
    }

    #[test]
    #[serial]
    fn test_local_manifest_wins() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        fs::write(temp_dir.path().join("gameflow.yaml"), "").unwrap();
        fs::write(temp_dir.path().join(".gameflow.local.yaml"), "").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_manifest_file();

        std::env::set_current_dir(original_dir).unwrap();
        assert!(result.unwrap().ends_with(".gameflow.local.yaml"));
    }

    #[test]
    #[serial]
    fn test_find_manifest_in_project_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();

        let project_dir = temp_dir.path().join(".gameflow");
        fs::create_dir(&project_dir).unwrap();
        fs::write(project_dir.join("gameflow.yaml"), "").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_manifest_file();

        std::env::set_current_dir(original_dir).unwrap();
        assert!(result.unwrap().ends_with(".gameflow/gameflow.yaml"));
    }

    #[test]
    #[serial]
    fn test_env_var_takes_precedence() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        let config_path = temp_dir.path().join("custom.yaml");
        fs::write(&config_path, "").unwrap();
        fs::write(temp_dir.path().join("gameflow.yaml"), "").unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        unsafe {
            std::env::set_var("GAMEFLOW_CONFIG_PATH", &config_path);
        }
        let result = find_manifest_file();
        unsafe {
            std::env::remove_var("GAMEFLOW_CONFIG_PATH");
        }

        std::env::set_current_dir(original_dir).unwrap();
        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    #[serial]
    fn test_manifest_not_found() {
        let temp_dir = tempfile::tempdir().unwrap();
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&temp_dir).unwrap();

        let result = find_manifest_file();

        std::env::set_current_dir(original_dir).unwrap();
        // a global manifest on the test machine would shadow this case
        if !dirs::config_dir()
            .map(|d| d.join("gameflow").join("gameflow.yaml").exists())
            .unwrap_or(false)
        {
            assert!(matches!(result, Err(ConfigError::ManifestNotFound)));
        }
    }
}
