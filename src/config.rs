use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration settings for Sessionlytics
///
/// Stores user preferences that persist between runs:
/// - Claude directory location
/// - Default number of recent sessions to analyze
/// - Directory for CSV exports
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    /// Custom path to Claude directory (default: ~/.claude)
    pub claude_path: Option<PathBuf>,
    /// How many recent sessions a bare invocation analyzes
    pub default_session_count: usize,
    /// Directory for CSV exports (default: current directory)
    pub export_directory: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            claude_path: None,
            default_session_count: 5,
            export_directory: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home
            .join(".config")
            .join("sessionlytics")
            .join("config.yaml"))
    }

    pub fn get_claude_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.claude_path {
            Ok(path.clone())
        } else {
            let home =
                dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
            Ok(home.join(".claude"))
        }
    }

    pub fn get_export_directory(&self) -> PathBuf {
        self.export_directory
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.claude_path.is_none());
        assert_eq!(config.default_session_count, 5);
        assert!(config.export_directory.is_none());
    }

    #[test]
    fn test_explicit_claude_path_wins() {
        let config = Config {
            claude_path: Some(PathBuf::from("/data/claude")),
            ..Config::default()
        };
        assert_eq!(
            config.get_claude_path().unwrap(),
            PathBuf::from("/data/claude")
        );
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = Config {
            claude_path: Some(PathBuf::from("/data/claude")),
            default_session_count: 8,
            export_directory: None,
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        let restored: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(restored.default_session_count, 8);
        assert_eq!(restored.claude_path, config.claude_path);
    }
}
