//! CLI configuration management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CliConfig {
    /// Artifactory server URL.
    pub artifactory_url: Option<String>,
    pub artifactory_username: Option<String>,
    pub artifactory_password: Option<String>,
    /// Package repository key.
    pub artifactory_repository: Option<String>,
    /// Build tables replacing the built-in ones.
    pub tables_path: Option<PathBuf>,
    /// Matrix output format.
    #[serde(default)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl CliConfig {
    /// Load configuration from the user config file.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_yaml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the user config file.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let dirs = directories::ProjectDirs::from("org", "openssl", "sslci")
            .ok_or("Could not determine config directory")?;
        Ok(dirs.config_dir().join("config.yaml"))
    }

    /// Set a configuration value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "artifactory_url" => self.artifactory_url = Some(value.to_string()),
            "artifactory_username" => self.artifactory_username = Some(value.to_string()),
            "artifactory_password" => self.artifactory_password = Some(value.to_string()),
            "artifactory_repository" => self.artifactory_repository = Some(value.to_string()),
            "tables_path" => self.tables_path = Some(PathBuf::from(value)),
            "output_format" => {
                self.output_format = match value {
                    "json" => OutputFormat::Json,
                    "yaml" => OutputFormat::Yaml,
                    _ => return Err(format!("Invalid output format: {}", value)),
                };
            }
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }
}
