use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file structure for devsweep.
///
/// Allows users to save service coordinates and output preferences and reuse
/// them across runs. Configuration files are loaded from the current
/// directory, the user config directory, or a specified path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// DevOps service connection settings
    #[serde(default)]
    pub devops: DevOpsConfig,

    /// Output format preferences
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DevOpsConfig {
    /// API token for the DevOps service
    pub token: Option<String>,

    /// DevOps service base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Compartment holding the projects' container and artifact repositories
    pub compartment: Option<String>,

    /// Keep the project resource itself after deleting its contents
    #[serde(default)]
    pub keep_project: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Default output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            devops: DevOpsConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for DevOpsConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
            compartment: None,
            keep_project: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Summary,
            pretty: false,
        }
    }
}

fn default_base_url() -> String {
    "https://devops.cloud.example.com".to_string()
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./devsweep.toml
    /// 3. ./devsweep.json
    /// 4. ./devsweep.yaml
    /// 5. ./devsweep.yml
    /// 6. <user config dir>/devsweep/devsweep.toml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        // Try common configuration file names
        let candidates = [
            "devsweep.toml",
            "devsweep.json",
            "devsweep.yaml",
            "devsweep.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        if let Some(path) = Self::user_config_path() {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        // No config file found, return defaults
        Ok(Self::default())
    }

    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("devsweep").join("devsweep.toml"))
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => {
                // Try TOML first, then JSON, then YAML
                toml::from_str(&contents)
                    .or_else(|_| serde_json::from_str(&contents))
                    .or_else(|_| serde_yaml::from_str(&contents))
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))
            }
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)?,
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)?,
            _ => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.devops.base_url, "https://devops.cloud.example.com");
        assert!(config.devops.token.is_none());
        assert!(!config.devops.keep_project);
        assert_eq!(config.output.format, OutputFormat::Summary);
        assert!(!config.output.pretty);
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[devops]
token = "dvs-test-token"
base-url = "https://devops.example.com"
compartment = "cmp-1"
keep-project = true

[output]
format = "json"
pretty = true
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.devops.token, Some("dvs-test-token".to_string()));
        assert_eq!(config.devops.base_url, "https://devops.example.com");
        assert_eq!(config.devops.compartment, Some("cmp-1".to_string()));
        assert!(config.devops.keep_project);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.pretty);
    }

    #[test]
    fn test_load_json_config() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        let json_content = r#"{
  "devops": {
    "token": "dvs-json-token",
    "base-url": "https://devops.json.example.com"
  },
  "output": {
    "format": "json"
  }
}"#;
        write!(temp_file, "{}", json_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.devops.token, Some("dvs-json-token".to_string()));
        assert_eq!(config.devops.base_url, "https://devops.json.example.com");
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        let yaml_content = r#"
devops:
  token: dvs-yaml-token
  compartment: cmp-2
"#;
        write!(temp_file, "{}", yaml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.devops.token, Some("dvs-yaml-token".to_string()));
        assert_eq!(config.devops.compartment, Some("cmp-2".to_string()));
        // Unset sections fall back to defaults
        assert_eq!(config.devops.base_url, "https://devops.cloud.example.com");
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load(Some(Path::new("nonexistent.toml")));
        assert!(result.is_err(), "Explicit path must exist");
    }

    #[test]
    fn test_save_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("devsweep.toml");

        let mut config = Config::default();
        config.devops.token = Some("dvs-saved".to_string());
        config.output.pretty = true;
        config.save(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.devops.token, Some("dvs-saved".to_string()));
        assert!(loaded.output.pretty);
    }
}
