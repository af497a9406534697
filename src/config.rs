use crate::error::{FertiplanError, Result};
use crate::models::Precision;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

const ENV_PREFIX: &str = "FERTIPLAN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Config {
    /// Reference settings bundle. Defaults to `settings.yaml` in the config dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_path: Option<PathBuf>,
    #[serde(default)]
    pub output: OutputFormat,
    /// Precision for projects that do not set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_precision: Option<Precision>,
}

impl Config {
    /// Load from `config_override` or the first standard location that exists.
    /// No file at all means defaults, still open to `FERTIPLAN__*` overrides.
    pub fn load(config_override: Option<&Path>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) if !p.exists() => {
                return Err(FertiplanError::Config(format!(
                    "Config file not found at {}",
                    p.display()
                )))
            }
            Some(p) => Some(p.to_path_buf()),
            None => Self::find_config_path(),
        };

        let contents = match &config_path {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                let raw = std::fs::read_to_string(path)
                    .map_err(|e| FertiplanError::Config(format!("Failed to read config: {}", e)))?;
                Self::substitute_env_vars(&raw)
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                String::new()
            }
        };

        Self::from_yaml(&contents)
    }

    /// Parse YAML text layered under `FERTIPLAN__*` environment variables.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if !contents.trim().is_empty() {
            builder = builder.add_source(::config::File::from_str(
                contents,
                ::config::FileFormat::Yaml,
            ));
        }

        builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| FertiplanError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Search for the config file in standard locations.
    fn find_config_path() -> Option<PathBuf> {
        let local_config = PathBuf::from("config/fertiplan.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join("fertiplan").join("config.yaml"))
            .filter(|p| p.exists())
    }

    fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| FertiplanError::Config("Cannot determine config directory".into()))?
            .join("fertiplan"))
    }

    /// Default path for writing new config files (~/.config/fertiplan/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.yaml"))
    }

    /// Where the reference settings live: an explicit override, the configured
    /// path, or `settings.yaml` next to the default config.
    pub fn settings_path(&self, settings_override: Option<&Path>) -> Result<PathBuf> {
        if let Some(p) = settings_override {
            return Ok(p.to_path_buf());
        }
        match &self.settings_path {
            Some(p) => Ok(p.clone()),
            None => Ok(Self::config_dir()?.join("settings.yaml")),
        }
    }

    /// Write this config with a header comment.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| FertiplanError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# Fertiplan Configuration\n# Generated by `fertiplan init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(path, content)?;
        Ok(())
    }

    fn substitute_env_vars(content: &str) -> String {
        static RE: OnceLock<regex_lite::Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is valid")
        });

        let mut result = content.to_string();
        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }
}
