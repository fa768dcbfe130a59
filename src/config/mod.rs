use crate::models::UserConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use ::config::{Config, Environment, File, FileFormat};
use std::fs;

/// Name of the settings file inside the config directory
pub const CONFIG_FILE_NAME: &str = "figconv.yaml";

/// Prefix of environment variables overriding file settings (`FIGCONV_DPI`, ...)
pub const ENV_PREFIX: &str = "FIGCONV";

/// Loads and saves the user settings file.
///
/// Settings are layered: built-in defaults, then `figconv.yaml`, then
/// `FIGCONV_*` environment variables.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    user_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager, creating `config_dir` if needed.
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            user_config_path: config_dir.join(CONFIG_FILE_NAME),
            config_dir,
        })
    }

    /// Load the user configuration.
    ///
    /// A missing file yields defaults; environment overrides still apply.
    pub fn load_user_config(&self) -> Result<UserConfig> {
        self.load_with_environment(Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("default_formats")
    }

    fn load_with_environment(&self, environment: Environment) -> Result<UserConfig> {
        let mut builder = Config::builder();

        if self.user_config_path.exists() {
            builder = builder.add_source(
                File::new(self.user_config_path.as_str(), FileFormat::Yaml).required(true),
            );
        } else {
            tracing::warn!(
                "User config file not found at {}, using defaults",
                self.user_config_path
            );
        }

        let config = builder
            .add_source(environment)
            .build()
            .with_context(|| format!("Failed to read user config: {}", self.user_config_path))?;

        let user_config: UserConfig = config
            .try_deserialize()
            .with_context(|| format!("Failed to parse user config: {}", self.user_config_path))?;

        tracing::info!("Loaded user config from {}", self.user_config_path);
        Ok(user_config)
    }

    /// Save the user configuration file.
    pub fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize user config to YAML")?;

        fs::write(&self.user_config_path, yaml_string)
            .with_context(|| format!("Failed to write user config: {}", self.user_config_path))?;

        tracing::info!("Saved user config to {}", self.user_config_path);
        Ok(())
    }

    /// Write a default settings file unless one exists.
    ///
    /// Returns `true` when a file was written.
    pub fn init_user_config(&self) -> Result<bool> {
        if self.user_config_path.exists() {
            tracing::info!("User config already exists at {}", self.user_config_path);
            return Ok(false);
        }

        self.save_user_config(&UserConfig::default())?;
        Ok(true)
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.user_config_path
    }

    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}
