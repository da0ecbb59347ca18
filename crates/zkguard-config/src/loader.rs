//! Configuration loader with multi-source merging

use crate::{AclConfig, Paths};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    include_user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "ZKGUARD".to_string(),
            include_user_config: true,
        }
    }

    /// Set the project directory
    #[must_use]
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "ZKGUARD")
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip ~/.config/zkguard/config.toml
    #[must_use]
    pub fn without_user_config(mut self) -> Self {
        self.include_user_config = false;
        self
    }

    /// Load configuration from all sources with proper precedence, then
    /// validate it.
    pub fn load(self) -> Result<AclConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = AclConfig::default();
        builder = builder.add_source(
            config::Config::try_from(&defaults).context("Failed to serialize defaults")?,
        );

        // 2. User config (~/.config/zkguard/config.toml)
        if self.include_user_config
            && let Ok(user_config_file) = Paths::new().user_config_file()
        {
            builder = builder.add_source(toml_file(user_config_file));
        }

        // 3. Project config (zkguard.toml)
        builder = builder.add_source(toml_file(Paths::project_config_file(&self.project_dir)));

        // 4. Local config (zkguard.local.toml, gitignored)
        builder = builder.add_source(toml_file(Paths::local_config_file(&self.project_dir)));

        // 5. Environment variables (ZKGUARD_PROVIDER, ZKGUARD_DIGEST__USERNAME, ...)
        //    Field names contain underscores, so sections are split on "__".
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // Build and deserialize
        let config = builder.build().context("Failed to build configuration")?;

        let acl_config: AclConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        acl_config
            .validate()
            .context("Configuration failed validation")?;

        Ok(acl_config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn toml_file(path: PathBuf) -> config::File<config::FileSourceFile, config::FileFormat> {
    config::File::from(path)
        .required(false)
        .format(config::FileFormat::Toml)
}
