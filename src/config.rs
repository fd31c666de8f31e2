//! Configuration Management
//!
//! Handles persistent configuration and credential files for the scrumy CLI.

use crate::scrumy::auth;
use crate::scrumy::client::DEFAULT_BASE_URL;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the API root
pub const BASE_URL_ENV: &str = "SCRUMY_BASE_URL";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Scrumy project name
    #[serde(default)]
    pub project: Option<String>,
    /// Project password; never written by [`Config::save`]
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// API root, defaults to https://scrumy.com/api
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("scrumy").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Parse a YAML credentials file (`project`, `password`, optional `base_url`)
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Invalid credentials file")
    }

    /// Read a YAML credentials file
    pub fn load_credentials_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read credentials file {}", path.display()))?;
        Self::from_yaml_str(&content)
    }

    /// Values from SCRUMY_PROJECT, SCRUMY_PASSWORD and SCRUMY_BASE_URL
    pub fn from_env() -> Self {
        Self {
            project: auth::get_default_project(),
            password: auth::get_default_password(),
            base_url: std::env::var(BASE_URL_ENV).ok().filter(|u| !u.is_empty()),
        }
    }

    /// Merge layers; for each field the first layer that sets it wins
    pub fn layered<I: IntoIterator<Item = Config>>(layers: I) -> Self {
        layers.into_iter().fold(Self::default(), |acc, layer| Self {
            project: acc.project.or(layer.project),
            password: acc.password.or(layer.password),
            base_url: acc.base_url.or(layer.base_url),
        })
    }

    /// Effective project name
    pub fn effective_project(&self) -> Result<String> {
        let project = self
            .project
            .clone()
            .context("No Scrumy project configured. Set SCRUMY_PROJECT or use --project")?;
        anyhow::ensure!(
            auth::validate_project(&project),
            "Invalid project name: {}",
            project
        );
        Ok(project)
    }

    /// Effective password
    pub fn effective_password(&self) -> Result<String> {
        self.password
            .clone()
            .context("No Scrumy password configured. Set SCRUMY_PASSWORD or use --password")
    }

    /// Effective API root, validated as an http(s) URL
    pub fn effective_base_url(&self) -> Result<String> {
        let base = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        validate_base_url(base)
    }

    /// Set project and save
    pub fn set_project(&mut self, project: &str) -> Result<()> {
        self.project = Some(project.to_string());
        self.save()
    }
}

/// Check that a base URL is an absolute http(s) URL and strip any trailing '/'
pub fn validate_base_url(base: &str) -> Result<String> {
    let parsed = url::Url::parse(base).with_context(|| format!("Invalid base URL: {}", base))?;
    anyhow::ensure!(
        matches!(parsed.scheme(), "http" | "https"),
        "Base URL must use http or https: {}",
        base
    );
    Ok(base.trim_end_matches('/').to_string())
}
