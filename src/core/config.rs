use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const ALPHAVANTAGE_BASE_URL: &str = "https://www.alphavantage.co";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_MODEL: &str = "gemini-2.5-flash-preview-05-20";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AlphaVantageProviderConfig {
    #[serde(default = "default_alphavantage_url")]
    pub base_url: String,
    #[serde(default = "default_alphavantage_key")]
    pub api_key: String,
}

impl Default for AlphaVantageProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_alphavantage_url(),
            api_key: default_alphavantage_key(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeminiProviderConfig {
    #[serde(default = "default_gemini_url")]
    pub base_url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
}

impl Default for GeminiProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_url(),
            model: default_gemini_model(),
            api_key: String::new(),
        }
    }
}

fn default_alphavantage_url() -> String {
    ALPHAVANTAGE_BASE_URL.to_string()
}

fn default_alphavantage_key() -> String {
    "demo".to_string()
}

fn default_gemini_url() -> String {
    GEMINI_BASE_URL.to_string()
}

fn default_gemini_model() -> String {
    GEMINI_MODEL.to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub alphavantage: AlphaVantageProviderConfig,
    #[serde(default)]
    pub gemini: GeminiProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    /// Signed-in account. Absent means signed out.
    pub user: Option<String>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Extra attempts after a transport failure.
    #[serde(default)]
    pub retries: usize,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "pricewatch", "pricewatch")
            .context("Could not determine project directories")
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.yaml"))
    }

    pub fn data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        Ok(Self::project_dirs()?.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
