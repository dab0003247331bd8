use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
}

/// One regional dataset: a small "latest" document for fast startup and a
/// full "complete" document fetched in the background.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub latest_url: String,
    pub complete_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
}

fn default_accent_color() -> String {
    "magenta".to_string()
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            name: "us".to_string(),
            latest_url: "https://tvcal.pages.dev/json/tv_us_latest.json".to_string(),
            complete_url: "https://tvcal.pages.dev/json/tv_us_complete.json".to_string(),
        },
        SourceConfig {
            name: "cn".to_string(),
            latest_url: "https://tvcal.pages.dev/json/tv_cn_latest.json".to_string(),
            complete_url: "https://tvcal.pages.dev/json/tv_cn_complete.json".to_string(),
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ui: UiConfig::default(),
            sources: default_sources(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            accent_color: default_accent_color(),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "terebi").ok_or(Error::NoConfigDir)
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = config_path()?;

        if !path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}
