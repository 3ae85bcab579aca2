use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const SERVER_URL_ENV: &str = "FAQCHAT_SERVER_URL";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            server_url: default_server_url(),
            log_file: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", config_path.display(), e))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    /// Store a new server URL in the config file.
    pub fn save_server_url(url: &str) -> Result<Self> {
        let mut config = Self::load()?;
        config.set_server_url(url)?;
        config.save()?;
        Ok(config)
    }

    pub fn set_server_url(&mut self, url: &str) -> Result<()> {
        let url = url.trim().trim_end_matches('/');
        if url.is_empty() {
            return Err(anyhow!("Server URL must not be empty"));
        }
        self.server_url = url.to_string();
        Ok(())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    /// Server URL with precedence: command line, then environment, then file.
    pub fn effective_server_url(&self, cli: Option<&str>) -> String {
        let env = std::env::var(SERVER_URL_ENV).ok();
        self.resolve_server_url(cli, env.as_deref())
    }

    /// Blank values at any level fall through to the next one.
    pub fn resolve_server_url(&self, cli: Option<&str>, env: Option<&str>) -> String {
        fn given(url: Option<&str>) -> Option<&str> {
            url.map(str::trim).filter(|url| !url.is_empty())
        }
        given(cli)
            .or_else(|| given(env))
            .unwrap_or(self.server_url.as_str())
            .to_string()
    }

    /// Log file location, defaulting to `faqchat.log` next to the config file.
    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log_file {
            return Ok(path.clone());
        }
        Ok(Self::config_dir()?.join("faqchat.log"))
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("faqchat"))
    }
}
