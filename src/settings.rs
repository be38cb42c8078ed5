use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

/// Optional settings file, looked up in the working directory.
const CONFIG_FILE: &str = "reclame";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// spider.cloud credential; required.
    pub spider_api_key: Option<String>,
    /// Access key expected in `X-API-Key`. Unset or empty means open mode.
    pub api_key: Option<String>,
    pub api_host: String,
    pub api_port: u16,
    /// Also fetch the HTML of each complaint for tags, chat and evaluation.
    pub fetch_html_details: bool,
    pub search_wait_ms: u64,
}

impl Settings {
    /// Defaults, then `reclame.toml` if present, then the environment
    /// (`.env` included).
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings: Settings = Config::builder()
            .set_default("api_host", "0.0.0.0")?
            .set_default("api_port", 8000)?
            .set_default("fetch_html_details", false)?
            .set_default("search_wait_ms", 3000)?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        settings.validate()
    }

    fn validate(self) -> Result<Self> {
        match self.spider_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(self),
            _ => bail!("SPIDER_API_KEY is not configured. Set it in the environment or in .env"),
        }
    }

    /// Fetch provider key; only valid after `load`.
    pub fn spider_key(&self) -> &str {
        self.spider_api_key.as_deref().unwrap_or_default().trim()
    }

    /// Configured access key, with blank values treated as unset.
    pub fn access_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    }
}
