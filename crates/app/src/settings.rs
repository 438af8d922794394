//! Handles settings for the application. Configuration is written in
//! `viatico.toml`; every section is optional so the binary also runs with no
//! file at all.

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Where the engine keeps its documents.
#[derive(Debug, Deserialize)]
pub enum Store {
    #[serde(rename = "memory")]
    Memory,
    #[serde(rename = "path")]
    Path(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Rates {
    pub url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub store: Option<Store>,
    pub rates: Rates,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("viatico").required(false))
            .build()?;

        settings.try_deserialize()
    }
}
