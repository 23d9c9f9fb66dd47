use std::{collections::HashMap, time::Duration};

use config::{Config as ConfigLib, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::blacklist::{DEFAULT_ENDPOINT, FetcherConfig, ParseMode};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub fetcher: FetcherSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherSettings {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub require_success: bool,
    pub user_agent: String,
    /// Fail on malformed lines instead of skipping them
    #[serde(default)]
    pub strict: bool,
}

impl FetcherSettings {
    pub fn to_fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            endpoint: self.endpoint.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            require_success: self.require_success,
            user_agent: self.user_agent.clone(),
            parse_mode: if self.strict {
                ParseMode::Strict
            } else {
                ParseMode::Lenient
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    pub format: OutputFormat,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_sources(None)
    }

    pub fn load_with_sources(
        env_vars: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigLib::builder()
            .set_default("fetcher.endpoint", DEFAULT_ENDPOINT)?
            .set_default("fetcher.timeout_secs", 30)?
            .set_default("fetcher.require_success", true)?
            .set_default(
                "fetcher.user_agent",
                concat!("blacklist-fetcher/", env!("CARGO_PKG_VERSION")),
            )?
            .set_default("fetcher.strict", false)?
            .set_default("output.format", "text")?
            .add_source(File::with_name("config/settings").required(false));

        // Explicit overrides replace the process environment so tests
        // don't pick up each other's variables
        if let Some(vars) = env_vars {
            for (key, value) in vars {
                builder = builder.set_override(&key, value)?;
            }
        } else {
            // e.g. BLACKLIST_FETCHER__ENDPOINT or BLACKLIST_OUTPUT__FORMAT
            builder = builder.add_source(
                Environment::with_prefix("BLACKLIST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        builder.build()?.try_deserialize()
    }
}
