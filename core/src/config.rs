use std::env;

use crate::error::{Error, Result};

/// Public API host used when no override is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.statuspage.io/";

pub const TOKEN_VAR: &str = "STATUSPAGE_API_TOKEN";
pub const PAGE_VAR: &str = "STATUSPAGE_API_PAGE";
pub const BASE_URL_VAR: &str = "STATUSPAGE_BASE_URL";

/// Connection settings for a [`Client`](crate::Client).
#[derive(Clone)]
pub struct Config {
    pub base_url: String,
    pub token: String,
    /// Substituted whenever a call site passes an empty page id.
    pub default_page: String,
}

impl Config {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.into(),
            default_page: String::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_default_page(mut self, page_id: impl Into<String>) -> Self {
        self.default_page = page_id.into();
        self
    }

    /// Read settings from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let token = env::var(TOKEN_VAR)
            .map_err(|_| Error::Config(format!("{TOKEN_VAR} must be set")))?;
        let mut config = Self::new(token);
        if let Ok(page) = env::var(PAGE_VAR) {
            config.default_page = page;
        }
        if let Ok(base_url) = env::var(BASE_URL_VAR) {
            config.base_url = base_url;
        }
        Ok(config)
    }
}

// Keep the bearer token out of logs and panic messages.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("default_page", &self.default_page)
            .finish()
    }
}
