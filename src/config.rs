use crate::error::ConfigError;
use std::time::Duration;

pub const DEFAULT_TABLE: &str = "bus_lines";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the remote line table.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    /// Project URL, e.g. "https://xyz.supabase.co"
    pub base_url: String,
    /// Public anon key sent with every request
    pub api_key: String,
    pub table: String,
    pub timeout: Duration,
}

impl SourceConfig {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Result<Self, ConfigError> {
        let base_url = base_url
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or(ConfigError::MissingUrl)?;
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingKey)?;

        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(ConfigError::InvalidUrl(base_url));
        }

        Ok(Self {
            base_url,
            api_key,
            table: DEFAULT_TABLE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Read SUPABASE_URL and SUPABASE_KEY from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(std::env::var("SUPABASE_URL").ok(), std::env::var("SUPABASE_KEY").ok())
    }

    // "select all rows" on the line table
    pub fn lines_url(&self) -> String {
        format!("{}/rest/v1/{}?select=*", self.base_url, self.table)
    }
}
