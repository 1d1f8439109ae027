use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::line::BusLine;
use serde::Deserialize;
use tracing::{error, info, instrument};

/// Anything that can hand back the full list of lines.
pub trait LineSource: Send + Sync {
    fn fetch_lines(&self) -> Result<Vec<BusLine>, FetchError>;
}

// PostgREST error payload
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Reads the line table over the Supabase REST interface.
pub struct SupabaseSource {
    agent: ureq::Agent,
    config: SourceConfig,
}

impl SupabaseSource {
    pub fn new(config: SourceConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { agent, config }
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }
}

impl LineSource for SupabaseSource {
    #[instrument(skip(self), fields(table = %self.config.table))]
    fn fetch_lines(&self) -> Result<Vec<BusLine>, FetchError> {
        let url = self.config.lines_url();
        info!("Fetching lines from {}", url);
        let start_time = std::time::Instant::now();

        let bearer = format!("Bearer {}", self.config.api_key);
        let response = match self
            .agent
            .get(&url)
            .set("apikey", &self.config.api_key)
            .set("Authorization", &bearer)
            .set("Accept", "application/json")
            .call()
        {
            Ok(r) => r,
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                error!(elapsed_ms = start_time.elapsed().as_millis(), code, "HTTP status error");
                return Err(parse_error_body(&body).unwrap_or(FetchError::Status { code, body }));
            }
            Err(e) => {
                error!(elapsed_ms = start_time.elapsed().as_millis(), "HTTP error: {}", e);
                return Err(FetchError::Http(e.to_string()));
            }
        };

        let body = response.into_string().map_err(|e| {
            error!(elapsed_ms = start_time.elapsed().as_millis(), "HTTP read error: {}", e);
            FetchError::Read(e.to_string())
        })?;

        let lines = parse_lines(&body).inspect_err(|e| {
            error!(elapsed_ms = start_time.elapsed().as_millis(), "{}", e);
        })?;

        info!(
            elapsed_ms = start_time.elapsed().as_millis(),
            count = lines.len(),
            "Fetched {} lines",
            lines.len()
        );
        Ok(lines)
    }
}

/// Decode a response body: a JSON array of lines, or an error object.
pub fn parse_lines(body: &str) -> Result<Vec<BusLine>, FetchError> {
    // Decode arrays straight from the text so period order survives
    if body.trim_start().starts_with('[') {
        return serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()));
    }

    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;
    match value {
        serde_json::Value::Null => Ok(Vec::new()),
        other => Err(parse_error_value(other)
            .unwrap_or_else(|| FetchError::Parse("expected a JSON array of lines".to_string()))),
    }
}

fn parse_error_body(body: &str) -> Option<FetchError> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(parse_error_value)
}

fn parse_error_value(value: serde_json::Value) -> Option<FetchError> {
    let api_error: ApiError = serde_json::from_value(value).ok()?;
    Some(FetchError::Remote(match api_error.code {
        Some(code) => format!("{} ({})", api_error.message, code),
        None => api_error.message,
    }))
}
