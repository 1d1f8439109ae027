use thiserror::Error;

/// Failure reading the line table from the remote store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("HTTP status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("HTTP read error: {0}")]
    Read(String),

    #[error("JSON parse error: {0}")]
    Parse(String),

    #[error("remote store returned an error: {0}")]
    Remote(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing data source URL (set SUPABASE_URL)")]
    MissingUrl,

    #[error("missing data source key (set SUPABASE_KEY)")]
    MissingKey,

    #[error("invalid data source URL {0:?}: must start with http:// or https://")]
    InvalidUrl(String),
}

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("could not write theme preference to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("no line available")]
    NoLineAvailable,

    #[error("line {0} is suspended")]
    LineSuspended(String),

    #[error("unknown line {0}")]
    UnknownLine(String),

    #[error("unknown period {0}")]
    UnknownPeriod(String),

    #[error("lines are not loaded yet")]
    NotLoaded,
}
