use thiserror::Error;

pub type Result<T> = std::result::Result<T, QuerycraftError>;

#[derive(Debug, Error)]
pub enum QuerycraftError {
    #[error("unsupported database vendor: {0}")]
    UnsupportedVendor(String),
    #[error("malformed select fragment: {0}")]
    MalformedFragment(String),
    #[error("malformed rollup chain: {0}")]
    MalformedRollupChain(String),
    #[error("empty query: {0}")]
    EmptyQuery(String),
    #[error("relationship error: {0}")]
    Relationship(String),
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl QuerycraftError {
    /// True when the error traces back to the shape of the request rather than
    /// the environment. Callers map these to a "bad request" response.
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            QuerycraftError::UnsupportedVendor(_)
                | QuerycraftError::MalformedFragment(_)
                | QuerycraftError::MalformedRollupChain(_)
                | QuerycraftError::EmptyQuery(_)
                | QuerycraftError::Relationship(_)
                | QuerycraftError::InvalidFilter(_)
        )
    }
}
