use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Mock transport error: {0}")]
    Mock(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid base URI for {gateway}: {value:?}")]
    InvalidBaseUri { gateway: &'static str, value: String },

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
