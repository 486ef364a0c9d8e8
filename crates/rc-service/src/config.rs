use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Default media server URL for local development.
const DEFAULT_LIVEKIT_URL: &str = "ws://localhost:7880";

/// Default directory recordings are written to and served from.
const DEFAULT_RECORDINGS_PATH: &str = "./recordings";

/// Default byte window served for an open-ended range request (1 MiB).
const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_secret: SecretString,
    pub livekit_url: String,
    pub recordings_path: PathBuf,
    pub chunk_size: u64,
    pub bind_address: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid chunk size: {0}")]
    InvalidChunkSize(String),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_key = vars
            .get("LIVEKIT_API_KEY")
            .ok_or_else(|| ConfigError::MissingEnvVar("LIVEKIT_API_KEY".to_string()))?
            .clone();

        let api_secret = vars
            .get("LIVEKIT_API_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("LIVEKIT_API_SECRET".to_string()))?
            .clone();

        let livekit_url = vars
            .get("LIVEKIT_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_LIVEKIT_URL.to_string());

        let recordings_path = vars
            .get("RECORDINGS_PATH")
            .cloned()
            .unwrap_or_else(|| DEFAULT_RECORDINGS_PATH.to_string());

        let chunk_size = match vars.get("RECORDING_CHUNK_SIZE") {
            Some(raw) => {
                let parsed: u64 = raw
                    .parse()
                    .map_err(|_| ConfigError::InvalidChunkSize(raw.clone()))?;
                if parsed == 0 {
                    return Err(ConfigError::InvalidChunkSize(raw.clone()));
                }
                parsed
            }
            None => DEFAULT_CHUNK_SIZE,
        };

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:6080".to_string());

        Ok(Config {
            api_key,
            api_secret: SecretString::from(api_secret),
            livekit_url,
            recordings_path: PathBuf::from(recordings_path),
            chunk_size,
            bind_address,
        })
    }

    /// The media server URL with the websocket scheme swapped for HTTP,
    /// suitable for the Twirp egress endpoints.
    pub fn http_url(&self) -> String {
        if let Some(rest) = self.livekit_url.strip_prefix("wss://") {
            format!("https://{rest}")
        } else if let Some(rest) = self.livekit_url.strip_prefix("ws://") {
            format!("http://{rest}")
        } else {
            self.livekit_url.clone()
        }
    }
}
