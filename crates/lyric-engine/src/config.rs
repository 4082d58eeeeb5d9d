use std::env;
use std::time::Duration;

use anyhow::{bail, Result};
use lyric_contracts::models::{DEFAULT_ANALYSIS_MODEL, DEFAULT_IMAGE_MODEL, DEFAULT_PROMPT_MODEL};

const DEFAULT_TIMEOUT_S: f64 = 90.0;
const DEFAULT_IMAGE_MAX_RETRIES: usize = 3;
const DEFAULT_IMAGE_DOWNLOAD_TIMEOUT_S: f64 = 30.0;
const DEFAULT_IMAGE_RETRY_BACKOFF_S: f64 = 2.0;

/// Model ids used for each pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageModels {
    pub analysis: String,
    pub prompt: String,
    pub image: String,
}

impl Default for StageModels {
    fn default() -> Self {
        Self {
            analysis: DEFAULT_ANALYSIS_MODEL.to_string(),
            prompt: DEFAULT_PROMPT_MODEL.to_string(),
            image: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub models: StageModels,
    pub request_timeout: Duration,
    pub image_download_timeout: Duration,
    /// Total image attempts; zero still makes one.
    pub image_max_retries: usize,
    pub image_retry_backoff_s: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            models: StageModels::default(),
            request_timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_S),
            image_download_timeout: Duration::from_secs_f64(DEFAULT_IMAGE_DOWNLOAD_TIMEOUT_S),
            image_max_retries: DEFAULT_IMAGE_MAX_RETRIES,
            image_retry_backoff_s: DEFAULT_IMAGE_RETRY_BACKOFF_S,
        }
    }
}

impl AgentConfig {
    /// Loads `.env` (if present) into the process environment, then reads it.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = StageModels::default();

        Self {
            api_key: get("API_KEY"),
            base_url: get("BASE_URL").map(|value| value.trim_end_matches('/').to_string()),
            models: StageModels {
                analysis: get("ANALYSIS_MODEL").unwrap_or(defaults.analysis),
                prompt: get("PROMPT_MODEL").unwrap_or(defaults.prompt),
                image: get("IMAGE_MODEL").unwrap_or(defaults.image),
            },
            request_timeout: seconds(get("OPENAI_TIMEOUT"), DEFAULT_TIMEOUT_S),
            image_download_timeout: seconds(
                get("IMAGE_DOWNLOAD_TIMEOUT"),
                DEFAULT_IMAGE_DOWNLOAD_TIMEOUT_S,
            ),
            image_max_retries: get("IMAGE_MAX_RETRIES")
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(DEFAULT_IMAGE_MAX_RETRIES),
            image_retry_backoff_s: get("IMAGE_RETRY_BACKOFF")
                .and_then(|value| value.parse::<f64>().ok())
                .filter(|value| {
                    *value >= 0.0 && Duration::try_from_secs_f64(*value).is_ok()
                })
                .unwrap_or(DEFAULT_IMAGE_RETRY_BACKOFF_S),
        }
    }

    pub fn credentials(&self) -> Result<(&str, &str)> {
        match (self.api_key.as_deref(), self.base_url.as_deref()) {
            (Some(key), Some(base)) => Ok((key, base)),
            _ => bail!("API_KEY or BASE_URL not found in environment or .env file."),
        }
    }
}

fn seconds(raw: Option<String>, default: f64) -> Duration {
    raw.and_then(|value| value.parse::<f64>().ok())
        .filter(|value| *value > 0.0)
        .and_then(|value| Duration::try_from_secs_f64(value).ok())
        .unwrap_or_else(|| Duration::from_secs_f64(default))
}
