//! Configuration types for the narration pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::synthesis::Voice;

/// Main pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrateConfig {
    /// Maximum characters per synthesis segment
    #[serde(default = "default_max_segment_length")]
    pub max_segment_length: usize,

    /// Synthesis calls allowed per minute
    #[serde(default = "default_rate_limit_per_minute")]
    pub rate_limit_per_minute: u32,

    /// Speech model requested from the synthesis service
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible speech API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Voice used when a request does not name one
    #[serde(default = "default_voice")]
    pub default_voice: String,

    /// USD charged per 1000 input characters
    #[serde(default = "default_price_per_thousand_chars")]
    pub price_per_thousand_chars: f64,
}

impl Default for NarrateConfig {
    fn default() -> Self {
        Self {
            max_segment_length: default_max_segment_length(),
            rate_limit_per_minute: default_rate_limit_per_minute(),
            model: default_model(),
            api_base_url: default_api_base_url(),
            default_voice: default_voice(),
            price_per_thousand_chars: default_price_per_thousand_chars(),
        }
    }
}

impl NarrateConfig {
    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_segment_length == 0 {
            return Err(Error::ConfigError(
                "max_segment_length must be greater than zero".to_string(),
            ));
        }
        if self.rate_limit_per_minute == 0 {
            return Err(Error::ConfigError(
                "rate_limit_per_minute must be greater than zero".to_string(),
            ));
        }
        self.fallback_voice()?;
        Ok(())
    }

    /// Voice for requests that do not name one.
    pub fn fallback_voice(&self) -> Result<Voice> {
        self.default_voice.parse().map_err(|_| {
            Error::ConfigError(format!(
                "default_voice: unknown voice {:?}",
                self.default_voice
            ))
        })
    }

    /// Pause enforced between consecutive synthesis calls.
    pub fn call_delay(&self) -> Duration {
        delay_for_rate(self.rate_limit_per_minute)
    }

    /// Linear cost estimate for narrating `characters` characters.
    pub fn estimate_cost(&self, characters: usize) -> f64 {
        characters as f64 / 1000.0 * self.price_per_thousand_chars
    }
}

/// `60000 / rate` milliseconds; a zero rate means no pacing.
pub fn delay_for_rate(rate_limit_per_minute: u32) -> Duration {
    if rate_limit_per_minute == 0 {
        return Duration::ZERO;
    }
    Duration::from_micros(60_000_000 / rate_limit_per_minute as u64)
}

fn default_max_segment_length() -> usize {
    4000
}

fn default_rate_limit_per_minute() -> u32 {
    50
}

fn default_model() -> String {
    "tts-1".to_string()
}

fn default_api_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_voice() -> String {
    "alloy".to_string()
}

fn default_price_per_thousand_chars() -> f64 {
    0.015
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_enabled")]
    pub cors_enabled: bool,

    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_cors_enabled(),
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_enabled() -> bool {
    true
}
