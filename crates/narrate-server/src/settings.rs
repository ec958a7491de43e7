//! Layered server settings: defaults, optional TOML files, then environment

use config::{Config, ConfigError, Environment, File};
use narrate_core::{NarrateConfig, ServerConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const ENV_PREFIX: &str = "NARRATE";
const FILE_NAME: &str = "narrate.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub narrate: NarrateConfig,
}

impl Settings {
    /// Load settings. Later sources override earlier ones:
    /// built-in defaults, `~/.config/narrate/narrate.toml`, `./narrate.toml`,
    /// then `NARRATE__SECTION__KEY` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Environment::with_prefix(ENV_PREFIX).separator("__"))
    }

    fn load_from(env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);

        if let Some(path) = user_config_path() {
            builder = builder.add_source(File::from(path).required(false));
        }

        builder
            .add_source(File::with_name(FILE_NAME).required(false))
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("narrate").join(FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::load_from(env(&[])).unwrap();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.narrate.rate_limit_per_minute, 50);
        assert_eq!(settings.narrate.max_segment_length, 4000);
    }

    #[test]
    fn test_environment_overrides() {
        let settings = Settings::load_from(env(&[
            ("NARRATE__SERVER__PORT", "9090"),
            ("NARRATE__NARRATE__RATE_LIMIT_PER_MINUTE", "20"),
            ("NARRATE__NARRATE__MODEL", "tts-1-hd"),
        ]))
        .unwrap();
        assert_eq!(settings.server.port, 9090);
        assert_eq!(settings.narrate.rate_limit_per_minute, 20);
        assert_eq!(settings.narrate.model, "tts-1-hd");
    }
}
