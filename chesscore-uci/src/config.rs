//! Embedder-facing configuration: a purely additive surface describing
//! where the child engine binary lives and what to hand it on startup.
//! The wire-level UCI handling itself never consults this type.

#[cfg(feature = "config")]
use serde::Deserialize;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

#[cfg_attr(feature = "config", derive(Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub name: String,
    pub executable: PathBuf,
    pub working_directory: Option<PathBuf>,
    /// `UCI_Option` overrides applied once, at the `LOADED -> IDLE`
    /// transition, before any user-issued `set_option` ("Pending
    /// config").
    pub startup_options: BTreeMap<String, String>,
    #[cfg_attr(feature = "config", serde(with = "duration_ms"))]
    pub default_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            name: String::new(),
            executable: PathBuf::new(),
            working_directory: None,
            startup_options: BTreeMap::new(),
            default_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(feature = "config")]
impl EngineConfig {
    pub fn from_toml_str(text: &str) -> Result<EngineConfig, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(feature = "config")]
mod duration_ms {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}

#[cfg(all(test, feature = "config"))]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_toml() {
        let cfg: EngineConfig = EngineConfig::from_toml_str(
            r#"
            name = "stockfish"
            executable = "/usr/local/bin/stockfish"
            default_timeout = 2000

            [startup_options]
            Threads = "4"
            Hash = "128"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.name, "stockfish");
        assert_eq!(cfg.startup_options.get("Threads"), Some(&"4".to_string()));
        assert_eq!(cfg.default_timeout, std::time::Duration::from_millis(2000));
    }
}
