//! Construction-time tunables, loadable from TOML.
//!
//! The engine itself never reads files on its own; the host loads a config,
//! adjusts it, and passes the pieces to the constructors that want them.

use serde::{Deserialize, Serialize};

use crate::decoder::{BEAM_SIZE_DEFAULT, FRAME_SIZE_DEFAULT};
use crate::error::{Error, Result};
use crate::history_bigram::HistoryConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// How many ranked sentences a decode produces.
    pub nbest: usize,
    /// Reject sentences scoring further than this below the best one.
    pub max_distance: f32,
    pub min_score: f32,
    pub beam_size: usize,
    pub frame_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            nbest: 1,
            max_distance: f32::MAX,
            min_score: f32::MIN,
            beam_size: BEAM_SIZE_DEFAULT,
            frame_size: FRAME_SIZE_DEFAULT,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fuzzy-rule names understood by the front-end, e.g. "an_ang" or
    /// "inner"; unknown names are ignored by the consumer.
    #[serde(default)]
    pub fuzzy: Vec<String>,
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::invalid_format(format!("config: {e}")))
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::invalid_format(format!("config: {e}")))
    }

    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let mut config = EngineConfig::default();
        config.fuzzy = vec!["an_ang".to_string(), "inner".to_string()];
        config.decoder.nbest = 5;
        config.history.recent.size = 64;

        let text = config.to_toml_string().unwrap();
        let parsed = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.fuzzy, config.fuzzy);
        assert_eq!(parsed.decoder.nbest, 5);
        assert_eq!(parsed.history.recent.size, 64);
    }

    #[test]
    fn test_defaults_from_empty_input() {
        let parsed = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(parsed.decoder.nbest, 1);
        assert!(parsed.fuzzy.is_empty());
    }

    #[test]
    fn test_bad_toml_is_invalid_format() {
        match EngineConfig::from_toml_str("decoder = nonsense[") {
            Err(Error::InvalidFormat(_)) => {}
            other => panic!("expected InvalidFormat, got {other:?}"),
        }
    }
}
