//! Store configuration.
//!
//! [`StoreConfig`] configures the in-memory store a provider builds when it
//! is not handed one. It deserializes from camelCase JSON with every field
//! optional:
//!
//! ```json
//! {
//!   "initialState": { "mediaPaused": true, "mediaVolume": 1 },
//!   "unmuteVolume": 0.25,
//!   "clampSeekToDuration": true
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::MediaState;

const DEFAULT_UNMUTE_VOLUME: f64 = 0.25;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// State the store starts from.
    pub initial_state: MediaState,

    /// Volume restored when unmuting while the volume is zero.
    pub unmute_volume: f64,

    /// Keep seek targets within `0..=duration` when the duration is known.
    pub clamp_seek_to_duration: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            initial_state: MediaState::default(),
            unmute_volume: DEFAULT_UNMUTE_VOLUME,
            clamp_seek_to_duration: true,
        }
    }
}

impl StoreConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_initial_state(mut self, state: MediaState) -> Self {
        self.initial_state = state;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = StoreConfig::from_json("{}").unwrap();

        assert!(config.initial_state.is_empty());
        assert_eq!(config.unmute_volume, DEFAULT_UNMUTE_VOLUME);
        assert!(config.clamp_seek_to_duration);
    }

    #[test]
    fn fields_are_camel_case() {
        let config = StoreConfig::from_json(
            r#"{
                "initialState": { "mediaPaused": true },
                "unmuteVolume": 0.5,
                "clampSeekToDuration": false
            }"#,
        )
        .unwrap();

        assert_eq!(config.initial_state.paused(), Some(true));
        assert_eq!(config.unmute_volume, 0.5);
        assert!(!config.clamp_seek_to_duration);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(StoreConfig::from_json(r#"{ "unmuteVolume": "loud" }"#).is_err());
    }
}
