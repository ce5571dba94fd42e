use crate::playback::Track;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

const SITE_JSON: &str = include_str!("../assets/site.json");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid site configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Playback tuning knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Past this position, "previous" restarts the track instead of stepping back.
    pub restart_threshold_secs: f64,
    /// Minimum position change before progress is republished.
    pub progress_step_secs: f64,
    pub waveform_bars: usize,
    pub placeholder_amplitude: f32,
    pub audio_element_id: String,
    pub shortcuts_enabled: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            restart_threshold_secs: 3.0,
            progress_step_secs: 0.25,
            waveform_bars: 96,
            placeholder_amplitude: 0.15,
            audio_element_id: "folioplayer-audio".to_string(),
            shortcuts_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistConfig {
    pub title: String,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// A page of playlists, served under `/listen/:slug`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub blurb: Option<String>,
    #[serde(default)]
    pub playlists: Vec<PlaylistConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SiteConfig {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub collections: Vec<Collection>,
}

impl SiteConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// The configuration bundled with the site. Falls back to defaults when
    /// the bundled file does not parse.
    pub fn bundled() -> Self {
        Self::from_json(SITE_JSON).unwrap_or_else(|err| {
            error!(error = %err, "falling back to default site configuration");
            Self::default()
        })
    }

    pub fn collection(&self, slug: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.slug == slug)
    }
}
