use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a mounted playlist view. Stable per page, usually derived
/// from the playlist title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaylistId(String);

impl PlaylistId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlaylistId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PlaylistId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for PlaylistId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A track as authored in a playlist. Peaks and duration are optional
/// precomputed hints; when missing they are resolved lazily.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Track {
    pub src: String,
    pub title: String,
    #[serde(default)]
    pub peaks: Option<Vec<f32>>,
    #[serde(default)]
    pub duration: Option<f32>,
}

impl Track {
    pub fn new(src: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            title: title.into(),
            peaks: None,
            duration: None,
        }
    }
}

/// Where a track was picked from: the playlist view and the route it lives on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackOrigin {
    pub playlist_id: PlaylistId,
    pub source_route: String,
}

impl TrackOrigin {
    pub fn new(playlist_id: impl Into<PlaylistId>, source_route: impl Into<String>) -> Self {
        Self {
            playlist_id: playlist_id.into(),
            source_route: source_route.into(),
        }
    }
}

/// The track currently loaded into the output handle.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRef {
    pub src: String,
    pub title: String,
    /// Position of the track inside its playlist.
    pub index: usize,
    pub playlist_id: Option<PlaylistId>,
    pub source_route: Option<String>,
    pub peaks: Option<Vec<f32>>,
    pub duration: Option<f32>,
}

impl TrackRef {
    pub fn from_track(track: &Track, index: usize, origin: Option<&TrackOrigin>) -> Self {
        Self {
            src: track.src.clone(),
            title: track.title.clone(),
            index,
            playlist_id: origin.map(|o| o.playlist_id.clone()),
            source_route: origin.map(|o| o.source_route.clone()),
            peaks: track.peaks.clone(),
            duration: track.duration,
        }
    }

    pub fn belongs_to(&self, playlist_id: &PlaylistId) -> bool {
        self.playlist_id.as_ref() == Some(playlist_id)
    }
}

/// What a playlist view needs to draw its highlighting and progress.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaylistView {
    pub active_index: Option<usize>,
    pub is_playing: bool,
    pub current_time: f64,
    pub duration: Option<f64>,
}
