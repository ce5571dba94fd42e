//! Playback core: queue, observers, waveform cache and the controller that
//! ties them to one output handle. Nothing here touches the DOM.

mod controller;
mod error;
mod model;
mod observers;
mod output;
mod queue;
mod waveform;

pub use controller::{PlaybackController, PlaybackSnapshot, Spawner};
pub use error::PlaybackError;
pub use model::{PlaylistId, PlaylistView, Track, TrackOrigin};
pub use observers::Subscription;
pub use output::{usable_duration, MediaEvent, OutputHandle};
pub use queue::QueueItem;
pub use waveform::{DecodedAudio, WaveformDecoder};
