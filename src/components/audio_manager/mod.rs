//! Audio Manager - builds the playback controller for the current platform
//! and connects it to the browser outside of the component render cycle.

#[cfg(target_arch = "wasm32")]
mod web_output;
#[cfg(target_arch = "wasm32")]
mod web_waveform;
mod shortcuts;

pub use shortcuts::install_shortcuts;

use crate::config::PlayerConfig;
use crate::playback::{
    DecodedAudio, OutputHandle, PlaybackController, PlaybackError, Spawner, WaveformDecoder,
};
use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use std::rc::Rc;
use tracing::warn;

/// Stand-in used where no media element exists (native builds, or a page
/// without a document). It tracks the source and position but never makes
/// sound, so no play/pause events ever reach the controller.
#[derive(Debug, Default)]
pub struct DetachedOutput {
    src: Option<String>,
    position: f64,
}

impl OutputHandle for DetachedOutput {
    fn load(&mut self, src: &str) {
        self.src = Some(src.to_string());
        self.position = 0.0;
    }

    fn unload(&mut self) {
        self.src = None;
        self.position = 0.0;
    }

    fn has_source(&self) -> bool {
        self.src.is_some()
    }

    fn play(&mut self) {}

    fn pause(&mut self) {}

    fn current_time(&self) -> f64 {
        self.position
    }

    fn set_current_time(&mut self, secs: f64) {
        self.position = secs.max(0.0);
    }

    fn duration(&self) -> Option<f64> {
        None
    }
}

pub struct UnavailableDecoder;

impl WaveformDecoder for UnavailableDecoder {
    fn decode(&self, _src: String) -> LocalBoxFuture<'static, Result<DecodedAudio, PlaybackError>> {
        futures_util::future::ready(Err(PlaybackError::Unavailable(
            "no audio decoder on this platform".to_string(),
        )))
        .boxed_local()
    }
}

#[cfg(target_arch = "wasm32")]
pub fn create_controller(config: PlayerConfig) -> PlaybackController {
    use dioxus::core::{Runtime, RuntimeGuard};
    use std::future::Future;

    // Waveform results write signals, so every poll runs inside the dioxus runtime.
    let runtime = Runtime::current();
    let spawner: Spawner = Rc::new(move |mut future: LocalBoxFuture<'static, ()>| {
        let runtime = runtime.clone();
        wasm_bindgen_futures::spawn_local(futures_util::future::poll_fn(move |cx| {
            let _guard = RuntimeGuard::new(runtime.clone());
            future.as_mut().poll(cx)
        }))
    });

    match web_output::get_or_create_audio_element(&config.audio_element_id) {
        Some(audio) => {
            let controller = PlaybackController::create(
                Box::new(web_output::WebAudioOutput::new(audio.clone())),
                Box::new(web_waveform::WebWaveformDecoder),
                spawner,
                config,
            );
            web_output::attach_media_events(&audio, &controller);
            controller
        }
        None => {
            warn!("no document to host the audio element; playback is disabled");
            PlaybackController::create(
                Box::new(DetachedOutput::default()),
                Box::new(UnavailableDecoder),
                spawner,
                config,
            )
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn create_controller(config: PlayerConfig) -> PlaybackController {
    let spawner: Spawner = Rc::new(|future: LocalBoxFuture<'static, ()>| {
        dioxus::prelude::spawn(future);
    });
    warn!("native build has no audio element; playback is silent");
    PlaybackController::create(
        Box::new(DetachedOutput::default()),
        Box::new(UnavailableDecoder),
        spawner,
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::block_on;

    #[test]
    fn detached_output_tracks_source_without_playing() {
        let mut output = DetachedOutput::default();
        assert!(!output.has_source());
        output.load("/audio/a.mp3");
        output.set_current_time(12.0);
        assert!(output.has_source());
        assert_eq!(output.current_time(), 12.0);
        assert_eq!(output.duration(), None);
        output.unload();
        assert!(!output.has_source());
    }

    #[test]
    fn unavailable_decoder_reports_unavailable() {
        let result = block_on(UnavailableDecoder.decode("/audio/a.mp3".to_string()));
        assert!(matches!(result, Err(PlaybackError::Unavailable(_))));
    }
}
