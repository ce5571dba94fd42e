// Waveform decoding through fetch + the Web Audio API.
use crate::playback::{DecodedAudio, PlaybackError, WaveformDecoder};
use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;
use gloo_net::http::Request;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioBuffer, AudioContext};

pub struct WebWaveformDecoder;

impl WaveformDecoder for WebWaveformDecoder {
    fn decode(&self, src: String) -> LocalBoxFuture<'static, Result<DecodedAudio, PlaybackError>> {
        async move { fetch_and_decode(&src).await }.boxed_local()
    }
}

async fn fetch_and_decode(src: &str) -> Result<DecodedAudio, PlaybackError> {
    let response = Request::get(src)
        .send()
        .await
        .map_err(|err| PlaybackError::fetch(src, err))?;
    if !response.ok() {
        return Err(PlaybackError::fetch(
            src,
            format!("HTTP status {}", response.status()),
        ));
    }
    let bytes = response
        .binary()
        .await
        .map_err(|err| PlaybackError::fetch(src, err))?;

    let context =
        AudioContext::new().map_err(|err| PlaybackError::Unavailable(format!("{err:?}")))?;
    let buffer = js_sys::Uint8Array::from(bytes.as_slice()).buffer();
    let decoded = match context.decode_audio_data(&buffer) {
        Ok(promise) => JsFuture::from(promise).await,
        Err(err) => Err(err),
    };
    // The context only exists for decoding; release it either way.
    let _ = context.close();

    let audio: AudioBuffer = decoded
        .map_err(|err| PlaybackError::decode(src, format!("{err:?}")))?
        .dyn_into()
        .map_err(|_| PlaybackError::decode(src, "decoder did not return an AudioBuffer"))?;

    let channels = (0..audio.number_of_channels())
        .filter_map(|channel| audio.get_channel_data(channel).ok())
        .collect();

    Ok(DecodedAudio {
        channels,
        duration: audio.duration() as f32,
    })
}
