//! Waveform summaries for the mini-player, decoded lazily and cached per
//! source for the lifetime of the controller.

use super::error::PlaybackError;
use crate::diagnostics::{log_perf, now_ms};
use futures_util::future::LocalBoxFuture;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct WaveformData {
    /// Normalized amplitudes in `[0, 1]`, one per bar.
    pub peaks: Vec<f32>,
    pub duration: f32,
}

/// Raw decoder output: one sample buffer per channel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedAudio {
    pub channels: Vec<Vec<f32>>,
    pub duration: f32,
}

/// Fetches a source and decodes it to PCM samples.
pub trait WaveformDecoder {
    fn decode(&self, src: String) -> LocalBoxFuture<'static, Result<DecodedAudio, PlaybackError>>;
}

/// Reduces sample buffers to `bars` peak amplitudes, normalized so the
/// loudest bar is 1.0.
pub fn extract_peaks(channels: &[Vec<f32>], bars: usize) -> Vec<f32> {
    let len = channels.iter().map(Vec::len).max().unwrap_or(0);
    if len == 0 || bars == 0 {
        return Vec::new();
    }

    let mut peaks: Vec<f32> = (0..bars)
        .map(|bar| {
            let start = bar * len / bars;
            let end = ((bar + 1) * len / bars).max(start + 1).min(len);
            channels
                .iter()
                .filter_map(|channel| channel.get(start..end.min(channel.len())))
                .flat_map(|window| window.iter())
                .fold(0.0f32, |peak, sample| peak.max(sample.abs()))
        })
        .collect();

    let loudest = peaks.iter().copied().fold(0.0f32, f32::max);
    if loudest > 0.0 {
        for peak in &mut peaks {
            *peak = (*peak / loudest).clamp(0.0, 1.0);
        }
    }
    peaks
}

pub struct WaveformCache {
    decoder: Box<dyn WaveformDecoder>,
    entries: RefCell<HashMap<String, Rc<WaveformData>>>,
    bars: usize,
    placeholder_amplitude: f32,
}

impl WaveformCache {
    pub fn new(decoder: Box<dyn WaveformDecoder>, bars: usize, placeholder_amplitude: f32) -> Self {
        Self {
            decoder,
            entries: RefCell::new(HashMap::new()),
            bars,
            placeholder_amplitude: placeholder_amplitude.clamp(0.0, 1.0),
        }
    }

    pub fn cached(&self, src: &str) -> Option<Rc<WaveformData>> {
        self.entries.borrow().get(src).cloned()
    }

    /// Flat data used when decoding fails, so views always have bars to draw.
    pub fn placeholder(&self, duration: f32) -> WaveformData {
        WaveformData {
            peaks: vec![self.placeholder_amplitude; self.bars],
            duration,
        }
    }

    /// Returns the cached summary for `src`, decoding it on first access.
    ///
    /// Concurrent first accesses are not merged: each one decodes and the
    /// last to finish replaces the entry. Failures yield a placeholder that
    /// is not cached.
    pub async fn get_or_load(&self, src: &str) -> Rc<WaveformData> {
        if let Some(hit) = self.cached(src) {
            return hit;
        }

        let started_at = now_ms();
        let decoded = self.decoder.decode(src.to_string()).await;
        match decoded.and_then(|audio| self.summarize(src, audio)) {
            Ok(data) => {
                let data = Rc::new(data);
                self.entries
                    .borrow_mut()
                    .insert(src.to_string(), Rc::clone(&data));
                log_perf(
                    "waveform.decode",
                    started_at,
                    &format!("src={src} bars={}", data.peaks.len()),
                );
                data
            }
            Err(err) => {
                warn!(%src, error = %err, "waveform unavailable, using placeholder");
                Rc::new(self.placeholder(0.0))
            }
        }
    }

    fn summarize(&self, src: &str, audio: DecodedAudio) -> Result<WaveformData, PlaybackError> {
        let peaks = extract_peaks(&audio.channels, self.bars);
        if peaks.is_empty() {
            return Err(PlaybackError::EmptyAudio(src.to_string()));
        }
        Ok(WaveformData {
            peaks,
            duration: audio.duration,
        })
    }
}
