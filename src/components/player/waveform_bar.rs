use crate::components::use_playback;
use dioxus::prelude::*;

const SEEK_STEPS: f64 = 1000.0;

/// Peak bars with a transparent range input on top for seeking.
#[component]
pub(super) fn WaveformBar(peaks: Vec<f32>, progress: f64, seekable: bool) -> Element {
    let controller = use_playback();
    let bar_count = peaks.len().max(1) as f64;
    let played_bars = (progress * bar_count).floor() as usize;
    let seek_value = (progress * SEEK_STEPS).round();
    let bars: Vec<(&'static str, String)> = peaks
        .iter()
        .enumerate()
        .map(|(index, peak)| {
            let class = if index < played_bars {
                "waveform-bar is-played"
            } else {
                "waveform-bar"
            };
            (class, format!("height: {:.1}%", peak.clamp(0.02, 1.0) * 100.0))
        })
        .collect();

    let on_seek = move |e: Event<FormData>| {
        if let Ok(value) = e.value().parse::<f64>() {
            controller.seek(value / SEEK_STEPS);
        }
    };

    rsx! {
        div { class: "waveform",
            div { class: "waveform-bars", aria_hidden: "true",
                for (index , (class , style)) in bars.into_iter().enumerate() {
                    span { key: "{index}", class, style }
                }
            }
            input {
                r#type: "range",
                class: "waveform-seek",
                aria_label: "Seek",
                min: "0",
                max: "{SEEK_STEPS}",
                step: "1",
                value: "{seek_value}",
                disabled: !seekable,
                oninput: on_seek,
            }
        }
    }
}
