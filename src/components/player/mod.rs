use crate::components::{use_playback, Icon, IconName};
use crate::playback::{PlaybackSnapshot, Subscription};
use crate::utils::format_clock;
use dioxus::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

mod controls;
mod queue_panel;
mod waveform_bar;

use controls::{
    LoopButton, NextButton, PlayPauseButton, PrevButton, QueueToggleButton, ShuffleButton,
    StopButton,
};
use queue_panel::QueuePanel;
use waveform_bar::WaveformBar;

/// Mirrors the controller state into a signal for as long as the calling
/// component is mounted.
pub fn use_playback_snapshot() -> Signal<PlaybackSnapshot> {
    let controller = use_playback();
    let snapshot = use_signal({
        let controller = controller.clone();
        move || controller.snapshot()
    });

    let subscription = use_hook(move || {
        let subscription = controller.subscribe(move |next: &PlaybackSnapshot| {
            let mut snapshot = snapshot;
            if *snapshot.peek() != *next {
                snapshot.set(next.clone());
            }
        });
        Rc::new(RefCell::new(Some(subscription)))
    });

    use_drop(move || {
        let taken: Option<Subscription> = subscription.borrow_mut().take();
        if let Some(subscription) = taken {
            subscription.unsubscribe();
        }
    });

    snapshot
}

/// Scrolls the playlist a track came from into view once its page has
/// rendered.
#[cfg(target_arch = "wasm32")]
fn reveal_playlist(element_id: String) {
    use web_sys::{window, ScrollBehavior, ScrollIntoViewOptions};

    wasm_bindgen_futures::spawn_local(async move {
        // Give the router a frame to mount the target page.
        gloo_timers::future::TimeoutFuture::new(50).await;
        let Some(element) = window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(&element_id))
        else {
            tracing::debug!(%element_id, "playlist element not found");
            return;
        };
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        element.scroll_into_view_with_scroll_into_view_options(&options);
    });
}

#[cfg(not(target_arch = "wasm32"))]
fn reveal_playlist(_element_id: String) {}

#[component]
pub fn MiniPlayer() -> Element {
    let controller = use_playback();
    let snapshot = use_playback_snapshot();
    let state = snapshot();

    if !state.mini_player_visible {
        return rsx! {};
    }
    let Some(track) = state.current_track.clone() else {
        return rsx! {};
    };

    let duration = state
        .duration
        .or(track.duration.map(f64::from))
        .filter(|d| *d > 0.0);
    let progress = duration
        .map(|d| (state.current_time / d).clamp(0.0, 1.0))
        .unwrap_or(0.0);
    let elapsed = format_clock(state.current_time);
    let total = duration.map(format_clock).unwrap_or_else(|| "--:--".to_string());

    let on_reveal = {
        let controller = controller.clone();
        let playlist_id = track.playlist_id.clone();
        move |_| {
            if let Some(element_id) = playlist_id
                .as_ref()
                .and_then(|id| controller.playlist_element_id(id))
            {
                reveal_playlist(element_id);
            }
        }
    };

    rsx! {
        div { class: "mini-player",
            div { class: "mini-player-main",
                div { class: "mini-player-title",
                    Icon { name: IconName::Music, class: "icon-sm".to_string() }
                    if let Some(route) = track.source_route.clone() {
                        Link {
                            class: "mini-player-link",
                            to: route,
                            onclick: on_reveal,
                            "{track.title}"
                        }
                    } else {
                        span { "{track.title}" }
                    }
                }

                div { class: "mini-player-controls",
                    ShuffleButton { active: state.shuffle }
                    PrevButton {}
                    PlayPauseButton { is_playing: state.is_playing }
                    NextButton {}
                    LoopButton { active: state.looping }
                }

                div { class: "mini-player-seek",
                    span { class: "mini-player-time", "{elapsed}" }
                    WaveformBar {
                        peaks: track.peaks.clone().unwrap_or_default(),
                        progress,
                        seekable: duration.is_some(),
                    }
                    span { class: "mini-player-time", "{total}" }
                }

                div { class: "mini-player-actions",
                    QueueToggleButton {
                        expanded: state.queue_expanded,
                        count: state.queue.len(),
                    }
                    StopButton {}
                }
            }

            if state.queue_expanded {
                QueuePanel { items: state.queue.clone(), current: state.queue_index }
            }
        }
    }
}
