use crate::components::{use_playback, Icon, IconName};
use dioxus::prelude::*;

const BUTTON_CLASS: &str = "player-button";

fn toggle_class(active: bool) -> String {
    if active {
        format!("{BUTTON_CLASS} is-active")
    } else {
        BUTTON_CLASS.to_string()
    }
}

#[component]
pub(super) fn PrevButton() -> Element {
    let controller = use_playback();
    rsx! {
        button {
            r#type: "button",
            class: BUTTON_CLASS,
            aria_label: "Previous track",
            onclick: move |_| controller.play_prev(),
            Icon { name: IconName::Prev, class: "icon-md".to_string() }
        }
    }
}

#[component]
pub(super) fn PlayPauseButton(is_playing: bool) -> Element {
    let controller = use_playback();
    rsx! {
        button {
            r#type: "button",
            class: "{BUTTON_CLASS} player-button-primary",
            aria_label: if is_playing { "Pause" } else { "Play" },
            onclick: move |_| controller.toggle_play(),
            if is_playing {
                Icon { name: IconName::Pause, class: "icon-md".to_string() }
            } else {
                Icon { name: IconName::Play, class: "icon-md".to_string() }
            }
        }
    }
}

#[component]
pub(super) fn NextButton() -> Element {
    let controller = use_playback();
    rsx! {
        button {
            r#type: "button",
            class: BUTTON_CLASS,
            aria_label: "Next track",
            onclick: move |_| controller.play_next(),
            Icon { name: IconName::Next, class: "icon-md".to_string() }
        }
    }
}

#[component]
pub(super) fn ShuffleButton(active: bool) -> Element {
    let controller = use_playback();
    rsx! {
        button {
            r#type: "button",
            class: toggle_class(active),
            aria_label: "Shuffle",
            aria_pressed: active,
            onclick: move |_| controller.toggle_shuffle(),
            Icon { name: IconName::Shuffle, class: "icon-sm".to_string() }
        }
    }
}

#[component]
pub(super) fn LoopButton(active: bool) -> Element {
    let controller = use_playback();
    rsx! {
        button {
            r#type: "button",
            class: toggle_class(active),
            aria_label: "Loop queue",
            aria_pressed: active,
            onclick: move |_| controller.toggle_loop(),
            Icon { name: IconName::Repeat, class: "icon-sm".to_string() }
        }
    }
}

#[component]
pub(super) fn QueueToggleButton(expanded: bool, count: usize) -> Element {
    let controller = use_playback();
    rsx! {
        button {
            r#type: "button",
            class: toggle_class(expanded),
            aria_label: "Show queue",
            aria_expanded: expanded,
            onclick: move |_| controller.toggle_queue_expanded(),
            Icon { name: IconName::Queue, class: "icon-sm".to_string() }
            if count > 0 {
                span { class: "player-badge", "{count}" }
            }
        }
    }
}

#[component]
pub(super) fn StopButton() -> Element {
    let controller = use_playback();
    rsx! {
        button {
            r#type: "button",
            class: BUTTON_CLASS,
            aria_label: "Stop and close player",
            onclick: move |_| controller.stop(),
            Icon { name: IconName::Close, class: "icon-sm".to_string() }
        }
    }
}
