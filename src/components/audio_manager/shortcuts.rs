// Keyboard and media-key shortcuts for the global player.
use crate::playback::PlaybackController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Next,
    Previous,
    TogglePlay,
}

impl ShortcutAction {
    pub fn apply(self, controller: &PlaybackController) {
        match self {
            ShortcutAction::Next => controller.play_next(),
            ShortcutAction::Previous => controller.play_prev(),
            ShortcutAction::TogglePlay => controller.toggle_play(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct KeyModifiers {
    pub meta: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

pub fn shortcut_action(
    key: &str,
    code: &str,
    key_code: u32,
    modifiers: KeyModifiers,
) -> Option<ShortcutAction> {
    if matches!(
        key,
        "MediaTrackNext" | "MediaNextTrack" | "AudioTrackNext" | "AudioNext" | "NextTrack"
    ) || code == "MediaTrackNext"
        || key_code == 176
    {
        return Some(ShortcutAction::Next);
    }
    if matches!(
        key,
        "MediaTrackPrevious" | "MediaPreviousTrack" | "AudioTrackPrevious" | "AudioPrev" | "PreviousTrack"
    ) || code == "MediaTrackPrevious"
        || key_code == 177
    {
        return Some(ShortcutAction::Previous);
    }
    if matches!(key, "MediaPlayPause" | "AudioPlay" | "AudioPause")
        || code == "MediaPlayPause"
        || key_code == 179
    {
        return Some(ShortcutAction::TogglePlay);
    }

    let meta_or_ctrl = modifiers.meta || modifiers.ctrl;
    if meta_or_ctrl && !modifiers.alt && !modifiers.shift {
        if key == "ArrowRight" {
            return Some(ShortcutAction::Next);
        }
        if key == "ArrowLeft" {
            return Some(ShortcutAction::Previous);
        }
    }

    if !modifiers.meta
        && !modifiers.ctrl
        && !modifiers.alt
        && is_space(key, code)
    {
        return Some(ShortcutAction::TogglePlay);
    }

    None
}

fn is_space(key: &str, code: &str) -> bool {
    key == " " || key == "Spacebar" || code == "Space"
}

/// Elements that act on Space themselves (buttons, links and their ARIA
/// equivalents). A bare Space must reach them instead of the player.
pub(crate) fn activates_on_space(tag: &str, role: Option<&str>) -> bool {
    let tag = tag.to_ascii_lowercase();
    if matches!(tag.as_str(), "button" | "a" | "summary") {
        return true;
    }
    role.is_some_and(|role| {
        matches!(
            role.to_ascii_lowercase().as_str(),
            "button" | "link" | "checkbox" | "switch" | "menuitem" | "tab"
        )
    })
}

#[cfg(target_arch = "wasm32")]
mod web {
    use super::*;
    use dioxus::core::{Runtime, RuntimeGuard};
    use wasm_bindgen::{closure::Closure, JsCast};
    use web_sys::{window, KeyboardEvent};

    fn is_editable_shortcut_target(event: &KeyboardEvent) -> bool {
        let Some(target) = event.target() else {
            return false;
        };

        let mut current = target.dyn_into::<web_sys::Element>().ok();
        while let Some(element) = current {
            let tag = element.tag_name().to_ascii_lowercase();
            if tag == "input" || tag == "textarea" || tag == "select" {
                return true;
            }
            if element.has_attribute("contenteditable")
                && element
                    .get_attribute("contenteditable")
                    .map(|v| v.to_ascii_lowercase() != "false")
                    .unwrap_or(true)
            {
                return true;
            }
            current = element.parent_element();
        }

        false
    }

    fn focus_takes_space(event: &KeyboardEvent) -> bool {
        let mut current = event
            .target()
            .and_then(|target| target.dyn_into::<web_sys::Element>().ok());
        while let Some(element) = current {
            if activates_on_space(&element.tag_name(), element.get_attribute("role").as_deref()) {
                return true;
            }
            current = element.parent_element();
        }
        false
    }

    fn action_for_event(event: &KeyboardEvent) -> Option<ShortcutAction> {
        if event.default_prevented() || event.is_composing() || is_editable_shortcut_target(event) {
            return None;
        }
        if is_space(&event.key(), &event.code()) && focus_takes_space(event) {
            return None;
        }
        shortcut_action(
            &event.key(),
            &event.code(),
            event.key_code(),
            KeyModifiers {
                meta: event.meta_key(),
                ctrl: event.ctrl_key(),
                alt: event.alt_key(),
                shift: event.shift_key(),
            },
        )
    }

    pub fn install_shortcuts(controller: &PlaybackController) {
        let Some(doc) = window().and_then(|w| w.document()) else {
            return;
        };
        let runtime = Runtime::current();
        let controller = controller.clone();
        let key_cb = Closure::wrap(Box::new(move |event: KeyboardEvent| {
            let Some(action) = action_for_event(&event) else {
                return;
            };
            event.prevent_default();
            let _guard = RuntimeGuard::new(runtime.clone());
            action.apply(&controller);
        }) as Box<dyn FnMut(KeyboardEvent)>);
        let _ = doc.add_event_listener_with_callback("keydown", key_cb.as_ref().unchecked_ref());
        key_cb.forget();
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::install_shortcuts;

#[cfg(not(target_arch = "wasm32"))]
pub fn install_shortcuts(_controller: &PlaybackController) {}
