use crate::components::{use_playback, Icon, IconName};
use crate::playback::{PlaylistId, PlaylistView, Track, TrackOrigin};
use crate::utils::{format_clock, slugify};
use dioxus::prelude::*;

/// Id under which a playlist registers with the controller. Unique per
/// route so the same title on two pages stays two playlists.
pub fn playlist_id_for(route: &str, title: &str) -> PlaylistId {
    PlaylistId::new(format!("{route}#{}", slugify(title)))
}

pub fn playlist_element_id(title: &str) -> String {
    format!("playlist-{}", slugify(title))
}

/// A titled track list wired to the global player.
#[component]
pub fn Playlist(title: String, tracks: Vec<Track>, route: String) -> Element {
    let controller = use_playback();
    let view = use_signal(PlaylistView::default);
    let id = use_hook({
        let route = route.clone();
        let title = title.clone();
        move || playlist_id_for(&route, &title)
    });
    let element_id = playlist_element_id(&title);

    // Registered after mount, so the first render callback never lands
    // inside this component's own render.
    use_effect({
        let controller = controller.clone();
        let id = id.clone();
        let tracks = tracks.clone();
        let element_id = element_id.clone();
        move || {
            controller.register_playlist(
                id.clone(),
                tracks.clone(),
                move |next: &PlaylistView| {
                    let mut view = view;
                    if *view.peek() != *next {
                        view.set(next.clone());
                    }
                },
                element_id.clone(),
            );
        }
    });

    use_drop({
        let controller = controller.clone();
        let id = id.clone();
        move || controller.unregister_playlist(&id)
    });

    let origin = TrackOrigin::new(id.clone(), route.clone());
    let current = view();

    let on_queue_all = {
        let controller = controller.clone();
        let tracks = tracks.clone();
        let origin = origin.clone();
        move |_| controller.add_playlist_to_queue(&tracks, 0, Some(origin.clone()))
    };

    rsx! {
        section { id: "{element_id}", class: "playlist",
            div { class: "playlist-header",
                h2 { class: "playlist-title", "{title}" }
                button {
                    r#type: "button",
                    class: "player-button",
                    aria_label: "Add playlist to queue",
                    disabled: tracks.is_empty(),
                    onclick: on_queue_all,
                    Icon { name: IconName::Plus, class: "icon-sm".to_string() }
                    span { "Queue all" }
                }
            }
            ol { class: "playlist-tracks",
                for (index , track) in tracks.iter().enumerate() {
                    PlaylistRow {
                        key: "{index}-{track.src}",
                        track: track.clone(),
                        index,
                        origin: origin.clone(),
                        active: current.active_index == Some(index),
                        is_playing: current.active_index == Some(index) && current.is_playing,
                        progress: row_progress(&current, index),
                    }
                }
            }
        }
    }
}

fn row_progress(view: &PlaylistView, index: usize) -> f64 {
    if view.active_index != Some(index) {
        return 0.0;
    }
    match view.duration {
        Some(duration) if duration > 0.0 => (view.current_time / duration).clamp(0.0, 1.0),
        _ => 0.0,
    }
}

#[component]
fn PlaylistRow(
    track: Track,
    index: usize,
    origin: TrackOrigin,
    active: bool,
    is_playing: bool,
    progress: f64,
) -> Element {
    let controller = use_playback();

    let on_play = {
        let controller = controller.clone();
        let track = track.clone();
        let origin = origin.clone();
        move |_| {
            if active {
                controller.toggle_play();
            } else {
                controller.play_track(&track, index, origin.clone());
            }
        }
    };

    let on_queue = {
        let controller = controller.clone();
        let track = track.clone();
        let origin = origin.clone();
        move |_| controller.add_to_queue(&track, index, Some(origin.clone()))
    };

    let length = track
        .duration
        .map(|d| format_clock(f64::from(d)))
        .unwrap_or_default();
    let progress_style = format!("width: {:.1}%", progress * 100.0);

    rsx! {
        li { class: if active { "playlist-row is-active" } else { "playlist-row" },
            button {
                r#type: "button",
                class: "playlist-row-play",
                aria_label: if is_playing { "Pause" } else { "Play" },
                onclick: on_play,
                if is_playing {
                    Icon { name: IconName::Pause, class: "icon-sm".to_string() }
                } else {
                    Icon { name: IconName::Play, class: "icon-sm".to_string() }
                }
            }
            div { class: "playlist-row-body",
                span { class: "playlist-row-title", "{track.title}" }
                if active {
                    div { class: "playlist-row-progress",
                        div { class: "playlist-row-progress-fill", style: progress_style }
                    }
                }
            }
            span { class: "playlist-row-length", "{length}" }
            button {
                r#type: "button",
                class: "player-button",
                aria_label: "Add to queue",
                onclick: on_queue,
                Icon { name: IconName::Plus, class: "icon-xs".to_string() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playlist_ids_are_scoped_to_their_route() {
        let a = playlist_id_for("/listen/music", "Piano Sketches");
        let b = playlist_id_for("/listen/game-audio", "Piano Sketches");
        assert_eq!(a.as_str(), "/listen/music#piano-sketches");
        assert_ne!(a, b);
        assert_eq!(playlist_element_id("Piano Sketches"), "playlist-piano-sketches");
    }

    #[test]
    fn only_the_active_row_shows_progress() {
        let view = PlaylistView {
            active_index: Some(1),
            is_playing: true,
            current_time: 30.0,
            duration: Some(120.0),
        };
        assert_eq!(row_progress(&view, 0), 0.0);
        assert_eq!(row_progress(&view, 1), 0.25);

        let unknown = PlaylistView {
            duration: None,
            ..view
        };
        assert_eq!(row_progress(&unknown, 1), 0.0);
    }
}
