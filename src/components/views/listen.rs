use crate::components::{AppView, Playlist};
use crate::config::SiteConfig;
use dioxus::prelude::*;
use tracing::debug;

#[component]
pub fn Listen(slug: String) -> Element {
    let site = use_context::<SiteConfig>();
    let route = AppView::Listen { slug: slug.clone() }.path();

    let Some(collection) = site.collection(&slug).cloned() else {
        debug!(%slug, "unknown collection");
        return rsx! {
            div { class: "page",
                h1 { "Nothing here" }
                p { "There is no collection called \"{slug}\"." }
                Link { class: "page-back", to: AppView::Home {}, "Back to the listening room" }
            }
        };
    };

    rsx! {
        div { class: "page listen",
            section { class: "page-intro",
                h1 { "{collection.title}" }
                if let Some(blurb) = collection.blurb.as_ref() {
                    p { "{blurb}" }
                }
            }
            for playlist in collection.playlists.iter() {
                Playlist {
                    key: "{route}-{playlist.title}",
                    title: playlist.title.clone(),
                    tracks: playlist.tracks.clone(),
                    route: route.clone(),
                }
            }
        }
    }
}
