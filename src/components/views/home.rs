use crate::components::{AppView, Icon, IconName};
use crate::config::SiteConfig;
use dioxus::prelude::*;

#[component]
pub fn Home() -> Element {
    let site = use_context::<SiteConfig>();

    rsx! {
        div { class: "page home",
            section { class: "page-intro",
                h1 { "Listening room" }
                p {
                    "Pick a collection. Playback keeps going while you browse the rest of the site."
                }
            }

            div { class: "collection-grid",
                for collection in site.collections.iter() {
                    Link {
                        key: "{collection.slug}",
                        class: "collection-card",
                        to: AppView::Listen {
                            slug: collection.slug.clone(),
                        },
                        div { class: "collection-card-icon",
                            Icon { name: IconName::Music, class: "icon-lg".to_string() }
                        }
                        h2 { "{collection.title}" }
                        if let Some(blurb) = collection.blurb.as_ref() {
                            p { "{blurb}" }
                        }
                        span { class: "collection-card-meta",
                            "{collection.playlists.len()} playlists"
                        }
                    }
                }
            }
        }
    }
}
