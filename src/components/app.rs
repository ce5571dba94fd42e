use crate::components::{create_controller, install_shortcuts, view_label, AppView, MiniPlayer};
use crate::config::SiteConfig;
use crate::playback::PlaybackController;
use dioxus::prelude::*;
use tracing::info;

/// Layout shared by every route. The controller lives here so playback
/// survives navigation between pages.
#[component]
pub fn AppShell() -> Element {
    let site = use_hook(SiteConfig::bundled);
    let controller = use_hook({
        let player = site.player.clone();
        move || {
            let controller = create_controller(player.clone());
            if controller.config().shortcuts_enabled {
                install_shortcuts(&controller);
            }
            info!("playback controller ready");
            controller
        }
    });

    use_context_provider(|| site.clone());
    use_context_provider(|| controller.clone());

    use_drop({
        let controller = controller.clone();
        move || controller.teardown()
    });

    let view = use_route::<AppView>();

    rsx! {
        div { class: "app-container",
            header { class: "site-header",
                div { class: "site-header-inner",
                    Link { class: "site-brand", to: AppView::Home {}, "Folio" }
                    nav { class: "site-nav",
                        for collection in site.collections.iter() {
                            Link {
                                key: "{collection.slug}",
                                class: "site-nav-link",
                                active_class: "is-active",
                                to: AppView::Listen {
                                    slug: collection.slug.clone(),
                                },
                                "{collection.title}"
                            }
                        }
                    }
                    span { class: "site-section", "{view_label(&view)}" }
                }
            }

            main { class: "page-shell",
                Outlet::<AppView> {}
            }

            MiniPlayer {}
        }
    }
}

/// The controller provided by [`AppShell`].
pub fn use_playback() -> PlaybackController {
    use_context::<PlaybackController>()
}
