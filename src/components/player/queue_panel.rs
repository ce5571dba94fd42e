use crate::components::{use_playback, Icon, IconName};
use crate::playback::QueueItem;
use dioxus::prelude::*;

#[component]
pub(super) fn QueuePanel(items: Vec<QueueItem>, current: usize) -> Element {
    let controller = use_playback();
    let last = items.len().saturating_sub(1);

    rsx! {
        div { class: "queue-panel",
            div { class: "queue-panel-header",
                h3 { "Up next" }
                span { class: "queue-panel-count", "{items.len()} tracks" }
            }
            if items.is_empty() {
                p { class: "queue-panel-empty", "The queue is empty." }
            }
            ol { class: "queue-panel-list",
                for (index , item) in items.iter().enumerate() {
                    li {
                        key: "{item.id().get()}",
                        class: if index == current { "queue-row is-current" } else { "queue-row" },
                        button {
                            r#type: "button",
                            class: "queue-row-title",
                            onclick: {
                                let controller = controller.clone();
                                move |_| controller.play_queue_item(index)
                            },
                            span { class: "queue-row-index", "{index + 1}" }
                            span { "{item.title}" }
                        }
                        div { class: "queue-row-actions",
                            button {
                                r#type: "button",
                                class: "player-button",
                                aria_label: "Move up",
                                disabled: index == 0,
                                onclick: {
                                    let controller = controller.clone();
                                    move |_| controller.reorder_queue(index, index.saturating_sub(1))
                                },
                                Icon { name: IconName::ArrowUp, class: "icon-xs".to_string() }
                            }
                            button {
                                r#type: "button",
                                class: "player-button",
                                aria_label: "Move down",
                                disabled: index == last,
                                onclick: {
                                    let controller = controller.clone();
                                    move |_| controller.reorder_queue(index, index + 1)
                                },
                                Icon { name: IconName::ArrowDown, class: "icon-xs".to_string() }
                            }
                            button {
                                r#type: "button",
                                class: "player-button",
                                aria_label: "Remove from queue",
                                onclick: {
                                    let controller = controller.clone();
                                    move |_| controller.remove_from_queue(index)
                                },
                                Icon { name: IconName::Trash, class: "icon-xs".to_string() }
                            }
                        }
                    }
                }
            }
        }
    }
}
