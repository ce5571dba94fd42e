use dioxus::prelude::*;

mod components;
mod config;
mod diagnostics;
mod playback;
mod utils;

use components::AppView;

const APP_CSS: Asset = asset!("/assets/styling/app.css");

fn main() {
    dioxus::logger::initialize_default();
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Meta { name: "theme-color", content: "#14161a" }
        document::Title { "Folio" }
        document::Stylesheet { href: APP_CSS }

        Router::<AppView> {}
    }
}
