//! Routes of the portfolio site.

use crate::components::views::{Home, Listen};
use crate::components::AppShell;
use dioxus::prelude::*;

#[derive(Routable, Clone, PartialEq, Debug)]
#[rustfmt::skip]
pub enum AppView {
    #[layout(AppShell)]
        #[route("/")]
        Home {},
        #[route("/listen/:slug")]
        Listen { slug: String },
}

impl AppView {
    /// Path of the current route, used as the `source_route` of tracks
    /// started from it.
    pub fn path(&self) -> String {
        self.to_string()
    }
}

pub fn view_label(view: &AppView) -> &'static str {
    match view {
        AppView::Home {} => "Home",
        AppView::Listen { .. } => "Listen",
    }
}
