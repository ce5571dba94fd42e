//! The components module contains all shared components for our app.

mod app;
mod app_view;
mod audio_manager;
mod icons;
mod player;
mod playlist;
pub mod views;

pub use app::*;
pub use app_view::*;
pub use audio_manager::*;
pub use icons::*;
pub use player::*;
pub use playlist::*;
// Views are accessed via views::ViewName
