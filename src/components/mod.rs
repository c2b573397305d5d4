//! The components module contains all shared components for the widget.

mod app;
mod icons;
pub mod media;
mod notice;
mod playback_controller;
mod track_list;
mod track_view;
mod uploader;

pub use app::*;
pub use icons::*;
pub use notice::*;
pub use playback_controller::*;
pub use track_list::*;
pub use track_view::*;
pub use uploader::*;
