use crate::components::{Icon, TrackView};
use crate::library::Track;
use dioxus::prelude::*;

#[component]
pub fn TrackList(tracks: Vec<Track>, can_delete: bool, on_delete: EventHandler<String>) -> Element {
    if tracks.is_empty() {
        return rsx! {
            div { class: "empty-state",
                Icon { name: "music".to_string(), class: "empty-icon".to_string() }
                div { class: "empty-title", "No audio files yet" }
                div { class: "empty-hint", "Upload some audio files to get started" }
            }
        };
    }

    rsx! {
        div { class: "audio-list",
            for track in tracks {
                TrackView {
                    key: "{track.id}",
                    track: track.clone(),
                    can_delete,
                    on_delete,
                }
            }
        }
    }
}
