use crate::components::{media, Icon, PlaybackController};
use crate::library::{format_duration, Track};
use crate::playback::MediaCommand;
use dioxus::prelude::*;
use log::warn;

/// One row in the library: metadata, transport and its own `<audio>` element.
#[component]
pub fn TrackView(track: Track, can_delete: bool, on_delete: EventHandler<String>) -> Element {
    let mut playback = use_context::<PlaybackController>();
    let mut is_loading = use_signal(|| false);

    let track_id = track.id.clone();
    let dom_id = track.media_dom_id();

    // Re-evaluated on every state change, but only fires downstream when the command flips.
    let command = use_memo({
        let track_id = track_id.clone();
        move || playback.command_for(&track_id)
    });

    // Reconcile the element with the shared state.
    use_effect({
        let track_id = track_id.clone();
        let dom_id = dom_id.clone();
        move || match command() {
            MediaCommand::Play => {
                let track_id = track_id.clone();
                let dom_id = dom_id.clone();
                let mut playback = playback;
                let mut is_loading = is_loading;
                spawn(async move {
                    if let Err(err) = media::start(&dom_id).await {
                        warn!("could not start {track_id}: {err}");
                        is_loading.set(false);
                        playback.report_failure(&track_id);
                    }
                });
            }
            MediaCommand::Pause => media::halt(&dom_id),
        }
    });

    let state = playback.current();
    let is_active = state.is_active(&track_id);
    let is_playing = state.is_playing_track(&track_id);
    let current_time = if is_active { state.current_time } else { 0.0 };
    let duration = if is_active {
        state.duration
    } else {
        track.duration.unwrap_or(0.0)
    };
    let progress = state.progress_percent(&track_id);

    let on_time_update = {
        let track_id = track_id.clone();
        let dom_id = dom_id.clone();
        move |_| {
            if !playback.peek().is_active(&track_id) {
                return;
            }
            let track_id = track_id.clone();
            let dom_id = dom_id.clone();
            let mut playback = playback;
            spawn(async move {
                if let Some(position) = media::position(&dom_id).await {
                    playback.report_progress(&track_id, position.current_time, position.duration);
                }
            });
        }
    };

    let on_media_error = {
        let track_id = track_id.clone();
        move |_| {
            is_loading.set(false);
            playback.report_failure(&track_id);
        }
    };

    let on_ended = {
        let track_id = track_id.clone();
        move |_| playback.report_ended(&track_id)
    };

    let on_toggle = {
        let track_id = track_id.clone();
        move |_| {
            if is_playing {
                playback.request_pause();
            } else {
                playback.request_play(&track_id);
            }
        }
    };

    let on_seek = {
        let track_id = track_id.clone();
        let dom_id = dom_id.clone();
        move |evt: Event<FormData>| {
            let Ok(percent) = evt.value().parse::<f64>() else {
                return;
            };
            if let Some(target) = playback.peek().seek_target(&track_id, percent / 100.0) {
                media::seek(&dom_id, target);
            }
        }
    };

    let on_delete_click = {
        let track_id = track_id.clone();
        move |_| on_delete.call(track_id.clone())
    };

    let meta_line = track.meta_line();
    let time_label = format!(
        "{} / {}",
        format_duration(current_time),
        format_duration(duration)
    );
    let item_class = if is_active { "audio-item active" } else { "audio-item" };

    rsx! {
        div { class: "{item_class}",
            audio {
                id: "{dom_id}",
                src: "{track.url}",
                preload: "metadata",
                ontimeupdate: on_time_update,
                onloadstart: move |_| is_loading.set(true),
                onloadedmetadata: move |_| is_loading.set(false),
                oncanplay: move |_| is_loading.set(false),
                onerror: on_media_error,
                onended: on_ended,
            }

            div { class: "audio-header",
                div {
                    div { class: "audio-title", "{track.name}" }
                    div { class: "audio-meta", "{meta_line}" }
                }
                if can_delete {
                    button {
                        class: "delete-button",
                        r#type: "button",
                        title: "Delete audio file",
                        onclick: on_delete_click,
                        Icon { name: "trash".to_string(), class: "icon-sm".to_string() }
                    }
                }
            }

            div { class: "audio-controls",
                button {
                    class: "play-button",
                    r#type: "button",
                    disabled: is_loading(),
                    title: if is_playing { "Pause" } else { "Play" },
                    onclick: on_toggle,
                    if is_loading() {
                        Icon { name: "loader".to_string(), class: "icon-sm".to_string() }
                    } else if is_playing {
                        Icon { name: "pause".to_string(), class: "icon-sm".to_string() }
                    } else {
                        Icon { name: "play".to_string(), class: "icon-sm".to_string() }
                    }
                }

                input {
                    class: "progress-slider",
                    r#type: "range",
                    min: "0",
                    max: "100",
                    step: "0.1",
                    value: "{progress}",
                    disabled: !is_active || duration <= 0.0,
                    style: "--progress: {progress}%",
                    oninput: on_seek,
                }

                div { class: "time-display", "{time_label}" }
            }
        }
    }
}
