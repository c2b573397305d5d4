use crate::components::{
    NoticeBanner, NoticeController, PlaybackController, TrackList, Uploader,
};
use crate::config::WidgetConfig;
use crate::db::load_widget_config;
use crate::error::WidgetError;
use crate::host::{CurrentUser, HostBridge, Permissions, PlatformHost, UploadEvent};
use crate::library::{
    import, load_registry, persist_change, BatchListener, FileCandidate, ImportOutcome,
    RegistryCell, TrackRegistry,
};
use crate::playback::PlaybackState;
use dioxus::html::FileData;
use dioxus::prelude::*;
use log::{debug, error, info};
use std::collections::HashMap;
use std::rc::Rc;

const INIT_FAILED: &str = "Failed to initialize widget";
const UPLOAD_FAILED: &str = "Failed to upload audio files. Please try again.";
const DELETE_FAILED: &str = "Failed to delete audio file. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BootState {
    Loading,
    Ready,
    Failed,
}

struct Session {
    host: PlatformHost,
    user: CurrentUser,
    permissions: Permissions,
    registry: TrackRegistry,
}

async fn start_session(config: &WidgetConfig) -> Result<Session, WidgetError> {
    let instance_id = config.new_instance_id();
    info!("starting widget instance {instance_id}");
    let host = PlatformHost::init(&instance_id).await?;
    let user = host.current_user().await?;
    let context = host.context().await?;
    let permissions = Permissions::derive(&context, config);
    let registry = load_registry(&host).await;
    Ok(Session {
        host,
        user,
        permissions,
        registry,
    })
}

impl RegistryCell for Signal<TrackRegistry> {
    fn update<R>(&mut self, f: impl FnOnce(&mut TrackRegistry) -> R) -> R {
        self.with_mut(f)
    }
}

async fn read_file(file: FileData) -> Result<Vec<u8>, WidgetError> {
    let name = file.name();
    file.read_bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|e| WidgetError::UploadFailure(format!("{name}: {e}")))
}

/// Marks the uploader busy. False when another batch already holds it.
fn claim_upload(busy: &mut bool) -> bool {
    if *busy {
        return false;
    }
    *busy = true;
    true
}

fn overall_progress(progress: &HashMap<usize, f64>) -> Option<f64> {
    if progress.is_empty() {
        return None;
    }
    Some(progress.values().sum::<f64>() / progress.len() as f64)
}

#[component]
pub fn WidgetShell() -> Element {
    let mut config = use_signal(WidgetConfig::default);
    let mut host = use_signal(|| None::<Rc<PlatformHost>>);
    let mut user = use_signal(|| None::<CurrentUser>);
    let mut permissions = use_signal(Permissions::default);
    let mut tracks = use_signal(TrackRegistry::default);
    let playback_state = use_signal(PlaybackState::default);
    let mut boot = use_signal(|| BootState::Loading);
    let mut is_uploading = use_signal(|| false);
    let mut upload_progress = use_signal(HashMap::<usize, f64>::new);
    let notice = use_signal(|| None);
    let notice_serial = use_signal(|| 0u64);
    let mut notice_timeout = use_signal(|| WidgetConfig::default().notice_timeout_ms);

    let playback = PlaybackController::new(playback_state);
    let mut notices = NoticeController::new(notice, notice_serial, notice_timeout);

    use_context_provider(|| playback);
    use_context_provider(|| notices);
    use_context_provider(|| config);

    // Load config, connect to the host and read the library on mount
    use_effect(move || {
        spawn(async move {
            let loaded = load_widget_config().await;
            notice_timeout.set(loaded.notice_timeout_ms);
            config.set(loaded.clone());

            match start_session(&loaded).await {
                Ok(session) => {
                    info!(
                        "widget ready for {} with {} track(s)",
                        session.user.name,
                        session.registry.len()
                    );
                    permissions.set(session.permissions);
                    user.set(Some(session.user));
                    tracks.set(session.registry);
                    host.set(Some(Rc::new(session.host)));
                    boot.set(BootState::Ready);
                }
                Err(err) => {
                    error!("failed to initialize widget: {err}");
                    notices.error(INIT_FAILED);
                    boot.set(BootState::Failed);
                }
            }
        });
    });

    let on_files = move |files: Vec<FileData>| {
        let Some(api) = host.peek().clone() else {
            return;
        };
        let Some(uploader) = user.peek().as_ref().map(|u| u.name.clone()) else {
            return;
        };
        // Claimed before spawning so a second drop in the same tick is turned away.
        if !is_uploading.with_mut(claim_upload) {
            return;
        }
        upload_progress.set(HashMap::new());

        spawn(async move {
            let listener: BatchListener = Rc::new(move |index, event| {
                let mut progress = upload_progress;
                match event {
                    UploadEvent::Started { name } => {
                        debug!("upload started: {name}");
                        progress.with_mut(|map| {
                            map.insert(index, 0.0);
                        });
                    }
                    UploadEvent::Progress { percent, .. } => {
                        progress.with_mut(|map| {
                            map.insert(index, percent.clamp(0.0, 100.0));
                        });
                    }
                    UploadEvent::Failed { name, message } => {
                        error!("upload error for {name}: {message}");
                    }
                }
            });

            let selection = files
                .into_iter()
                .map(|file| {
                    let candidate =
                        FileCandidate::new(file.name(), file.content_type(), file.size());
                    (candidate, file)
                })
                .collect();
            let settings = config.peek().clone();
            let mut registry = tracks;

            match import(
                &*api,
                &mut registry,
                selection,
                read_file,
                &uploader,
                listener,
                &settings,
            )
            .await
            {
                Ok(ImportOutcome {
                    added: 0,
                    rejection: Some(rejection),
                }) => notices.error(rejection.user_message()),
                Ok(ImportOutcome { added: 0, .. }) => {}
                Ok(ImportOutcome { added, .. }) => {
                    info!("saved library after uploading {added} file(s)");
                    notices.success(format!("Successfully uploaded {added} audio file(s)"));
                }
                Err(err) => {
                    error!("upload failed: {err}");
                    notices.error(UPLOAD_FAILED);
                }
            }

            is_uploading.set(false);
            upload_progress.set(HashMap::new());
        });
    };

    let on_delete = move |track_id: String| {
        let Some(api) = host.peek().clone() else {
            return;
        };
        let mut playback = playback;
        let removed = playback.with_state_mut(|state| {
            tracks.with_mut(|registry| registry.remove(&track_id, state))
        });
        let Some(change) = removed else {
            return;
        };
        let policy = config.peek().sync_policy;

        spawn(async move {
            let mut registry = tracks;
            match persist_change(&*api, &mut registry, change, policy).await {
                Ok(()) => {
                    info!("deleted {track_id}");
                    notices.success("Audio file deleted successfully");
                }
                Err(err) => {
                    error!("delete save failed: {err}");
                    notices.error(DELETE_FAILED);
                }
            }
        });
    };

    let header = rsx! {
        div { class: "widget-header",
            h1 { class: "widget-title", "Audio Player" }
            p { class: "widget-subtitle", "Channel Audio Library" }
        }
    };

    match boot() {
        BootState::Loading => rsx! {
            div { class: "audio-player-widget",
                {header}
                div { class: "loading",
                    span { "Loading..." }
                    div { class: "spinner" }
                }
            }
        },
        BootState::Failed => rsx! {
            div { class: "audio-player-widget",
                {header}
                div { class: "widget-content",
                    NoticeBanner {}
                    div { class: "empty-state",
                        div { class: "empty-title", "The audio library is unavailable" }
                        div { class: "empty-hint", "Reload the page to try again" }
                    }
                }
            }
        },
        BootState::Ready => {
            let current_permissions = permissions();
            let track_list = tracks.read().list().to_vec();
            rsx! {
                div { class: "audio-player-widget",
                    {header}
                    div { class: "widget-content",
                        NoticeBanner {}
                        Uploader {
                            is_uploading: is_uploading(),
                            can_upload: current_permissions.can_upload,
                            progress: overall_progress(&upload_progress.read()),
                            on_files,
                        }
                        TrackList {
                            tracks: track_list,
                            can_delete: current_permissions.can_delete,
                            on_delete,
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_in_the_same_tick_is_refused() {
        let mut busy = false;
        assert!(claim_upload(&mut busy));
        assert!(!claim_upload(&mut busy));
        busy = false;
        assert!(claim_upload(&mut busy));
    }

    #[test]
    fn progress_is_averaged_across_files() {
        let mut progress = HashMap::new();
        assert_eq!(overall_progress(&progress), None);
        progress.insert(0, 100.0);
        progress.insert(1, 50.0);
        assert_eq!(overall_progress(&progress), Some(75.0));
    }
}
