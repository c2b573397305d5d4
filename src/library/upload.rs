use super::models::Track;
use super::registry::{persist_change, RegistryCell};
use crate::config::WidgetConfig;
use crate::error::{ValidationError, WidgetError};
use crate::host::{HostBridge, PendingFile, UploadEvent, UploadListener};
use futures_util::future::try_join_all;
use log::{info, warn};
use std::future::Future;
use std::rc::Rc;

/// Upload notifications tagged with the file's position in the batch.
pub type BatchListener = Rc<dyn Fn(usize, UploadEvent)>;

/// What the browser tells us about a picked or dropped file before reading it.
#[derive(Debug, Clone, PartialEq)]
pub struct FileCandidate {
    pub name: String,
    pub mime: String,
    pub size: u64,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, mime: Option<String>, size: u64) -> Self {
        let name = name.into();
        let mime = mime
            .map(|m| m.trim().to_ascii_lowercase())
            .filter(|m| !m.is_empty())
            .or_else(|| mime_from_extension(&name).map(str::to_string))
            .unwrap_or_default();
        Self { name, mime, size }
    }
}

fn mime_from_extension(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    Some(match ext.to_ascii_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "opus" => "audio/opus",
        "weba" => "audio/webm",
        _ => return None,
    })
}

pub fn validate(candidate: &FileCandidate, config: &WidgetConfig) -> Result<(), ValidationError> {
    if !candidate.mime.starts_with(&config.accepted_mime_prefix) {
        return Err(ValidationError::NotAudio {
            name: candidate.name.clone(),
        });
    }
    if candidate.size > config.max_upload_bytes {
        return Err(ValidationError::TooLarge {
            name: candidate.name.clone(),
            limit: config.max_upload_bytes,
        });
    }
    Ok(())
}

/// Selection split into files worth uploading and the message for the last refusal.
#[derive(Debug)]
pub struct Screening<T> {
    pub accepted: Vec<(FileCandidate, T)>,
    pub rejection: Option<ValidationError>,
}

/// Drop invalid files from a selection; valid ones go on as one batch.
pub fn screen<T>(
    selection: impl IntoIterator<Item = (FileCandidate, T)>,
    config: &WidgetConfig,
) -> Screening<T> {
    let mut accepted = Vec::new();
    let mut rejection = None;
    for (candidate, handle) in selection {
        match validate(&candidate, config) {
            Ok(()) => accepted.push((candidate, handle)),
            Err(err) => {
                warn!("rejected {}: {err}", candidate.name);
                rejection = Some(err);
            }
        }
    }
    Screening {
        accepted,
        rejection,
    }
}

/// Upload every file in parallel. Either all of them become tracks or none do.
pub async fn upload_batch<H: HostBridge>(
    host: &H,
    files: Vec<PendingFile>,
    uploaded_by: &str,
    listener: BatchListener,
) -> Result<Vec<Track>, WidgetError> {
    let uploads = files.into_iter().enumerate().map(|(index, file)| {
        let listener = listener.clone();
        let per_file: UploadListener = Rc::new(move |event| listener(index, event));
        async move {
            let name = file.name.clone();
            let size = file.size;
            let uploaded = host.upload(file, per_file).await?;
            Ok::<_, WidgetError>(Track::new(name, uploaded.url, size, uploaded_by.to_string()))
        }
    });
    let tracks = try_join_all(uploads).await?;
    info!("uploaded {} file(s)", tracks.len());
    Ok(tracks)
}

/// What a picked or dropped selection turned into.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImportOutcome {
    pub added: usize,
    /// Last refusal from screening, if any file was dropped.
    pub rejection: Option<ValidationError>,
}

/// Screen a selection, read and upload what passed, then append and save the new tracks.
///
/// Refused files never reach `read`, the host or the registry. A failed upload leaves the
/// registry untouched; a failed save follows the configured sync policy.
pub async fn import<H, S, T, R, Fut>(
    host: &H,
    registry: &mut S,
    selection: Vec<(FileCandidate, T)>,
    read: R,
    uploaded_by: &str,
    listener: BatchListener,
    config: &WidgetConfig,
) -> Result<ImportOutcome, WidgetError>
where
    H: HostBridge,
    S: RegistryCell,
    R: Fn(T) -> Fut,
    Fut: Future<Output = Result<Vec<u8>, WidgetError>>,
{
    let Screening {
        accepted,
        rejection,
    } = screen(selection, config);
    if accepted.is_empty() {
        return Ok(ImportOutcome {
            added: 0,
            rejection,
        });
    }

    let mut files = Vec::with_capacity(accepted.len());
    for (candidate, handle) in accepted {
        let bytes = read(handle).await?;
        files.push(PendingFile {
            name: candidate.name,
            mime: candidate.mime,
            size: candidate.size,
            bytes,
        });
    }

    let tracks = upload_batch(host, files, uploaded_by, listener).await?;
    let added = tracks.len();
    let change = registry.update(|current| current.extend(tracks));
    persist_change(host, registry, change, config.sync_policy).await?;
    Ok(ImportOutcome { added, rejection })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncPolicy;
    use crate::host::testing::MemoryHost;
    use crate::library::registry::{load_registry, TrackRegistry};
    use std::cell::{Cell, RefCell};

    const MB: u64 = 1024 * 1024;

    fn pending(name: &str) -> PendingFile {
        PendingFile {
            name: name.to_string(),
            mime: "audio/mpeg".to_string(),
            size: 4,
            bytes: vec![0; 4],
        }
    }

    fn picked(name: &str, mime: &str, size: u64) -> (FileCandidate, Vec<u8>) {
        (FileCandidate::new(name, Some(mime.to_string()), size), vec![1, 2, 3])
    }

    async fn in_memory(bytes: Vec<u8>) -> Result<Vec<u8>, WidgetError> {
        Ok(bytes)
    }

    fn quiet() -> BatchListener {
        Rc::new(|_, _| {})
    }

    fn names(registry: &TrackRegistry) -> Vec<&str> {
        registry.list().iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn rejects_non_audio_and_oversized_files() {
        let config = WidgetConfig::default();
        let pdf = FileCandidate::new("notes.pdf", Some("application/pdf".into()), 10);
        assert!(matches!(
            validate(&pdf, &config),
            Err(ValidationError::NotAudio { .. })
        ));

        let huge = FileCandidate::new("set.wav", Some("audio/wav".into()), 50 * MB + 1);
        assert!(matches!(
            validate(&huge, &config),
            Err(ValidationError::TooLarge { limit, .. }) if limit == 50 * MB
        ));

        let exact = FileCandidate::new("set.wav", Some("audio/wav".into()), 50 * MB);
        assert!(validate(&exact, &config).is_ok());
    }

    #[test]
    fn infers_mime_from_extension_when_browser_gives_none() {
        assert_eq!(FileCandidate::new("Song.MP3", None, 1).mime, "audio/mpeg");
        assert_eq!(FileCandidate::new("take.m4a", Some(" ".into()), 1).mime, "audio/mp4");
        assert_eq!(FileCandidate::new("README", None, 1).mime, "");
        assert_eq!(
            FileCandidate::new("clip.mp3", Some("Audio/MPEG".into()), 1).mime,
            "audio/mpeg"
        );
    }

    #[test]
    fn screening_keeps_valid_files_and_reports_last_rejection() {
        let config = WidgetConfig::default();
        let selection = vec![
            (FileCandidate::new("a.mp3", Some("audio/mpeg".into()), 10), 0),
            (FileCandidate::new("b.png", Some("image/png".into()), 10), 1),
            (FileCandidate::new("c.ogg", Some("audio/ogg".into()), 10), 2),
            (FileCandidate::new("d.wav", Some("audio/wav".into()), 60 * MB), 3),
        ];
        let screening = screen(selection, &config);
        let kept: Vec<i32> = screening.accepted.iter().map(|(_, h)| *h).collect();
        assert_eq!(kept, vec![0, 2]);
        assert!(matches!(
            screening.rejection,
            Some(ValidationError::TooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn batch_creates_tracks_in_selection_order() {
        let host = MemoryHost::default();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();
        let listener: BatchListener =
            Rc::new(move |index, event| sink.borrow_mut().push((index, event)));

        let tracks = upload_batch(
            &host,
            vec![pending("one.mp3"), pending("one.mp3")],
            "Ada",
            listener,
        )
        .await
        .unwrap();

        assert_eq!(tracks.len(), 2);
        assert!(tracks.iter().all(|t| t.uploaded_by == "Ada" && t.size == 4));
        assert_eq!(tracks[0].url, "memory://one.mp3");
        assert_ne!(tracks[0].id, tracks[1].id);

        // Same file name twice still reports progress for two distinct slots.
        let finished: Vec<usize> = events
            .borrow()
            .iter()
            .filter(|(_, e)| matches!(e, UploadEvent::Progress { percent, .. } if *percent == 100.0))
            .map(|(index, _)| *index)
            .collect();
        assert_eq!(finished, vec![0, 1]);
    }

    #[tokio::test]
    async fn mixed_selection_imports_only_audio_files() {
        let host = MemoryHost::default();
        let config = WidgetConfig::default();
        let mut registry = TrackRegistry::default();
        let selection = vec![
            picked("a.mp3", "audio/mpeg", 10),
            picked("notes.txt", "text/plain", 10),
            picked("b.ogg", "audio/ogg", 10),
        ];

        let outcome = import(
            &host,
            &mut registry,
            selection,
            in_memory,
            "Ada",
            quiet(),
            &config,
        )
        .await
        .unwrap();

        assert_eq!(outcome.added, 2);
        assert!(matches!(
            outcome.rejection,
            Some(ValidationError::NotAudio { ref name }) if name == "notes.txt"
        ));
        assert_eq!(names(&registry), vec!["a.mp3", "b.ogg"]);
        assert_eq!(*host.uploads.borrow(), vec!["a.mp3", "b.ogg"]);
        assert_eq!(host.write_count(), 1);
        assert_eq!(load_registry(&host).await, registry);
    }

    #[tokio::test]
    async fn refused_selection_never_reaches_the_host() {
        let host = MemoryHost::default();
        let config = WidgetConfig::default();
        let mut registry = TrackRegistry::default();
        let reads = Cell::new(0);
        let read = |bytes: Vec<u8>| {
            reads.set(reads.get() + 1);
            in_memory(bytes)
        };
        let selection = vec![
            picked("x.txt", "text/plain", 1),
            picked("y.mp3", "audio/mpeg", 51 * MB),
        ];

        let outcome = import(&host, &mut registry, selection, read, "Ada", quiet(), &config)
            .await
            .unwrap();

        assert_eq!(outcome.added, 0);
        assert!(matches!(
            outcome.rejection,
            Some(ValidationError::TooLarge { .. })
        ));
        assert_eq!(reads.get(), 0);
        assert!(registry.is_empty());
        assert!(host.uploads.borrow().is_empty());
        assert_eq!(host.write_count(), 0);
    }

    #[tokio::test]
    async fn one_failed_upload_drops_the_whole_batch() {
        let host = MemoryHost::default();
        *host.fail_upload_named.borrow_mut() = Some("two.mp3".to_string());
        let config = WidgetConfig::default();
        let mut registry = TrackRegistry::default();
        registry.extend([Track::new(
            "old.mp3".to_string(),
            "memory://old.mp3".to_string(),
            1,
            "Ada".to_string(),
        )]);
        let before = registry.clone();

        let result = import(
            &host,
            &mut registry,
            vec![picked("one.mp3", "audio/mpeg", 3), picked("two.mp3", "audio/mpeg", 3)],
            in_memory,
            "Ada",
            quiet(),
            &config,
        )
        .await;

        assert!(matches!(result, Err(WidgetError::UploadFailure(_))));
        assert_eq!(registry, before);
        assert_eq!(host.write_count(), 0);
    }

    #[tokio::test]
    async fn failed_save_after_upload_follows_sync_policy() {
        let mut config = WidgetConfig::default();
        let mut registry = TrackRegistry::default();

        let host = MemoryHost::default();
        host.fail_saves.set(true);
        let result = import(
            &host,
            &mut registry,
            vec![picked("kept.mp3", "audio/mpeg", 3)],
            in_memory,
            "Ada",
            quiet(),
            &config,
        )
        .await;
        assert!(matches!(result, Err(WidgetError::Persistence(_))));
        assert_eq!(names(&registry), vec!["kept.mp3"]);

        config.sync_policy = SyncPolicy::RevertOnFailure;
        let result = import(
            &host,
            &mut registry,
            vec![picked("dropped.mp3", "audio/mpeg", 3)],
            in_memory,
            "Ada",
            quiet(),
            &config,
        )
        .await;
        assert!(matches!(result, Err(WidgetError::Persistence(_))));
        assert_eq!(names(&registry), vec!["kept.mp3"]);
    }
}
