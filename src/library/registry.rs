use super::models::Track;
use crate::config::SyncPolicy;
use crate::error::WidgetError;
use crate::host::HostBridge;
use crate::playback::PlaybackState;
use log::{info, warn};

/// Ordered list of every track the widget knows about, in upload order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackRegistry {
    tracks: Vec<Track>,
}

/// One mutation applied in memory, kept so a failed save can take back exactly that.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryChange {
    Added { ids: Vec<String> },
    Removed { index: usize, track: Track },
}

impl TrackRegistry {
    /// Decode the host blob. Absent or `null` content is an empty library.
    pub fn decode(content: Option<&str>) -> Result<Self, WidgetError> {
        let Some(raw) = content.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Ok(Self::default());
        };
        let tracks: Option<Vec<Track>> = serde_json::from_str(raw)?;
        Ok(Self {
            tracks: tracks.unwrap_or_default(),
        })
    }

    pub fn encode(&self) -> Result<String, WidgetError> {
        Ok(serde_json::to_string(&self.tracks)?)
    }

    pub fn extend(&mut self, tracks: impl IntoIterator<Item = Track>) -> RegistryChange {
        let start = self.tracks.len();
        self.tracks.extend(tracks);
        RegistryChange::Added {
            ids: self.tracks[start..].iter().map(|t| t.id.clone()).collect(),
        }
    }

    /// Drop a track. If it is the active one, playback is reset first.
    pub fn remove(&mut self, id: &str, playback: &mut PlaybackState) -> Option<RegistryChange> {
        if playback.is_active(id) {
            playback.stop();
        }
        let index = self.tracks.iter().position(|track| track.id == id)?;
        let track = self.tracks.remove(index);
        Some(RegistryChange::Removed { index, track })
    }

    /// Take back a single change, leaving everything else that happened since in place.
    pub fn undo(&mut self, change: RegistryChange) {
        match change {
            RegistryChange::Added { ids } => self.tracks.retain(|track| !ids.contains(&track.id)),
            RegistryChange::Removed { index, track } => {
                if self.tracks.iter().any(|t| t.id == track.id) {
                    return;
                }
                let index = index.min(self.tracks.len());
                self.tracks.insert(index, track);
            }
        }
    }

    pub fn list(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Wherever the live registry is kept. Borrows never span an await.
pub trait RegistryCell {
    fn update<R>(&mut self, f: impl FnOnce(&mut TrackRegistry) -> R) -> R;
}

impl RegistryCell for TrackRegistry {
    fn update<R>(&mut self, f: impl FnOnce(&mut TrackRegistry) -> R) -> R {
        f(self)
    }
}

/// Load the library; anything unreadable starts the widget with an empty list.
pub async fn load_registry<H: HostBridge>(host: &H) -> TrackRegistry {
    let stored = match host.get_content().await {
        Ok(stored) => stored,
        Err(err) => {
            warn!("could not read stored tracks: {err}");
            return TrackRegistry::default();
        }
    };
    match TrackRegistry::decode(stored.content.as_deref()) {
        Ok(registry) => {
            info!("loaded {} track(s)", registry.len());
            registry
        }
        Err(err) => {
            warn!("stored tracks are unreadable, starting empty: {err}");
            TrackRegistry::default()
        }
    }
}

/// Write the whole registry to the host. Every failure surfaces as `Persistence`.
pub async fn save_registry<H: HostBridge>(
    host: &H,
    registry: &TrackRegistry,
) -> Result<(), WidgetError> {
    let written = match registry.encode() {
        Ok(encoded) => host.set_content(encoded).await,
        Err(err) => Err(err),
    };
    written.map_err(|error| match error {
        WidgetError::Persistence(_) => error,
        other => WidgetError::Persistence(other.to_string()),
    })
}

/// Save after `change` was applied in memory. Under `RevertOnFailure` a failed write
/// undoes that change on the registry as it stands once the write settles.
pub async fn persist_change<H: HostBridge, S: RegistryCell>(
    host: &H,
    registry: &mut S,
    change: RegistryChange,
    policy: SyncPolicy,
) -> Result<(), WidgetError> {
    let snapshot = registry.update(|current| current.clone());
    let Err(error) = save_registry(host, &snapshot).await else {
        return Ok(());
    };
    if policy == SyncPolicy::RevertOnFailure {
        warn!("save failed, undoing {change:?}");
        registry.update(|current| current.undo(change));
    }
    Err(error)
}
