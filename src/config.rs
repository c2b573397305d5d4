use rand::Rng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;
const INSTANCE_SUFFIX_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// What happens to the in-memory library when saving it to the host fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SyncPolicy {
    /// Keep the change on screen; UI and host may diverge until the next save.
    #[default]
    Optimistic,
    /// Put the library back the way it was before the change.
    RevertOnFailure,
}

/// Widget settings stored in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    #[serde(default = "default_accepted_mime_prefix")]
    pub accepted_mime_prefix: String,
    #[serde(default = "default_notice_timeout_ms")]
    pub notice_timeout_ms: u32,
    #[serde(default = "default_instance_prefix")]
    pub instance_prefix: String,
    #[serde(default = "default_true")]
    pub allow_upload: bool,
    #[serde(default = "default_true")]
    pub allow_delete: bool,
    #[serde(default)]
    pub sync_policy: SyncPolicy,
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

fn default_accepted_mime_prefix() -> String {
    "audio/".to_string()
}

fn default_notice_timeout_ms() -> u32 {
    3000
}

fn default_instance_prefix() -> String {
    "audio-player-widget".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            accepted_mime_prefix: default_accepted_mime_prefix(),
            notice_timeout_ms: default_notice_timeout_ms(),
            instance_prefix: default_instance_prefix(),
            allow_upload: true,
            allow_delete: true,
            sync_policy: SyncPolicy::Optimistic,
        }
    }
}

impl WidgetConfig {
    /// Repair values a hand-edited config could break. Returns true when anything changed.
    pub fn normalize(&mut self) -> bool {
        let before = self.clone();
        if self.max_upload_bytes == 0 {
            self.max_upload_bytes = default_max_upload_bytes();
        }
        if self.accepted_mime_prefix.trim().is_empty() {
            self.accepted_mime_prefix = default_accepted_mime_prefix();
        }
        self.accepted_mime_prefix = self.accepted_mime_prefix.trim().to_ascii_lowercase();
        if self.notice_timeout_ms == 0 {
            self.notice_timeout_ms = default_notice_timeout_ms();
        }
        let prefix = self.instance_prefix.trim().trim_end_matches('-');
        self.instance_prefix = if prefix.is_empty() {
            default_instance_prefix()
        } else {
            prefix.to_string()
        };
        *self != before
    }

    /// Fresh id handed to the host SDK on every start, e.g. `audio-player-widget-k3v9x0q2a`.
    pub fn new_instance_id(&self) -> String {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..INSTANCE_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        format!("{}-{}", self.instance_prefix, suffix)
    }
}
