use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// One uploaded audio file. The bytes live with the host; this is only metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl Track {
    pub fn new(name: String, url: String, size: u64, uploaded_by: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            url,
            size,
            uploaded_by,
            uploaded_at: Utc::now(),
            duration: None,
        }
    }

    /// DOM id of the media element rendered for this track.
    pub fn media_dom_id(&self) -> String {
        media_dom_id(&self.id)
    }

    /// "Uploaded by Ada • 1.5 MB • 3/14/2026" line under the title.
    pub fn meta_line(&self) -> String {
        format!(
            "Uploaded by {} • {} • {}",
            self.uploaded_by,
            format_file_size(self.size),
            self.uploaded_at
                .with_timezone(&Local)
                .format("%-m/%-d/%Y")
        )
    }
}

pub fn media_dom_id(track_id: &str) -> String {
    let safe: String = track_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("channel-audio-{safe}")
}

/// `m:ss`; anything that is not a finite, non-negative number reads as `0:00`.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let scaled = bytes as f64 / 1024f64.powi(exponent as i32);
    let rounded = (scaled * 100.0).round() / 100.0;
    let text = format!("{rounded:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", text, UNITS[exponent])
}
