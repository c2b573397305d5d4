//! Error taxonomy for the widget.
//!
//! Every fallible library call returns [`WidgetError`]; UI handlers turn it into a
//! transient notice instead of letting it escape.

use thiserror::Error;

/// Why a selected file was refused before any host call was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{name} is not an audio file")]
    NotAudio { name: String },
    #[error("{name} is larger than {limit} bytes")]
    TooLarge { name: String, limit: u64 },
}

impl ValidationError {
    /// Inline message shown under the drop zone.
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::NotAudio { .. } => "Please select only audio files".to_string(),
            ValidationError::TooLarge { limit, .. } => {
                format!("File size must be less than {}", whole_megabytes(*limit))
            }
        }
    }
}

fn whole_megabytes(bytes: u64) -> String {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if (mb - mb.round()).abs() < f64::EPSILON {
        format!("{}MB", mb.round() as u64)
    } else {
        format!("{mb:.1}MB")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
    #[error("host bridge unavailable: {0}")]
    Initialization(String),
    #[error("upload rejected: {0}")]
    UploadValidation(#[from] ValidationError),
    #[error("upload failed: {0}")]
    UploadFailure(String),
    #[error("failed to save library: {0}")]
    Persistence(String),
    #[error("stored content is unreadable: {0}")]
    Content(String),
    #[error("local storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for WidgetError {
    fn from(err: serde_json::Error) -> Self {
        WidgetError::Content(err.to_string())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl From<rusqlite::Error> for WidgetError {
    fn from(err: rusqlite::Error) -> Self {
        WidgetError::Storage(err.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl From<gloo_storage::errors::StorageError> for WidgetError {
    fn from(err: gloo_storage::errors::StorageError) -> Self {
        WidgetError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_match_widget_copy() {
        let not_audio = ValidationError::NotAudio {
            name: "notes.pdf".to_string(),
        };
        assert_eq!(not_audio.user_message(), "Please select only audio files");

        let too_large = ValidationError::TooLarge {
            name: "set.wav".to_string(),
            limit: 50 * 1024 * 1024,
        };
        assert_eq!(too_large.user_message(), "File size must be less than 50MB");
    }

    #[test]
    fn json_errors_become_content_errors() {
        let err = serde_json::from_str::<Vec<u32>>("{").unwrap_err();
        assert!(matches!(WidgetError::from(err), WidgetError::Content(_)));
    }
}
