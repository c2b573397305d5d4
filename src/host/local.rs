// Desktop stand-in for the widget host: content in SQLite, uploads copied into the data dir.

use super::*;
use crate::db::{data_dir, default_database_path, load_content, open_database, save_content};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

const LIBRARY_KEY: &str = "audio-library";

pub struct LocalHost {
    conn: Connection,
    upload_dir: PathBuf,
    instance_id: String,
}

impl LocalHost {
    pub fn open(db_path: &Path, upload_dir: PathBuf, instance_id: &str) -> Result<Self, WidgetError> {
        std::fs::create_dir_all(&upload_dir)
            .map_err(|e| WidgetError::Initialization(format!("upload dir: {e}")))?;
        let conn =
            open_database(db_path).map_err(|e| WidgetError::Initialization(e.to_string()))?;
        Ok(Self {
            conn,
            upload_dir,
            instance_id: instance_id.to_string(),
        })
    }

    fn stored_name(file_name: &str) -> String {
        let cleaned: String = file_name
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '\0' => '_',
                other => other,
            })
            .collect();
        format!("{}-{}", uuid::Uuid::new_v4().simple(), cleaned)
    }

    fn file_url(path: &Path) -> String {
        let encoded: Vec<String> = path
            .to_string_lossy()
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("file://{}", encoded.join("/"))
    }
}

impl HostBridge for LocalHost {
    async fn init(instance_id: &str) -> Result<Self, WidgetError> {
        Self::open(
            &default_database_path(),
            data_dir().join("uploads"),
            instance_id,
        )
    }

    async fn current_user(&self) -> Result<CurrentUser, WidgetError> {
        let name = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_default();
        Ok(CurrentUser {
            name: if name.trim().is_empty() {
                "Local user".to_string()
            } else {
                name
            },
        })
    }

    async fn context(&self) -> Result<HostContext, WidgetError> {
        Ok(HostContext {
            raw: serde_json::json!({
                "host": "desktop",
                "instanceId": self.instance_id,
            }),
        })
    }

    async fn get_content(&self) -> Result<StoredContent, WidgetError> {
        let content = load_content(&self.conn, LIBRARY_KEY)
            .map_err(|e| WidgetError::Persistence(e.to_string()))?;
        Ok(StoredContent { content })
    }

    async fn set_content(&self, content: String) -> Result<(), WidgetError> {
        save_content(&self.conn, LIBRARY_KEY, &content)
            .map_err(|e| WidgetError::Persistence(e.to_string()))
    }

    async fn upload(
        &self,
        file: PendingFile,
        listener: UploadListener,
    ) -> Result<UploadedFile, WidgetError> {
        listener(UploadEvent::Started {
            name: file.name.clone(),
        });
        let target = self.upload_dir.join(Self::stored_name(&file.name));
        if let Err(err) = std::fs::write(&target, &file.bytes) {
            let message = err.to_string();
            listener(UploadEvent::Failed {
                name: file.name.clone(),
                message: message.clone(),
            });
            return Err(WidgetError::UploadFailure(format!("{}: {message}", file.name)));
        }
        listener(UploadEvent::Progress {
            name: file.name,
            percent: 100.0,
        });
        Ok(UploadedFile {
            url: Self::file_url(&target),
        })
    }
}
