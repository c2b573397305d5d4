use crate::config::WidgetConfig;
use crate::error::WidgetError;

#[cfg(target_arch = "wasm32")]
use gloo_storage::{LocalStorage, Storage};
#[cfg(not(target_arch = "wasm32"))]
use rusqlite::{Connection, OptionalExtension};
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};

#[cfg(target_arch = "wasm32")]
const CONFIG_KEY: &str = "channel_audio.config";
#[cfg(not(target_arch = "wasm32"))]
const CONFIG_ROW: &str = "widget_config";

// Native storage: one SQLite file holding the widget config and the content blobs
// the desktop host keeps on behalf of the widget.

#[cfg(not(target_arch = "wasm32"))]
pub fn open_database(path: &Path) -> Result<Connection, WidgetError> {
    let conn = Connection::open(path)
        .map_err(|e| WidgetError::Storage(format!("Failed to open database: {e}")))?;
    initialize_database(&conn)?;
    Ok(conn)
}

#[cfg(not(target_arch = "wasm32"))]
pub fn initialize_database(conn: &Connection) -> Result<(), WidgetError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS widget_content (
            storage_key TEXT PRIMARY KEY,
            content TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save_config(conn: &Connection, config: &WidgetConfig) -> Result<(), WidgetError> {
    let config_json = serde_json::to_string(config)?;
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
        [CONFIG_ROW, config_json.as_str()],
    )?;
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_config(conn: &Connection) -> Result<WidgetConfig, WidgetError> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key = ?1",
            [CONFIG_ROW],
            |row: &rusqlite::Row| row.get(0),
        )
        .optional()?;

    match stored {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(WidgetConfig::default()),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn save_content(conn: &Connection, storage_key: &str, content: &str) -> Result<(), WidgetError> {
    let updated_at = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR REPLACE INTO widget_content (storage_key, content, updated_at) VALUES (?1, ?2, ?3)",
        [storage_key, content, updated_at.as_str()],
    )?;
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn load_content(conn: &Connection, storage_key: &str) -> Result<Option<String>, WidgetError> {
    let content = conn
        .query_row(
            "SELECT content FROM widget_content WHERE storage_key = ?1",
            [storage_key],
            |row: &rusqlite::Row| row.get(0),
        )
        .optional()?;
    Ok(content)
}

/// Per-user data directory, created on demand.
#[cfg(not(target_arch = "wasm32"))]
pub fn data_dir() -> PathBuf {
    let dir = dirs::data_dir()
        .map(|dir| dir.join("channel-audio"))
        .unwrap_or_else(|| PathBuf::from(".channel-audio"));
    let _ = std::fs::create_dir_all(&dir);
    dir
}

#[cfg(not(target_arch = "wasm32"))]
pub fn default_database_path() -> PathBuf {
    data_dir().join("channel-audio.db")
}

/// Config for this run; unreadable or missing config falls back to defaults.
#[cfg(not(target_arch = "wasm32"))]
pub async fn load_widget_config() -> WidgetConfig {
    let loaded = open_database(&default_database_path()).and_then(|conn| {
        let mut config = load_config(&conn)?;
        if config.normalize() {
            save_config(&conn, &config)?;
        }
        Ok(config)
    });
    loaded.unwrap_or_else(|err| {
        log::warn!("config unavailable, using defaults: {err}");
        WidgetConfig::default()
    })
}

#[cfg(target_arch = "wasm32")]
pub async fn load_widget_config() -> WidgetConfig {
    let mut config = match LocalStorage::get::<WidgetConfig>(CONFIG_KEY) {
        Ok(config) => config,
        Err(_) => WidgetConfig::default(),
    };
    if config.normalize() {
        if let Err(err) = save_widget_config(&config) {
            log::warn!("could not store normalized config: {err}");
        }
    }
    config
}

#[cfg(target_arch = "wasm32")]
pub fn save_widget_config(config: &WidgetConfig) -> Result<(), WidgetError> {
    LocalStorage::set(CONFIG_KEY, config)?;
    Ok(())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::config::SyncPolicy;

    fn temp_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = open_database(&dir.path().join("widget.db")).unwrap();
        (dir, conn)
    }

    #[test]
    fn missing_config_reads_as_default() {
        let (_dir, conn) = temp_db();
        assert_eq!(load_config(&conn).unwrap(), WidgetConfig::default());
    }

    #[test]
    fn config_survives_a_save() {
        let (_dir, conn) = temp_db();
        let config = WidgetConfig {
            sync_policy: SyncPolicy::RevertOnFailure,
            max_upload_bytes: 1024,
            ..WidgetConfig::default()
        };
        save_config(&conn, &config).unwrap();
        assert_eq!(load_config(&conn).unwrap(), config);
    }

    #[test]
    fn content_is_replaced_wholesale() {
        let (_dir, conn) = temp_db();
        assert_eq!(load_content(&conn, "library").unwrap(), None);
        save_content(&conn, "library", "[1]").unwrap();
        save_content(&conn, "library", "[1,2]").unwrap();
        assert_eq!(load_content(&conn, "library").unwrap().as_deref(), Some("[1,2]"));
        assert_eq!(load_content(&conn, "other").unwrap(), None);
    }
}
