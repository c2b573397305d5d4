//! Host bridge: identity, permissions, content storage and file upload provided by the
//! application that embeds the widget.

use crate::config::WidgetConfig;
use crate::error::WidgetError;
use serde::Deserialize;
use std::rc::Rc;

#[cfg(not(target_arch = "wasm32"))]
mod local;
#[cfg(target_arch = "wasm32")]
mod widget_sdk;

#[cfg(not(target_arch = "wasm32"))]
pub use local::LocalHost;
#[cfg(target_arch = "wasm32")]
pub use widget_sdk::WidgetSdkHost;

/// Host implementation for the current build target.
#[cfg(target_arch = "wasm32")]
pub type PlatformHost = WidgetSdkHost;
#[cfg(not(target_arch = "wasm32"))]
pub type PlatformHost = LocalHost;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum UserName {
    Plain(String),
    Structured {
        #[serde(rename = "fullName", default)]
        full_name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct RawUser {
    #[serde(default)]
    name: Option<UserName>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub name: String,
}

impl CurrentUser {
    /// Accepts `{ "name": "Ada" }` as well as `{ "name": { "fullName": "Ada" } }`.
    pub fn from_json(raw: &str) -> Result<Self, WidgetError> {
        let parsed: RawUser = serde_json::from_str(raw)?;
        let name = match parsed.name {
            Some(UserName::Plain(name)) => name,
            Some(UserName::Structured { full_name }) => full_name,
            None => String::new(),
        };
        let name = name.trim();
        Ok(Self {
            name: if name.is_empty() {
                "Unknown user".to_string()
            } else {
                name.to_string()
            },
        })
    }
}

/// Opaque host context. Kept as JSON; only permission derivation looks at it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostContext {
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    pub can_upload: bool,
    pub can_delete: bool,
}

impl Permissions {
    // Role lookup on the host context is not wired yet; the config decides.
    pub fn derive(_context: &HostContext, config: &WidgetConfig) -> Self {
        Self {
            can_upload: config.allow_upload,
            can_delete: config.allow_delete,
        }
    }
}

/// Result of `getContent`: `None` means nothing was ever stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoredContent {
    pub content: Option<String>,
}

/// A validated file ready to hand to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFile {
    pub name: String,
    pub mime: String,
    pub size: u64,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub url: String,
}

/// Notifications the host emits while a file uploads. There is no cancel handle.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Started { name: String },
    Progress { name: String, percent: f64 },
    Failed { name: String, message: String },
}

pub type UploadListener = Rc<dyn Fn(UploadEvent)>;

#[allow(async_fn_in_trait)]
pub trait HostBridge: Sized {
    async fn init(instance_id: &str) -> Result<Self, WidgetError>;
    async fn current_user(&self) -> Result<CurrentUser, WidgetError>;
    async fn context(&self) -> Result<HostContext, WidgetError>;
    async fn get_content(&self) -> Result<StoredContent, WidgetError>;
    /// Replaces the stored blob wholesale.
    async fn set_content(&self, content: String) -> Result<(), WidgetError>;
    async fn upload(
        &self,
        file: PendingFile,
        listener: UploadListener,
    ) -> Result<UploadedFile, WidgetError>;
}
