use crate::components::Icon;
use crate::config::WidgetConfig;
use crate::library::format_file_size;
use dioxus::html::{FileData, HasFileData};
use dioxus::prelude::*;

/// Drop zone plus hidden file picker. Hands every picked or dropped file to the shell.
#[component]
pub fn Uploader(
    is_uploading: bool,
    can_upload: bool,
    progress: Option<f64>,
    on_files: EventHandler<Vec<FileData>>,
) -> Element {
    let config = use_context::<Signal<WidgetConfig>>();
    let mut drag_over = use_signal(|| false);

    let accept_files = move |files: Vec<FileData>| {
        if !can_upload || is_uploading || files.is_empty() {
            return;
        }
        on_files.call(files);
    };

    if !can_upload {
        return rsx! {
            div { class: "upload-section disabled",
                Icon { name: "alert".to_string(), class: "upload-icon".to_string() }
                div { class: "upload-text", "Upload not available" }
                div { class: "upload-hint", "You don't have permission to upload files" }
            }
        };
    }

    let limit_label = format_file_size(config().max_upload_bytes);
    let headline = match (is_uploading, progress) {
        (true, Some(percent)) => format!("Uploading... {}%", percent.round() as u32),
        (true, None) => "Uploading...".to_string(),
        (false, _) => "Upload Audio Files".to_string(),
    };
    let zone_class = match (drag_over(), is_uploading) {
        (_, true) => "upload-section busy",
        (true, false) => "upload-section dragover",
        (false, false) => "upload-section",
    };

    rsx! {
        label {
            class: "{zone_class}",
            ondragover: move |evt: DragEvent| {
                evt.prevent_default();
                drag_over.set(true);
            },
            ondragleave: move |evt: DragEvent| {
                evt.prevent_default();
                drag_over.set(false);
            },
            ondrop: move |evt: DragEvent| {
                evt.prevent_default();
                drag_over.set(false);
                accept_files(evt.files());
            },
            Icon { name: "upload".to_string(), class: "upload-icon".to_string() }
            div { class: "upload-text", "{headline}" }
            div { class: "upload-hint",
                "Drag and drop audio files here, or click to browse"
                br {}
                "Supported formats: MP3, WAV, OGG, M4A (Max {limit_label})"
            }
            input {
                class: "file-input",
                r#type: "file",
                accept: "audio/*",
                multiple: true,
                disabled: is_uploading,
                onchange: move |evt: FormEvent| accept_files(evt.files()),
            }
        }
    }
}
