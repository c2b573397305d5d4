//! Commands for the `<audio>` element each track view renders.
//! Browser builds go through web-sys; desktop builds script the webview.

#[cfg(not(target_arch = "wasm32"))]
use dioxus::prelude::*;
use serde::Deserialize;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use web_sys::{window, HtmlAudioElement};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MediaPosition {
    pub current_time: f64,
    pub duration: f64,
}

#[cfg(target_arch = "wasm32")]
fn audio_element(dom_id: &str) -> Option<HtmlAudioElement> {
    let document = window()?.document()?;
    document
        .get_element_by_id(dom_id)?
        .dyn_into::<HtmlAudioElement>()
        .ok()
}

/// Start playback and wait for the browser to accept it.
#[cfg(target_arch = "wasm32")]
pub async fn start(dom_id: &str) -> Result<(), String> {
    let audio = audio_element(dom_id).ok_or_else(|| format!("no media element #{dom_id}"))?;
    if !audio.paused() {
        return Ok(());
    }
    let promise = audio.play().map_err(|e| format!("{e:?}"))?;
    wasm_bindgen_futures::JsFuture::from(promise)
        .await
        .map(|_| ())
        .map_err(|e| e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

#[cfg(target_arch = "wasm32")]
pub fn halt(dom_id: &str) {
    if let Some(audio) = audio_element(dom_id) {
        if !audio.paused() {
            let _ = audio.pause();
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub fn seek(dom_id: &str, position: f64) {
    if let Some(audio) = audio_element(dom_id) {
        audio.set_current_time(position.max(0.0));
    }
}

#[cfg(target_arch = "wasm32")]
pub async fn position(dom_id: &str) -> Option<MediaPosition> {
    let audio = audio_element(dom_id)?;
    let duration = audio.duration();
    Some(MediaPosition {
        current_time: audio.current_time(),
        duration: if duration.is_nan() { 0.0 } else { duration },
    })
}

#[cfg(not(target_arch = "wasm32"))]
fn element_script(dom_id: &str, body: &str) -> String {
    let id = serde_json::to_string(dom_id).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        r#"return (async function () {{
            const audio = document.getElementById({id});
            if (!audio) return null;
            {body}
        }})();"#
    )
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn start(dom_id: &str) -> Result<(), String> {
    let script = element_script(
        dom_id,
        r#"if (!audio.paused) return "";
            try {
              await audio.play();
              return "";
            } catch (err) {
              return String((err && err.message) || err || "playback failed");
            }"#,
    );
    match document::eval(&script).join::<Option<String>>().await {
        Ok(Some(message)) if message.is_empty() => Ok(()),
        Ok(Some(message)) => Err(message),
        Ok(None) => Err(format!("no media element #{dom_id}")),
        Err(err) => Err(err.to_string()),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn halt(dom_id: &str) {
    let _ = document::eval(&element_script(
        dom_id,
        "if (!audio.paused) audio.pause(); return true;",
    ));
}

#[cfg(not(target_arch = "wasm32"))]
pub fn seek(dom_id: &str, position: f64) {
    let position = if position.is_finite() { position.max(0.0) } else { 0.0 };
    let _ = document::eval(&element_script(
        dom_id,
        &format!("audio.currentTime = {position}; return true;"),
    ));
}

#[cfg(not(target_arch = "wasm32"))]
pub async fn position(dom_id: &str) -> Option<MediaPosition> {
    let script = element_script(
        dom_id,
        r#"const duration = Number.isFinite(audio.duration) ? audio.duration : 0;
            return { current_time: audio.currentTime || 0, duration };"#,
    );
    document::eval(&script)
        .join::<Option<MediaPosition>>()
        .await
        .ok()
        .flatten()
}
