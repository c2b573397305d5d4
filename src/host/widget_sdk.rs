// Browser host: talks to the `widgetSDK` global the embedding page injects.

use super::*;
use js_sys::{Array, Function, Object, Promise, Reflect, Uint8Array, JSON};
use std::cell::RefCell;
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{File, FilePropertyBag};

#[wasm_bindgen::prelude::wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["widgetSDK", "api"], js_name = init, catch)]
    fn sdk_init(instance_id: &str) -> Result<JsValue, JsValue>;
}

pub struct WidgetSdkHost {
    api: JsValue,
}

fn describe(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Ok(message) = Reflect::get(value, &"message".into()) {
        if let Some(text) = message.as_string() {
            return text;
        }
    }
    JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
        .unwrap_or_else(|| "unknown host error".to_string())
}

/// Await the value if the SDK handed back a promise.
async fn settle(value: JsValue) -> Result<JsValue, JsValue> {
    match value.dyn_into::<Promise>() {
        Ok(promise) => JsFuture::from(promise).await,
        Err(value) => Ok(value),
    }
}

fn to_json(value: &JsValue) -> Option<String> {
    if value.is_null() || value.is_undefined() {
        return None;
    }
    JSON::stringify(value).ok().and_then(|s| s.as_string())
}

impl WidgetSdkHost {
    async fn call(&self, method: &str, args: &Array) -> Result<JsValue, String> {
        let function = Reflect::get(&self.api, &method.into())
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| format!("host api has no `{method}`"))?;
        let returned = function.apply(&self.api, args).map_err(|e| describe(&e))?;
        settle(returned).await.map_err(|e| describe(&e))
    }

    fn browser_file(file: &PendingFile) -> Result<File, String> {
        let bytes = Uint8Array::from(file.bytes.as_slice());
        let parts = Array::of1(&bytes);
        let options = FilePropertyBag::new();
        options.set_type(&file.mime);
        File::new_with_u8_array_sequence_and_options(&parts, &file.name, &options)
            .map_err(|e| describe(&e))
    }
}

impl HostBridge for WidgetSdkHost {
    async fn init(instance_id: &str) -> Result<Self, WidgetError> {
        let pending = sdk_init(instance_id).map_err(|e| WidgetError::Initialization(describe(&e)))?;
        let api = settle(pending)
            .await
            .map_err(|e| WidgetError::Initialization(describe(&e)))?;
        if api.is_null() || api.is_undefined() {
            return Err(WidgetError::Initialization(
                "widgetSDK.api.init returned nothing".to_string(),
            ));
        }
        Ok(Self { api })
    }

    async fn current_user(&self) -> Result<CurrentUser, WidgetError> {
        let user = self
            .call("getCurrentUser", &Array::new())
            .await
            .map_err(WidgetError::Initialization)?;
        let raw = to_json(&user).unwrap_or_else(|| "{}".to_string());
        CurrentUser::from_json(&raw)
    }

    async fn context(&self) -> Result<HostContext, WidgetError> {
        let context = self
            .call("getContext", &Array::new())
            .await
            .map_err(WidgetError::Initialization)?;
        let raw = match to_json(&context) {
            Some(json) => serde_json::from_str(&json)?,
            None => serde_json::Value::Null,
        };
        Ok(HostContext { raw })
    }

    async fn get_content(&self) -> Result<StoredContent, WidgetError> {
        let response = self
            .call("getContent", &Array::new())
            .await
            .map_err(WidgetError::Persistence)?;
        if response.is_null() || response.is_undefined() {
            return Ok(StoredContent::default());
        }
        let content = Reflect::get(&response, &"content".into())
            .ok()
            .and_then(|value| value.as_string());
        Ok(StoredContent { content })
    }

    async fn set_content(&self, content: String) -> Result<(), WidgetError> {
        self.call("setContent", &Array::of1(&JsValue::from_str(&content)))
            .await
            .map(|_| ())
            .map_err(WidgetError::Persistence)
    }

    async fn upload(
        &self,
        file: PendingFile,
        listener: UploadListener,
    ) -> Result<UploadedFile, WidgetError> {
        let name = file.name.clone();
        let browser_file = Self::browser_file(&file).map_err(WidgetError::UploadFailure)?;
        let reported_error: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));

        let start_cb = {
            let listener = listener.clone();
            let name = name.clone();
            Closure::wrap(Box::new(move |_entry: JsValue| {
                listener(UploadEvent::Started { name: name.clone() });
            }) as Box<dyn FnMut(JsValue)>)
        };
        let progress_cb = {
            let listener = listener.clone();
            let name = name.clone();
            Closure::wrap(Box::new(move |entry: JsValue| {
                let percent = Reflect::get(&entry, &"uploadProgress".into())
                    .ok()
                    .and_then(|value| value.as_f64())
                    .unwrap_or(0.0);
                listener(UploadEvent::Progress {
                    name: name.clone(),
                    percent,
                });
            }) as Box<dyn FnMut(JsValue)>)
        };
        let error_cb = {
            let listener = listener.clone();
            let name = name.clone();
            let reported_error = reported_error.clone();
            Closure::wrap(Box::new(move |_id: JsValue, error: JsValue| {
                let message = describe(&error);
                *reported_error.borrow_mut() = Some(message.clone());
                listener(UploadEvent::Failed {
                    name: name.clone(),
                    message,
                });
            }) as Box<dyn FnMut(JsValue, JsValue)>)
        };

        let request = Object::new();
        let set = |key: &str, value: &JsValue| {
            Reflect::set(&request, &key.into(), value).map_err(|e| describe(&e))
        };
        set("files", &Array::of1(&browser_file))
            .and_then(|_| set("startUpload", start_cb.as_ref()))
            .and_then(|_| set("updateUploadProgress", progress_cb.as_ref()))
            .and_then(|_| set("onUploadError", error_cb.as_ref()))
            .map_err(WidgetError::UploadFailure)?;

        // Closures stay alive until the call settles, then drop with this frame.
        let result = self.call("uploadImage", &Array::of1(&request)).await;

        if let Some(message) = reported_error.borrow_mut().take() {
            return Err(WidgetError::UploadFailure(format!("{name}: {message}")));
        }
        let response = result.map_err(|e| WidgetError::UploadFailure(format!("{name}: {e}")))?;
        let url = Reflect::get(&response, &"url".into())
            .ok()
            .and_then(|value| value.as_string())
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| WidgetError::UploadFailure(format!("{name}: host returned no url")))?;

        drop((start_cb, progress_cb, error_cb));
        Ok(UploadedFile { url })
    }
}
