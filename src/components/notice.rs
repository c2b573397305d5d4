// Transient status line above the uploader.

use dioxus::prelude::*;

#[cfg(not(target_arch = "wasm32"))]
async fn delay_ms(ms: u32) {
    tokio::time::sleep(std::time::Duration::from_millis(ms as u64)).await;
}

#[cfg(target_arch = "wasm32")]
async fn delay_ms(ms: u32) {
    gloo_timers::future::TimeoutFuture::new(ms).await;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
    serial: u64,
}

#[derive(Clone, Copy, PartialEq)]
pub struct NoticeController {
    current: Signal<Option<Notice>>,
    serial: Signal<u64>,
    timeout_ms: Signal<u32>,
}

impl NoticeController {
    pub fn new(
        current: Signal<Option<Notice>>,
        serial: Signal<u64>,
        timeout_ms: Signal<u32>,
    ) -> Self {
        Self {
            current,
            serial,
            timeout_ms,
        }
    }

    fn show(&mut self, kind: NoticeKind, text: String) -> u64 {
        let serial = *self.serial.peek() + 1;
        self.serial.set(serial);
        self.current.set(Some(Notice { kind, text, serial }));
        serial
    }

    /// Errors stay until clicked or replaced.
    pub fn error(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::error!("{text}");
        self.show(NoticeKind::Error, text);
    }

    /// Success messages dismiss themselves after the configured interval.
    pub fn success(&mut self, text: impl Into<String>) {
        let serial = self.show(NoticeKind::Success, text.into());
        let timeout = *self.timeout_ms.peek();
        let mut current = self.current;
        spawn(async move {
            delay_ms(timeout).await;
            // A newer notice owns the slot now.
            let still_ours = current
                .peek()
                .as_ref()
                .map(|notice| notice.serial == serial)
                .unwrap_or(false);
            if still_ours {
                current.set(None);
            }
        });
    }

    pub fn clear(&mut self) {
        self.current.set(None);
    }

    pub fn current(&self) -> Option<Notice> {
        (self.current)()
    }
}

#[component]
pub fn NoticeBanner() -> Element {
    let mut notices = use_context::<NoticeController>();
    let Some(notice) = notices.current() else {
        return rsx! {};
    };
    let class = match notice.kind {
        NoticeKind::Error => "notice error",
        NoticeKind::Success => "notice success",
    };

    rsx! {
        div {
            class: "{class}",
            role: "status",
            title: "Dismiss",
            onclick: move |_| notices.clear(),
            "{notice.text}"
        }
    }
}
