use dioxus::prelude::*;

mod components;
mod config;
mod db;
mod error;
mod host;
mod library;
mod logging;
mod playback;

use components::WidgetShell;

const WIDGET_CSS: Asset = asset!("/assets/styling/widget.css");

fn main() {
    logging::init_logging();
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    rsx! {
        document::Meta { name: "theme-color", content: "#6366f1" }
        document::Stylesheet { href: WIDGET_CSS }

        WidgetShell {}
    }
}
