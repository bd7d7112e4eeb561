use dioxus::prelude::*;

use crate::api::ModeData;

#[component]
pub fn ModeSelector(modes: Vec<ModeData>, selected: String, on_change: EventHandler<String>) -> Element {
    rsx! {
        div { class: "panel",
            h3 { "Visualization" }
            select {
                "aria-label": "Select visualization",
                value: "{selected}",
                onchange: move |evt: Event<FormData>| on_change.call(evt.value().to_string()),
                for m in modes {
                    option {
                        value: "{m.mode}",
                        selected: selected == m.mode,
                        "{m.label}"
                    }
                }
            }
        }
    }
}
