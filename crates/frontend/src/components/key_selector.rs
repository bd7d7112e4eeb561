use dioxus::prelude::*;

use crate::api::DomainData;

/// Year (land cover) or year pair (change detection) dropdown.
#[component]
pub fn KeySelector(domain: Option<DomainData>, selected: String, on_change: EventHandler<String>) -> Element {
    let Some(domain) = domain else {
        return rsx! {};
    };
    let title = if domain.mode == "CHANGE_DETECTION" { "Years" } else { "Year" };

    rsx! {
        div { class: "panel",
            h3 { "{title}" }
            select {
                "aria-label": "Select {title}",
                value: "{selected}",
                onchange: move |evt: Event<FormData>| on_change.call(evt.value().to_string()),
                for o in domain.options {
                    option {
                        value: "{o.key}",
                        selected: selected == o.key,
                        "{o.label}"
                    }
                }
            }
        }
    }
}
