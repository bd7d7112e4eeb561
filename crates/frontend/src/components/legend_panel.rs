use dioxus::prelude::*;

use crate::api::LegendData;

#[component]
pub fn LegendPanel(legend: Option<LegendData>) -> Element {
    let Some(legend) = legend else {
        return rsx! {};
    };

    rsx! {
        div { class: "panel legend",
            h3 { class: "legend-title", "{legend.title}" }
            for entry in legend.entries {
                div { class: "legend-item", key: "{entry.value}",
                    span {
                        class: "legend-swatch",
                        style: "background-color: {entry.color};",
                    }
                    span { "{entry.label}" }
                }
            }
        }
    }
}
