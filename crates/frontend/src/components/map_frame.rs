use dioxus::prelude::*;

use crate::api::{LayerData, RenderErrorData};

/// Rendered map, or an error panel in its place.
#[component]
pub fn MapFrame(
    layer: Option<LayerData>,
    error: Option<RenderErrorData>,
    on_retry: EventHandler<()>,
) -> Element {
    if let Some(err) = error {
        return rsx! {
            div { class: "map-error", role: "alert",
                h3 { "Layer unavailable" }
                p { "{err.message}" }
                if err.retryable {
                    button { onclick: move |_| on_retry.call(()), "Retry" }
                }
            }
        };
    }

    match layer {
        Some(layer) => rsx! {
            iframe {
                class: "map-frame",
                title: "{layer.layer_name}",
                key: "{layer.asset_reference}",
                width: "100%",
                height: "600",
                srcdoc: layer.html,
            }
        },
        None => rsx! {
            div { class: "map-placeholder", "Loading map..." }
        },
    }
}
