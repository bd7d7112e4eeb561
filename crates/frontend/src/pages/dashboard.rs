use dioxus::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

use crate::api::{self, DomainData, LayerData, LegendData, ModeData, RenderCycleData, RenderErrorData};
use crate::components::key_selector::KeySelector;
use crate::components::legend_panel::LegendPanel;
use crate::components::map_frame::MapFrame;
use crate::components::mode_selector::ModeSelector;

const SESSION_STORAGE_KEY: &str = "mangrove.session";

fn stored_session_id() -> Option<String> {
    let storage = web_sys::window()?.local_storage().ok()??;
    storage.get_item(SESSION_STORAGE_KEY).ok().flatten()
}

fn store_session_id(id: &str) {
    if let Some(Ok(Some(storage))) = web_sys::window().map(|w| w.local_storage()) {
        let _ = storage.set_item(SESSION_STORAGE_KEY, id);
    }
}

/// Orders overlapping requests. Only the answer to the newest ticket counts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest == ticket
    }
}

/// Every panel the backend can redraw.
#[derive(Clone, Copy)]
struct Panels {
    session_id: Signal<Option<String>>,
    mode: Signal<String>,
    domain: Signal<Option<DomainData>>,
    key: Signal<String>,
    legend: Signal<Option<LegendData>>,
    layer: Signal<Option<LayerData>>,
    error: Signal<Option<RenderErrorData>>,
    status: Signal<Option<String>>,
    requests: Signal<RequestSequence>,
}

impl Panels {
    fn issue(mut self) -> u64 {
        self.requests.write().issue()
    }

    /// Apply the answer to `ticket`, unless a newer request was issued since.
    fn settle(self, ticket: u64, result: Result<RenderCycleData, String>) {
        if !self.requests.peek().is_current(ticket) {
            return;
        }
        match result {
            Ok(cycle) => self.apply(cycle),
            Err(e) => self.fail(e),
        }
    }

    /// Apply one render cycle. Panels absent from the cycle are left alone.
    fn apply(mut self, cycle: RenderCycleData) {
        if self.session_id.peek().as_deref() != Some(cycle.session.id.as_str()) {
            store_session_id(&cycle.session.id);
            self.session_id.set(Some(cycle.session.id.clone()));
        }
        if let Some(mode) = cycle.session.mode {
            self.mode.set(mode);
        }
        if let Some(domain) = cycle.domain {
            self.key.set(domain.selected.clone().unwrap_or_default());
            self.domain.set(Some(domain));
        }
        if let Some(legend) = cycle.legend {
            self.legend.set(Some(legend));
        }
        match (cycle.layer, cycle.error) {
            (_, Some(err)) => {
                self.layer.set(None);
                self.error.set(Some(err));
            }
            (Some(layer), None) => {
                self.layer.set(Some(layer));
                self.error.set(None);
            }
            (None, None) => {}
        }
        self.status.set(None);
    }

    fn fail(mut self, message: String) {
        self.status.set(Some(message));
    }

    fn current_session(&self) -> Option<String> {
        (*self.session_id.peek()).clone()
    }
}

#[component]
pub fn Dashboard() -> Element {
    let modes_resource = use_resource(|| api::fetch_modes());

    let panels = Panels {
        session_id: use_signal(|| None::<String>),
        mode: use_signal(String::new),
        domain: use_signal(|| None::<DomainData>),
        key: use_signal(String::new),
        legend: use_signal(|| None::<LegendData>),
        layer: use_signal(|| None::<LayerData>),
        error: use_signal(|| None::<RenderErrorData>),
        status: use_signal(|| None::<String>),
        requests: use_signal(RequestSequence::default),
    };

    // Start or resume the session once
    use_hook(move || {
        let ticket = panels.issue();
        wasm_bindgen_futures::spawn_local(async move {
            let stored = stored_session_id();
            let result = api::start_session(stored.as_deref())
                .await
                .map_err(|e| format!("Failed to start session: {}", e));
            panels.settle(ticket, result);
        });
    });

    // Pan/zoom reports from the embedded map
    use_hook(move || {
        let on_message = Closure::<dyn FnMut(web_sys::MessageEvent)>::new(
            move |evt: web_sys::MessageEvent| {
                let Some(data) = evt.data().as_string() else {
                    return;
                };
                let Some(view) = api::parse_view_message(&data) else {
                    return;
                };
                let Some(id) = panels.current_session() else {
                    return;
                };
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = api::move_view(&id, &view).await {
                        panels.fail(format!("Failed to record view: {}", e));
                    }
                });
            },
        );
        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("message", on_message.as_ref().unchecked_ref());
        }
        // Listener lives as long as the page
        on_message.forget();
    });

    let on_mode_change = move |mode: String| {
        let Some(id) = panels.current_session() else {
            return;
        };
        let ticket = panels.issue();
        wasm_bindgen_futures::spawn_local(async move {
            panels.settle(ticket, api::select_mode(&id, &mode).await);
        });
    };

    let on_key_change = move |key: String| {
        let Some(id) = panels.current_session() else {
            return;
        };
        let mut key_signal = panels.key;
        key_signal.set(key.clone());
        let ticket = panels.issue();
        wasm_bindgen_futures::spawn_local(async move {
            panels.settle(ticket, api::select_key(&id, &key).await);
        });
    };

    let modes: Vec<ModeData> = match &*modes_resource.read() {
        Some(Ok(m)) => m.clone(),
        _ => vec![],
    };

    let current_mode = panels.mode.read().clone();
    let current_key = panels.key.read().clone();
    let domain = panels.domain.read().clone();
    let legend = panels.legend.read().clone();
    let layer = panels.layer.read().clone();
    let error = panels.error.read().clone();
    let status = panels.status.read().clone();
    let retry_key = current_key.clone();

    rsx! {
        div { class: "app",
            div { class: "header",
                h1 { "Mangrove Forest Visualization Dashboard" }
            }

            if let Some(message) = status {
                div { class: "status-error", role: "alert", "{message}" }
            }

            div { class: "layout",
                div { class: "sidebar",
                    ModeSelector {
                        modes: modes,
                        selected: current_mode,
                        on_change: on_mode_change,
                    }
                    KeySelector {
                        domain: domain,
                        selected: current_key,
                        on_change: on_key_change,
                    }
                    LegendPanel { legend: legend }
                }
                div { class: "map-container",
                    MapFrame {
                        layer: layer,
                        error: error,
                        on_retry: move |_| on_key_change(retry_key.clone()),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_newest_ticket_is_current() {
        let mut seq = RequestSequence::default();
        let first = seq.issue();
        let second = seq.issue();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }

    #[test]
    fn test_late_answer_to_older_request_is_refused() {
        let mut seq = RequestSequence::default();
        let mode_change = seq.issue();
        let key_change = seq.issue();
        // key answer lands first, then the mode answer straggles in
        assert!(seq.is_current(key_change));
        assert!(!seq.is_current(mode_change));
        let retry = seq.issue();
        assert!(!seq.is_current(key_change));
        assert!(seq.is_current(retry));
    }
}
