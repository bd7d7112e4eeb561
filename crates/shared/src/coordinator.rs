//! Selection state machine.
//!
//! ```text
//! Idle --start--> ModeSelected(LandCover) --resolve default--> Resolved
//! Resolved --mode change--> ModeSelected(new) --resolve default--> Resolved
//! Resolved --key change--> Resolved (layer only)
//! ```
//!
//! Each event is handled to completion and returns the render instructions
//! for that cycle. Resolution failures become a `LayerError` instruction and
//! leave the machine in `ModeSelected`, whose replay repeats the error panel.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::catalog::Catalog;
use crate::domain::SelectorDomain;
use crate::error::{CoreError, ErrorKind};
use crate::models::{LegendSpec, Mode, Resolution, SelectorKey, SessionSnapshot, ViewState};
use crate::render::LayerRequest;
use crate::view::ViewStateStore;

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorState {
    Idle,
    ModeSelected {
        mode: Mode,
    },
    Resolved {
        mode: Mode,
        key: SelectorKey,
        resolution: Resolution,
    },
}

impl CoordinatorState {
    pub fn mode(&self) -> Option<Mode> {
        match self {
            CoordinatorState::Idle => None,
            CoordinatorState::ModeSelected { mode } | CoordinatorState::Resolved { mode, .. } => {
                Some(*mode)
            }
        }
    }

    pub fn key(&self) -> Option<SelectorKey> {
        match self {
            CoordinatorState::Resolved { key, .. } => Some(*key),
            _ => None,
        }
    }
}

/// Inbound UI events.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    ModeChanged(Mode),
    SelectorChanged(SelectorKey),
    ViewStateChanged { lat: f64, lng: f64, zoom: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl From<&CoreError> for RenderFailure {
    fn from(err: &CoreError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

impl RenderFailure {
    /// Panel for a mode whose last selection did not resolve.
    fn no_layer(mode: Mode) -> Self {
        Self {
            kind: ErrorKind::UnknownSelectorKey,
            message: format!("no layer selected for mode {}", mode),
            retryable: false,
        }
    }
}

/// Outbound instructions, in the order they should be applied.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderInstruction {
    /// Repopulate the secondary dropdown.
    Domain {
        domain: SelectorDomain,
        selected: Option<SelectorKey>,
    },
    Legend(LegendSpec),
    Layer(LayerRequest),
    /// Replace the map with an explicit error panel.
    LayerError(RenderFailure),
}

pub struct RenderCoordinator {
    catalog: Arc<Catalog>,
    state: CoordinatorState,
    view: ViewStateStore,
}

impl RenderCoordinator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_view(catalog, ViewState::default())
    }

    pub fn with_view(catalog: Arc<Catalog>, view: ViewState) -> Self {
        Self {
            catalog,
            state: CoordinatorState::Idle,
            view: ViewStateStore::new(view),
        }
    }

    /// Rebuild from a snapshot without emitting anything.
    pub fn restore(catalog: Arc<Catalog>, snapshot: &SessionSnapshot) -> Self {
        let mut c = Self::with_view(catalog, snapshot.view);
        c.state = match (snapshot.mode, snapshot.key) {
            (None, _) => CoordinatorState::Idle,
            (Some(mode), None) => CoordinatorState::ModeSelected { mode },
            (Some(mode), Some(key)) => match c.catalog.resolver().resolve(mode, key) {
                Ok(resolution) => CoordinatorState::Resolved {
                    mode,
                    key,
                    resolution,
                },
                Err(err) => {
                    warn!(%mode, %key, %err, "stored selection no longer resolves");
                    CoordinatorState::ModeSelected { mode }
                }
            },
        };
        c
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.state.mode(),
            key: self.state.key(),
            view: self.view.current(),
        }
    }

    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    pub fn view(&self) -> ViewState {
        self.view.current()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Initial load. From any state other than `Idle` this replays the
    /// current screen instead.
    pub fn start(&mut self) -> Vec<RenderInstruction> {
        if self.state == CoordinatorState::Idle {
            self.enter_mode(Mode::LandCover)
        } else {
            self.replay()
        }
    }

    pub fn handle(&mut self, event: UiEvent) -> Vec<RenderInstruction> {
        match event {
            UiEvent::ModeChanged(mode) => self.on_mode_changed(mode),
            UiEvent::SelectorChanged(key) => self.on_selector_changed(key),
            UiEvent::ViewStateChanged { lat, lng, zoom } => {
                if let Err(err) = self.on_view_state_changed(lat, lng, zoom) {
                    warn!(%err, "ignoring view change");
                }
                Vec::new()
            }
        }
    }

    pub fn on_mode_changed(&mut self, mode: Mode) -> Vec<RenderInstruction> {
        self.enter_mode(mode)
    }

    pub fn on_selector_changed(&mut self, key: SelectorKey) -> Vec<RenderInstruction> {
        let mut out = Vec::new();
        let mode = match self.state.mode() {
            Some(mode) => mode,
            None => {
                out.extend(self.start());
                Mode::LandCover
            }
        };
        out.extend(self.select(mode, key));
        out
    }

    /// Raw dropdown value. Malformed input is handled like an unknown key.
    pub fn on_selector_input(&mut self, raw: &str) -> Vec<RenderInstruction> {
        match raw.parse::<SelectorKey>() {
            Ok(key) => self.on_selector_changed(key),
            Err(_) => {
                let mut out = Vec::new();
                let mode = match self.state.mode() {
                    Some(mode) => mode,
                    None => {
                        out.extend(self.start());
                        Mode::LandCover
                    }
                };
                self.state = CoordinatorState::ModeSelected { mode };
                out.push(self.failure(CoreError::UnknownSelectorKey {
                    mode,
                    key: raw.to_string(),
                }));
                out
            }
        }
    }

    /// Only writer of the view. Emits nothing; the next layer picks it up.
    pub fn on_view_state_changed(&mut self, lat: f64, lng: f64, zoom: u8) -> Result<ViewState, CoreError> {
        self.view.apply_gesture(lat, lng, zoom)
    }

    /// Full redraw of the current state.
    pub fn replay(&mut self) -> Vec<RenderInstruction> {
        let current = match &self.state {
            CoordinatorState::Idle => None,
            CoordinatorState::ModeSelected { mode } => Some((
                *mode,
                None,
                RenderInstruction::LayerError(RenderFailure::no_layer(*mode)),
            )),
            CoordinatorState::Resolved {
                mode,
                key,
                resolution,
            } => Some((
                *mode,
                Some(*key),
                RenderInstruction::Layer(LayerRequest::new(resolution, self.view.current())),
            )),
        };
        let Some((mode, selected, layer)) = current else {
            return self.start();
        };
        let mut out = vec![RenderInstruction::Domain {
            domain: self.catalog.domains().domain_for(mode),
            selected,
        }];
        out.extend(self.legend_for(mode));
        out.push(layer);
        out
    }

    fn enter_mode(&mut self, mode: Mode) -> Vec<RenderInstruction> {
        debug!(%mode, "mode selected");
        self.state = CoordinatorState::ModeSelected { mode };

        let domain = self.catalog.domains().domain_for(mode);
        let default = domain.default;
        let mut out = vec![RenderInstruction::Domain {
            domain,
            selected: Some(default),
        }];
        out.extend(self.legend_for(mode));
        out.extend(self.select(mode, default));
        out
    }

    fn select(&mut self, mode: Mode, key: SelectorKey) -> Vec<RenderInstruction> {
        match self.catalog.resolver().resolve(mode, key) {
            Ok(resolution) => {
                debug!(%mode, %key, asset = %resolution.asset, "selection resolved");
                let request = LayerRequest::new(&resolution, self.view.current());
                self.state = CoordinatorState::Resolved {
                    mode,
                    key,
                    resolution,
                };
                vec![RenderInstruction::Layer(request)]
            }
            Err(err) => {
                self.state = CoordinatorState::ModeSelected { mode };
                vec![self.failure(err)]
            }
        }
    }

    fn legend_for(&self, mode: Mode) -> Option<RenderInstruction> {
        match self.catalog.visuals().legend(mode) {
            Ok(legend) => Some(RenderInstruction::Legend(legend.clone())),
            Err(err) => {
                error!(%mode, %err, "no legend configured for mode");
                None
            }
        }
    }

    fn failure(&self, err: CoreError) -> RenderInstruction {
        match &err {
            CoreError::UnknownSelectorKey { mode, key } => {
                error!(%mode, key = %key, "selector key missing from catalog; domain and catalog out of sync");
            }
            _ => warn!(%err, "layer could not be resolved"),
        }
        RenderInstruction::LayerError(RenderFailure::from(&err))
    }
}
