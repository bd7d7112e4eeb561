use crate::error::CoreError;
use crate::models::ViewState;

/// Holds the map camera. Only pan/zoom gestures write to it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewStateStore {
    current: ViewState,
}

impl ViewStateStore {
    pub fn new(initial: ViewState) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> ViewState {
        self.current
    }

    /// Record a user gesture. Invalid positions leave the store unchanged.
    pub fn apply_gesture(&mut self, lat: f64, lng: f64, zoom: u8) -> Result<ViewState, CoreError> {
        let next = ViewState::new(lat, lng, zoom)?;
        self.current = next;
        Ok(next)
    }
}
