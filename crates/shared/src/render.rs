//! Narrow interfaces to the raster provider and the map renderer.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::{AssetReference, Resolution, ViewState, VisualizationSpec};

/// Tag on the map page's `postMessage` view reports.
pub const VIEW_MESSAGE_SOURCE: &str = "mangrove-map";

/// Outbound request to draw one layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRequest {
    pub asset: AssetReference,
    pub visualization: VisualizationSpec,
    pub view: ViewState,
    pub layer_name: String,
}

impl LayerRequest {
    pub fn new(resolution: &Resolution, view: ViewState) -> Self {
        Self {
            asset: resolution.asset.clone(),
            visualization: resolution.visualization.clone(),
            view,
            layer_name: resolution.layer_name.clone(),
        }
    }
}

/// Addressable raster layer returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerHandle {
    pub asset: AssetReference,
    /// XYZ tile template (`{z}/{x}/{y}` placeholders).
    pub tile_url: String,
    pub label: String,
}

/// Embeddable rendering of a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapView {
    pub html: String,
}

pub trait RasterProvider {
    /// Fails with `AssetUnavailable` for unknown or unauthorized assets.
    fn open(&self, asset: &AssetReference) -> Result<LayerHandle, CoreError>;
}

pub trait MapRenderer {
    fn render(
        &self,
        layer: &LayerHandle,
        visualization: &VisualizationSpec,
        view: &ViewState,
    ) -> Result<MapView, CoreError>;
}

/// Run one layer request through both collaborators. No retries here.
pub fn present_layer<P, R>(provider: &P, renderer: &R, request: &LayerRequest) -> Result<MapView, CoreError>
where
    P: RasterProvider + ?Sized,
    R: MapRenderer + ?Sized,
{
    let mut handle = provider.open(&request.asset).inspect_err(|err| {
        tracing::warn!(asset = %request.asset, %err, "raster provider could not serve asset");
    })?;
    handle.label = request.layer_name.clone();
    renderer
        .render(&handle, &request.visualization, &request.view)
        .inspect_err(|err| {
            tracing::warn!(asset = %request.asset, %err, "map renderer failed");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::models::{Mode, SelectorKey};
    use std::cell::Cell;

    struct FakeProvider {
        allow: bool,
        calls: Cell<u32>,
    }

    impl RasterProvider for FakeProvider {
        fn open(&self, asset: &AssetReference) -> Result<LayerHandle, CoreError> {
            self.calls.set(self.calls.get() + 1);
            if self.allow {
                Ok(LayerHandle {
                    asset: asset.clone(),
                    tile_url: format!("https://tiles.test/{}/{{z}}/{{x}}/{{y}}", asset),
                    label: String::new(),
                })
            } else {
                Err(CoreError::AssetUnavailable {
                    asset: asset.to_string(),
                    reason: "denied".into(),
                })
            }
        }
    }

    struct EchoRenderer;

    impl MapRenderer for EchoRenderer {
        fn render(
            &self,
            layer: &LayerHandle,
            visualization: &VisualizationSpec,
            view: &ViewState,
        ) -> Result<MapView, CoreError> {
            Ok(MapView {
                html: format!(
                    "{}|{}|{}..{}|z{}",
                    layer.label, layer.tile_url, visualization.min, visualization.max, view.zoom
                ),
            })
        }
    }

    fn request() -> LayerRequest {
        let catalog = Catalog::builtin();
        let r = catalog
            .resolver()
            .resolve(Mode::LandCover, SelectorKey::Year(2017))
            .unwrap();
        LayerRequest::new(&r, ViewState::default())
    }

    #[test]
    fn test_present_layer_passes_label_and_view() {
        let provider = FakeProvider {
            allow: true,
            calls: Cell::new(0),
        };
        let view = present_layer(&provider, &EchoRenderer, &request()).unwrap();
        assert!(view.html.starts_with("land_cover 2017|https://tiles.test/"));
        assert!(view.html.ends_with("|0..3|z8"));
    }

    #[test]
    fn test_present_layer_does_not_retry_unavailable_asset() {
        let provider = FakeProvider {
            allow: false,
            calls: Cell::new(0),
        };
        let err = present_layer(&provider, &EchoRenderer, &request()).unwrap_err();
        assert!(matches!(err, CoreError::AssetUnavailable { .. }));
        assert!(err.is_retryable());
        assert_eq!(provider.calls.get(), 1);
    }
}
