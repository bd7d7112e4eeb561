//! Raster provider and map renderer backing the layer panel.
//!
//! The provider maps an asset reference onto a tile endpoint. The renderer
//! produces a standalone Leaflet page for the dashboard iframe. That page
//! reports pan/zoom gestures to its parent window with `postMessage`.

use mangrove_shared::error::CoreError;
use mangrove_shared::models::{AssetReference, ViewState, VisualizationSpec};
use mangrove_shared::render::{
    present_layer, LayerHandle, LayerRequest, MapRenderer, MapView, RasterProvider,
    VIEW_MESSAGE_SOURCE,
};

use crate::config::Config;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";

pub struct TileRasterProvider {
    tile_url_template: String,
    asset_prefix: String,
}

impl TileRasterProvider {
    pub fn new(tile_url_template: impl Into<String>, asset_prefix: impl Into<String>) -> Self {
        Self {
            tile_url_template: tile_url_template.into(),
            asset_prefix: asset_prefix.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.tile_url_template, &config.asset_prefix)
    }
}

impl RasterProvider for TileRasterProvider {
    fn open(&self, asset: &AssetReference) -> Result<LayerHandle, CoreError> {
        let unavailable = |reason: &str| CoreError::AssetUnavailable {
            asset: asset.to_string(),
            reason: reason.to_string(),
        };
        let name = asset.as_str();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(unavailable("malformed asset reference"));
        }
        if !name.starts_with(&self.asset_prefix) {
            return Err(unavailable("asset is outside the authorized project"));
        }
        Ok(LayerHandle {
            asset: asset.clone(),
            tile_url: self.tile_url_template.replace("{asset}", name),
            label: name.to_string(),
        })
    }
}

pub struct LeafletRenderer {
    basemap_url: String,
}

impl LeafletRenderer {
    pub fn new(basemap_url: impl Into<String>) -> Self {
        Self {
            basemap_url: basemap_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.basemap_url)
    }
}

/// Both collaborators, shared by all resolvers.
pub struct Presenter {
    provider: Box<dyn RasterProvider + Send + Sync>,
    renderer: Box<dyn MapRenderer + Send + Sync>,
}

impl Presenter {
    pub fn new(
        provider: impl RasterProvider + Send + Sync + 'static,
        renderer: impl MapRenderer + Send + Sync + 'static,
    ) -> Self {
        Self {
            provider: Box::new(provider),
            renderer: Box::new(renderer),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            TileRasterProvider::from_config(config),
            LeafletRenderer::from_config(config),
        )
    }

    pub fn present(&self, request: &LayerRequest) -> Result<MapView, CoreError> {
        present_layer(&*self.provider, &*self.renderer, request)
    }
}

/// Append min/max/palette to a tile template as query parameters.
pub fn styled_tile_url(tile_url: &str, vis: &VisualizationSpec) -> String {
    let palette = vis
        .palette
        .iter()
        .map(|c| c.trim_start_matches('#'))
        .collect::<Vec<_>>()
        .join(",");
    let sep = if tile_url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}min={}&max={}&palette={}",
        tile_url, sep, vis.min, vis.max, palette
    )
}

/// JSON string literal that is also safe inside a `<script>` element.
fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string())
        .to_string()
        .replace('<', "\\u003c")
}

impl MapRenderer for LeafletRenderer {
    fn render(
        &self,
        layer: &LayerHandle,
        visualization: &VisualizationSpec,
        view: &ViewState,
    ) -> Result<MapView, CoreError> {
        if layer.tile_url.is_empty() {
            return Err(CoreError::Render("layer has no tile endpoint".to_string()));
        }
        let overlay_url = styled_tile_url(&layer.tile_url, visualization);
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="{css}">
<script src="{js}"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }}</style>
</head>
<body>
<div id="map"></div>
<script>
var map = L.map('map').setView([{lat}, {lng}], {zoom});
var basemap = L.tileLayer({basemap}, {{ maxZoom: 22, attribution: 'Esri World Imagery' }}).addTo(map);
var overlay = L.tileLayer({overlay}, {{ maxZoom: 22 }}).addTo(map);
var overlays = {{}};
overlays[{label}] = overlay;
L.control.layers({{ 'Satellite': basemap }}, overlays).addTo(map);
map.on('moveend', function () {{
  var c = map.getCenter().wrap();
  window.parent.postMessage(JSON.stringify({{ source: {source}, lat: c.lat, lng: c.lng, zoom: map.getZoom() }}), '*');
}});
</script>
</body>
</html>"#,
            title = html_escape::encode_text(&layer.label),
            css = LEAFLET_CSS,
            js = LEAFLET_JS,
            lat = view.center.lat,
            lng = view.center.lng,
            zoom = view.zoom,
            basemap = js_string(&self.basemap_url),
            overlay = js_string(&overlay_url),
            label = js_string(&layer.label),
            source = js_string(VIEW_MESSAGE_SOURCE),
        );
        Ok(MapView { html })
    }
}
