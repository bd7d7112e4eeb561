use serde::{Deserialize, Serialize};
use std::str::FromStr;
#[cfg(feature = "uuid-support")]
use uuid::Uuid;

use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    LandCover,
    ChangeDetection,
}

impl Mode {
    /// Both modes in dropdown order.
    pub const ALL: [Mode; 2] = [Mode::LandCover, Mode::ChangeDetection];

    /// Wire identifier, also used in layer names.
    pub fn id(&self) -> &'static str {
        match self {
            Mode::LandCover => "land_cover",
            Mode::ChangeDetection => "change_detection",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mode::LandCover => "Land Cover",
            Mode::ChangeDetection => "Change Detection",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Mode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "land_cover" => Ok(Mode::LandCover),
            "change_detection" => Ok(Mode::ChangeDetection),
            other => Err(CoreError::UnsupportedMode(other.to_string())),
        }
    }
}

/// Secondary selection within a mode.
///
/// The textual form is unambiguous (`"2017"` vs `"2017_2018"`), so keys
/// parse without knowing the mode and serialize as plain strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SelectorKey {
    /// A single classification year (land cover).
    Year(u16),
    /// Consecutive start/end years (change detection).
    YearPair(u16, u16),
}

impl SelectorKey {
    /// Pair starting at `start`, or `None` when the end year does not fit.
    pub fn year_pair(start: u16) -> Option<Self> {
        start.checked_add(1).map(|end| SelectorKey::YearPair(start, end))
    }

    /// The mode whose key space this key belongs to.
    pub fn mode(&self) -> Mode {
        match self {
            SelectorKey::Year(_) => Mode::LandCover,
            SelectorKey::YearPair(_, _) => Mode::ChangeDetection,
        }
    }

    /// Dropdown label, e.g. "Year 2017" or "Change 2017 to 2018".
    pub fn label(&self) -> String {
        match self {
            SelectorKey::Year(y) => format!("Year {}", y),
            SelectorKey::YearPair(a, b) => format!("Change {} to {}", a, b),
        }
    }

    /// Parse raw dropdown input for `mode`. Malformed input is reported the
    /// same way as a well-formed key missing from the catalog.
    pub fn parse_for(mode: Mode, raw: &str) -> Result<Self, CoreError> {
        raw.parse().map_err(|_| CoreError::UnknownSelectorKey {
            mode,
            key: raw.to_string(),
        })
    }
}

impl std::fmt::Display for SelectorKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectorKey::Year(y) => write!(f, "{}", y),
            SelectorKey::YearPair(a, b) => write!(f, "{}_{}", a, b),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed selector key: {0:?}")]
pub struct ParseKeyError(pub String);

impl FromStr for SelectorKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseKeyError(s.to_string());
        match s.split_once('_') {
            Some((a, b)) => {
                let a = a.parse::<u16>().map_err(|_| bad())?;
                let b = b.parse::<u16>().map_err(|_| bad())?;
                Ok(SelectorKey::YearPair(a, b))
            }
            None => s
                .parse::<u16>()
                .map(SelectorKey::Year)
                .map_err(|_| bad()),
        }
    }
}

impl TryFrom<String> for SelectorKey {
    type Error = ParseKeyError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SelectorKey> for String {
    fn from(k: SelectorKey) -> Self {
        k.to_string()
    }
}

/// Opaque name of a precomputed raster resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetReference(String);

impl AssetReference {
    pub fn new(reference: impl Into<String>) -> Self {
        AssetReference(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AssetReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How palette entries relate to raster values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteMapping {
    /// Entry `i` colors class value `min + i`.
    Direct,
    /// The palette is spread evenly across `min..=max`.
    #[default]
    Stretched,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizationSpec {
    pub min: i32,
    pub max: i32,
    pub palette: Vec<String>,
    #[serde(default)]
    pub mapping: PaletteMapping,
}

impl VisualizationSpec {
    /// Number of palette entries a direct mapping needs, or `None` when
    /// `min..=max` is too wide to count in an `i32`.
    pub fn class_count(&self) -> Option<usize> {
        let span = self.max.checked_sub(self.min)?.checked_add(1)?;
        usize::try_from(span.max(0)).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
    /// Raster class value this entry describes.
    pub value: i32,
}

/// Ordered label/color pairs. Pairing is structural; the parallel views
/// below always have equal length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegendSpec {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

impl LegendSpec {
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn colors(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.color.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub const MAX_ZOOM: u8 = 22;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Map camera position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub center: LatLng,
    pub zoom: u8,
}

impl ViewState {
    pub fn new(lat: f64, lng: f64, zoom: u8) -> Result<Self, CoreError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoreError::InvalidViewState(format!(
                "latitude {} outside [-90, 90]",
                lat
            )));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoreError::InvalidViewState(format!(
                "longitude {} outside [-180, 180]",
                lng
            )));
        }
        if zoom > MAX_ZOOM {
            return Err(CoreError::InvalidViewState(format!(
                "zoom {} above {}",
                zoom, MAX_ZOOM
            )));
        }
        Ok(ViewState {
            center: LatLng { lat, lng },
            zoom,
        })
    }
}

impl Default for ViewState {
    /// Teknaf peninsula, where the classified scenes are.
    fn default() -> Self {
        ViewState {
            center: LatLng {
                lat: 20.791193,
                lng: 92.317565,
            },
            zoom: 8,
        }
    }
}

/// Everything a layer render needs, derived from one (mode, key) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub asset: AssetReference,
    pub visualization: VisualizationSpec,
    pub legend: LegendSpec,
    pub layer_name: String,
}

/// Persistable coordinator state: the current selection plus the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub mode: Option<Mode>,
    pub key: Option<SelectorKey>,
    pub view: ViewState,
}

#[cfg(feature = "uuid-support")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub snapshot: SessionSnapshot,
    pub created_at: String,
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trips_through_id() {
        for mode in Mode::ALL {
            assert_eq!(mode.id().parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_unknown_mode_is_unsupported() {
        let err = "ndvi".parse::<Mode>().unwrap_err();
        assert_eq!(err, CoreError::UnsupportedMode("ndvi".to_string()));
    }

    #[test]
    fn test_selector_key_parses_both_shapes() {
        assert_eq!("2017".parse::<SelectorKey>().unwrap(), SelectorKey::Year(2017));
        assert_eq!(
            "2017_2018".parse::<SelectorKey>().unwrap(),
            SelectorKey::YearPair(2017, 2018)
        );
        assert!("2017-2018".parse::<SelectorKey>().is_err());
        assert!("".parse::<SelectorKey>().is_err());
        assert!("abc_2018".parse::<SelectorKey>().is_err());
    }

    #[test]
    fn test_selector_key_display_matches_wire_format() {
        assert_eq!(SelectorKey::year_pair(2013).unwrap().to_string(), "2013_2014");
        assert_eq!(SelectorKey::Year(2024).to_string(), "2024");
    }

    #[test]
    fn test_selector_key_labels() {
        assert_eq!(SelectorKey::Year(2017).label(), "Year 2017");
        assert_eq!(SelectorKey::year_pair(2017).unwrap().label(), "Change 2017 to 2018");
    }

    #[test]
    fn test_selector_key_spaces_are_disjoint() {
        assert_eq!(SelectorKey::Year(2017).mode(), Mode::LandCover);
        assert_eq!(SelectorKey::year_pair(2017).unwrap().mode(), Mode::ChangeDetection);
    }

    #[test]
    fn test_selector_key_serializes_as_string() {
        let json = serde_json::to_string(&SelectorKey::year_pair(2020).unwrap()).unwrap();
        assert_eq!(json, "\"2020_2021\"");
        let back: SelectorKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SelectorKey::year_pair(2020).unwrap());
    }

    #[test]
    fn test_parse_for_reports_unknown_key_with_mode() {
        let err = SelectorKey::parse_for(Mode::ChangeDetection, "soon").unwrap_err();
        assert_eq!(
            err,
            CoreError::UnknownSelectorKey {
                mode: Mode::ChangeDetection,
                key: "soon".to_string()
            }
        );
    }

    #[test]
    fn test_view_state_rejects_out_of_range() {
        assert!(ViewState::new(91.0, 0.0, 5).is_err());
        assert!(ViewState::new(0.0, -181.0, 5).is_err());
        assert!(ViewState::new(0.0, 0.0, MAX_ZOOM + 1).is_err());
        assert!(ViewState::new(20.0, 92.0, 12).is_ok());
    }

    #[test]
    fn test_default_view_state() {
        let v = ViewState::default();
        assert!((v.center.lat - 20.791193).abs() < 1e-9);
        assert!((v.center.lng - 92.317565).abs() < 1e-9);
        assert_eq!(v.zoom, 8);
    }

    #[test]
    fn test_class_count() {
        let vis = VisualizationSpec {
            min: 0,
            max: 3,
            palette: vec![],
            mapping: PaletteMapping::Direct,
        };
        assert_eq!(vis.class_count(), Some(4));
    }

    #[test]
    fn test_class_count_of_full_i32_range_is_none() {
        let vis = VisualizationSpec {
            min: i32::MIN,
            max: i32::MAX,
            palette: vec![],
            mapping: PaletteMapping::Direct,
        };
        assert_eq!(vis.class_count(), None);
    }

    #[test]
    fn test_year_pair_at_last_year_is_none() {
        assert_eq!(SelectorKey::year_pair(u16::MAX), None);
        assert_eq!(
            SelectorKey::year_pair(u16::MAX - 1),
            Some(SelectorKey::YearPair(u16::MAX - 1, u16::MAX))
        );
    }

    #[test]
    fn test_selector_key_refuses_surrounding_whitespace() {
        assert!(" 2017 ".parse::<SelectorKey>().is_err());
        assert!("2017_2018\n".parse::<SelectorKey>().is_err());
        let err = SelectorKey::parse_for(Mode::LandCover, " 2017").unwrap_err();
        assert_eq!(
            err,
            CoreError::UnknownSelectorKey {
                mode: Mode::LandCover,
                key: " 2017".to_string()
            }
        );
    }
}
