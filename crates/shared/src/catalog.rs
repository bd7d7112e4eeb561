//! Static catalogs: (mode, key) -> asset, mode -> visualization + legend.
//!
//! Built once at startup, either from the literals below or from a JSON
//! file of the same shape, and shared read-only afterwards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{SelectorDomainResolver, YearRange};
use crate::error::{CatalogError, CoreError};
use crate::models::{
    AssetReference, LegendEntry, LegendSpec, Mode, PaletteMapping, SelectorKey,
    VisualizationSpec,
};
use crate::resolve::SelectionResolver;

const LAND_COVER_ASSETS: [(u16, &str); 11] = [
    (2014, "projects/ee-neelsimpson112/assets/ClassifiedTeknafImages/Classified_2014"),
    (2015, "projects/ee-neelsimpson112/assets/ClassifiedTeknafImages/Classified_2015"),
    (2016, "projects/ee-neelsimpson112/assets/ClassifiedTeknafImages/Classified_2016"),
    (2017, "projects/ee-neelsimpson112/assets/ClassifiedTeknafImages/Classified_2017"),
    (2018, "projects/ee-neelsimpson112/assets/ClassifiedTeknafImages/Classified_2018"),
    (2019, "projects/ee-neelsimpson112/assets/ClassifiedTeknafImages/Classified_2019"),
    (2020, "projects/ee-neelsimpson112/assets/ClassifiedTeknafImages/Classified_2020"),
    (2021, "projects/ee-neelsimpson112/assets/ClassifiedTeknafImages/Classified_2021"),
    (2022, "projects/ee-neelsimpson112/assets/ClassifiedTeknafImages/Classified_2022"),
    (2023, "projects/ee-neelsimpson112/assets/ClassifiedTeknafImages/Classified_2023"),
    (2024, "projects/ee-neelsimpson112/assets/ClassifiedTeknafImages/Classified_2024"),
];

/// Keyed by start year.
const CHANGE_DETECTION_ASSETS: [(u16, &str); 11] = [
    (2013, "projects/ee-neelsimpson112/assets/ChangeDetection/Change_2013_2014"),
    (2014, "projects/ee-neelsimpson112/assets/ChangeDetection/Change_2014_2015"),
    (2015, "projects/ee-neelsimpson112/assets/ChangeDetection/Change_2015_2016"),
    (2016, "projects/ee-neelsimpson112/assets/ChangeDetection/Change_2016_2017"),
    (2017, "projects/ee-neelsimpson112/assets/ChangeDetection/Change_2017_2018"),
    (2018, "projects/ee-neelsimpson112/assets/ChangeDetection/Change_2018_2019"),
    (2019, "projects/ee-neelsimpson112/assets/ChangeDetection/Change_2019_2020"),
    (2020, "projects/ee-neelsimpson112/assets/ChangeDetection/Change_2020_2021"),
    (2021, "projects/ee-neelsimpson112/assets/ChangeDetection/Change_2021_2022"),
    (2022, "projects/ee-neelsimpson112/assets/ChangeDetection/Change_2022_2023"),
    (2023, "projects/ee-neelsimpson112/assets/ChangeDetection/Change_2023_2024"),
];

/// (label, color, class value). Class values are 0..=3.
const LAND_COVER_LEGEND: [(&str, &str, i32); 4] = [
    ("Mangroves", "#1a6f2b", 0),
    ("Bare", "#e9c889", 1),
    ("Water", "#365dcb", 2),
    ("Other Vegetation", "#aeec49", 3),
];

// Transition codes are from*10 + to. The no-change color #428023 is also
// used for bare -> mangroves (index 4); kept as published.
const CHANGE_DETECTION_LEGEND: [(&str, &str, i32); 16] = [
    ("No change (Mangroves)", "#428023", 0),
    ("Deforestation: Mangroves to Bare", "#e06666", 1),
    ("Deforestation: Mangroves to Water", "#b60535", 2),
    ("Deforestation: Mangroves to Other Vegetation", "#ff4100", 3),
    ("Afforestation: Bare to Mangroves", "#428023", 10),
    ("No change (Bare)", "#f9cb9c", 11),
    ("Bare to Water", "#cfe2f3", 12),
    ("Bare to Other Vegetation", "#cdee5d", 13),
    ("Land Reclamation: Water to Mangroves", "#5b9686", 20),
    ("Water to Bare", "#fff2cc", 21),
    ("No change (Water)", "#16537e", 22),
    ("Water to Other Vegetation", "#8fce00", 23),
    ("Afforestation:Other Vegetation to Mangroves", "#7d9150", 30),
    ("Other Vegetation to Bare", "#d9ef8b", 31),
    ("Other Vegetation to Water", "#3288bd", 32),
    ("No change (Other Vegetation)", "#d9ead3", 33),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetCatalog {
    entries: BTreeMap<Mode, BTreeMap<SelectorKey, AssetReference>>,
}

impl AssetCatalog {
    pub fn new(entries: BTreeMap<Mode, BTreeMap<SelectorKey, AssetReference>>) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, mode: Mode, key: SelectorKey) -> Option<&AssetReference> {
        self.entries.get(&mode)?.get(&key)
    }

    pub fn keys(&self, mode: Mode) -> impl Iterator<Item = SelectorKey> + '_ {
        self.entries
            .get(&mode)
            .into_iter()
            .flat_map(|m| m.keys().copied())
    }

    pub fn len(&self, mode: Mode) -> usize {
        self.entries.get(&mode).map_or(0, BTreeMap::len)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeVisuals {
    pub visualization: VisualizationSpec,
    pub legend: LegendSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisualizationCatalog {
    entries: BTreeMap<Mode, ModeVisuals>,
}

impl VisualizationCatalog {
    pub fn new(entries: BTreeMap<Mode, ModeVisuals>) -> Self {
        Self { entries }
    }

    pub fn visualization(&self, mode: Mode) -> Result<&VisualizationSpec, CoreError> {
        self.get(mode).map(|v| &v.visualization)
    }

    pub fn legend(&self, mode: Mode) -> Result<&LegendSpec, CoreError> {
        self.get(mode).map(|v| &v.legend)
    }

    fn get(&self, mode: Mode) -> Result<&ModeVisuals, CoreError> {
        self.entries
            .get(&mode)
            .ok_or_else(|| CoreError::UnsupportedMode(mode.id().to_string()))
    }
}

/// Domain ranges plus both catalogs, validated together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    domains: SelectorDomainResolver,
    assets: AssetCatalog,
    visuals: VisualizationCatalog,
}

impl Catalog {
    /// Assemble and validate. Every domain key must have an asset.
    pub fn new(
        domains: SelectorDomainResolver,
        assets: AssetCatalog,
        visuals: VisualizationCatalog,
    ) -> Result<Self, CatalogError> {
        let catalog = Self {
            domains,
            assets,
            visuals,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The Teknaf mangrove layers.
    pub fn builtin() -> Self {
        let land_cover = LAND_COVER_ASSETS
            .iter()
            .map(|&(y, r)| (SelectorKey::Year(y), AssetReference::new(r)))
            .collect();
        let change_detection = CHANGE_DETECTION_ASSETS
            .iter()
            .filter_map(|&(y, r)| Some((SelectorKey::year_pair(y)?, AssetReference::new(r))))
            .collect();
        let assets = AssetCatalog::new(BTreeMap::from([
            (Mode::LandCover, land_cover),
            (Mode::ChangeDetection, change_detection),
        ]));

        let visuals = VisualizationCatalog::new(BTreeMap::from([
            (
                Mode::LandCover,
                visuals_from_literals("Land Cover Classes", &LAND_COVER_LEGEND, 0, 3, PaletteMapping::Direct),
            ),
            (
                Mode::ChangeDetection,
                visuals_from_literals(
                    "Change Detection Transitions",
                    &CHANGE_DETECTION_LEGEND,
                    0,
                    33,
                    PaletteMapping::Stretched,
                ),
            ),
        ]));

        Self {
            domains: SelectorDomainResolver::default(),
            assets,
            visuals,
        }
    }

    /// Parse a catalog file. See [`CatalogFile`] for the layout.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        file.into_catalog()
    }

    pub fn domains(&self) -> &SelectorDomainResolver {
        &self.domains
    }

    pub fn assets(&self) -> &AssetCatalog {
        &self.assets
    }

    pub fn visuals(&self) -> &VisualizationCatalog {
        &self.visuals
    }

    pub fn resolver(&self) -> SelectionResolver<'_> {
        SelectionResolver::new(&self.domains, &self.assets, &self.visuals)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        for mode in Mode::ALL {
            let vis = self
                .visuals
                .visualization(mode)
                .map_err(|_| CatalogError::MissingMode(mode))?;
            let required = vis.class_count().ok_or(CatalogError::RangeOverflow {
                mode,
                what: "visualization",
                low: vis.min.into(),
                high: vis.max.into(),
            })?;
            if vis.mapping == PaletteMapping::Direct && vis.palette.len() < required {
                return Err(CatalogError::PaletteTooShort {
                    mode,
                    palette: vis.palette.len(),
                    required,
                });
            }
            for key in self.assets.keys(mode) {
                if key.mode() != mode {
                    return Err(CatalogError::InvalidKey {
                        mode,
                        key: key.to_string(),
                    });
                }
            }
            for key in self.domains.domain_for(mode).keys() {
                if self.assets.lookup(mode, key).is_none() {
                    return Err(CatalogError::MissingAsset { mode, key });
                }
            }
        }
        Ok(())
    }
}

fn visuals_from_literals(
    title: &str,
    legend: &[(&str, &str, i32)],
    min: i32,
    max: i32,
    mapping: PaletteMapping,
) -> ModeVisuals {
    let entries: Vec<LegendEntry> = legend
        .iter()
        .map(|&(label, color, value)| LegendEntry {
            label: label.to_string(),
            color: color.to_string(),
            value,
        })
        .collect();
    ModeVisuals {
        visualization: VisualizationSpec {
            min,
            max,
            palette: entries.iter().map(|e| e.color.clone()).collect(),
            mapping,
        },
        legend: LegendSpec {
            title: title.to_string(),
            entries,
        },
    }
}

/// On-disk catalog: one section per mode id (`land_cover`, `change_detection`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogFile(pub BTreeMap<String, ModeSection>);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeSection {
    pub domain: YearRange,
    pub assets: BTreeMap<String, String>,
    pub visualization: VisualizationSpec,
    pub legend: LegendSection,
}

/// Legend in the parallel-list form people write by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegendSection {
    pub title: String,
    pub categories: Vec<String>,
    pub colors: Vec<String>,
    /// Class values per category; positional indices when omitted.
    #[serde(default)]
    pub values: Option<Vec<i32>>,
}

impl LegendSection {
    fn into_spec(self, mode: Mode) -> Result<LegendSpec, CatalogError> {
        if self.categories.len() != self.colors.len() {
            return Err(CatalogError::LegendMismatch {
                mode,
                categories: self.categories.len(),
                colors: self.colors.len(),
            });
        }
        let values = match self.values {
            Some(v) if v.len() != self.categories.len() => {
                return Err(CatalogError::LegendValuesMismatch {
                    mode,
                    categories: self.categories.len(),
                    values: v.len(),
                })
            }
            Some(v) => v,
            None => (0..self.categories.len() as i32).collect(),
        };
        let entries = self
            .categories
            .into_iter()
            .zip(self.colors)
            .zip(values)
            .map(|((label, color), value)| LegendEntry {
                label,
                color,
                value,
            })
            .collect();
        Ok(LegendSpec {
            title: self.title,
            entries,
        })
    }
}

impl CatalogFile {
    pub fn into_catalog(self) -> Result<Catalog, CatalogError> {
        let mut sections = BTreeMap::new();
        for (id, section) in self.0 {
            let mode: Mode = id
                .parse()
                .map_err(|_| CatalogError::UnsupportedMode(id.clone()))?;
            sections.insert(mode, section);
        }

        let mut ranges = BTreeMap::new();
        let mut assets = BTreeMap::new();
        let mut visuals = BTreeMap::new();
        for mode in Mode::ALL {
            let section = sections
                .remove(&mode)
                .ok_or(CatalogError::MissingMode(mode))?;
            ranges.insert(mode, section.domain);

            let mut mode_assets = BTreeMap::new();
            for (raw, reference) in section.assets {
                let key: SelectorKey = raw
                    .parse()
                    .map_err(|_| CatalogError::InvalidKey { mode, key: raw.clone() })?;
                mode_assets.insert(key, AssetReference::new(reference));
            }
            assets.insert(mode, mode_assets);

            visuals.insert(
                mode,
                ModeVisuals {
                    visualization: section.visualization,
                    legend: section.legend.into_spec(mode)?,
                },
            );
        }

        let domains = SelectorDomainResolver::new(
            ranges[&Mode::LandCover],
            ranges[&Mode::ChangeDetection],
        )?;
        Catalog::new(
            domains,
            AssetCatalog::new(assets),
            VisualizationCatalog::new(visuals),
        )
    }
}
