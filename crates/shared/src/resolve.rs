use crate::catalog::{AssetCatalog, VisualizationCatalog};
use crate::domain::SelectorDomainResolver;
use crate::error::CoreError;
use crate::models::{Mode, Resolution, SelectorKey};

/// Turns a (mode, key) pair into an asset plus its visualization and legend.
/// Pure: output depends only on the inputs and the borrowed catalogs.
#[derive(Debug, Clone, Copy)]
pub struct SelectionResolver<'a> {
    domains: &'a SelectorDomainResolver,
    assets: &'a AssetCatalog,
    visuals: &'a VisualizationCatalog,
}

impl<'a> SelectionResolver<'a> {
    pub fn new(
        domains: &'a SelectorDomainResolver,
        assets: &'a AssetCatalog,
        visuals: &'a VisualizationCatalog,
    ) -> Self {
        Self {
            domains,
            assets,
            visuals,
        }
    }

    pub fn resolve(&self, mode: Mode, key: SelectorKey) -> Result<Resolution, CoreError> {
        let unknown = || CoreError::UnknownSelectorKey {
            mode,
            key: key.to_string(),
        };
        if !self.domains.contains(mode, key) {
            return Err(unknown());
        }
        let asset = self.assets.lookup(mode, key).ok_or_else(unknown)?;
        Ok(Resolution {
            asset: asset.clone(),
            visualization: self.visuals.visualization(mode)?.clone(),
            legend: self.visuals.legend(mode)?.clone(),
            layer_name: format!("{} {}", mode, key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::collections::BTreeMap;

    #[test]
    fn test_every_domain_key_resolves() {
        let catalog = Catalog::builtin();
        let resolver = catalog.resolver();
        for mode in Mode::ALL {
            for key in catalog.domains().domain_for(mode).keys() {
                let r = resolver.resolve(mode, key).unwrap();
                assert_eq!(Some(&r.asset), catalog.assets().lookup(mode, key));
            }
        }
    }

    #[test]
    fn test_land_cover_2017() {
        let catalog = Catalog::builtin();
        let r = catalog
            .resolver()
            .resolve(Mode::LandCover, SelectorKey::Year(2017))
            .unwrap();
        assert_eq!(
            r.asset.as_str(),
            "projects/ee-neelsimpson112/assets/ClassifiedTeknafImages/Classified_2017"
        );
        assert_eq!(r.legend.len(), 4);
        assert_eq!(r.legend.title, "Land Cover Classes");
        assert_eq!(r.layer_name, "land_cover 2017");
    }

    #[test]
    fn test_change_detection_2017_2018() {
        let catalog = Catalog::builtin();
        let r = catalog
            .resolver()
            .resolve(Mode::ChangeDetection, SelectorKey::year_pair(2017).unwrap())
            .unwrap();
        assert_eq!(
            r.asset.as_str(),
            "projects/ee-neelsimpson112/assets/ChangeDetection/Change_2017_2018"
        );
        assert_eq!(r.legend.len(), 16);
        assert_eq!(r.visualization.max, 33);
        assert_eq!(r.layer_name, "change_detection 2017_2018");
    }

    #[test]
    fn test_key_outside_domain_is_unknown() {
        let catalog = Catalog::builtin();
        let err = catalog
            .resolver()
            .resolve(Mode::LandCover, SelectorKey::Year(1999))
            .unwrap_err();
        assert_eq!(
            err,
            CoreError::UnknownSelectorKey {
                mode: Mode::LandCover,
                key: "1999".to_string()
            }
        );
    }

    #[test]
    fn test_key_from_other_mode_is_unknown() {
        let catalog = Catalog::builtin();
        let err = catalog
            .resolver()
            .resolve(Mode::LandCover, SelectorKey::year_pair(2017).unwrap())
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownSelectorKey { .. }));
    }

    #[test]
    fn test_domain_key_missing_from_catalog_is_unknown() {
        // Unvalidated catalog with a hole, as a desync would look.
        let catalog = Catalog::builtin();
        let assets = AssetCatalog::new(BTreeMap::new());
        let resolver = SelectionResolver::new(catalog.domains(), &assets, catalog.visuals());
        let err = resolver
            .resolve(Mode::LandCover, SelectorKey::Year(2017))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownSelectorKey { .. }));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let catalog = Catalog::builtin();
        let resolver = catalog.resolver();
        let key = SelectorKey::year_pair(2020).unwrap();
        let a = resolver.resolve(Mode::ChangeDetection, key).unwrap();
        let b = resolver.resolve(Mode::ChangeDetection, key).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_legend_does_not_depend_on_key() {
        let catalog = Catalog::builtin();
        let resolver = catalog.resolver();
        let a = resolver.resolve(Mode::LandCover, SelectorKey::Year(2014)).unwrap();
        let b = resolver.resolve(Mode::LandCover, SelectorKey::Year(2024)).unwrap();
        assert_eq!(a.legend, b.legend);
        assert_eq!(a.visualization, b.visualization);
        assert_ne!(a.asset, b.asset);
    }
}
