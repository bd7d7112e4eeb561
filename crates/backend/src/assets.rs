use mangrove_shared::catalog::Catalog;
use mangrove_shared::error::CatalogError;
use mangrove_shared::models::Mode;
use std::path::Path;

pub const CATALOG_FILE: &str = "catalog.json";

/// Load `catalog.json` from `assets_dir`, or the built-in catalog when the
/// file does not exist. A present but invalid file is an error.
pub fn load_catalog(assets_dir: &Path) -> Result<Catalog, CatalogError> {
    let path = assets_dir.join(CATALOG_FILE);
    let catalog = match std::fs::read_to_string(&path) {
        Ok(json) => {
            let catalog = Catalog::from_json(&json)?;
            tracing::info!(path = %path.display(), "Loaded catalog file");
            catalog
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No catalog file, using built-in catalog");
            Catalog::builtin()
        }
        Err(e) => return Err(CatalogError::Io(e)),
    };

    tracing::info!(
        land_cover = catalog.assets().len(Mode::LandCover),
        change_detection = catalog.assets().len(Mode::ChangeDetection),
        "Catalog ready"
    );
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mangrove_shared::models::SelectorKey;

    #[test]
    fn test_missing_file_falls_back_to_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = load_catalog(dir.path()).unwrap();
        assert_eq!(catalog, Catalog::builtin());
    }

    #[test]
    fn test_invalid_file_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CATALOG_FILE), "{ not json").unwrap();
        let err = load_catalog(dir.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn test_file_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let json = serde_json::json!({
            "land_cover": {
                "domain": { "first": 2030, "last": 2030, "default": 2030 },
                "assets": { "2030": "projects/x/lc_2030" },
                "visualization": { "min": 0, "max": 0, "palette": ["#000000"], "mapping": "direct" },
                "legend": { "title": "LC", "categories": ["Only"], "colors": ["#000000"] }
            },
            "change_detection": {
                "domain": { "first": 2030, "last": 2030, "default": 2030 },
                "assets": { "2030_2031": "projects/x/cd_2030" },
                "visualization": { "min": 0, "max": 0, "palette": ["#000000"] },
                "legend": { "title": "CD", "categories": ["Only"], "colors": ["#000000"] }
            }
        });
        std::fs::write(dir.path().join(CATALOG_FILE), json.to_string()).unwrap();
        let catalog = load_catalog(dir.path()).unwrap();
        assert_eq!(
            catalog
                .assets()
                .lookup(Mode::LandCover, SelectorKey::Year(2030))
                .unwrap()
                .as_str(),
            "projects/x/lc_2030"
        );
    }
}
