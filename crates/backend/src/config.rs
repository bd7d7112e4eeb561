use std::path::PathBuf;

pub const DEFAULT_PORT: &str = "3000";
pub const DEFAULT_ASSETS_DIR: &str = "assets";
pub const DEFAULT_DB_PATH: &str = "data/sessions.redb";
pub const DEFAULT_TILE_URL_TEMPLATE: &str =
    "https://earthengine.googleapis.com/v1/{asset}/tiles/{z}/{x}/{y}";
pub const DEFAULT_ASSET_PREFIX: &str = "projects/ee-neelsimpson112/assets/";
pub const DEFAULT_BASEMAP_URL: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: String,
    pub assets_dir: PathBuf,
    pub db_path: PathBuf,
    /// Raster tile template; `{asset}` is replaced with the asset reference.
    pub tile_url_template: String,
    /// Only assets under this prefix are served.
    pub asset_prefix: String,
    pub basemap_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Separated so tests can supply variables without touching the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        Config {
            port: get("PORT", DEFAULT_PORT),
            assets_dir: PathBuf::from(get("ASSETS_DIR", DEFAULT_ASSETS_DIR)),
            db_path: PathBuf::from(get("DB_PATH", DEFAULT_DB_PATH)),
            tile_url_template: get("TILE_URL_TEMPLATE", DEFAULT_TILE_URL_TEMPLATE),
            asset_prefix: get("ASSET_PREFIX", DEFAULT_ASSET_PREFIX),
            basemap_url: get("BASEMAP_URL", DEFAULT_BASEMAP_URL),
        }
    }
}
