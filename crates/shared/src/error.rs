//! Error types for selection, resolution and catalog loading.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Mode, SelectorKey};

/// Errors surfaced by a render cycle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Domain and asset catalog disagree. Internal defect, not user error.
    #[error("unknown selector key {key:?} for mode {mode}")]
    UnknownSelectorKey { mode: Mode, key: String },

    #[error("asset {asset} is unavailable: {reason}")]
    AssetUnavailable { asset: String, reason: String },

    #[error("unsupported mode: {0}")]
    UnsupportedMode(String),

    #[error("map rendering failed: {0}")]
    Render(String),

    #[error("invalid view state: {0}")]
    InvalidViewState(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnknownSelectorKey,
    AssetUnavailable,
    UnsupportedMode,
    Render,
    InvalidViewState,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::UnknownSelectorKey { .. } => ErrorKind::UnknownSelectorKey,
            CoreError::AssetUnavailable { .. } => ErrorKind::AssetUnavailable,
            CoreError::UnsupportedMode(_) => ErrorKind::UnsupportedMode,
            CoreError::Render(_) => ErrorKind::Render,
            CoreError::InvalidViewState(_) => ErrorKind::InvalidViewState,
        }
    }

    /// Whether asking again may succeed. Only collaborator failures qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoreError::AssetUnavailable { .. } | CoreError::Render(_)
        )
    }
}

/// Configuration defects found while loading catalogs. Fatal at startup.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("no asset configured for {mode} key {key}")]
    MissingAsset { mode: Mode, key: SelectorKey },

    #[error("legend for {mode} has {categories} categories but {colors} colors")]
    LegendMismatch {
        mode: Mode,
        categories: usize,
        colors: usize,
    },

    #[error("legend for {mode} has {values} class values for {categories} categories")]
    LegendValuesMismatch {
        mode: Mode,
        categories: usize,
        values: usize,
    },

    #[error("direct palette for {mode} has {palette} colors, needs at least {required}")]
    PaletteTooShort {
        mode: Mode,
        palette: usize,
        required: usize,
    },

    #[error("default year {default} for {mode} outside {first}..={last}")]
    DefaultOutsideDomain {
        mode: Mode,
        default: u16,
        first: u16,
        last: u16,
    },

    #[error("{what} range {low}..={high} for {mode} overflows")]
    RangeOverflow {
        mode: Mode,
        what: &'static str,
        low: i64,
        high: i64,
    },

    #[error("catalog has no section for {0}")]
    MissingMode(Mode),

    #[error("invalid key {key:?} in {mode} catalog")]
    InvalidKey { mode: Mode, key: String },

    #[error("unsupported mode in catalog: {0}")]
    UnsupportedMode(String),

    #[error("catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog I/O: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_collaborator_failures_are_retryable() {
        let unavailable = CoreError::AssetUnavailable {
            asset: "x".into(),
            reason: "denied".into(),
        };
        assert!(unavailable.is_retryable());
        assert!(CoreError::Render("timeout".into()).is_retryable());
        assert!(!CoreError::UnknownSelectorKey {
            mode: Mode::LandCover,
            key: "1999".into()
        }
        .is_retryable());
        assert!(!CoreError::UnsupportedMode("x".into()).is_retryable());
    }

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnknownSelectorKey {
            mode: Mode::LandCover,
            key: "1999".into(),
        };
        assert_eq!(err.to_string(), "unknown selector key \"1999\" for mode land_cover");
        assert_eq!(err.kind(), ErrorKind::UnknownSelectorKey);
    }
}
