use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::models::{Mode, SelectorKey};

/// Inclusive year range with the year selected when the mode is entered.
/// For change detection the years are start years of each pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub first: u16,
    pub last: u16,
    pub default: u16,
}

impl YearRange {
    pub const fn new(first: u16, last: u16, default: u16) -> Self {
        Self {
            first,
            last,
            default,
        }
    }

    pub fn contains(&self, year: u16) -> bool {
        (self.first..=self.last).contains(&year)
    }
}

pub const LAND_COVER_YEARS: YearRange = YearRange::new(2014, 2024, 2017);
pub const CHANGE_DETECTION_START_YEARS: YearRange = YearRange::new(2013, 2023, 2017);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorOption {
    pub key: SelectorKey,
    pub label: String,
}

/// Valid secondary selections for one mode, in dropdown order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorDomain {
    pub mode: Mode,
    pub options: Vec<SelectorOption>,
    pub default: SelectorKey,
}

impl SelectorDomain {
    pub fn keys(&self) -> impl Iterator<Item = SelectorKey> + '_ {
        self.options.iter().map(|o| o.key)
    }

    pub fn contains(&self, key: SelectorKey) -> bool {
        self.options.iter().any(|o| o.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorDomainResolver {
    land_cover: YearRange,
    change_detection: YearRange,
}

impl Default for SelectorDomainResolver {
    fn default() -> Self {
        Self {
            land_cover: LAND_COVER_YEARS,
            change_detection: CHANGE_DETECTION_START_YEARS,
        }
    }
}

impl SelectorDomainResolver {
    pub fn new(land_cover: YearRange, change_detection: YearRange) -> Result<Self, CatalogError> {
        for (mode, range) in [
            (Mode::LandCover, land_cover),
            (Mode::ChangeDetection, change_detection),
        ] {
            if !range.contains(range.default) {
                return Err(CatalogError::DefaultOutsideDomain {
                    mode,
                    default: range.default,
                    first: range.first,
                    last: range.last,
                });
            }
        }
        if change_detection.last == u16::MAX {
            return Err(CatalogError::RangeOverflow {
                mode: Mode::ChangeDetection,
                what: "start year",
                low: change_detection.first.into(),
                high: change_detection.last.into(),
            });
        }
        Ok(Self {
            land_cover,
            change_detection,
        })
    }

    pub fn range(&self, mode: Mode) -> YearRange {
        match mode {
            Mode::LandCover => self.land_cover,
            Mode::ChangeDetection => self.change_detection,
        }
    }

    /// Ordered keys and default for `mode`.
    pub fn domain_for(&self, mode: Mode) -> SelectorDomain {
        let range = self.range(mode);
        let options = (range.first..=range.last)
            .map(|year| {
                let key = key_for(mode, year);
                SelectorOption {
                    key,
                    label: key.label(),
                }
            })
            .collect();
        SelectorDomain {
            mode,
            options,
            default: key_for(mode, range.default),
        }
    }

    /// Membership test without building the option list.
    pub fn contains(&self, mode: Mode, key: SelectorKey) -> bool {
        let range = self.range(mode);
        match (mode, key) {
            (Mode::LandCover, SelectorKey::Year(y)) => range.contains(y),
            (Mode::ChangeDetection, SelectorKey::YearPair(a, b)) => {
                range.contains(a) && a.checked_add(1) == Some(b)
            }
            _ => false,
        }
    }
}

fn key_for(mode: Mode, year: u16) -> SelectorKey {
    match mode {
        Mode::LandCover => SelectorKey::Year(year),
        // `new` keeps change-detection start years below u16::MAX
        Mode::ChangeDetection => SelectorKey::YearPair(year, year.saturating_add(1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_land_cover_domain() {
        let d = SelectorDomainResolver::default().domain_for(Mode::LandCover);
        let keys: Vec<SelectorKey> = d.keys().collect();
        let expected: Vec<SelectorKey> = (2014..=2024).map(SelectorKey::Year).collect();
        assert_eq!(keys, expected);
        assert_eq!(d.default, SelectorKey::Year(2017));
        assert_eq!(d.options[0].label, "Year 2014");
    }

    #[test]
    fn test_change_detection_domain() {
        let d = SelectorDomainResolver::default().domain_for(Mode::ChangeDetection);
        let keys: Vec<String> = d.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys.len(), 11);
        assert_eq!(keys.first().unwrap(), "2013_2014");
        assert_eq!(keys.last().unwrap(), "2023_2024");
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(d.default.to_string(), "2017_2018");
        assert_eq!(d.options[4].label, "Change 2017 to 2018");
    }

    #[test]
    fn test_default_is_in_domain() {
        let r = SelectorDomainResolver::default();
        for mode in Mode::ALL {
            let d = r.domain_for(mode);
            assert!(d.contains(d.default));
        }
    }

    #[test]
    fn test_contains_rejects_foreign_and_out_of_range_keys() {
        let r = SelectorDomainResolver::default();
        assert!(r.contains(Mode::LandCover, SelectorKey::Year(2014)));
        assert!(!r.contains(Mode::LandCover, SelectorKey::Year(1999)));
        assert!(!r.contains(Mode::LandCover, SelectorKey::year_pair(2017).unwrap()));
        assert!(!r.contains(Mode::ChangeDetection, SelectorKey::Year(2017)));
        assert!(!r.contains(Mode::ChangeDetection, SelectorKey::YearPair(2017, 2019)));
        assert!(!r.contains(Mode::ChangeDetection, SelectorKey::year_pair(2024).unwrap()));
    }

    #[test]
    fn test_default_outside_range_is_refused() {
        let err = SelectorDomainResolver::new(
            YearRange::new(2014, 2024, 2030),
            CHANGE_DETECTION_START_YEARS,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DefaultOutsideDomain {
                mode: Mode::LandCover,
                default: 2030,
                ..
            }
        ));
    }

    #[test]
    fn test_change_detection_ending_at_last_year_is_refused() {
        let err = SelectorDomainResolver::new(
            LAND_COVER_YEARS,
            YearRange::new(u16::MAX, u16::MAX, u16::MAX),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::RangeOverflow {
                mode: Mode::ChangeDetection,
                high: 65535,
                ..
            }
        ));
    }

    #[test]
    fn test_land_cover_may_use_last_year() {
        let r = SelectorDomainResolver::new(
            YearRange::new(u16::MAX - 1, u16::MAX, u16::MAX),
            CHANGE_DETECTION_START_YEARS,
        )
        .unwrap();
        assert!(r.contains(Mode::LandCover, SelectorKey::Year(u16::MAX)));
        assert!(!r.contains(Mode::ChangeDetection, SelectorKey::YearPair(u16::MAX, 0)));
    }
}
