//! Request parameters.
//!
//! [`RawSearchParams`] is the loosely typed bag a request arrives as.
//! [`SearchParams::from_raw`] validates it once, in pipeline order
//! (program, day, time window), so the first failing stage decides the
//! error. The order key is kept as given and parsed by
//! [`SearchParams::order_key`] when the ordering stage runs, after the
//! timezone has been checked. Everything else falls back to a default.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};
use crate::ranking::OrderKey;
use crate::store::ProgramId;
use crate::temporal::{ClockTime, DayIndex};

/// Fixed page size of search results.
pub const PER_PAGE: u32 = 6;

/// Search settings that are not part of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub per_page: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig { per_page: PER_PAGE }
    }
}

/// Unvalidated request parameters, as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSearchParams {
    /// Comma-separated program ids.
    pub program: Option<String>,
    /// Comma-separated day indices, 0 = Monday.
    pub day: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Radius in miles.
    pub distance: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
}

/// Validated request parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchParams {
    pub programs: BTreeSet<ProgramId>,
    pub days: Vec<DayIndex>,
    pub start_time: Option<ClockTime>,
    pub end_time: Option<ClockTime>,
    pub distance_miles: Option<f64>,
    /// Order key as requested, blank counted as absent.
    pub order: Option<String>,
    pub page: u32,
}

impl SearchParams {
    /// Validate a raw parameter bag.
    ///
    /// # Errors
    ///
    /// - [`SearchError::ProgramMissing`] when no program id is given.
    /// - [`SearchError::DayFilterMissing`] when no day is given.
    /// - [`SearchError::MalformedTimeFilter`] for a bad day index or clock time.
    pub fn from_raw(raw: &RawSearchParams) -> Result<Self> {
        let programs: BTreeSet<ProgramId> = split_list(raw.program.as_deref())
            .map(ProgramId::new)
            .collect();
        if programs.is_empty() {
            return Err(SearchError::ProgramMissing);
        }

        let tokens: Vec<&str> = split_list(raw.day.as_deref()).collect();
        if tokens.is_empty() {
            return Err(SearchError::DayFilterMissing);
        }
        let mut days = Vec::with_capacity(tokens.len());
        for token in tokens {
            let day: DayIndex = token.parse()?;
            if !days.contains(&day) {
                days.push(day);
            }
        }

        let start_time = parse_clock(raw.start_time.as_deref())?;
        let end_time = parse_clock(raw.end_time.as_deref())?;

        Ok(SearchParams {
            programs,
            days,
            start_time,
            end_time,
            distance_miles: parse_distance(raw.distance.as_deref()),
            order: non_blank(raw.order.as_deref()).map(String::from),
            page: parse_page(raw.page.as_deref()),
        })
    }

    /// Parse the requested order, `last` when none was given.
    ///
    /// # Errors
    ///
    /// [`SearchError::InvalidOrderKey`] for an order outside the closed set.
    pub fn order_key(&self) -> Result<OrderKey> {
        OrderKey::parse_optional(self.order.as_deref())
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_clock(raw: Option<&str>) -> Result<Option<ClockTime>> {
    non_blank(raw).map(str::parse::<ClockTime>).transpose()
}

fn parse_distance(raw: Option<&str>) -> Option<f64> {
    let raw = non_blank(raw)?;
    match raw.parse::<f64>() {
        Ok(d) if d.is_finite() && d > 0.0 => Some(d),
        _ => {
            tracing::warn!(distance = raw, "ignoring unusable distance");
            None
        }
    }
}

fn parse_page(raw: Option<&str>) -> u32 {
    let Some(raw) = non_blank(raw) else {
        return 1;
    };
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => n,
        _ => {
            tracing::warn!(page = raw, "ignoring unusable page, using 1");
            1
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(program: Option<&str>, day: Option<&str>) -> RawSearchParams {
        RawSearchParams {
            program: program.map(String::from),
            day: day.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_minimal_params_use_defaults() {
        let p = SearchParams::from_raw(&raw(Some("3"), Some("0"))).unwrap();
        assert_eq!(p.programs.len(), 1);
        assert_eq!(p.days, vec![DayIndex::MONDAY]);
        assert_eq!(p.start_time, None);
        assert_eq!(p.end_time, None);
        assert_eq!(p.distance_miles, None);
        assert_eq!(p.order, None);
        assert_eq!(p.order_key().unwrap(), OrderKey::Last);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn test_lists_are_split_and_trimmed() {
        let p = SearchParams::from_raw(&raw(Some(" 1, 2,,3 "), Some("0, 2,2"))).unwrap();
        let ids: Vec<&str> = p.programs.iter().map(ProgramId::as_str).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(p.days.iter().map(|d| d.get()).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_program_missing() {
        for program in [None, Some(""), Some(" , ")] {
            let err = SearchParams::from_raw(&raw(program, Some("1"))).unwrap_err();
            assert_eq!(err, SearchError::ProgramMissing);
        }
    }

    #[test]
    fn test_program_checked_before_day() {
        let err = SearchParams::from_raw(&raw(None, None)).unwrap_err();
        assert_eq!(err, SearchError::ProgramMissing);
    }

    #[test]
    fn test_day_missing_regardless_of_other_params() {
        let mut r = raw(Some("1"), Some(""));
        r.order = Some("loudest".into());
        r.start_time = Some("bogus".into());
        r.page = Some("3".into());
        assert_eq!(SearchParams::from_raw(&r).unwrap_err(), SearchError::DayFilterMissing);
    }

    #[test]
    fn test_bad_day_index() {
        let err = SearchParams::from_raw(&raw(Some("1"), Some("0,9"))).unwrap_err();
        assert!(matches!(err, SearchError::MalformedTimeFilter(_)));
    }

    #[test]
    fn test_bad_clock_time() {
        let mut r = raw(Some("1"), Some("0"));
        r.end_time = Some("quarter past".into());
        let err = SearchParams::from_raw(&r).unwrap_err();
        assert!(matches!(err, SearchError::MalformedTimeFilter(_)));
    }

    #[test]
    fn test_time_checked_before_order() {
        let mut r = raw(Some("1"), Some("0"));
        r.start_time = Some("99:99".into());
        r.order = Some("loudest".into());
        let err = SearchParams::from_raw(&r).unwrap_err();
        assert!(matches!(err, SearchError::MalformedTimeFilter(_)));
    }

    #[test]
    fn test_invalid_order_is_deferred() {
        let mut r = raw(Some("1"), Some("0"));
        r.order = Some("loudest".into());
        let p = SearchParams::from_raw(&r).unwrap();
        assert_eq!(p.order.as_deref(), Some("loudest"));
        assert_eq!(
            p.order_key().unwrap_err(),
            SearchError::InvalidOrderKey("loudest".into())
        );
    }

    #[test]
    fn test_blank_order_is_absent() {
        let mut r = raw(Some("1"), Some("0"));
        r.order = Some("  ".into());
        let p = SearchParams::from_raw(&r).unwrap();
        assert_eq!(p.order, None);
        assert_eq!(p.order_key().unwrap(), OrderKey::Last);
    }

    #[test]
    fn test_page_and_distance_fall_back() {
        let mut r = raw(Some("1"), Some("0"));
        r.page = Some("zero".into());
        r.distance = Some("-5".into());
        let p = SearchParams::from_raw(&r).unwrap();
        assert_eq!(p.page, 1);
        assert_eq!(p.distance_miles, None);

        r.page = Some("4".into());
        r.distance = Some("12.5".into());
        let p = SearchParams::from_raw(&r).unwrap();
        assert_eq!(p.page, 4);
        assert_eq!(p.distance_miles, Some(12.5));
    }

    #[test]
    fn test_raw_params_from_json() {
        let r: RawSearchParams =
            serde_json::from_str(r#"{"program": "1,2", "day": "4", "order": "highest"}"#).unwrap();
        let p = SearchParams::from_raw(&r).unwrap();
        assert_eq!(p.order_key().unwrap(), OrderKey::Highest);
    }

    #[test]
    fn test_default_config_pages_by_six() {
        assert_eq!(SearchConfig::default().per_page, 6);
    }
}
