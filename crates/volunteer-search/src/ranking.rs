//! Result ordering.
//!
//! The order key is a closed set. Anything outside it is rejected rather than
//! silently mapped to a default; only an absent key falls back to
//! most-recently-active first.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::distance::Coordinates;
use crate::error::{Result, SearchError};
use crate::store::Volunteer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKey {
    /// Highest average rating first.
    Highest,
    /// Most recently created first.
    Newest,
    /// Nearest to the caller's address first.
    Closest,
    /// Most recently signed in first.
    #[default]
    Last,
}

impl OrderKey {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderKey::Highest => "highest",
            OrderKey::Newest => "newest",
            OrderKey::Closest => "closest",
            OrderKey::Last => "last",
        }
    }

    /// Parse an optional raw order value. Absent or blank means [`OrderKey::Last`].
    pub fn parse_optional(raw: Option<&str>) -> Result<OrderKey> {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => s.parse(),
            None => Ok(OrderKey::default()),
        }
    }
}

impl FromStr for OrderKey {
    type Err = SearchError;

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "highest" => Ok(OrderKey::Highest),
            "newest" => Ok(OrderKey::Newest),
            "closest" => Ok(OrderKey::Closest),
            "last" => Ok(OrderKey::Last),
            other => Err(SearchError::InvalidOrderKey(other.to_string())),
        }
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sorts volunteers by an [`OrderKey`]. Ties break on ascending id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultRanker {
    key: OrderKey,
    origin: Option<Coordinates>,
}

impl ResultRanker {
    /// `origin` is only consulted for [`OrderKey::Closest`]; without one the
    /// ranker falls back to [`OrderKey::Last`].
    pub fn new(key: OrderKey, origin: Option<Coordinates>) -> Self {
        let key = match (key, origin) {
            (OrderKey::Closest, None) => {
                tracing::warn!("closest ordering without a resolvable address, using last");
                OrderKey::Last
            }
            (key, _) => key,
        };
        ResultRanker { key, origin }
    }

    /// The key actually applied, after any fallback.
    pub fn key(&self) -> OrderKey {
        self.key
    }

    pub fn compare(&self, a: &Volunteer, b: &Volunteer) -> Ordering {
        let primary = match self.key {
            OrderKey::Highest => desc_nulls_last(a.average_rating, b.average_rating, f64::total_cmp),
            OrderKey::Newest => b.created_at.cmp(&a.created_at),
            OrderKey::Last => desc_nulls_last(a.last_sign_in_at, b.last_sign_in_at, cmp_instant),
            OrderKey::Closest => {
                let distance = |v: &Volunteer| {
                    self.origin
                        .zip(v.location)
                        .map(|(origin, loc)| origin.distance_miles(&loc))
                };
                asc_nulls_last(distance(a), distance(b), f64::total_cmp)
            }
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }

    pub fn rank(&self, records: &mut [&Volunteer]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}

fn cmp_instant(a: &DateTime<Utc>, b: &DateTime<Utc>) -> Ordering {
    a.cmp(b)
}

fn desc_nulls_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(&b, &a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn asc_nulls_last<T>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(&a, &b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
