//! Resolve a local weekday window into UTC intervals.
//!
//! A request like "Tuesday 22:00–23:30 in America/New_York" becomes one or two
//! UTC intervals over the reference week (see [`crate::temporal`]). When the
//! converted window leaves the UTC reference date the window is split, and the
//! part that fell on the other side of the UTC day boundary is left unbounded
//! on its far side.
//!
//! Wrap detection compares UTC day-of-month only. That is correct because
//! every instant is pinned to the first week of January 2001: the only
//! neighbouring dates are December 31 and January 2..=8, none of which share
//! a day-of-month with a reference date.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::Result;
use crate::temporal::{local_to_utc, parse_timezone, ClockTime, DayIndex};

/// One end of a [`TimeInterval`].
///
/// Variant order gives `NegInfinity < At(_) < PosInfinity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    NegInfinity,
    At(DateTime<Utc>),
    PosInfinity,
}

impl Endpoint {
    pub fn instant(self) -> Option<DateTime<Utc>> {
        match self {
            Endpoint::At(dt) => Some(dt),
            _ => None,
        }
    }
}

impl From<DateTime<Utc>> for Endpoint {
    fn from(dt: DateTime<Utc>) -> Self {
        Endpoint::At(dt)
    }
}

/// A closed UTC interval `[start, end]` with possibly unbounded ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeInterval {
    start: Endpoint,
    end: Endpoint,
}

impl TimeInterval {
    /// Build an interval. Returns `None` when `start > end`.
    pub fn new(start: impl Into<Endpoint>, end: impl Into<Endpoint>) -> Option<Self> {
        let (start, end) = (start.into(), end.into());
        (start <= end).then_some(TimeInterval { start, end })
    }

    pub fn start(&self) -> Endpoint {
        self.start
    }

    pub fn end(&self) -> Endpoint {
        self.end
    }

    /// Inclusive on both ends.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let at = Endpoint::At(instant);
        self.start <= at && at <= self.end
    }

    /// Both `start` and `end` lie inside this interval.
    pub fn encloses(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.contains(start) && self.contains(end)
    }
}

/// The UTC intervals for one requested day. Matching any one of them is enough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UtcIntervalQuery {
    pub day: DayIndex,
    pub intervals: Vec<TimeInterval>,
}

impl UtcIntervalQuery {
    pub fn is_split(&self) -> bool {
        self.intervals.len() > 1
    }

    pub fn encloses(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.intervals.iter().any(|i| i.encloses(start, end))
    }
}

/// Converts local weekday windows into UTC interval queries for one timezone.
///
/// The timezone is owned by the resolver and never read from ambient state,
/// so concurrent requests in different zones cannot interfere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindowResolver {
    tz: Tz,
}

impl TimeWindowResolver {
    pub fn new(tz: Tz) -> Self {
        TimeWindowResolver { tz }
    }

    /// Build a resolver from an IANA timezone name.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::MalformedTimeFilter`] for an unknown timezone.
    ///
    /// [`SearchError::MalformedTimeFilter`]: crate::error::SearchError::MalformedTimeFilter
    pub fn for_timezone(name: &str) -> Result<Self> {
        parse_timezone(name).map(Self::new)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Resolve `day` between `start` (default 00:00) and `end` (default 23:59),
    /// local time, into at most two UTC intervals.
    ///
    /// A `start` later than `end` is not an error. The wrap rule still applies
    /// and any resulting pair whose start falls after its end is dropped, so
    /// the query may be empty and match nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::MalformedTimeFilter`] when a local time cannot be
    /// placed in the timezone.
    ///
    /// [`SearchError::MalformedTimeFilter`]: crate::error::SearchError::MalformedTimeFilter
    ///
    /// # Examples
    ///
    /// ```
    /// use volunteer_search::temporal::{ClockTime, DayIndex};
    /// use volunteer_search::window::TimeWindowResolver;
    ///
    /// let resolver = TimeWindowResolver::for_timezone("UTC").unwrap();
    /// let query = resolver
    ///     .resolve(DayIndex::MONDAY, ClockTime::from_hm(9, 0), ClockTime::from_hm(17, 0))
    ///     .unwrap();
    /// assert_eq!(query.intervals.len(), 1);
    /// ```
    pub fn resolve(
        &self,
        day: DayIndex,
        start: Option<ClockTime>,
        end: Option<ClockTime>,
    ) -> Result<UtcIntervalQuery> {
        let start_clock = start.unwrap_or(ClockTime::START_OF_DAY);
        let end_clock = end.unwrap_or_else(ClockTime::end_of_day);

        let start_utc = local_to_utc(&self.tz, day, start_clock)?;
        let end_utc = local_to_utc(&self.tz, day, end_clock)?;
        let day_start_utc = local_to_utc(&self.tz, day, ClockTime::START_OF_DAY)?;
        let day_end_utc = local_to_utc(&self.tz, day, ClockTime::end_of_day())?;

        let reference_day = day.day_of_month();
        let pairs: Vec<(Endpoint, Endpoint)> = if end_utc.day() != reference_day {
            // The local window ends past the UTC reference date.
            vec![
                (start_utc.into(), day_end_utc.into()),
                (Endpoint::NegInfinity, end_utc.into()),
            ]
        } else if start_utc.day() != reference_day {
            // The local window starts before the UTC reference date.
            vec![
                (start_utc.into(), Endpoint::PosInfinity),
                (day_start_utc.into(), end_utc.into()),
            ]
        } else {
            vec![(start_utc.into(), end_utc.into())]
        };

        // Inverted pairs match nothing and are dropped.
        let intervals: Vec<TimeInterval> = pairs
            .into_iter()
            .filter_map(|(s, e)| TimeInterval::new(s, e))
            .collect();
        if intervals.is_empty() {
            tracing::debug!(
                day = day.get(),
                start = %start_clock,
                end = %end_clock,
                "window resolves to no UTC interval"
            );
        }

        Ok(UtcIntervalQuery { day, intervals })
    }
}

/// Resolve a single day window in the named timezone.
///
/// Convenience wrapper over [`TimeWindowResolver::resolve`].
pub fn resolve(
    day: DayIndex,
    start: Option<ClockTime>,
    end: Option<ClockTime>,
    timezone: &str,
) -> Result<UtcIntervalQuery> {
    TimeWindowResolver::for_timezone(timezone)?.resolve(day, start, end)
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use chrono::TimeZone;

    fn utc(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        if d == 0 {
            return Utc.with_ymd_and_hms(2000, 12, 31, h, m, 0).unwrap();
        }
        Utc.with_ymd_and_hms(2001, 1, d, h, m, 0).unwrap()
    }

    fn day(i: u8) -> DayIndex {
        DayIndex::new(i).unwrap()
    }

    fn hm(h: u32, m: u32) -> Option<ClockTime> {
        ClockTime::from_hm(h, m)
    }

    fn at(dt: DateTime<Utc>) -> Endpoint {
        Endpoint::At(dt)
    }

    // ── Endpoint / TimeInterval tests ───────────────────────────────────

    #[test]
    fn test_endpoint_ordering() {
        assert!(Endpoint::NegInfinity < at(utc(1, 0, 0)));
        assert!(at(utc(1, 0, 0)) < at(utc(1, 0, 1)));
        assert!(at(utc(7, 23, 59)) < Endpoint::PosInfinity);
    }

    #[test]
    fn test_interval_rejects_inverted() {
        assert!(TimeInterval::new(utc(2, 10, 0), utc(2, 9, 0)).is_none());
        assert!(TimeInterval::new(Endpoint::PosInfinity, utc(2, 9, 0)).is_none());
    }

    #[test]
    fn test_interval_contains_is_inclusive() {
        let i = TimeInterval::new(utc(2, 9, 0), utc(2, 17, 0)).unwrap();
        assert!(i.contains(utc(2, 9, 0)));
        assert!(i.contains(utc(2, 17, 0)));
        assert!(!i.contains(utc(2, 17, 1)));
    }

    #[test]
    fn test_unbounded_interval_contains_everything_on_open_side() {
        let i = TimeInterval::new(Endpoint::NegInfinity, utc(3, 4, 30)).unwrap();
        assert!(i.contains(utc(0, 0, 0)));
        assert!(!i.contains(utc(3, 4, 31)));
    }

    // ── resolve: no wrap ────────────────────────────────────────────────

    #[test]
    fn test_resolve_utc_full_day() {
        let q = resolve(day(0), None, None, "UTC").unwrap();
        assert_eq!(q.intervals.len(), 1);
        assert_eq!(q.intervals[0].start(), at(utc(1, 0, 0)));
        assert_eq!(q.intervals[0].end(), at(utc(1, 23, 59)));
    }

    #[test]
    fn test_resolve_new_york_morning_single_interval() {
        let q = resolve(day(1), hm(9, 0), hm(17, 0), "America/New_York").unwrap();
        assert!(!q.is_split());
        assert_eq!(q.intervals[0].start(), at(utc(2, 14, 0)));
        assert_eq!(q.intervals[0].end(), at(utc(2, 22, 0)));
    }

    #[test]
    fn test_resolve_half_hour_zone() {
        let q = resolve(day(2), hm(12, 0), hm(13, 0), "Asia/Kolkata").unwrap();
        assert_eq!(q.intervals, vec![TimeInterval::new(utc(3, 6, 30), utc(3, 7, 30)).unwrap()]);
    }

    // ── resolve: forward wrap ───────────────────────────────────────────

    #[test]
    fn test_resolve_new_york_late_evening_splits() {
        // Tuesday 22:00-23:30 EST = Wednesday 03:00-04:30 UTC.
        let q = resolve(day(1), hm(22, 0), hm(23, 30), "America/New_York").unwrap();
        assert_eq!(q.intervals.len(), 2);
        assert_eq!(q.intervals[0].start(), at(utc(3, 3, 0)));
        // 23:59 EST on the reference Tuesday.
        assert_eq!(q.intervals[0].end(), at(utc(3, 4, 59)));
        assert_eq!(q.intervals[1].start(), Endpoint::NegInfinity);
        assert_eq!(q.intervals[1].end(), at(utc(3, 4, 30)));
    }

    #[test]
    fn test_forward_wrap_availability_matches_first_interval_only() {
        let q = resolve(day(1), hm(22, 0), hm(23, 30), "America/New_York").unwrap();
        // Stored availability 22:00-23:45 local, before local midnight.
        let (s, e) = (utc(3, 3, 0), utc(3, 4, 45));
        assert!(q.intervals[0].encloses(s, e));
        assert!(!q.intervals[1].encloses(s, e));
        assert!(q.encloses(s, e));
    }

    #[test]
    fn test_default_window_wraps_west_of_utc() {
        let q = resolve(day(6), None, None, "America/Los_Angeles").unwrap();
        assert!(q.is_split());
        assert_eq!(q.intervals[0].start(), at(utc(7, 8, 0)));
        assert_eq!(q.intervals[1].end(), at(utc(8, 7, 59)));
    }

    // ── resolve: backward wrap ──────────────────────────────────────────

    #[test]
    fn test_resolve_tokyo_early_morning_splits_backward() {
        // Monday 02:00-12:00 JST = Sunday Dec 31 17:00 - Monday 03:00 UTC.
        let q = resolve(day(0), hm(2, 0), hm(12, 0), "Asia/Tokyo").unwrap();
        assert_eq!(q.intervals.len(), 2);
        assert_eq!(q.intervals[0].start(), at(utc(0, 17, 0)));
        assert_eq!(q.intervals[0].end(), Endpoint::PosInfinity);
        // Local midnight Monday JST.
        assert_eq!(q.intervals[1].start(), at(utc(0, 15, 0)));
        assert_eq!(q.intervals[1].end(), at(utc(1, 3, 0)));
    }

    #[test]
    fn test_default_window_wraps_east_of_utc() {
        // Sydney is UTC+11 in January: 00:00 local is 13:00 UTC the previous day,
        // 23:59 local is 12:59 UTC the same day, so only the start wraps.
        let q = resolve(day(3), None, None, "Australia/Sydney").unwrap();
        assert_eq!(q.intervals[0].end(), Endpoint::PosInfinity);
        assert_eq!(q.intervals[1].end(), at(utc(4, 12, 59)));
    }

    // ── resolve: errors and determinism ─────────────────────────────────

    #[test]
    fn test_resolve_unknown_timezone() {
        let err = resolve(day(0), None, None, "Not/AZone").unwrap_err();
        assert!(matches!(err, SearchError::MalformedTimeFilter(_)));
    }

    #[test]
    fn test_inverted_window_in_utc_matches_nothing() {
        let q = resolve(day(0), hm(18, 0), hm(9, 0), "UTC").unwrap();
        assert!(q.intervals.is_empty());
        assert!(!q.encloses(utc(1, 18, 0), utc(1, 19, 0)));
        assert!(!q.encloses(utc(1, 8, 0), utc(1, 9, 0)));
    }

    #[test]
    fn test_past_midnight_window_in_new_york_keeps_both_halves() {
        // Tuesday 22:00 EST = Wednesday 03:00 UTC; 02:00 EST = Tuesday 07:00 UTC.
        let q = resolve(day(1), hm(22, 0), hm(2, 0), "America/New_York").unwrap();
        assert_eq!(
            q.intervals,
            vec![
                TimeInterval::new(utc(3, 3, 0), Endpoint::PosInfinity).unwrap(),
                TimeInterval::new(utc(2, 5, 0), utc(2, 7, 0)).unwrap(),
            ]
        );
        assert!(q.encloses(utc(3, 3, 0), utc(3, 4, 0)));
        assert!(q.encloses(utc(2, 5, 30), utc(2, 6, 30)));
    }

    #[test]
    fn test_seconds_past_day_end_drop_the_first_half() {
        let start: ClockTime = "23:59:30".parse().unwrap();
        let end: ClockTime = "23:59:45".parse().unwrap();
        let q = resolve(day(1), Some(start), Some(end), "America/New_York").unwrap();
        // [04:59:30, 04:59:00] is inverted; only the unbounded half remains.
        let end_utc = Utc.with_ymd_and_hms(2001, 1, 3, 4, 59, 45).unwrap();
        assert_eq!(
            q.intervals,
            vec![TimeInterval::new(Endpoint::NegInfinity, end_utc).unwrap()]
        );
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let resolver = TimeWindowResolver::for_timezone("Europe/Berlin").unwrap();
        let a = resolver.resolve(day(4), hm(0, 30), hm(5, 0)).unwrap();
        let b = resolver.resolve(day(4), hm(0, 30), hm(5, 0)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolver_carries_its_own_timezone() {
        let ny = TimeWindowResolver::for_timezone("America/New_York").unwrap();
        let tokyo = TimeWindowResolver::for_timezone("Asia/Tokyo").unwrap();
        let a = ny.resolve(day(2), hm(9, 0), hm(10, 0)).unwrap();
        let _ = tokyo.resolve(day(2), hm(9, 0), hm(10, 0)).unwrap();
        assert_eq!(a, ny.resolve(day(2), hm(9, 0), hm(10, 0)).unwrap());
        assert_eq!(ny.timezone(), chrono_tz::America::New_York);
    }
}
