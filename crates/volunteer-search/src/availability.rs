//! Availability rows and the weekday-window predicate built over them.
//!
//! A request names one or more weekdays plus an optional local clock range.
//! Each weekday resolves to one or two UTC intervals (see [`crate::window`]);
//! a volunteer matches when any one of its availability rows lies entirely
//! inside any one of those intervals. Days are OR-combined, so the predicate
//! for `{0, 2}` accepts exactly the union of the predicates for `{0}` and `{2}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};
use crate::temporal::{ClockTime, DayIndex};
use crate::window::{TimeInterval, TimeWindowResolver, UtcIntervalQuery};

/// A bookable slot, stored as literal UTC instants on the reference week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl Availability {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Availability {
            start_time,
            end_time,
        }
    }
}

/// OR-combination of per-day UTC interval queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityPredicate {
    clauses: Vec<UtcIntervalQuery>,
}

impl AvailabilityPredicate {
    pub fn clauses(&self) -> &[UtcIntervalQuery] {
        &self.clauses
    }

    /// Every interval across all days, in request order.
    pub fn intervals(&self) -> impl Iterator<Item = &TimeInterval> {
        self.clauses.iter().flat_map(|c| c.intervals.iter())
    }

    pub fn matches(&self, availability: &Availability) -> bool {
        self.clauses
            .iter()
            .any(|c| c.encloses(availability.start_time, availability.end_time))
    }

    /// True when at least one of `availabilities` matches.
    pub fn matches_any(&self, availabilities: &[Availability]) -> bool {
        availabilities.iter().any(|a| self.matches(a))
    }

    /// OR two predicates together.
    pub fn or(mut self, other: AvailabilityPredicate) -> Self {
        self.clauses.extend(other.clauses);
        self
    }
}

/// Builds an [`AvailabilityPredicate`] for a set of requested weekdays.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityPredicateBuilder {
    resolver: TimeWindowResolver,
    start: Option<ClockTime>,
    end: Option<ClockTime>,
}

impl AvailabilityPredicateBuilder {
    pub fn new(resolver: TimeWindowResolver) -> Self {
        AvailabilityPredicateBuilder {
            resolver,
            start: None,
            end: None,
        }
    }

    pub fn start(mut self, start: Option<ClockTime>) -> Self {
        self.start = start;
        self
    }

    pub fn end(mut self, end: Option<ClockTime>) -> Self {
        self.end = end;
        self
    }

    /// Resolve every day and OR the results.
    ///
    /// Duplicate days are resolved once.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::DayFilterMissing`] if `days` is empty, or
    /// [`SearchError::MalformedTimeFilter`] if a window cannot be resolved.
    pub fn build(&self, days: &[DayIndex]) -> Result<AvailabilityPredicate> {
        if days.is_empty() {
            return Err(SearchError::DayFilterMissing);
        }

        let mut seen = Vec::with_capacity(days.len());
        let mut clauses = Vec::with_capacity(days.len());
        for &day in days {
            if seen.contains(&day) {
                continue;
            }
            seen.push(day);
            let query = self.resolver.resolve(day, self.start, self.end)?;
            tracing::trace!(
                day = day.get(),
                intervals = query.intervals.len(),
                "resolved day window"
            );
            clauses.push(query);
        }

        Ok(AvailabilityPredicate { clauses })
    }
}

/// Build the availability predicate for `days` in the named timezone.
pub fn build(
    days: &[DayIndex],
    timezone: &str,
    start: Option<ClockTime>,
    end: Option<ClockTime>,
) -> Result<AvailabilityPredicate> {
    if days.is_empty() {
        return Err(SearchError::DayFilterMissing);
    }
    let resolver = TimeWindowResolver::for_timezone(timezone)?;
    AvailabilityPredicateBuilder::new(resolver)
        .start(start)
        .end(end)
        .build(days)
}

// ── Tests ───────────────────────────────────────────────────────────────────
