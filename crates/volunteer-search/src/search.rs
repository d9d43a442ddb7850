//! The search pipeline.
//!
//! A search runs a fixed sequence of stages over a [`VolunteerQuery`]:
//!
//! ```text
//! ValidateProgram → ValidateDay → ApplyAvailability → ApplyDistance → Paginate → ApplyOrder → Done
//! ```
//!
//! Each stage takes the query and returns it narrowed, or fails with a
//! [`SearchError`]. The first failure ends the search; no partial results are
//! produced. Timezone and caller address travel in a [`SearchContext`] value.

use std::fmt;

use crate::availability::AvailabilityPredicateBuilder;
use crate::distance::{
    Coordinates, DistanceConstraint, DistanceFilter, Geocoder, CLOSEST_SEARCH_RADIUS_MILES,
};
use crate::error::{Result, SearchError};
use crate::params::{RawSearchParams, SearchConfig, SearchParams};
use crate::ranking::{OrderKey, ResultRanker};
use crate::store::{PageRequest, ResultPage, VolunteerQuery};
use crate::window::TimeWindowResolver;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    ValidateProgram,
    ValidateDay,
    ApplyAvailability,
    ApplyDistance,
    Paginate,
    ApplyOrder,
    Done,
}

impl Stage {
    pub const ALL: [Stage; 7] = [
        Stage::ValidateProgram,
        Stage::ValidateDay,
        Stage::ApplyAvailability,
        Stage::ApplyDistance,
        Stage::Paginate,
        Stage::ApplyOrder,
        Stage::Done,
    ];

    pub fn next(self) -> Option<Stage> {
        Stage::ALL.iter().copied().find(|s| *s > self)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::ValidateProgram => "validate_program",
            Stage::ValidateDay => "validate_day",
            Stage::ApplyAvailability => "apply_availability",
            Stage::ApplyDistance => "apply_distance",
            Stage::Paginate => "paginate",
            Stage::ApplyOrder => "apply_order",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Per-request values that are not search parameters.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    /// IANA timezone the day and clock filters are expressed in.
    pub timezone: &'a str,
    /// The caller's address, used for distance filtering and "closest".
    pub address: Option<&'a str>,
}

impl<'a> SearchContext<'a> {
    pub fn new(timezone: &'a str) -> Self {
        SearchContext {
            timezone,
            address: None,
        }
    }

    pub fn with_address(mut self, address: Option<&'a str>) -> Self {
        self.address = address;
        self
    }
}

pub struct SearchOrchestrator<'g> {
    config: SearchConfig,
    distance: DistanceFilter<'g>,
}

impl<'g> SearchOrchestrator<'g> {
    pub fn new(config: SearchConfig, geocoder: &'g dyn Geocoder) -> Self {
        SearchOrchestrator {
            config,
            distance: DistanceFilter::new(geocoder),
        }
    }

    /// Validate `raw` and run the search.
    pub fn search_raw<Q: VolunteerQuery>(
        &self,
        query: Q,
        raw: &RawSearchParams,
        ctx: &SearchContext<'_>,
    ) -> Result<ResultPage<Q::Record>> {
        let params = SearchParams::from_raw(raw)?;
        self.search(query, &params, ctx)
    }

    /// Run every stage over `query` and fetch the requested page.
    pub fn search<Q: VolunteerQuery>(
        &self,
        query: Q,
        params: &SearchParams,
        ctx: &SearchContext<'_>,
    ) -> Result<ResultPage<Q::Record>> {
        let query = self.validate_program(query, params)?;
        self.validate_day(params)?;
        let query = self.apply_availability(query, params, ctx)?;

        let wants_origin = params.distance_miles.is_some()
            || params.order.as_deref() == Some(OrderKey::Closest.as_str());
        let origin = if wants_origin {
            self.distance.origin(ctx.address)
        } else {
            None
        };

        let query = self.apply_distance(query, params, origin);
        let query = self.paginate(query, params);
        let query = self.apply_order(query, params, origin)?;

        let page = query.fetch()?;
        tracing::debug!(
            stage = %Stage::Done,
            total = page.total_entries,
            returned = page.entries.len(),
            page = page.page,
            "search finished"
        );
        Ok(page)
    }

    fn validate_program<Q: VolunteerQuery>(&self, query: Q, params: &SearchParams) -> Result<Q> {
        if params.programs.is_empty() {
            return Err(SearchError::ProgramMissing);
        }
        tracing::debug!(
            stage = %Stage::ValidateProgram,
            programs = params.programs.len(),
            "filtering by program"
        );
        Ok(query.with_programs(&params.programs))
    }

    fn validate_day(&self, params: &SearchParams) -> Result<()> {
        if params.days.is_empty() {
            return Err(SearchError::DayFilterMissing);
        }
        tracing::debug!(stage = %Stage::ValidateDay, days = params.days.len(), "day filter present");
        Ok(())
    }

    fn apply_availability<Q: VolunteerQuery>(
        &self,
        query: Q,
        params: &SearchParams,
        ctx: &SearchContext<'_>,
    ) -> Result<Q> {
        let resolver = TimeWindowResolver::for_timezone(ctx.timezone)?;
        let predicate = AvailabilityPredicateBuilder::new(resolver)
            .start(params.start_time)
            .end(params.end_time)
            .build(&params.days)?;
        tracing::debug!(
            stage = %Stage::ApplyAvailability,
            timezone = ctx.timezone,
            intervals = predicate.intervals().count(),
            "filtering by availability"
        );
        Ok(query.with_availability(&predicate))
    }

    fn apply_distance<Q: VolunteerQuery>(
        &self,
        query: Q,
        params: &SearchParams,
        origin: Option<Coordinates>,
    ) -> Q {
        match self.distance.constraint(params.distance_miles, origin) {
            Some(c) => {
                tracing::debug!(stage = %Stage::ApplyDistance, radius = c.radius_miles, "filtering by distance");
                query.near(&c)
            }
            None => query,
        }
    }

    fn paginate<Q: VolunteerQuery>(&self, query: Q, params: &SearchParams) -> Q {
        let page = PageRequest {
            number: params.page.max(1),
            per_page: self.config.per_page,
        };
        tracing::debug!(stage = %Stage::Paginate, page = page.number, per_page = page.per_page, "paginating");
        query.paginate(page)
    }

    fn apply_order<Q: VolunteerQuery>(
        &self,
        query: Q,
        params: &SearchParams,
        origin: Option<Coordinates>,
    ) -> Result<Q> {
        let ranker = ResultRanker::new(params.order_key()?, origin);
        tracing::debug!(stage = %Stage::ApplyOrder, order = %ranker.key(), "ordering");
        let query = match (ranker.key(), origin) {
            (OrderKey::Closest, Some(origin)) => query.near(&DistanceConstraint {
                origin,
                radius_miles: CLOSEST_SEARCH_RADIUS_MILES,
            }),
            _ => query,
        };
        Ok(query.order_by(ranker))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
