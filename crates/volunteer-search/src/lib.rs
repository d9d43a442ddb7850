//! # volunteer-search
//!
//! Timezone-aware search over volunteer records.
//!
//! A search filters volunteers by the programs they help with, by weekday
//! availability windows expressed in the caller's local time, and by distance
//! from the caller's address, then orders and paginates the result. The hard
//! part is the availability match: local weekday windows are converted into
//! UTC intervals over a fixed reference week, split when they cross a UTC day
//! boundary, and OR-combined across the requested days.
//!
//! ## Modules
//!
//! - [`temporal`] — Reference-week weekdays, clock times, timezone conversion
//! - [`window`] — Local weekday window → one or two UTC intervals
//! - [`availability`] — Availability rows and the OR-combined day predicate
//! - [`distance`] — Haversine radius filtering behind a geocoder seam
//! - [`ranking`] — Closed set of order keys and the result ranker
//! - [`params`] — Raw request bag → validated search parameters
//! - [`store`] — Volunteer records, the queryable store seam, in-memory store
//! - [`search`] — The staged search pipeline
//! - [`locale`] — Day names and user-facing error messages
//! - [`error`] — Error types

pub mod availability;
pub mod distance;
pub mod error;
pub mod locale;
pub mod params;
pub mod ranking;
pub mod search;
pub mod store;
pub mod temporal;
pub mod window;

pub use availability::{Availability, AvailabilityPredicate, AvailabilityPredicateBuilder};
pub use distance::{Coordinates, DistanceConstraint, DistanceFilter, Geocoder, PlaceTable};
pub use error::{ErrorKind, SearchError};
pub use locale::{Catalog, Localizer};
pub use params::{RawSearchParams, SearchConfig, SearchParams, PER_PAGE};
pub use ranking::{OrderKey, ResultRanker};
pub use search::{SearchContext, SearchOrchestrator, Stage};
pub use store::{
    MemoryQuery, MemoryStore, PageRequest, ProgramId, ResultPage, Role, Volunteer, VolunteerQuery,
};
pub use temporal::{ClockTime, DayIndex};
pub use window::{Endpoint, TimeInterval, TimeWindowResolver, UtcIntervalQuery};
