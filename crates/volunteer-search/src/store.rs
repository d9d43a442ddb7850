//! Volunteer records and the queryable record-store seam.
//!
//! [`VolunteerQuery`] is the collaborator the search pipeline talks to. Each
//! builder call narrows or orders the relation and returns it; nothing runs
//! until [`VolunteerQuery::fetch`]. Like a SQL relation, the result does not
//! depend on the order in which filters, ordering and paging were attached.
//!
//! [`MemoryStore`] is the in-process implementation used by the CLI and tests.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::{Availability, AvailabilityPredicate};
use crate::distance::{Coordinates, DistanceConstraint};
use crate::error::Result;
use crate::ranking::ResultRanker;

/// Identifier of a program (a capability a volunteer can help with).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramId(pub String);

impl ProgramId {
    pub fn new(id: impl Into<String>) -> Self {
        ProgramId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProgramId {
    fn from(id: &str) -> Self {
        ProgramId::new(id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Volunteer,
    Client,
    Admin,
}

/// A provider record as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Volunteer {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub programs: Vec<ProgramId>,
    #[serde(default)]
    pub availabilities: Vec<Availability>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<Coordinates>,
}

fn default_active() -> bool {
    true
}

impl Volunteer {
    /// Active volunteers with at least one availability row.
    pub fn is_searchable(&self) -> bool {
        self.role == Role::Volunteer && self.active && !self.availabilities.is_empty()
    }

    pub fn helps_with_any(&self, programs: &BTreeSet<ProgramId>) -> bool {
        self.programs.iter().any(|p| programs.contains(p))
    }
}

/// Page request. `number` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub number: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn offset(&self) -> usize {
        self.number.saturating_sub(1) as usize * self.per_page as usize
    }
}

/// One page of results plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultPage<T> {
    pub page: u32,
    pub per_page: u32,
    pub total_entries: usize,
    pub total_pages: usize,
    pub entries: Vec<T>,
}

/// A lazily evaluated, chainable query over volunteer records.
pub trait VolunteerQuery: Sized {
    type Record;

    /// Keep searchable volunteers that help with any of `programs`.
    fn with_programs(self, programs: &BTreeSet<ProgramId>) -> Self;

    /// Keep records with an availability row matching `predicate`.
    fn with_availability(self, predicate: &AvailabilityPredicate) -> Self;

    /// Keep records within the constraint's radius.
    fn near(self, constraint: &DistanceConstraint) -> Self;

    fn order_by(self, ranker: ResultRanker) -> Self;

    fn paginate(self, page: PageRequest) -> Self;

    /// Execute the query.
    fn fetch(self) -> Result<ResultPage<Self::Record>>;
}

/// Records held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Vec<Volunteer>,
}

impl MemoryStore {
    pub fn new(records: Vec<Volunteer>) -> Self {
        MemoryStore { records }
    }

    pub fn records(&self) -> &[Volunteer] {
        &self.records
    }

    pub fn query(&self) -> MemoryQuery<'_> {
        MemoryQuery {
            records: &self.records,
            programs: None,
            availability: Vec::new(),
            distances: Vec::new(),
            ranker: None,
            page: None,
        }
    }
}

/// Query handle returned by [`MemoryStore::query`].
#[derive(Debug, Clone)]
pub struct MemoryQuery<'a> {
    records: &'a [Volunteer],
    programs: Option<BTreeSet<ProgramId>>,
    availability: Vec<AvailabilityPredicate>,
    distances: Vec<DistanceConstraint>,
    ranker: Option<ResultRanker>,
    page: Option<PageRequest>,
}

impl<'a> MemoryQuery<'a> {
    fn admits(&self, record: &Volunteer) -> bool {
        if let Some(programs) = &self.programs {
            if !(record.is_searchable() && record.helps_with_any(programs)) {
                return false;
            }
        }
        self.availability
            .iter()
            .all(|p| p.matches_any(&record.availabilities))
            && self
                .distances
                .iter()
                .all(|d| d.admits(record.location.as_ref()))
    }
}

impl<'a> VolunteerQuery for MemoryQuery<'a> {
    type Record = &'a Volunteer;

    fn with_programs(mut self, programs: &BTreeSet<ProgramId>) -> Self {
        self.programs = Some(match self.programs.take() {
            Some(existing) => existing.intersection(programs).cloned().collect(),
            None => programs.clone(),
        });
        self
    }

    fn with_availability(mut self, predicate: &AvailabilityPredicate) -> Self {
        self.availability.push(predicate.clone());
        self
    }

    fn near(mut self, constraint: &DistanceConstraint) -> Self {
        self.distances.push(*constraint);
        self
    }

    fn order_by(mut self, ranker: ResultRanker) -> Self {
        self.ranker = Some(ranker);
        self
    }

    fn paginate(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    fn fetch(self) -> Result<ResultPage<&'a Volunteer>> {
        let mut matched: Vec<&'a Volunteer> =
            self.records.iter().filter(|r| self.admits(r)).collect();

        if let Some(ranker) = &self.ranker {
            ranker.rank(&mut matched);
        }

        let total_entries = matched.len();
        let (entries, page, per_page, total_pages) = match self.page {
            Some(page) if page.per_page > 0 => {
                let entries = matched
                    .into_iter()
                    .skip(page.offset())
                    .take(page.per_page as usize)
                    .collect();
                let total_pages = total_entries.div_ceil(page.per_page as usize);
                (entries, page.number, page.per_page, total_pages)
            }
            _ => {
                let per_page = u32::try_from(total_entries).unwrap_or(u32::MAX);
                (matched, 1, per_page, usize::from(total_entries > 0))
            }
        };

        Ok(ResultPage {
            page,
            per_page,
            total_entries,
            total_pages,
            entries,
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
