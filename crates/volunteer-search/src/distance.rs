//! Geographic radius filtering.
//!
//! Address lookup is delegated to a [`Geocoder`]. An address that cannot be
//! resolved disables distance filtering for the request instead of failing it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Radius used by the "closest" ordering, large enough to keep every record.
pub const CLOSEST_SEARCH_RADIUS_MILES: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinates {
            latitude,
            longitude,
        }
    }

    /// Great-circle (haversine) distance in miles.
    pub fn distance_miles(&self, other: &Coordinates) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_MILES * c
    }
}

/// Resolves a free-form address to coordinates.
pub trait Geocoder {
    fn locate(&self, address: &str) -> Option<Coordinates>;
}

/// An address book lookup, case- and whitespace-insensitive on the address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(
    from = "HashMap<String, Coordinates>",
    into = "HashMap<String, Coordinates>"
)]
pub struct PlaceTable {
    places: HashMap<String, Coordinates>,
}

impl PlaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, address: &str, coordinates: Coordinates) {
        self.places.insert(normalize_address(address), coordinates);
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

impl FromIterator<(String, Coordinates)> for PlaceTable {
    fn from_iter<I: IntoIterator<Item = (String, Coordinates)>>(iter: I) -> Self {
        let mut table = PlaceTable::new();
        for (address, coordinates) in iter {
            table.insert(&address, coordinates);
        }
        table
    }
}

impl From<HashMap<String, Coordinates>> for PlaceTable {
    fn from(places: HashMap<String, Coordinates>) -> Self {
        places.into_iter().collect()
    }
}

impl From<PlaceTable> for HashMap<String, Coordinates> {
    fn from(table: PlaceTable) -> Self {
        table.places
    }
}

impl Geocoder for PlaceTable {
    fn locate(&self, address: &str) -> Option<Coordinates> {
        self.places.get(&normalize_address(address)).copied()
    }
}

fn normalize_address(address: &str) -> String {
    address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// A resolved radius constraint around an origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistanceConstraint {
    pub origin: Coordinates,
    pub radius_miles: f64,
}

impl DistanceConstraint {
    /// Records without a location never satisfy a distance constraint.
    pub fn admits(&self, location: Option<&Coordinates>) -> bool {
        location.is_some_and(|loc| self.origin.distance_miles(loc) <= self.radius_miles)
    }
}

/// Turns the request's radius and address into an optional [`DistanceConstraint`].
pub struct DistanceFilter<'g> {
    geocoder: &'g dyn Geocoder,
}

impl<'g> DistanceFilter<'g> {
    pub fn new(geocoder: &'g dyn Geocoder) -> Self {
        DistanceFilter { geocoder }
    }

    /// Geocode `address`, or `None` when it is absent, blank or unknown.
    pub fn origin(&self, address: Option<&str>) -> Option<Coordinates> {
        let address = address.map(str::trim).filter(|a| !a.is_empty())?;
        let origin = self.geocoder.locate(address);
        if origin.is_none() {
            tracing::warn!(address, "address could not be geocoded");
        }
        origin
    }

    /// `None` unless both a positive radius and an origin are present.
    ///
    /// The origin comes from [`DistanceFilter::origin`], so one geocoding
    /// result can serve both the radius filter and "closest" ordering.
    pub fn constraint(
        &self,
        radius_miles: Option<f64>,
        origin: Option<Coordinates>,
    ) -> Option<DistanceConstraint> {
        let radius_miles = radius_miles.filter(|r| r.is_finite() && *r > 0.0)?;
        let origin = origin?;
        Some(DistanceConstraint {
            origin,
            radius_miles,
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
