//! User-facing strings: weekday names and error messages.
//!
//! Messages are keyed by [`ErrorKind`]. A catalog is a plain value passed to
//! whoever renders the error; there is no process-wide current locale.

use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, SearchError};
use crate::temporal::DayIndex;

pub trait Localizer {
    fn day_name(&self, day: DayIndex) -> Cow<'_, str>;

    fn message(&self, kind: ErrorKind) -> Cow<'_, str>;

    /// Localized message for `error`, with the error's own detail appended
    /// when it carries one.
    fn render(&self, error: &SearchError) -> String {
        let message = self.message(error.kind());
        match error {
            SearchError::InvalidOrderKey(detail)
            | SearchError::MalformedTimeFilter(detail)
            | SearchError::Store(detail) => format!("{message} ({detail})"),
            SearchError::ProgramMissing | SearchError::DayFilterMissing => message.into_owned(),
        }
    }
}

/// A message catalog. Day names are Sunday-first, like most locale tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub day_names: Option<[String; 7]>,
    #[serde(default)]
    pub messages: HashMap<ErrorKind, String>,
}

const ENGLISH_DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

fn english_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::ProgramMissing => "Please select at least one program.",
        ErrorKind::DayFilterMissing => "Please select at least one day.",
        ErrorKind::InvalidOrderKey => "The selected order is not supported.",
        ErrorKind::MalformedTimeFilter => "The selected time range is not valid.",
        ErrorKind::Store => "Search is temporarily unavailable.",
    }
}

impl Catalog {
    /// The built-in English catalog. Empty tables fall through to it.
    pub fn english() -> Self {
        Catalog {
            day_names: None,
            messages: HashMap::new(),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::english()
    }
}

impl Localizer for Catalog {
    fn day_name(&self, day: DayIndex) -> Cow<'_, str> {
        let slot = day.weekday().num_days_from_sunday() as usize;
        match &self.day_names {
            Some(names) => Cow::Borrowed(names[slot].as_str()),
            None => Cow::Borrowed(ENGLISH_DAY_NAMES[slot]),
        }
    }

    fn message(&self, kind: ErrorKind) -> Cow<'_, str> {
        match self.messages.get(&kind) {
            Some(message) => Cow::Borrowed(message.as_str()),
            None => Cow::Borrowed(english_message(kind)),
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
