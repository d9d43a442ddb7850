//! Weekday, clock-time and timezone primitives.
//!
//! Stored availability rows do not carry weekday symbols. Each weekday is
//! encoded as a literal calendar date in the first week of January 2001
//! (2001-01-01 was a Monday), so "Tuesday 09:00 in New York" is stored as the
//! UTC instant of 2001-01-02 09:00 America/New_York. Everything here works
//! against that reference week; none of it reads the system clock or any
//! process-wide timezone.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Timelike, Utc, Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};

/// Year of the reference week.
pub const REFERENCE_YEAR: i32 = 2001;
/// Month of the reference week.
pub const REFERENCE_MONTH: u32 = 1;

// ── DayIndex ────────────────────────────────────────────────────────────────

/// A weekday in the reference week: 0 = Monday … 6 = Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayIndex(u8);

impl DayIndex {
    pub const MONDAY: DayIndex = DayIndex(0);
    pub const SUNDAY: DayIndex = DayIndex(6);

    pub fn new(index: u8) -> Option<Self> {
        (index <= 6).then_some(DayIndex(index))
    }

    pub fn all() -> impl Iterator<Item = DayIndex> {
        (0..=6).map(DayIndex)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Day-of-month of this weekday inside the reference week (1..=7).
    pub fn day_of_month(self) -> u32 {
        u32::from(self.0) + 1
    }

    pub fn reference_date(self) -> NaiveDate {
        // January 1..=7 2001 always exist.
        NaiveDate::from_ymd_opt(REFERENCE_YEAR, REFERENCE_MONTH, self.day_of_month())
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn weekday(self) -> Weekday {
        self.reference_date().weekday()
    }
}

impl TryFrom<u8> for DayIndex {
    type Error = SearchError;

    fn try_from(value: u8) -> Result<Self> {
        DayIndex::new(value).ok_or_else(|| {
            SearchError::MalformedTimeFilter(format!("day index {value} is outside 0..=6"))
        })
    }
}

impl From<DayIndex> for u8 {
    fn from(day: DayIndex) -> u8 {
        day.0
    }
}

impl FromStr for DayIndex {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let n: u8 = s
            .parse()
            .map_err(|_| SearchError::MalformedTimeFilter(format!("invalid day index '{s}'")))?;
        DayIndex::try_from(n)
    }
}

impl fmt::Display for DayIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── ClockTime ───────────────────────────────────────────────────────────────

/// A local wall-clock time of day, as typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    /// Default start of a day window.
    pub const START_OF_DAY: ClockTime = ClockTime(NaiveTime::MIN);

    /// Default end of a day window (23:59, not midnight of the next day).
    pub fn end_of_day() -> ClockTime {
        ClockTime(NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN))
    }

    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(ClockTime)
    }

    pub fn as_naive(self) -> NaiveTime {
        self.0
    }
}

impl FromStr for ClockTime {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        parse_time_string(s)
            .map(ClockTime)
            .ok_or_else(|| SearchError::MalformedTimeFilter(format!("invalid clock time '{}'", s.trim())))
    }
}

impl TryFrom<String> for ClockTime {
    type Error = SearchError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(clock: ClockTime) -> String {
        clock.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0.hour(), self.0.minute())?;
        if self.0.second() != 0 {
            write!(f, ":{:02}", self.0.second())?;
        }
        Ok(())
    }
}

// ── Timezone helpers ────────────────────────────────────────────────────────

/// Parse an IANA timezone string into `Tz`.
pub fn parse_timezone(s: &str) -> Result<Tz> {
    s.trim()
        .parse::<Tz>()
        .map_err(|_| SearchError::MalformedTimeFilter(format!("unknown timezone '{}'", s.trim())))
}

/// Interpret a clock time on a reference weekday in `tz` and return the UTC instant.
///
/// Ambiguous local times (DST fall-back) resolve to the earlier instant.
/// Nonexistent local times (DST spring-forward gap) move forward by one hour.
pub fn local_to_utc(tz: &Tz, day: DayIndex, clock: ClockTime) -> Result<DateTime<Utc>> {
    let naive = day.reference_date().and_time(clock.as_naive());
    resolve_local(tz, naive)
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            SearchError::MalformedTimeFilter(format!("local time {naive} does not exist in {tz}"))
        })
}

fn resolve_local(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
    }
}

/// Format the UTC offset of `tz` at local midnight of a reference weekday (e.g. "-05:00").
pub fn utc_offset_on(tz: &Tz, day: DayIndex) -> String {
    let naive = day.reference_date().and_time(NaiveTime::MIN);
    let offset_secs = resolve_local(tz, naive)
        .map(|dt| dt.offset().fix().local_minus_utc())
        .unwrap_or(0);
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let abs_secs = offset_secs.unsigned_abs();
    let hours = abs_secs / 3600;
    let minutes = (abs_secs % 3600) / 60;
    format!("{sign}{hours:02}:{minutes:02}")
}

// ── Parsing helpers ─────────────────────────────────────────────────────────

/// Parse a time string: "14:00", "14:30:00", "2pm", "2:30pm", "2:30 PM".
fn parse_time_string(s: &str) -> Option<NaiveTime> {
    let s = s.trim().to_lowercase();

    if let Ok(t) = NaiveTime::parse_from_str(&s, "%H:%M:%S") {
        return Some(t);
    }
    if let Ok(t) = NaiveTime::parse_from_str(&s, "%H:%M") {
        return Some(t);
    }

    let s_no_space = s.replace(' ', "");
    let (time_part, is_pm) = if let Some(rest) = s_no_space.strip_suffix("pm") {
        (rest, true)
    } else if let Some(rest) = s_no_space.strip_suffix("am") {
        (rest, false)
    } else {
        return None;
    };

    let parts: Vec<&str> = time_part.split(':').collect();
    let hour: u32 = parts.first()?.parse().ok()?;
    let minute: u32 = match parts.get(1) {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    if parts.len() > 2 || !(1..=12).contains(&hour) {
        return None;
    }

    let hour24 = match (hour, is_pm) {
        (12, true) => 12,
        (12, false) => 0,
        (h, true) => h + 12,
        (h, false) => h,
    };

    NaiveTime::from_hms_opt(hour24, minute, 0)
}

// ── Tests ───────────────────────────────────────────────────────────────────
