//! Error types for volunteer search operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("Program filter is missing")]
    ProgramMissing,

    #[error("Day filter is missing")]
    DayFilterMissing,

    #[error("Invalid order key: '{0}'")]
    InvalidOrderKey(String),

    #[error("Malformed time filter: {0}")]
    MalformedTimeFilter(String),

    #[error("Record store error: {0}")]
    Store(String),
}

/// Fieldless discriminant of [`SearchError`], used to key localized messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ProgramMissing,
    DayFilterMissing,
    InvalidOrderKey,
    MalformedTimeFilter,
    Store,
}

impl ErrorKind {
    /// Bad-request errors caused by the caller's parameters. These are never
    /// worth retrying.
    pub fn is_user_error(self) -> bool {
        !matches!(self, ErrorKind::Store)
    }

    /// Snake-case key used in message catalogs.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::ProgramMissing => "program_missing",
            ErrorKind::DayFilterMissing => "day_filter_missing",
            ErrorKind::InvalidOrderKey => "invalid_order_key",
            ErrorKind::MalformedTimeFilter => "malformed_time_filter",
            ErrorKind::Store => "store",
        }
    }
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::ProgramMissing => ErrorKind::ProgramMissing,
            SearchError::DayFilterMissing => ErrorKind::DayFilterMissing,
            SearchError::InvalidOrderKey(_) => ErrorKind::InvalidOrderKey,
            SearchError::MalformedTimeFilter(_) => ErrorKind::MalformedTimeFilter,
            SearchError::Store(_) => ErrorKind::Store,
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;
