//! Error types for shop-hours operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HoursError {
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid time range: {0}")]
    InvalidRange(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid override: {0}")]
    InvalidOverride(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

pub type Result<T> = std::result::Result<T, HoursError>;
