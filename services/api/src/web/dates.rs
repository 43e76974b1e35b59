//! services/api/src/web/dates.rs
//!
//! Parsing of the dates and timestamps clients send.
//!
//! Timestamps are stored as naive local time. Inputs carrying an offset
//! (`2024-01-15T12:30:00Z`) are converted to the server's local time first.

use crate::error::ApiError;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};

pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn parse_timestamp(field: &str, raw: &str) -> Result<NaiveDateTime, ApiError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Local).naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|_| ApiError::BadRequest(format!("{} must be an ISO-8601 timestamp", field)))
}

/// Accepts `YYYY-MM-DD`, or a full timestamp whose date part is used.
pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| parse_timestamp(field, raw).map(|ts| ts.date()))
        .map_err(|_| ApiError::BadRequest(format!("{} must be a date (YYYY-MM-DD)", field)))
}

/// A missing or empty query parameter means today.
pub fn date_or_today(field: &str, raw: Option<&str>) -> Result<NaiveDate, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_date(field, raw),
        None => Ok(local_today()),
    }
}
