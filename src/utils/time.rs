// src/utils/time.rs

//! Date/time conversion for schedule pages (local time is Asia/Taipei).

use chrono::{FixedOffset, NaiveDateTime, TimeZone};

use crate::error::{AppError, Result};

const TAIPEI_OFFSET_SECS: i32 = 8 * 3600;
const PAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert `YYYY-MM-DD HH:MM:SS` in Taipei local time to RFC 3339.
pub fn to_iso_time(text: &str) -> Result<String> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), PAGE_FORMAT)
        .map_err(|e| AppError::validation(format!("invalid datetime '{text}': {e}")))?;
    let offset = FixedOffset::east_opt(TAIPEI_OFFSET_SECS)
        .ok_or_else(|| AppError::validation("invalid UTC offset"))?;
    let local = offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| AppError::validation(format!("ambiguous datetime '{text}'")))?;
    Ok(local.to_rfc3339())
}

/// Convert `start ~ end` into a pair of RFC 3339 strings.
pub fn range_to_iso_times(range: &str) -> Result<(String, String)> {
    let (start, end) = range
        .split_once('~')
        .ok_or_else(|| AppError::validation(format!("not a time range: '{range}'")))?;
    Ok((to_iso_time(start)?, to_iso_time(end)?))
}
