//! Enrollment period schedule rows.

use serde::Serialize;

/// One stage of the enrollment schedule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    /// 選課階段
    pub course_stage: String,
    /// 狀態
    pub status: String,
    /// Stage opening time (RFC 3339), `None` when the range is malformed
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// RFC 3339 when parseable, otherwise the text as printed
    pub result_publish_time: String,
}
