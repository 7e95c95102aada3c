//! Course list rows from the open-data CSV download.

use std::collections::BTreeMap;

use serde::Serialize;

/// One row of the course list, with the known columns renamed.
///
/// Columns without a known mapping are kept under their original header in
/// `extra`, which is flattened into the stored document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CourseInfo {
    pub academic_year: String,
    pub academic_semester: String,
    pub course_code: String,
    pub course_name: String,
    pub department_code: String,
    pub department_name: String,
    pub course_type: String,
    pub credits_1: String,
    pub credits_2: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl CourseInfo {
    /// Assign a CSV cell by its source header.
    pub fn set_column(&mut self, header: &str, value: String) {
        match header {
            "學年" => self.academic_year = value,
            "學期" => self.academic_semester = value,
            "選課代碼" => self.course_code = value,
            "課程名稱" => self.course_name = value,
            "開課系所代碼" => self.department_code = value,
            "開課系所名稱" => self.department_name = value,
            "必選修" => self.course_type = value,
            "學分1" => self.credits_1 = value,
            "學分2" => self.credits_2 = value,
            other => {
                self.extra.insert(other.to_string(), value);
            }
        }
    }
}
