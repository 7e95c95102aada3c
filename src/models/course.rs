//! Course detail records extracted from the per-course detail page.

use serde::Serialize;

use crate::utils::parse_decimal;

/// Structured content of one course detail page.
///
/// A record is either closed (only `course_code` and `is_closed: true`) or
/// full, in which case every content field is present with its default when
/// the page did not provide it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseDetailRecord {
    course_code: String,
    is_closed: bool,
    #[serde(flatten)]
    content: Option<CourseContent>,
}

impl CourseDetailRecord {
    /// A course that will not run this term.
    pub fn closed(course_code: impl Into<String>) -> Self {
        Self {
            course_code: course_code.into(),
            is_closed: true,
            content: None,
        }
    }

    /// A course page with extracted content.
    pub fn full(course_code: impl Into<String>, content: CourseContent) -> Self {
        Self {
            course_code: course_code.into(),
            is_closed: false,
            content: Some(content),
        }
    }

    pub fn course_code(&self) -> &str {
        &self.course_code
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    /// Extracted content, `None` for closed courses.
    pub fn content(&self) -> Option<&CourseContent> {
        self.content.as_ref()
    }
}

/// Content fields of an open course.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CourseContent {
    /// Teacher names in page order; `None` for a link without text
    pub teachers: Vec<Option<String>>,
    pub grading_items: Vec<GradingItem>,
    pub selection_records: Vec<SelectionRecord>,
    pub teaching_goal: String,
    pub course_description: String,
    pub basic_info: BasicInfo,
}

/// One row of the grading breakdown table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GradingItem {
    pub method: String,
    pub percentage: Percentage,
    pub description: String,
}

/// Grading weight as printed on the page.
///
/// Cells made only of digits (ASCII or full-width) become integers, anything
/// else (`40%`, `依評分標準`) is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Percentage {
    Number(u64),
    Text(String),
}

impl From<&str> for Percentage {
    fn from(text: &str) -> Self {
        match parse_decimal(text) {
            Some(n) => Percentage::Number(n),
            None => Percentage::Text(text.to_string()),
        }
    }
}

/// One observation of the enrollment chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionRecord {
    pub date: String,
    pub enrolled: u64,
    pub remaining: u64,
    pub registered: u64,
}

/// Key/value lines of the basic info block.
///
/// Only populated keys are serialized. `raw_text` is set only when no line
/// carried a recognized label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BasicInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
}

impl BasicInfo {
    /// True when at least one labeled line was recognized.
    pub fn has_labels(&self) -> bool {
        self.course_type.is_some()
            || self.credits.is_some()
            || self.class_time.is_some()
            || self.target_class.is_some()
            || self.target_grade.is_some()
            || self.enrollment_notes.is_some()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_percentage_type_split() {
        assert_eq!(Percentage::from("30"), Percentage::Number(30));
        assert_eq!(Percentage::from("40%"), Percentage::Text("40%".into()));
        assert_eq!(
            Percentage::from("依評分標準"),
            Percentage::Text("依評分標準".into())
        );
        assert_eq!(Percentage::from(""), Percentage::Text(String::new()));
        assert_eq!(Percentage::from("３０"), Percentage::Number(30));
        assert_eq!(Percentage::from("２0"), Percentage::Number(20));
        assert_eq!(Percentage::from("３０％"), Percentage::Text("３０％".into()));
    }

    #[test]
    fn test_closed_record_serializes_two_fields() {
        let value = serde_json::to_value(CourseDetailRecord::closed("A001")).unwrap();
        assert_eq!(value, json!({"course_code": "A001", "is_closed": true}));
    }

    #[test]
    fn test_full_record_serializes_defaults() {
        let value =
            serde_json::to_value(CourseDetailRecord::full("A002", CourseContent::default()))
                .unwrap();
        assert_eq!(
            value,
            json!({
                "course_code": "A002",
                "is_closed": false,
                "teachers": [],
                "grading_items": [],
                "selection_records": [],
                "teaching_goal": "",
                "course_description": "",
                "basic_info": {}
            })
        );
    }

    #[test]
    fn test_grading_item_percentage_json() {
        let items = vec![
            GradingItem {
                method: "期中考".into(),
                percentage: Percentage::from("30"),
                description: String::new(),
            },
            GradingItem {
                method: "期末考".into(),
                percentage: Percentage::from("40%"),
                description: String::new(),
            },
        ];
        let value = serde_json::to_value(items).unwrap();
        assert_eq!(value[0]["percentage"], json!(30));
        assert_eq!(value[1]["percentage"], json!("40%"));
    }

    #[test]
    fn test_basic_info_raw_text_is_not_a_label() {
        let info = BasicInfo {
            raw_text: Some("something".into()),
            ..BasicInfo::default()
        };
        assert!(!info.has_labels());
        assert!(!BasicInfo::default().has_labels());
    }
}
