//! Course-domain persistence on top of a [`DocumentStore`].

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::error::{AppError, Result};
use crate::models::{
    CourseDetailRecord, CourseInfo, Department, DepartmentCategory, Environment, ScheduleEntry,
};
use crate::storage::{DocumentStore, UpsertSummary};

const COURSE_INFO: &str = "course_info";
const COURSE_DETAIL: &str = "course_detail";
const COURSES: &str = "courses";
const COURSE_SCHEDULE: &str = "course_schedule";
const DEPARTMENT_CATEGORIES: &str = "department_categories";
const DEPARTMENTS: &str = "departments";

const COURSE_KEY: &str = "course_code";

/// Saves crawl results into environment-specific collections.
pub struct CourseRepository<'a> {
    store: &'a dyn DocumentStore,
    env: Environment,
}

impl<'a> CourseRepository<'a> {
    pub fn new(store: &'a dyn DocumentStore, env: Environment) -> Self {
        Self { store, env }
    }

    /// Collection name for the current environment.
    pub fn collection(&self, base: &str) -> String {
        self.env.collection_name(base)
    }

    pub async fn save_course_info(&self, courses: &[CourseInfo]) -> Result<UpsertSummary> {
        let docs = to_documents(courses)?;
        self.upsert(COURSE_INFO, COURSE_KEY, docs).await
    }

    pub async fn save_course_details(
        &self,
        records: &[CourseDetailRecord],
    ) -> Result<UpsertSummary> {
        let docs = records
            .iter()
            .map(detail_document)
            .collect::<Result<Vec<_>>>()?;
        self.upsert(COURSE_DETAIL, COURSE_KEY, docs).await
    }

    /// Save course list rows joined with their detail records.
    pub async fn save_merged_courses(
        &self,
        courses: &[CourseInfo],
        records: &[CourseDetailRecord],
    ) -> Result<UpsertSummary> {
        let docs = merge_courses(courses, records)?;
        self.upsert(COURSES, COURSE_KEY, docs).await
    }

    /// Replace the stored schedule with `entries`.
    pub async fn save_schedule(&self, entries: &[ScheduleEntry]) -> Result<()> {
        let collection = self.collection(COURSE_SCHEDULE);
        log::info!("Saving course schedule (collection: {})", collection);
        self.store
            .replace_all(&collection, to_documents(entries)?)
            .await
    }

    pub async fn save_department_categories(
        &self,
        categories: &[DepartmentCategory],
    ) -> Result<UpsertSummary> {
        let docs = to_documents(categories)?;
        self.upsert(DEPARTMENT_CATEGORIES, "category_code", docs)
            .await
    }

    pub async fn save_departments(&self, departments: &[Department]) -> Result<UpsertSummary> {
        let docs = to_documents(departments)?;
        self.upsert(DEPARTMENTS, "department_code", docs).await
    }

    /// Distinct course codes of the stored course list, in stored order.
    pub async fn course_codes(&self) -> Result<Vec<String>> {
        let docs = self.store.load_all(&self.collection(COURSE_INFO)).await?;
        let mut seen = HashSet::new();
        Ok(docs
            .iter()
            .filter_map(|doc| doc.get(COURSE_KEY)?.as_str())
            .filter(|code| seen.insert(code.to_string()))
            .map(str::to_string)
            .collect())
    }

    async fn upsert(&self, base: &str, key: &str, docs: Vec<Value>) -> Result<UpsertSummary> {
        let collection = self.collection(base);
        if docs.is_empty() {
            log::info!("Nothing to save into {}", collection);
            return Ok(UpsertSummary::default());
        }

        log::info!("Saving {} documents (collection: {})", docs.len(), collection);
        let summary = self.store.upsert_many(&collection, key, docs).await?;
        log::info!(
            "Write matched: {}, modified: {}, upserted: {}",
            summary.matched,
            summary.modified,
            summary.upserted
        );
        Ok(summary)
    }
}

fn to_documents<T: Serialize>(items: &[T]) -> Result<Vec<Value>> {
    items
        .iter()
        .map(|item| serde_json::to_value(item).map_err(AppError::from))
        .collect()
}

fn into_object(value: Value) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(AppError::storage(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Fill every detail field a record did not carry with its empty value.
fn apply_detail_defaults(doc: &mut Map<String, Value>) {
    let defaults = [
        ("is_closed", json!(false)),
        ("teachers", json!([])),
        ("grading_items", json!([])),
        ("selection_records", json!([])),
        ("teaching_goal", json!("")),
        ("course_description", json!("")),
        ("basic_info", json!({})),
    ];
    for (field, value) in defaults {
        doc.entry(field).or_insert(value);
    }
}

/// Stored shape of a detail record: closed records get empty content fields.
fn detail_document(record: &CourseDetailRecord) -> Result<Value> {
    let mut doc = into_object(serde_json::to_value(record)?)?;
    apply_detail_defaults(&mut doc);
    Ok(Value::Object(doc))
}

/// Left-join course list rows with detail records on `course_code`.
///
/// Courses without a detail record keep their list fields and get empty
/// detail fields.
pub fn merge_courses(
    courses: &[CourseInfo],
    records: &[CourseDetailRecord],
) -> Result<Vec<Value>> {
    let details: HashMap<&str, &CourseDetailRecord> = records
        .iter()
        .map(|record| (record.course_code(), record))
        .collect();

    courses
        .iter()
        .map(|course| {
            let mut doc = into_object(serde_json::to_value(course)?)?;
            if let Some(record) = details.get(course.course_code.as_str()) {
                doc.extend(into_object(serde_json::to_value(record)?)?);
            }
            apply_detail_defaults(&mut doc);
            Ok(Value::Object(doc))
        })
        .collect()
}
