// src/services/course_list.rs

//! Course list service.
//!
//! Downloads the open-data CSV for a term and maps each row to a
//! [`CourseInfo`].

use crate::error::{AppError, Result};
use crate::models::{CourseInfo, Term};
use crate::utils::http::{Transport, fetch_text};

/// Service for fetching the course list of a term.
pub struct CourseListService<'a> {
    transport: &'a dyn Transport,
    base_url: &'a str,
}

impl<'a> CourseListService<'a> {
    pub fn new(transport: &'a dyn Transport, base_url: &'a str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/'),
        }
    }

    /// CSV download URL for a term.
    pub fn list_url(&self, term: &Term) -> String {
        format!(
            "{}/opendatadownload/list/{}/{}/",
            self.base_url, term.year, term.semester
        )
    }

    /// Fetch and parse the course list.
    ///
    /// An unreachable list or a list without any course is an error: the
    /// detail crawl must not run on an empty input.
    pub async fn fetch(&self, term: &Term) -> Result<Vec<CourseInfo>> {
        let url = self.list_url(term);
        let text = fetch_text(self.transport, &url).await?;
        let courses = parse_course_list(&text)?;

        if courses.is_empty() {
            return Err(AppError::crawl(url, "course list is empty"));
        }
        Ok(courses)
    }
}

/// Parse the course list CSV.
///
/// A short row keeps its leading cells and leaves the missing columns empty.
/// Rows with more cells than the header, unreadable rows and rows without a
/// course code are skipped.
pub fn parse_course_list(text: &str) -> Result<Vec<CourseInfo>> {
    let text = text.trim_start_matches('\u{feff}');
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut courses = Vec::new();
    let mut skipped = 0usize;

    for (line, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) if record.len() <= headers.len() => record,
            Ok(record) => {
                log::debug!(
                    "Skipping course list row {}: expected at most {} fields, got {}",
                    line + 2,
                    headers.len(),
                    record.len()
                );
                skipped += 1;
                continue;
            }
            Err(e) => {
                log::debug!("Skipping course list row {}: {}", line + 2, e);
                skipped += 1;
                continue;
            }
        };

        let mut info = CourseInfo::default();
        let mut cells = record.iter();
        for header in &headers {
            info.set_column(header, cells.next().unwrap_or_default().to_string());
        }
        if info.course_code.trim().is_empty() {
            skipped += 1;
            continue;
        }
        courses.push(info);
    }

    if skipped > 0 {
        log::warn!("Skipped {} malformed course list rows", skipped);
    }
    Ok(courses)
}
