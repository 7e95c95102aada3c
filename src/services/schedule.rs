// src/services/schedule.rs

//! Enrollment schedule service.
//!
//! Reads the stage table on the course site's index page.

use scraper::Html;

use crate::error::{AppError, Result};
use crate::models::ScheduleEntry;
use crate::utils::html::{NodeExt, parse_selector, table_rows};
use crate::utils::http::{Transport, fetch_page_async};
use crate::utils::time::{range_to_iso_times, to_iso_time};

const STAGE_COLUMN: &str = "選課階段";
const STATUS_COLUMN: &str = "狀態";
const RANGE_COLUMN: &str = "起迄時間";
const PUBLISH_COLUMN: &str = "結果公布日";

/// Service for fetching the enrollment schedule.
pub struct ScheduleService<'a> {
    transport: &'a dyn Transport,
    base_url: &'a str,
}

impl<'a> ScheduleService<'a> {
    pub fn new(transport: &'a dyn Transport, base_url: &'a str) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/'),
        }
    }

    pub fn index_url(&self) -> String {
        format!("{}/index", self.base_url)
    }

    /// Fetch the schedule table from the index page.
    pub async fn fetch(&self) -> Result<Vec<ScheduleEntry>> {
        let url = self.index_url();
        let document = fetch_page_async(self.transport, &url).await?;
        parse_schedule(&document)
    }
}

/// Parse the first table of the index page into schedule entries.
pub fn parse_schedule(document: &Html) -> Result<Vec<ScheduleEntry>> {
    let table_sel = parse_selector("table")?;
    let table = document
        .root_element()
        .first(&table_sel)
        .ok_or_else(|| AppError::crawl("schedule", "no table on index page"))?;

    let mut rows = table_rows(table)?.into_iter();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };

    let column = |name: &str| header.iter().position(|h| h == name);
    let (stage, status, range, publish) = (
        column(STAGE_COLUMN),
        column(STATUS_COLUMN),
        column(RANGE_COLUMN),
        column(PUBLISH_COLUMN),
    );

    let cell = |row: &[String], idx: Option<usize>| -> String {
        idx.and_then(|i| row.get(i)).cloned().unwrap_or_default()
    };

    Ok(rows
        .map(|row| {
            let row = row.as_slice();
            let (start_time, end_time) = match range_to_iso_times(&cell(row, range)) {
                Ok((start, end)) => (Some(start), Some(end)),
                Err(_) => (None, None),
            };
            let published = cell(row, publish);
            ScheduleEntry {
                course_stage: cell(row, stage),
                status: cell(row, status),
                start_time,
                end_time,
                result_publish_time: to_iso_time(&published).unwrap_or(published),
            }
        })
        .collect())
}
