// src/services/detail/mod.rs

//! Course detail page parser.
//!
//! Turns the HTML of one `/view/{year}/{semester}/{code}/` page into a
//! [`CourseDetailRecord`]. Each field has its own extraction function; a
//! field that cannot be located falls back to its empty value. Only a page
//! with neither a closed-course banner nor a grading table is rejected.

pub mod basic_info;
pub mod chart;

use scraper::{ElementRef, Html, Selector};

use crate::error::Result;
use crate::models::{
    BasicInfo, CourseContent, CourseDetailRecord, DetailSelectorConfig, GradingItem, Percentage,
    SelectionRecord,
};
use crate::utils::html::{NodeExt, parse_selector, table_rows};

pub use chart::ChartParser;

const TEACHING_GOAL_LABEL: &str = "教育目標";
const COURSE_OVERVIEW_LABEL: &str = "課程概述";

/// Outcome of parsing one detail page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// The page produced a record (closed or full).
    Found(CourseDetailRecord),
    /// The page has no extractable content.
    NotFound,
}

impl PageOutcome {
    pub fn into_record(self) -> Option<CourseDetailRecord> {
        match self {
            PageOutcome::Found(record) => Some(record),
            PageOutcome::NotFound => None,
        }
    }
}

/// Compiled selectors for the detail page.
#[derive(Debug, Clone)]
struct DetailSelectors {
    closed_notice: Selector,
    grading_table: Selector,
    teacher_section: Selector,
    content_section: Selector,
    section_heading: Selector,
    basic_info: Selector,
    script: Selector,
    link: Selector,
}

impl DetailSelectors {
    fn new(config: &DetailSelectorConfig) -> Result<Self> {
        Ok(Self {
            closed_notice: parse_selector(&config.closed_notice)?,
            grading_table: parse_selector(&config.grading_table)?,
            teacher_section: parse_selector(&config.teacher_section)?,
            content_section: parse_selector(&config.content_section)?,
            section_heading: parse_selector(&config.section_heading)?,
            basic_info: parse_selector(&config.basic_info)?,
            script: parse_selector("script")?,
            link: parse_selector("a")?,
        })
    }
}

/// Stateless parser for course detail pages.
///
/// Holds only compiled selectors and patterns, so one instance can be shared
/// by every unit of a batch.
#[derive(Debug, Clone)]
pub struct DetailPageParser {
    selectors: DetailSelectors,
    chart: ChartParser,
}

impl DetailPageParser {
    pub fn new(config: &DetailSelectorConfig) -> Result<Self> {
        Ok(Self {
            selectors: DetailSelectors::new(config)?,
            chart: ChartParser::new()?,
        })
    }

    /// Parse one detail page belonging to `course_code`.
    pub fn parse(&self, html: &str, course_code: &str) -> PageOutcome {
        let document = Html::parse_document(html);
        let root = document.root_element();

        if self.is_closed(root) {
            return PageOutcome::Found(CourseDetailRecord::closed(course_code));
        }

        let Some(grading_items) = self.grading_items(root) else {
            return PageOutcome::NotFound;
        };

        let (teaching_goal, course_description) = self.sections(root);
        let content = CourseContent {
            teachers: self.teachers(root),
            grading_items,
            selection_records: self.selection_records(root),
            teaching_goal: teaching_goal.unwrap_or_default(),
            course_description: course_description.unwrap_or_default(),
            basic_info: self.basic_info(root),
        };
        PageOutcome::Found(CourseDetailRecord::full(course_code, content))
    }

    /// Closed courses carry a dismissible warning banner.
    fn is_closed(&self, root: ElementRef<'_>) -> bool {
        root.first(&self.selectors.closed_notice).is_some()
    }

    /// Grading rows of the first table, `None` when the page has no table.
    fn grading_items(&self, root: ElementRef<'_>) -> Option<Vec<GradingItem>> {
        let table = root.first(&self.selectors.grading_table)?;
        let rows = table_rows(table).ok()?;

        Some(
            rows.into_iter()
                .skip(1)
                .filter(|cells| cells.len() >= 3)
                .map(|cells| {
                    let mut cells = cells.into_iter();
                    let method = cells.next().unwrap_or_default();
                    let percentage = cells.next().unwrap_or_default();
                    let description = cells.next().unwrap_or_default();
                    GradingItem {
                        method,
                        percentage: Percentage::from(percentage.as_str()),
                        description,
                    }
                })
                .collect(),
        )
    }

    fn selection_records(&self, root: ElementRef<'_>) -> Vec<SelectionRecord> {
        let scripts = root
            .select(&self.selectors.script)
            .map(|script| script.text().collect::<String>());
        self.chart.extract_first(scripts)
    }

    fn teachers(&self, root: ElementRef<'_>) -> Vec<Option<String>> {
        let Some(section) = root.first(&self.selectors.teacher_section) else {
            return Vec::new();
        };
        section
            .select(&self.selectors.link)
            .map(|a| Some(a.stripped_text()).filter(|name| !name.is_empty()))
            .collect()
    }

    /// Teaching goal and course overview, each read from the paragraph
    /// following its heading.
    fn sections(&self, root: ElementRef<'_>) -> (Option<String>, Option<String>) {
        let mut goal = None;
        let mut overview = None;

        let Some(container) = root.first(&self.selectors.content_section) else {
            return (goal, overview);
        };

        for heading in container.select(&self.selectors.section_heading) {
            let title = heading.stripped_text();
            let Some(paragraph) = heading.next_sibling_named("p") else {
                continue;
            };
            if title.contains(TEACHING_GOAL_LABEL) {
                goal = Some(paragraph.stripped_text());
            } else if title.contains(COURSE_OVERVIEW_LABEL) {
                overview = Some(paragraph.stripped_text());
            }
        }
        (goal, overview)
    }

    fn basic_info(&self, root: ElementRef<'_>) -> BasicInfo {
        root.first(&self.selectors.basic_info)
            .map(|p| basic_info::parse_block(&basic_info::block_text(p)))
            .unwrap_or_default()
    }
}
