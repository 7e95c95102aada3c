//! Service layer for the crawler application.
//!
//! This module contains the business logic for:
//! - Course detail page parsing (`DetailPageParser`)
//! - Bounded detail page fetching (`DetailFetcher`)
//! - Course list download (`CourseListService`)
//! - Enrollment schedule (`ScheduleService`)
//! - Department crawling (`DepartmentCrawler`)

mod course_list;
mod departments;
pub mod detail;
mod fetcher;
mod schedule;

pub use course_list::{CourseListService, parse_course_list};
pub use departments::{DepartmentCrawler, parse_category_links, parse_department_table};
pub use detail::{DetailPageParser, PageOutcome};
pub use fetcher::{DetailFetcher, FetchFailure};
pub use schedule::{ScheduleService, parse_schedule};
