//! Pipeline entry points for crawler operations.
//!
//! - `run_courses`: Course list, detail pages and their merge
//! - `run_details`: Detail pages for stored course codes
//! - `run_schedule`: Enrollment schedule
//! - `run_departments`: Department categories and departments
//! - `run_all`: All of the above in order

pub mod crawl;
pub mod detail;
pub mod progress;

pub use crawl::{
    inspect_course, run_all, run_courses, run_departments, run_details, run_schedule,
};
pub use detail::{DetailBatch, DetailPipeline};
pub use progress::{LogProgress, ProgressReporter};
