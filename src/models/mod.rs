// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod course;
mod course_info;
mod department;
mod schedule;

// Re-export all public types
pub use config::{
    AcademicConfig, Config, CrawlerConfig, DetailSelectorConfig, Environment, EnvironmentConfig,
    StorageConfig, Term,
};
pub use course::{
    BasicInfo, CourseContent, CourseDetailRecord, GradingItem, Percentage, SelectionRecord,
};
pub use course_info::CourseInfo;
pub use department::{
    Department, DepartmentCatalog, DepartmentCategory, UNCATEGORIZED_CODE, UNCATEGORIZED_NAME,
};
pub use schedule::ScheduleEntry;
