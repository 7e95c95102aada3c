//! Storage abstractions for crawled documents.
//!
//! Every crawl result ends up in a named collection of JSON documents.
//! Collections are keyed by a natural id (`course_code`, `department_code`
//! and so on) and written with upsert semantics, so re-running a crawl
//! updates documents in place.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── course_info.json            # Course list rows
//! ├── course_detail.json          # Parsed detail pages
//! ├── courses.json                # Course list left-joined with details
//! ├── course_schedule.json        # Enrollment stages
//! ├── department_categories.json
//! └── departments.json
//! ```
//!
//! In dev mode each collection name carries a `_dev` suffix.

pub mod local;
pub mod repository;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;
pub use repository::{CourseRepository, merge_courses};

/// Counters reported by an upsert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Documents whose key already existed
    pub matched: usize,
    /// Matched documents that actually changed
    pub modified: usize,
    /// Documents inserted because their key was new
    pub upserted: usize,
}

/// Trait for document storage backends.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Merge `docs` into `collection`, matching existing documents on the
    /// `key` field. Fields of a matched document are overwritten field by
    /// field; fields absent from the incoming document are kept.
    ///
    /// An empty `docs` is a no-op.
    async fn upsert_many(
        &self,
        collection: &str,
        key: &str,
        docs: Vec<Value>,
    ) -> Result<UpsertSummary>;

    /// Replace the whole content of `collection`.
    async fn replace_all(&self, collection: &str, docs: Vec<Value>) -> Result<()>;

    /// Load every document of `collection`. A missing collection is empty.
    async fn load_all(&self, collection: &str) -> Result<Vec<Value>>;
}
