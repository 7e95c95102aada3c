// src/services/fetcher.rs

//! Bounded detail page fetcher.
//!
//! Every request holds one permit of a shared semaphore for its whole
//! duration, so at most `capacity` requests are in flight at once.

use std::fmt;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::models::Term;
use crate::utils::http::Transport;

/// Why a detail page could not be fetched. Never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The server answered with a non-200 status.
    Status(u16),
    /// Timeout, connection reset, DNS failure and the like.
    Transport(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Status(code) => write!(f, "HTTP {code}"),
            FetchFailure::Transport(message) => write!(f, "transport error: {message}"),
        }
    }
}

/// Fetches course detail pages through a shared concurrency limiter.
pub struct DetailFetcher<T> {
    transport: T,
    base_url: String,
    limiter: Arc<Semaphore>,
    capacity: usize,
}

impl<T: Transport> DetailFetcher<T> {
    /// Create a fetcher allowing `capacity` simultaneous requests.
    pub fn new(transport: T, base_url: &str, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Detail page URL for one course.
    pub fn detail_url(&self, course_code: &str, term: &Term) -> String {
        format!(
            "{}/view/{}/{}/{}/",
            self.base_url, term.year, term.semester, course_code
        )
    }

    /// Fetch the detail page HTML for one course.
    pub async fn fetch(
        &self,
        course_code: &str,
        term: &Term,
    ) -> std::result::Result<String, FetchFailure> {
        let url = self.detail_url(course_code, term);

        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        let page = self
            .transport
            .get(&url)
            .await
            .map_err(|e| FetchFailure::Transport(e.to_string()))?;

        if !page.is_ok() {
            return Err(FetchFailure::Status(page.status));
        }
        Ok(page.body)
    }
}
