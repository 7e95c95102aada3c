// src/pipeline/detail.rs

//! Concurrent detail page fetch-and-extract.

use futures::future::join_all;

use crate::models::{CourseDetailRecord, Term};
use crate::pipeline::progress::ProgressReporter;
use crate::services::{DetailFetcher, DetailPageParser, PageOutcome};
use crate::utils::http::Transport;

/// Records of one detail batch with its loss counters.
#[derive(Debug, Default)]
pub struct DetailBatch {
    pub records: Vec<CourseDetailRecord>,
    /// Course codes handed to the batch
    pub requested: usize,
    /// Pages that could not be fetched
    pub fetch_failures: usize,
    /// Pages fetched but without extractable content
    pub unparseable: usize,
}

impl DetailBatch {
    /// Course codes that produced no record.
    pub fn lost(&self) -> usize {
        self.requested.saturating_sub(self.records.len())
    }
}

enum UnitOutcome {
    Record(CourseDetailRecord),
    FetchFailed,
    Unparseable,
}

/// Fetches and parses course detail pages for a list of course codes.
pub struct DetailPipeline<T> {
    fetcher: DetailFetcher<T>,
    parser: DetailPageParser,
}

impl<T: Transport> DetailPipeline<T> {
    pub fn new(fetcher: DetailFetcher<T>, parser: DetailPageParser) -> Self {
        Self { fetcher, parser }
    }

    /// Run one unit per course code and collect every record produced.
    ///
    /// Units run concurrently, bounded only by the fetcher's limiter. A unit
    /// that fails to fetch or parse is counted and dropped, it never fails
    /// the batch.
    pub async fn run(
        &self,
        course_codes: &[String],
        term: &Term,
        progress: &dyn ProgressReporter,
    ) -> DetailBatch {
        log::info!(
            "Fetching {} course details for {} (max {} concurrent)",
            course_codes.len(),
            term,
            self.fetcher.capacity()
        );
        progress.begin(course_codes.len());

        let units = course_codes.iter().map(|code| async move {
            let outcome = self.unit(code, term).await;
            progress.advance();
            outcome
        });
        let outcomes = join_all(units).await;
        progress.finish();

        let mut batch = DetailBatch {
            requested: course_codes.len(),
            ..DetailBatch::default()
        };
        for outcome in outcomes {
            match outcome {
                UnitOutcome::Record(record) => batch.records.push(record),
                UnitOutcome::FetchFailed => batch.fetch_failures += 1,
                UnitOutcome::Unparseable => batch.unparseable += 1,
            }
        }

        log::info!(
            "Extracted {} of {} course details",
            batch.records.len(),
            batch.requested
        );
        if batch.lost() > 0 {
            log::warn!(
                "Lost {} course details ({} fetch failures, {} without content)",
                batch.lost(),
                batch.fetch_failures,
                batch.unparseable
            );
        }
        batch
    }

    async fn unit(&self, course_code: &str, term: &Term) -> UnitOutcome {
        let html = match self.fetcher.fetch(course_code, term).await {
            Ok(html) => html,
            Err(failure) => {
                log::debug!("Failed to fetch course {}: {}", course_code, failure);
                return UnitOutcome::FetchFailed;
            }
        };

        match self.parser.parse(&html, course_code) {
            PageOutcome::Found(record) => UnitOutcome::Record(record),
            PageOutcome::NotFound => {
                log::debug!("No course content on page for {}", course_code);
                UnitOutcome::Unparseable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::error::{AppError, Result};
    use crate::models::DetailSelectorConfig;
    use crate::pipeline::progress::LogProgress;
    use crate::utils::http::FetchedPage;

    /// Closed for codes starting with `C`, 404 for `M`, transport error for
    /// `E`, a page without a table for `N`, otherwise a minimal full page.
    struct ScriptedTransport;

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, url: &str) -> Result<FetchedPage> {
            let code = url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default();
            let body = match code.chars().next() {
                Some('C') => r#"<div class="warning closable">停開</div>"#,
                Some('M') => {
                    return Ok(FetchedPage {
                        status: 404,
                        body: String::new(),
                    });
                }
                Some('E') => return Err(AppError::crawl(url, "timed out")),
                Some('N') => "<p>找不到</p>",
                _ => "<table><tr><th>方式</th></tr><tr><td>報告</td><td>100</td><td></td></tr></table>",
            };
            Ok(FetchedPage {
                status: 200,
                body: format!("<html><body>{body}</body></html>"),
            })
        }
    }

    fn pipeline() -> DetailPipeline<ScriptedTransport> {
        DetailPipeline::new(
            DetailFetcher::new(ScriptedTransport, "https://course.example.edu", 5),
            DetailPageParser::new(&DetailSelectorConfig::default()).unwrap(),
        )
    }

    fn codes(list: &[&str]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn test_counters() {
        let progress = LogProgress::new("details");
        let batch = pipeline()
            .run(
                &codes(&["C1", "F1", "M1", "E1", "N1", "F2"]),
                &Term::new("114", "2"),
                &progress,
            )
            .await;

        assert_eq!(batch.requested, 6);
        assert_eq!(batch.records.len(), 3);
        assert_eq!(batch.fetch_failures, 2);
        assert_eq!(batch.unparseable, 1);
        assert_eq!(batch.lost(), 3);
        assert_eq!(progress.done(), 6);

        let closed: Vec<&str> = batch
            .records
            .iter()
            .filter(|r| r.is_closed())
            .map(|r| r.course_code())
            .collect();
        assert_eq!(closed, vec!["C1"]);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let progress = LogProgress::new("details");
        let batch = pipeline()
            .run(&[], &Term::new("114", "2"), &progress)
            .await;
        assert_eq!(batch.requested, 0);
        assert!(batch.records.is_empty());
        assert_eq!(progress.done(), 0);
    }
}
