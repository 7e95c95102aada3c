//! Detail pipeline behavior against simulated course sites.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use course_crawler::error::{AppError, Result};
use course_crawler::models::{Config, DetailSelectorConfig, Environment, Percentage, Term};
use course_crawler::pipeline::{self, DetailPipeline, LogProgress, ProgressReporter};
use course_crawler::services::{DetailFetcher, DetailPageParser};
use course_crawler::storage::{DocumentStore, LocalStorage};
use course_crawler::utils::http::{FetchedPage, Transport};
use tempfile::TempDir;

const BASE: &str = "https://course.example.edu";

const CLOSED_PAGE: &str = r#"<html><body>
<div class="ui warning closable message">本課程已停開</div>
</body></html>"#;

const FULL_PAGE: &str = r#"<html><body>
<div id="mainContent">
  <div>title</div>
  <div>
    <table>
      <tr><th>評分方式</th><th>比例</th><th>說明</th></tr>
      <tr><td>期中考</td><td>40</td><td>紙筆測驗</td></tr>
      <tr><td>報告</td><td>約60%</td><td>分組</td></tr>
    </table>
  </div>
  <div>nav</div>
  <div>
    <div><a href="/teacher/1">陳老師</a></div>
    <div class="thirteen columns">
      <h2 class="title">教育目標</h2>
      <p>理解基本概念</p>
      <h2 class="title">課程概述</h2>
      <p>每週一個主題</p>
    </div>
  </div>
  <div>
    <div>side</div>
    <div><div><p>必修課，學分數：2-0<br>上課時間：一/5,6</p></div></div>
  </div>
</div>
<script>
  var data = google.visualization.arrayToDataTable([
    ['日期','已選','餘額','已登記'],
    ['2025-01-06', 30, 10, 42]
  ]);
</script>
</body></html>"#;

/// Serves canned pages, tracking how many requests are in flight.
#[derive(Clone, Default)]
struct SimulatedSite {
    delay: Duration,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    requests: Arc<AtomicUsize>,
}

impl SimulatedSite {
    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn page_for(url: &str) -> Option<(u16, String)> {
        let path = url.strip_prefix(BASE)?;
        if path.starts_with("/opendatadownload/list/") {
            let csv = "學年,學期,選課代碼,課程名稱,開課系所代碼,開課系所名稱,必選修,學分1,學分2\n\
                       114,2,A001,停開課,300,數學系,選修,2,0\n\
                       114,2,A002,線性代數,300,數學系,必修,2,0\n\
                       114,2,A404,不存在,300,數學系,選修,2,0\n";
            return Some((200, csv.to_string()));
        }
        let code = path.trim_end_matches('/').rsplit('/').next()?;
        match code {
            "A001" => Some((200, CLOSED_PAGE.to_string())),
            "A404" => Some((404, "not found".to_string())),
            "BROKEN" => None,
            _ => Some((200, FULL_PAGE.to_string())),
        }
    }
}

#[async_trait]
impl Transport for SimulatedSite {
    async fn get(&self, url: &str) -> Result<FetchedPage> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        match Self::page_for(url) {
            Some((status, body)) => Ok(FetchedPage { status, body }),
            None => Err(AppError::crawl(url, "connection reset by peer")),
        }
    }
}

/// Counts `advance` calls.
#[derive(Default)]
struct CountingProgress {
    total: AtomicUsize,
    advanced: AtomicUsize,
    finished: AtomicUsize,
}

impl ProgressReporter for CountingProgress {
    fn begin(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
    }

    fn advance(&self) {
        self.advanced.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

fn pipeline_for(site: SimulatedSite, capacity: usize) -> DetailPipeline<SimulatedSite> {
    DetailPipeline::new(
        DetailFetcher::new(site, BASE, capacity),
        DetailPageParser::new(&DetailSelectorConfig::default()).unwrap(),
    )
}

fn term() -> Term {
    Term::new("114", "2")
}

#[tokio::test]
async fn test_in_flight_requests_never_exceed_capacity() {
    let site = SimulatedSite::slow(Duration::from_millis(20));
    let max_in_flight = Arc::clone(&site.max_in_flight);
    let pipeline = pipeline_for(site, 5);

    let codes: Vec<String> = (0..20).map(|i| format!("C{i:03}")).collect();
    let progress = CountingProgress::default();
    let batch = pipeline.run(&codes, &term(), &progress).await;

    assert_eq!(batch.records.len(), 20);
    assert!(max_in_flight.load(Ordering::SeqCst) <= 5);
    assert!(max_in_flight.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn test_single_failure_is_isolated() {
    let pipeline = pipeline_for(SimulatedSite::slow(Duration::from_millis(1)), 5);

    let mut codes: Vec<String> = (0..19).map(|i| format!("C{i:03}")).collect();
    codes.insert(7, "BROKEN".to_string());

    let progress = CountingProgress::default();
    let batch = pipeline.run(&codes, &term(), &progress).await;

    assert_eq!(batch.records.len(), 19);
    assert_eq!(batch.fetch_failures, 1);
    assert!(batch.records.iter().all(|r| r.course_code() != "BROKEN"));
}

#[tokio::test]
async fn test_progress_advances_once_per_unit() {
    let pipeline = pipeline_for(SimulatedSite::default(), 3);
    let codes: Vec<String> = ["A001", "A002", "A404", "BROKEN", "A005"]
        .iter()
        .map(|c| c.to_string())
        .collect();

    let progress = CountingProgress::default();
    let batch = pipeline.run(&codes, &term(), &progress).await;

    assert_eq!(progress.total.load(Ordering::SeqCst), 5);
    assert_eq!(progress.advanced.load(Ordering::SeqCst), 5);
    assert_eq!(progress.finished.load(Ordering::SeqCst), 1);
    assert_eq!(batch.lost(), 2);
}

#[tokio::test]
async fn test_closed_and_full_courses_end_to_end() {
    let pipeline = pipeline_for(SimulatedSite::default(), 5);
    let codes = vec!["A001".to_string(), "A002".to_string()];

    let batch = pipeline
        .run(&codes, &term(), &LogProgress::new("details"))
        .await;
    assert_eq!(batch.records.len(), 2);

    let closed = batch
        .records
        .iter()
        .find(|r| r.course_code() == "A001")
        .unwrap();
    assert!(closed.is_closed());
    assert!(closed.content().is_none());

    let full = batch
        .records
        .iter()
        .find(|r| r.course_code() == "A002")
        .unwrap();
    assert!(!full.is_closed());
    let content = full.content().unwrap();
    assert_eq!(content.teachers, vec![Some("陳老師".to_string())]);
    assert_eq!(content.grading_items.len(), 2);
    assert_eq!(content.grading_items[0].percentage, Percentage::Number(40));
    assert_eq!(
        content.grading_items[1].percentage,
        Percentage::Text("約60%".to_string())
    );
    assert_eq!(content.selection_records.len(), 1);
    assert_eq!(content.selection_records[0].registered, 42);
    assert_eq!(content.teaching_goal, "理解基本概念");
    assert_eq!(content.course_description, "每週一個主題");
    assert_eq!(content.basic_info.course_type.as_deref(), Some("必修課"));
    assert_eq!(content.basic_info.class_time.as_deref(), Some("一/5,6"));
}

#[tokio::test]
async fn test_course_command_saves_merged_documents() {
    let tmp = TempDir::new().unwrap();
    let storage = LocalStorage::new(tmp.path());

    let mut config = Config::default();
    config.crawler.base_url = BASE.to_string();
    config.academic.semester = "2".to_string();
    config.environment.mode = Environment::Prod;

    let site = SimulatedSite::default();
    let batch = pipeline::run_courses(
        &config,
        &site,
        &storage,
        &CountingProgress::default(),
    )
    .await
    .unwrap();
    assert_eq!(batch.requested, 3);
    assert_eq!(batch.records.len(), 2);

    let merged = storage.load_all("courses").await.unwrap();
    assert_eq!(merged.len(), 3);

    let missing = merged
        .iter()
        .find(|doc| doc["course_code"] == "A404")
        .unwrap();
    assert_eq!(missing["course_name"], "不存在");
    assert_eq!(missing["is_closed"], false);
    assert_eq!(missing["grading_items"], serde_json::json!([]));

    let closed = merged
        .iter()
        .find(|doc| doc["course_code"] == "A001")
        .unwrap();
    assert_eq!(closed["is_closed"], true);

    assert_eq!(storage.load_all("course_detail").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_details_command_uses_stored_course_codes() {
    let tmp = TempDir::new().unwrap();
    let storage = LocalStorage::new(tmp.path());
    storage
        .upsert_many(
            "course_info",
            "course_code",
            vec![
                serde_json::json!({"course_code": "A001", "course_name": "停開課"}),
                serde_json::json!({"course_code": "A002", "course_name": "線性代數"}),
            ],
        )
        .await
        .unwrap();

    let mut config = Config::default();
    config.crawler.base_url = BASE.to_string();

    let site = SimulatedSite::default();
    let requests = Arc::clone(&site.requests);
    let progress = CountingProgress::default();
    let batch = pipeline::run_details(&config, &site, &storage, &progress)
        .await
        .unwrap();

    assert_eq!(batch.requested, 2);
    assert_eq!(batch.records.len(), 2);
    assert_eq!(requests.load(Ordering::SeqCst), 2);
    assert_eq!(storage.load_all("course_detail").await.unwrap().len(), 2);
    assert!(storage.load_all("courses").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_details_command_without_stored_codes_fails() {
    let tmp = TempDir::new().unwrap();
    let storage = LocalStorage::new(tmp.path());
    let mut config = Config::default();
    config.crawler.base_url = BASE.to_string();

    let site = SimulatedSite::default();
    let requests = Arc::clone(&site.requests);
    let result =
        pipeline::run_details(&config, &site, &storage, &CountingProgress::default()).await;

    assert!(result.is_err());
    assert_eq!(requests.load(Ordering::SeqCst), 0);
}
