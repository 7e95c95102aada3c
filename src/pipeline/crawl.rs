// src/pipeline/crawl.rs

//! Crawl commands: course list and details, schedule, departments.

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{Config, CourseDetailRecord};
use crate::pipeline::detail::{DetailBatch, DetailPipeline};
use crate::pipeline::progress::ProgressReporter;
use crate::services::{
    CourseListService, DepartmentCrawler, DetailFetcher, DetailPageParser, PageOutcome,
    ScheduleService,
};
use crate::storage::{CourseRepository, DocumentStore};
use crate::utils::http::Transport;

fn detail_pipeline<T: Transport>(config: &Config, transport: T) -> Result<DetailPipeline<T>> {
    Ok(DetailPipeline::new(
        DetailFetcher::new(transport, config.base_url(), config.crawler.max_concurrent),
        DetailPageParser::new(&config.selectors)?,
    ))
}

/// Crawl the course list and every course detail page, then save the
/// list, the details and their merge.
///
/// Fails before any detail request when the course list cannot be loaded.
pub async fn run_courses<T: Transport + Clone>(
    config: &Config,
    transport: &T,
    store: &dyn DocumentStore,
    progress: &dyn ProgressReporter,
) -> Result<DetailBatch> {
    let start_time = Utc::now();
    let term = config.term();
    let repo = CourseRepository::new(store, config.environment.mode);

    log::info!("Fetching course list for {}", term);
    let courses = CourseListService::new(transport, config.base_url())
        .fetch(&term)
        .await?;
    repo.save_course_info(&courses).await?;
    log::info!("Saved {} courses", courses.len());

    let codes: Vec<String> = courses.iter().map(|c| c.course_code.clone()).collect();
    let codes = config.environment.limit_codes(codes);
    if codes.len() < courses.len() {
        log::warn!("[DEV MODE] Fetching {} course details", codes.len());
    }

    let pipeline = detail_pipeline(config, transport.clone())?;
    let batch = pipeline.run(&codes, &term, progress).await;

    repo.save_course_details(&batch.records).await?;
    repo.save_merged_courses(&courses, &batch.records).await?;

    let elapsed = Utc::now() - start_time;
    log::info!(
        "Course crawl complete: {} merged, {} details in {}s",
        courses.len(),
        batch.records.len(),
        elapsed.num_seconds()
    );
    Ok(batch)
}

/// Re-crawl detail pages for the course codes already in the store.
///
/// Only the detail collection is updated. Fails when no course list has been
/// saved yet.
pub async fn run_details<T: Transport + Clone>(
    config: &Config,
    transport: &T,
    store: &dyn DocumentStore,
    progress: &dyn ProgressReporter,
) -> Result<DetailBatch> {
    let term = config.term();
    let repo = CourseRepository::new(store, config.environment.mode);

    let codes = repo.course_codes().await?;
    if codes.is_empty() {
        return Err(AppError::crawl(
            repo.collection("course_info"),
            "no stored course codes, run the courses command first",
        ));
    }
    let codes = config.environment.limit_codes(codes);
    log::info!("Loaded {} stored course codes", codes.len());

    let pipeline = detail_pipeline(config, transport.clone())?;
    let batch = pipeline.run(&codes, &term, progress).await;
    repo.save_course_details(&batch.records).await?;
    Ok(batch)
}

/// Crawl the enrollment schedule and replace the stored one.
pub async fn run_schedule(
    config: &Config,
    transport: &dyn Transport,
    store: &dyn DocumentStore,
) -> Result<usize> {
    let entries = ScheduleService::new(transport, config.base_url())
        .fetch()
        .await?;
    log::info!("Found {} schedule stages", entries.len());

    CourseRepository::new(store, config.environment.mode)
        .save_schedule(&entries)
        .await?;
    Ok(entries.len())
}

/// Crawl department categories and departments.
pub async fn run_departments(
    config: &Config,
    transport: &dyn Transport,
    store: &dyn DocumentStore,
) -> Result<usize> {
    let catalog = DepartmentCrawler::new(transport, config.base_url())?
        .crawl_all(&config.term())
        .await?;
    log::info!(
        "Total categories: {}, total departments: {}",
        catalog.category_count(),
        catalog.department_count()
    );

    let repo = CourseRepository::new(store, config.environment.mode);
    repo.save_department_categories(&catalog.categories).await?;
    repo.save_departments(&catalog.departments).await?;
    Ok(catalog.department_count())
}

/// Run schedule, departments and courses in order.
///
/// A failing step is logged and the next one still runs; the number of
/// failed steps is returned.
pub async fn run_all<T: Transport + Clone>(
    config: &Config,
    transport: &T,
    store: &dyn DocumentStore,
    progress: &dyn ProgressReporter,
) -> usize {
    let mut failures = 0;

    log::info!("Step 1/3: Crawling enrollment schedule...");
    if let Err(e) = run_schedule(config, transport, store).await {
        log::error!("Schedule crawl failed: {}", e);
        failures += 1;
    }

    log::info!("Step 2/3: Crawling departments...");
    if let Err(e) = run_departments(config, transport, store).await {
        log::error!("Department crawl failed: {}", e);
        failures += 1;
    }

    log::info!("Step 3/3: Crawling courses...");
    if let Err(e) = run_courses(config, transport, store, progress).await {
        log::error!("Course crawl failed: {}", e);
        failures += 1;
    }

    failures
}

/// Fetch and parse a single detail page without saving it.
pub async fn inspect_course<T: Transport>(
    config: &Config,
    transport: T,
    course_code: &str,
) -> Result<Option<CourseDetailRecord>> {
    let term = config.term();
    let fetcher = DetailFetcher::new(transport, config.base_url(), 1);
    let parser = DetailPageParser::new(&config.selectors)?;

    let html = fetcher
        .fetch(course_code, &term)
        .await
        .map_err(|failure| AppError::crawl(fetcher.detail_url(course_code, &term), failure))?;

    Ok(match parser.parse(&html, course_code) {
        PageOutcome::Found(record) => Some(record),
        PageOutcome::NotFound => None,
    })
}
