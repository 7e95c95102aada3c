//! Course Crawler CLI
//!
//! Local execution entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use course_crawler::{
    error::{AppError, Result},
    models::Config,
    pipeline::{self, LogProgress},
    storage::LocalStorage,
    utils::http,
};

/// Course catalog crawler
#[derive(Parser, Debug)]
#[command(
    name = "course-crawler",
    version,
    about = "Crawls the university course catalog into a local document store"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the course list and every course detail page
    Courses,

    /// Re-crawl detail pages for course codes already in the store
    Details,

    /// Crawl the enrollment schedule
    Schedule,

    /// Crawl department categories and departments
    Departments,

    /// Run schedule, departments and courses in order
    All,

    /// Fetch and parse one detail page, printing the record as JSON
    Inspect {
        /// Course code (選課代碼)
        course_code: String,
    },

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env()?;

    if let Command::Validate = cli.command {
        log::info!("Validating configuration...");
        if let Err(e) = config.validate() {
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
        log::info!(
            "✓ Config OK (term {}, {:?} mode, storage at {})",
            config.term(),
            config.environment.mode,
            config.storage.dir.display()
        );
        return Ok(());
    }

    config.validate()?;
    log::info!(
        "Course crawler starting for term {} ({:?} mode)",
        config.term(),
        config.environment.mode
    );

    let client = http::create_async_client(&config.crawler)?;
    let storage = LocalStorage::new(&config.storage.dir);

    match cli.command {
        Command::Courses => {
            let progress = LogProgress::new("Course details");
            pipeline::run_courses(&config, &client, &storage, &progress).await?;
        }

        Command::Details => {
            let progress = LogProgress::new("Course details");
            pipeline::run_details(&config, &client, &storage, &progress).await?;
        }

        Command::Schedule => {
            pipeline::run_schedule(&config, &client, &storage).await?;
        }

        Command::Departments => {
            pipeline::run_departments(&config, &client, &storage).await?;
        }

        Command::All => {
            let progress = LogProgress::new("Course details");
            let failures = pipeline::run_all(&config, &client, &storage, &progress).await;
            if failures > 0 {
                return Err(AppError::crawl("all", format!("{failures} step(s) failed")));
            }
        }

        Command::Inspect { course_code } => {
            match pipeline::inspect_course(&config, client, &course_code).await? {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => {
                    return Err(AppError::crawl(
                        course_code,
                        "page has no extractable course content",
                    ));
                }
            }
        }

        Command::Validate => {}
    }

    log::info!("Done!");

    Ok(())
}
