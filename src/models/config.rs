//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use scraper::Selector;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Academic term to crawl
    #[serde(default)]
    pub academic: AcademicConfig,

    /// Deployment environment
    #[serde(default)]
    pub environment: EnvironmentConfig,

    /// Document store location
    #[serde(default)]
    pub storage: StorageConfig,

    /// CSS paths into the course detail page
    #[serde(default)]
    pub selectors: DetailSelectorConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply overrides from process environment variables.
    ///
    /// Reads `ACADEMIC_YEAR`, `ACADEMIC_SEMESTER`, `DB_ENV`, `DEV_DATA_LIMIT`,
    /// `STORAGE_DIR` and `BASE_URL`. A `.env` file in the working directory is
    /// loaded first when present.
    pub fn apply_env(&mut self) -> Result<()> {
        dotenvy::dotenv().ok();
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(year) = var("ACADEMIC_YEAR") {
            self.academic.year = year;
        }
        if let Some(semester) = var("ACADEMIC_SEMESTER") {
            self.academic.semester = semester;
        }
        if let Some(mode) = var("DB_ENV") {
            self.environment.mode = mode.parse()?;
        }
        if let Some(limit) = var("DEV_DATA_LIMIT") {
            self.environment.dev_data_limit = limit.trim().parse().map_err(|e| {
                AppError::config(format!("DEV_DATA_LIMIT must be an integer: {e}"))
            })?;
        }
        if let Some(dir) = var("STORAGE_DIR") {
            self.storage.dir = PathBuf::from(dir);
        }
        if let Some(base_url) = var("BASE_URL") {
            self.crawler.base_url = base_url;
        }
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        Url::parse(&self.crawler.base_url).map_err(|e| {
            AppError::validation(format!(
                "crawler.base_url '{}' is not a valid URL: {e}",
                self.crawler.base_url
            ))
        })?;
        if self.academic.year.trim().is_empty() || self.academic.semester.trim().is_empty() {
            return Err(AppError::validation(
                "academic.year and academic.semester must be set",
            ));
        }
        self.selectors.validate()
    }

    /// The academic term selected by this configuration.
    pub fn term(&self) -> Term {
        Term::new(&self.academic.year, &self.academic.semester)
    }

    /// Base URL of the course site without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.crawler.base_url.trim_end_matches('/')
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum in-flight detail page requests
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Root of the course site
    #[serde(default = "defaults::base_url")]
    pub base_url: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            base_url: defaults::base_url(),
        }
    }
}

/// Academic year and semester selectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicConfig {
    #[serde(default = "defaults::academic_year")]
    pub year: String,

    #[serde(default = "defaults::academic_semester")]
    pub semester: String,
}

impl Default for AcademicConfig {
    fn default() -> Self {
        Self {
            year: defaults::academic_year(),
            semester: defaults::academic_semester(),
        }
    }
}

/// A single academic term, e.g. year `114` semester `2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub year: String,
    pub semester: String,
}

impl Term {
    pub fn new(year: impl Into<String>, semester: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            semester: semester.into(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.year, self.semester)
    }
}

/// Deployment mode. `Dev` truncates batches and suffixes collection names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    #[default]
    Prod,
}

impl Environment {
    /// Collection name for this environment.
    pub fn collection_name(&self, base: &str) -> String {
        match self {
            Environment::Dev => format!("{base}_dev"),
            Environment::Prod => base.to_string(),
        }
    }
}

impl FromStr for Environment {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => Err(AppError::config(format!(
                "DB_ENV must be 'dev' or 'prod', got: {other}"
            ))),
        }
    }
}

/// Environment settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub mode: Environment,

    /// Number of course details fetched in dev mode
    #[serde(default = "defaults::dev_data_limit")]
    pub dev_data_limit: usize,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            mode: Environment::default(),
            dev_data_limit: defaults::dev_data_limit(),
        }
    }
}

impl EnvironmentConfig {
    /// Truncate a course code list for low-volume dev runs.
    pub fn limit_codes(&self, mut codes: Vec<String>) -> Vec<String> {
        if self.mode == Environment::Dev {
            codes.truncate(self.dev_data_limit);
        }
        codes
    }
}

/// Local document store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::storage_dir")]
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: defaults::storage_dir(),
        }
    }
}

/// CSS selector paths used on the course detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailSelectorConfig {
    /// Banner shown on a closed/cancelled course
    #[serde(default = "defaults::closed_notice")]
    pub closed_notice: String,

    /// Grading breakdown table
    #[serde(default = "defaults::grading_table")]
    pub grading_table: String,

    /// Container holding teacher links
    #[serde(default = "defaults::teacher_section")]
    pub teacher_section: String,

    /// Container holding the teaching goal and course overview
    #[serde(default = "defaults::content_section")]
    pub content_section: String,

    /// Heading inside the content container
    #[serde(default = "defaults::section_heading")]
    pub section_heading: String,

    /// Paragraph holding the `<br>`-separated basic info lines
    #[serde(default = "defaults::basic_info")]
    pub basic_info: String,
}

impl Default for DetailSelectorConfig {
    fn default() -> Self {
        Self {
            closed_notice: defaults::closed_notice(),
            grading_table: defaults::grading_table(),
            teacher_section: defaults::teacher_section(),
            content_section: defaults::content_section(),
            section_heading: defaults::section_heading(),
            basic_info: defaults::basic_info(),
        }
    }
}

impl DetailSelectorConfig {
    /// Ensure every configured path is a valid CSS selector.
    pub fn validate(&self) -> Result<()> {
        for (name, path) in self.paths() {
            Selector::parse(path).map_err(|e| {
                AppError::validation(format!("selectors.{name} '{path}' is invalid: {e:?}"))
            })?;
        }
        Ok(())
    }

    fn paths(&self) -> [(&'static str, &str); 6] {
        [
            ("closed_notice", &self.closed_notice),
            ("grading_table", &self.grading_table),
            ("teacher_section", &self.teacher_section),
            ("content_section", &self.content_section),
            ("section_heading", &self.section_heading),
            ("basic_info", &self.basic_info),
        ]
    }
}

mod defaults {
    use std::path::PathBuf;

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; course-crawler/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        5
    }
    pub fn base_url() -> String {
        "https://course.thu.edu.tw".into()
    }

    // Academic defaults
    pub fn academic_year() -> String {
        "114".into()
    }
    pub fn academic_semester() -> String {
        "2".into()
    }

    pub fn dev_data_limit() -> usize {
        10
    }

    pub fn storage_dir() -> PathBuf {
        PathBuf::from("storage")
    }

    // Detail page selectors
    pub fn closed_notice() -> String {
        ".warning.closable".into()
    }
    pub fn grading_table() -> String {
        "table".into()
    }
    pub fn teacher_section() -> String {
        "#mainContent > div:nth-child(4) > div:nth-child(1)".into()
    }
    pub fn content_section() -> String {
        "#mainContent > div:nth-child(4) > div.thirteen.columns".into()
    }
    pub fn section_heading() -> String {
        "h2.title".into()
    }
    pub fn basic_info() -> String {
        "#mainContent > div:nth-child(5) > div:nth-child(2) > div:nth-child(1) > p".into()
    }
}
