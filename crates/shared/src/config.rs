//! Application configuration management.

use chrono::NaiveDate;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Statement engine configuration.
    #[serde(default)]
    pub statement: StatementConfig,
    /// Batch job run by the reporter binary.
    #[serde(default)]
    pub job: Option<JobConfig>,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// How the prior comparison date is derived from the report date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonBasis {
    /// Same day one year earlier.
    #[default]
    Annual,
    /// Same day one month earlier.
    Monthly,
}

/// Which amounts feed the exception-group sign test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExceptionTestWindow {
    /// Current and prior nets are summed; one placement for both columns.
    #[default]
    Combined,
    /// Each column is placed by its own net.
    PerPeriod,
}

/// Statement engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StatementConfig {
    /// Accounting books included when a request names none.
    #[serde(default = "default_books")]
    pub default_books: Vec<String>,
    /// Comparison basis used when a request carries no explicit date.
    #[serde(default)]
    pub comparison: ComparisonBasis,
    /// Sign-test window for exception groups.
    #[serde(default)]
    pub exception_test: ExceptionTestWindow,
    /// Default page size for paginated reads.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_books() -> Vec<String> {
    vec!["F".to_string(), "A".to_string()]
}

fn default_page_size() -> u32 {
    25
}

impl Default for StatementConfig {
    fn default() -> Self {
        Self {
            default_books: default_books(),
            comparison: ComparisonBasis::default(),
            exception_test: ExceptionTestWindow::default(),
            page_size: default_page_size(),
        }
    }
}

/// One-shot generation job for the reporter binary.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    /// Company schema holding the ledger.
    pub company: String,
    /// Balance-sheet variant.
    pub report_type: String,
    /// Requesting identity.
    pub owner: String,
    /// Report date.
    pub as_of: NaiveDate,
    /// Explicit comparison date, overriding the configured basis.
    #[serde(default)]
    pub comparison_date: Option<NaiveDate>,
    /// Accounting books; falls back to `statement.default_books`.
    #[serde(default)]
    pub books: Vec<String>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("BALANZA")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("statement.default_books")
                    .with_list_parse_key("job.books")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
