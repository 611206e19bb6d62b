use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::SafetyGraphError;

/// Neo4j connection settings. Absent means the in-memory graph is used.
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub neo4j: Option<Neo4jConfig>,

    // Postgres
    pub database_url: Option<String>,
    pub pg_batch_size: usize,

    // Files
    pub output_dir: PathBuf,
    pub data_dir: PathBuf,

    // Extraction
    /// Lower-cased source name -> HTTP endpoint, from `SOURCE_URL_<NAME>`.
    pub source_urls: HashMap<String, String>,
    pub http_timeout: Duration,
    pub http_min_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            neo4j: None,
            database_url: None,
            pg_batch_size: 10_000,
            output_dir: PathBuf::from("./output"),
            data_dir: PathBuf::from("./data"),
            source_urls: HashMap::new(),
            http_timeout: Duration::from_secs(30),
            http_min_interval: Duration::from_millis(1000),
        }
    }
}

impl Config {
    /// Load configuration from environment variables. Every value is optional;
    /// only malformed numbers are rejected.
    pub fn from_env() -> Result<Self, SafetyGraphError> {
        let defaults = Self::default();

        let neo4j = match (non_empty_env("NEO4J_URI"), non_empty_env("NEO4J_USER")) {
            (Some(uri), Some(user)) => Some(Neo4jConfig {
                uri,
                user,
                password: env::var("NEO4J_PASSWORD").unwrap_or_default(),
            }),
            _ => None,
        };

        let source_urls = env::vars()
            .filter_map(|(key, value)| {
                let name = key.strip_prefix("SOURCE_URL_")?;
                (!value.is_empty()).then(|| (name.to_lowercase(), value))
            })
            .collect();

        Ok(Self {
            neo4j,
            database_url: non_empty_env("DATABASE_URL"),
            pg_batch_size: parse_env("PG_BATCH_SIZE")?.unwrap_or(defaults.pg_batch_size),
            output_dir: non_empty_env("OUTPUT_DIR").map(PathBuf::from).unwrap_or(defaults.output_dir),
            data_dir: non_empty_env("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            source_urls,
            http_timeout: parse_env("HTTP_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            http_min_interval: parse_env("HTTP_MIN_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.http_min_interval),
        })
    }

    /// Log the loaded configuration without secrets.
    pub fn log_redacted(&self) {
        tracing::info!("Config loaded:");
        match &self.neo4j {
            Some(n) => tracing::info!("  NEO4J_URI: {} (user {})", n.uri, n.user),
            None => tracing::info!("  NEO4J_URI: <not set> (in-memory graph)"),
        }
        tracing::info!(
            "  DATABASE_URL: {}",
            if self.database_url.is_some() { "<set>" } else { "<not set>" }
        );
        tracing::info!("  OUTPUT_DIR: {}", self.output_dir.display());
        tracing::info!("  DATA_DIR: {}", self.data_dir.display());
        let mut sources: Vec<_> = self.source_urls.keys().map(String::as_str).collect();
        sources.sort_unstable();
        tracing::info!("  SOURCE_URL_*: [{}]", sources.join(", "));
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, SafetyGraphError> {
    match non_empty_env(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SafetyGraphError::Config(format!("{key} must be a number, got {raw:?}"))),
    }
}
