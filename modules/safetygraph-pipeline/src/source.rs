use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use safetygraph_common::Config;

use crate::error::ExtractionError;

/// Sources processed by `--all`, in order.
pub const KNOWN_SOURCES: &[&str] = &["osha", "esaw", "cnesst"];

/// Anything that yields raw records for one run.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Label used in logs, reports and export file names.
    fn name(&self) -> &str;

    /// Source identifier handed to the harmonizer. `None` means detect per record.
    fn source_hint(&self) -> Option<&str>;

    async fn extract(&self) -> anyhow::Result<Vec<Value>>;
}

// ---------------------------------------------------------------------------
// Local files
// ---------------------------------------------------------------------------

/// A `.json` (array or single object) or `.jsonl` file on disk.
pub struct FileSource {
    path: PathBuf,
    name: String,
    hint: Option<String>,
}

impl FileSource {
    /// A file whose records are typed by signature.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        Self { path, name, hint: None }
    }

    /// A file known to hold records of one named source.
    pub fn for_source(path: impl Into<PathBuf>, source: &str) -> Self {
        Self {
            path: path.into(),
            name: source.to_string(),
            hint: Some(source.to_string()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RecordSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    async fn extract(&self) -> anyhow::Result<Vec<Value>> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Err(ExtractionError::MissingFile(self.path.clone()).into());
        }
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(ExtractionError::Io)?;
        let path_str = self.path.display().to_string();

        let records = match extension(&self.path).as_deref() {
            Some("json") => parse_json_document(&text, &path_str)?,
            Some("jsonl") | Some("ndjson") => parse_json_lines(&text, &path_str)?,
            other => {
                return Err(ExtractionError::UnsupportedFormat(format!(
                    "{path_str} (extension {:?})",
                    other.unwrap_or("")
                ))
                .into())
            }
        };
        info!(path = path_str.as_str(), records = records.len(), "Extracted records from file");
        Ok(records)
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

fn parse_json_document(text: &str, path: &str) -> Result<Vec<Value>, ExtractionError> {
    let value: Value = serde_json::from_str(text).map_err(|source| ExtractionError::Parse {
        path: path.to_string(),
        line: source.line(),
        source,
    })?;
    Ok(unwrap_records(value))
}

fn parse_json_lines(text: &str, path: &str) -> Result<Vec<Value>, ExtractionError> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|source| ExtractionError::Parse {
                path: path.to_string(),
                line: i + 1,
                source,
            })
        })
        .collect()
}

/// A top-level array is the record list; a wrapper object with a `records`,
/// `data` or `results` array is unwrapped; anything else is one record.
fn unwrap_records(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => {
            for key in ["records", "data", "results"] {
                if matches!(obj.get(key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = obj.remove(key) {
                        return items;
                    }
                }
            }
            vec![Value::Object(obj)]
        }
        other => vec![other],
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// JSON-over-HTTP endpoint. One GET per extraction, no retry. Successive
/// requests from the same instance are spaced by at least `min_interval`.
pub struct HttpSource {
    name: String,
    url: String,
    client: reqwest::Client,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl HttpSource {
    pub fn new(
        name: &str,
        url: &str,
        timeout: Duration,
        min_interval: Duration,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| ExtractionError::Http { url: url.to_string(), source })?;
        Ok(Self {
            name: name.to_string(),
            url: url.to_string(),
            client,
            min_interval,
            last_request: Mutex::new(None),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn wait_turn(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(at) = *last {
            let ready = at + self.min_interval;
            if ready > Instant::now() {
                debug!(source = self.name.as_str(), "Rate limiting, waiting for next request slot");
                tokio::time::sleep_until(ready).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl RecordSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_hint(&self) -> Option<&str> {
        Some(&self.name)
    }

    async fn extract(&self) -> anyhow::Result<Vec<Value>> {
        self.wait_turn().await;
        let http_err = |source| ExtractionError::Http { url: self.url.clone(), source };

        let value: Value = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(http_err)?
            .json()
            .await
            .map_err(http_err)?;

        let records = unwrap_records(value);
        info!(source = self.name.as_str(), records = records.len(), "Extracted records over HTTP");
        Ok(records)
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Turn a `--source` argument into a record source.
///
/// An existing path (or anything with a `.json`/`.jsonl` extension) is read as
/// a file with per-record detection. Otherwise the argument is a source name:
/// `SOURCE_URL_<NAME>` wins, then `<data_dir>/<name>.json`, then `.jsonl`.
pub fn resolve_source(arg: &str, config: &Config) -> Result<Box<dyn RecordSource>, ExtractionError> {
    let path = Path::new(arg);
    let looks_like_file = matches!(extension(path).as_deref(), Some("json" | "jsonl" | "ndjson"));
    if path.is_file() || looks_like_file {
        return Ok(Box::new(FileSource::new(path)));
    }

    let name = arg.to_lowercase();
    if let Some(url) = config.source_urls.get(&name) {
        let source = HttpSource::new(&name, url, config.http_timeout, config.http_min_interval)?;
        return Ok(Box::new(source));
    }

    for ext in ["json", "jsonl"] {
        let candidate = config.data_dir.join(format!("{name}.{ext}"));
        if candidate.is_file() {
            return Ok(Box::new(FileSource::for_source(candidate, &name)));
        }
    }

    Err(ExtractionError::UnknownSource(arg.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrapper_objects_are_unwrapped() {
        let wrapped = json!({"records": [{"a": 1}, {"a": 2}], "total": 2});
        assert_eq!(unwrap_records(wrapped).len(), 2);

        let single = json!({"event_type": "42"});
        assert_eq!(unwrap_records(single.clone()), vec![single]);
    }

    #[test]
    fn json_lines_skip_blanks_and_report_line_numbers() {
        let text = "{\"a\": 1}\n\n{\"a\": 2}\n";
        assert_eq!(parse_json_lines(text, "x.jsonl").unwrap().len(), 2);

        let err = parse_json_lines("{\"a\": 1}\nnot json\n", "x.jsonl").unwrap_err();
        assert!(matches!(err, ExtractionError::Parse { line: 2, .. }));
    }

    #[tokio::test]
    async fn missing_file_is_an_extraction_error() {
        let source = FileSource::new("/nonexistent/osha.json");
        let err = source.extract().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExtractionError>(),
            Some(ExtractionError::MissingFile(_))
        ));
    }

    #[tokio::test]
    async fn reads_json_lines_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.jsonl");
        std::fs::write(&path, "{\"event_type\": \"42\"}\n{\"event_type\": \"51\"}\n").unwrap();

        let records = FileSource::new(&path).extract().await.unwrap();
        assert_eq!(records.len(), 2);

        let csv = dir.path().join("batch.csv");
        std::fs::write(&csv, "a,b\n").unwrap();
        let err = FileSource::new(&csv).extract().await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ExtractionError>(),
            Some(ExtractionError::UnsupportedFormat(_))
        ));
    }

    #[tokio::test]
    async fn named_source_resolves_from_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cnesst.json"), r#"[{"genre_accident": "31"}]"#).unwrap();
        let config = Config { data_dir: dir.path().to_path_buf(), ..Config::default() };

        let source = resolve_source("CNESST", &config).unwrap();
        assert_eq!(source.name(), "cnesst");
        assert_eq!(source.source_hint(), Some("cnesst"));
        assert_eq!(source.extract().await.unwrap().len(), 1);

        assert!(matches!(
            resolve_source("ilostat", &config),
            Err(ExtractionError::UnknownSource(_))
        ));
    }

    #[test]
    fn configured_url_wins_over_data_dir() {
        let mut config = Config::default();
        config.source_urls.insert("esaw".into(), "http://localhost:9/esaw".into());
        let source = resolve_source("esaw", &config).unwrap();
        assert_eq!(source.source_hint(), Some("esaw"));
    }
}
