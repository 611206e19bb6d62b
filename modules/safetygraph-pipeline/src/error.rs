use std::path::PathBuf;

use thiserror::Error;

use safetygraph_common::SafetyGraphError;

/// Why a source produced no records.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Source file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),

    #[error("Unknown source {0:?}: not a file, no SOURCE_URL_* endpoint and nothing under the data directory")]
    UnknownSource(String),

    #[error("Invalid JSON in {path} at line {line}: {source}")]
    Parse {
        path: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ExtractionError> for SafetyGraphError {
    fn from(e: ExtractionError) -> Self {
        SafetyGraphError::Extraction(e.to_string())
    }
}
