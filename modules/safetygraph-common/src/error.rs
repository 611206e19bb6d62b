use thiserror::Error;

#[derive(Error, Debug)]
pub enum SafetyGraphError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("Graph store error: {0}")]
    Graph(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
