pub mod error;
pub mod orchestrator;
pub mod report;
pub mod sink;
pub mod source;

pub use error::ExtractionError;
pub use orchestrator::{OutputTarget, Pipeline, PipelineOptions};
pub use report::{RunReport, RunResult, SinkKind, SinkOutcome, ValidationSummary};
pub use sink::{read_export, JsonExport, RelationalSink};
pub use source::{resolve_source, FileSource, HttpSource, RecordSource, KNOWN_SOURCES};
