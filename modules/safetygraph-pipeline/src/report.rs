use std::fmt;

use chrono::{DateTime, Utc};

use safetygraph_graph::{GraphLoadStats, GraphStats};
use safetygraph_harmonizer::{RecordFailure, TransformationStats};

/// A destination for harmonized records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SinkKind {
    Json,
    Graph,
    Relational,
}

impl SinkKind {
    pub fn name(self) -> &'static str {
        match self {
            SinkKind::Json => "json",
            SinkKind::Graph => "graph",
            SinkKind::Relational => "relational",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What one sink did with one source's batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkOutcome {
    pub sink: SinkKind,
    /// Graph backend actually used (`neo4j` or `memory`).
    pub backend: Option<&'static str>,
    pub written: u64,
    pub failed: u64,
    /// Export file path, for the flat-file sink.
    pub location: Option<String>,
    pub error: Option<String>,
}

impl SinkOutcome {
    pub fn written(sink: SinkKind, written: u64) -> Self {
        Self { sink, backend: None, written, failed: 0, location: None, error: None }
    }

    pub fn failed(sink: SinkKind, error: impl fmt::Display) -> Self {
        Self { error: Some(error.to_string()), ..Self::written(sink, 0) }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

impl fmt::Display for SinkOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.backend {
            Some(backend) => write!(f, "{} ({})", self.sink, backend)?,
            None => write!(f, "{}", self.sink)?,
        }
        match &self.error {
            Some(e) => write!(f, ": FAILED {e}")?,
            None => write!(f, ": {} written", self.written)?,
        }
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        if let Some(location) = &self.location {
            write!(f, " -> {location}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub valid: usize,
    pub invalid: usize,
}

/// Outcome of one source: extract, harmonize, validate, load.
#[derive(Debug, Clone, Default)]
pub struct RunResult {
    pub source: String,
    pub extracted: usize,
    pub harmonized: usize,
    pub failures: Vec<RecordFailure>,
    /// Present only when validation was requested.
    pub validation: Option<ValidationSummary>,
    pub sinks: Vec<SinkOutcome>,
    pub extraction_error: Option<String>,
}

impl RunResult {
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into(), ..Default::default() }
    }

    pub fn extraction_failed(&self) -> bool {
        self.extraction_error.is_some()
    }

    pub fn sink(&self, kind: SinkKind) -> Option<&SinkOutcome> {
        self.sinks.iter().find(|s| s.sink == kind)
    }

    /// Every recovered failure in this run, one line each.
    pub fn errors(&self) -> Vec<String> {
        let extraction = self.extraction_error.iter().map(|e| format!("extraction: {e}"));
        let records = self.failures.iter().map(|f| format!("harmonize: {f}"));
        let sinks = self
            .sinks
            .iter()
            .filter_map(|s| s.error.as_ref().map(|e| format!("{}: {e}", s.sink)));
        extraction.chain(records).chain(sinks).collect()
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n--- Source: {} ---", self.source)?;
        if let Some(e) = &self.extraction_error {
            return writeln!(f, "Extraction FAILED: {e}");
        }
        writeln!(f, "Extracted:  {}", self.extracted)?;
        writeln!(f, "Harmonized: {}", self.harmonized)?;
        writeln!(f, "Failed:     {}", self.failures.len())?;
        if let Some(v) = self.validation {
            writeln!(f, "Valid:      {} ({} invalid)", v.valid, v.invalid)?;
        }
        for sink in &self.sinks {
            writeln!(f, "  {sink}")?;
        }
        Ok(())
    }
}

/// Aggregate over every source processed by one pipeline.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub runs: Vec<RunResult>,
    pub harmonization: TransformationStats,
    pub graph: Option<GraphLoadStats>,
    /// Store totals read just before the graph store was closed.
    pub graph_contents: Option<GraphStats>,
}

impl RunReport {
    pub fn sources_processed(&self) -> usize {
        self.runs.iter().filter(|r| !r.extraction_failed()).count()
    }

    pub fn total_extracted(&self) -> usize {
        self.runs.iter().map(|r| r.extracted).sum()
    }

    pub fn total_harmonized(&self) -> usize {
        self.runs.iter().map(|r| r.harmonized).sum()
    }

    pub fn total_written(&self, kind: SinkKind) -> u64 {
        self.runs.iter().filter_map(|r| r.sink(kind)).map(|s| s.written).sum()
    }

    pub fn errors(&self) -> Vec<String> {
        self.runs
            .iter()
            .flat_map(|r| r.errors().into_iter().map(move |e| format!("[{}] {e}", r.source)))
            .collect()
    }

    /// False when sinks were attempted and every one of them failed.
    pub fn any_sink_succeeded(&self) -> bool {
        let mut attempted = self.runs.iter().flat_map(|r| &r.sinks).peekable();
        attempted.peek().is_none() || attempted.any(SinkOutcome::succeeded)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Pipeline Run Complete ===")?;
        writeln!(f, "Started:           {}", self.started_at.to_rfc3339())?;
        writeln!(f, "Finished:          {}", self.finished_at.to_rfc3339())?;
        writeln!(f, "Duration:          {}s", (self.finished_at - self.started_at).num_seconds())?;
        writeln!(f, "Sources processed: {}/{}", self.sources_processed(), self.runs.len())?;
        writeln!(f, "Records extracted: {}", self.total_extracted())?;
        writeln!(f, "Records harmonized: {}", self.total_harmonized())?;
        writeln!(f, "Loaded (graph):    {}", self.total_written(SinkKind::Graph))?;
        writeln!(f, "Loaded (pg):       {}", self.total_written(SinkKind::Relational))?;
        writeln!(f, "Exported (json):   {}", self.total_written(SinkKind::Json))?;
        for run in &self.runs {
            write!(f, "{run}")?;
        }
        write!(f, "{}", self.harmonization)?;
        if let Some(graph) = &self.graph {
            write!(f, "{graph}")?;
        }
        if let Some(contents) = &self.graph_contents {
            write!(f, "{contents}")?;
        }
        let errors = self.errors();
        if !errors.is_empty() {
            writeln!(f, "\nErrors ({}):", errors.len())?;
            for e in errors {
                writeln!(f, "  {e}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(runs: Vec<RunResult>) -> RunReport {
        let now = Utc::now();
        RunReport {
            started_at: now,
            finished_at: now,
            runs,
            harmonization: TransformationStats::default(),
            graph: None,
            graph_contents: None,
        }
    }

    #[test]
    fn every_sink_failing_is_the_only_failure() {
        let mut failed = RunResult::new("osha");
        failed.sinks = vec![SinkOutcome::failed(SinkKind::Relational, "connection refused")];
        assert!(!report(vec![failed.clone()]).any_sink_succeeded());

        let mut ok = RunResult::new("esaw");
        ok.sinks = vec![SinkOutcome::written(SinkKind::Json, 3)];
        assert!(report(vec![failed, ok]).any_sink_succeeded());

        let mut missing = RunResult::new("cnesst");
        missing.extraction_error = Some("not found".into());
        assert!(report(vec![missing]).any_sink_succeeded());
    }

    #[test]
    fn errors_are_prefixed_by_source() {
        let mut run = RunResult::new("osha");
        run.sinks = vec![SinkOutcome::failed(SinkKind::Graph, "session expired")];
        let errors = report(vec![run]).errors();
        assert_eq!(errors, vec!["[osha] graph: session expired".to_string()]);
    }
}
