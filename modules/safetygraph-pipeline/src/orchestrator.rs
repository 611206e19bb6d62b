use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use safetygraph_common::{Config, SafetyGraphError, UnifiedIncidentRecord};
use safetygraph_graph::GraphLoader;
use safetygraph_harmonizer::Harmonizer;

use crate::report::{RunReport, RunResult, SinkKind, SinkOutcome, ValidationSummary};
use crate::sink::{JsonExport, RelationalSink};
use crate::source::{resolve_source, RecordSource};

/// Where harmonized records go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputTarget {
    Json,
    #[value(alias = "neo4j")]
    Graph,
    #[value(alias = "postgresql", alias = "pg")]
    Relational,
    All,
}

impl OutputTarget {
    pub fn sinks(self) -> &'static [SinkKind] {
        match self {
            OutputTarget::Json => &[SinkKind::Json],
            OutputTarget::Graph => &[SinkKind::Graph],
            OutputTarget::Relational => &[SinkKind::Relational],
            OutputTarget::All => &[SinkKind::Json, SinkKind::Graph, SinkKind::Relational],
        }
    }

    pub fn includes(self, sink: SinkKind) -> bool {
        self.sinks().contains(&sink)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub output: OutputTarget,
    pub validate: bool,
    /// Records per graph batch.
    pub batch_size: usize,
    /// Use the in-memory graph even when Neo4j is configured.
    pub mock_graph: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { output: OutputTarget::Json, validate: false, batch_size: 1000, mock_graph: false }
    }
}

/// Drives sources through extract, harmonize, validate and load, and owns the
/// sink connections until [`Pipeline::finish`].
pub struct Pipeline {
    config: Config,
    options: PipelineOptions,
    harmonizer: Harmonizer,
    json: Option<JsonExport>,
    graph: Option<GraphLoader>,
    relational: Option<RelationalSink>,
    /// Requested sinks that could not be opened, with the reason.
    unavailable: Vec<(SinkKind, String)>,
    runs: Vec<RunResult>,
    started_at: DateTime<Utc>,
}

impl Pipeline {
    /// A pipeline with no sinks attached.
    pub fn new(config: Config, options: PipelineOptions) -> Self {
        Self {
            config,
            options,
            harmonizer: Harmonizer::new(),
            json: None,
            graph: None,
            relational: None,
            unavailable: Vec::new(),
            runs: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// Open every sink `options.output` asks for. Fails only when none of
    /// them can be opened.
    pub async fn open(config: Config, options: PipelineOptions) -> Result<Self, SafetyGraphError> {
        let mut pipeline = Self::new(config, options);
        let output = options.output;

        if output.includes(SinkKind::Json) {
            let export = JsonExport::new(&pipeline.config.output_dir);
            pipeline = pipeline.with_json(export);
        }

        if output.includes(SinkKind::Graph) {
            let loader = if options.mock_graph {
                info!("Mock mode, using in-memory graph store");
                GraphLoader::in_memory()
            } else {
                GraphLoader::from_config(pipeline.config.neo4j.as_ref()).await
            };
            match loader.initialize_schema().await {
                Ok(seeded) => info!(
                    domains = seeded.domains,
                    jurisdictions = seeded.jurisdictions,
                    backend = loader.backend(),
                    "Graph schema ready"
                ),
                Err(e) => warn!(error = %e, "Graph schema initialization failed, relationships may not link"),
            }
            pipeline = pipeline.with_graph(loader);
        }

        if output.includes(SinkKind::Relational) {
            match open_relational(&pipeline.config).await {
                Ok(sink) => pipeline = pipeline.with_relational(sink),
                Err(e) => {
                    warn!(error = %e, "Relational sink unavailable");
                    pipeline.unavailable.push((SinkKind::Relational, e.to_string()));
                }
            }
        }

        if !pipeline.has_sink() {
            let reasons: Vec<String> = pipeline
                .unavailable
                .iter()
                .map(|(kind, reason)| format!("{kind}: {reason}"))
                .collect();
            return Err(SafetyGraphError::SinkUnavailable(format!(
                "no output sink could be opened ({})",
                reasons.join("; ")
            )));
        }
        Ok(pipeline)
    }

    pub fn with_harmonizer(mut self, harmonizer: Harmonizer) -> Self {
        self.harmonizer = harmonizer;
        self
    }

    pub fn with_json(mut self, export: JsonExport) -> Self {
        self.json = Some(export);
        self
    }

    pub fn with_graph(mut self, loader: GraphLoader) -> Self {
        self.graph = Some(loader);
        self
    }

    pub fn with_relational(mut self, sink: RelationalSink) -> Self {
        self.relational = Some(sink);
        self
    }

    pub fn has_sink(&self) -> bool {
        self.json.is_some() || self.graph.is_some() || self.relational.is_some()
    }

    pub fn harmonizer(&self) -> &Harmonizer {
        &self.harmonizer
    }

    pub fn graph(&self) -> Option<&GraphLoader> {
        self.graph.as_ref()
    }

    pub fn runs(&self) -> &[RunResult] {
        &self.runs
    }

    /// Run one source given by name or file path.
    pub async fn run(&mut self, source: &str) -> &RunResult {
        match resolve_source(source, &self.config) {
            Ok(resolved) => self.run_source(resolved.as_ref()).await,
            Err(e) => {
                error!(source, error = %e, "Cannot resolve source, skipping");
                let mut result = RunResult::new(source);
                result.extraction_error = Some(e.to_string());
                self.record(result)
            }
        }
    }

    /// Run several sources in order. A failing source never stops the rest.
    pub async fn run_all(&mut self, sources: &[&str]) -> &[RunResult] {
        let first = self.runs.len();
        for source in sources {
            info!(source, "Processing source");
            self.run(source).await;
        }
        &self.runs[first..]
    }

    pub async fn run_source(&mut self, source: &dyn RecordSource) -> &RunResult {
        let mut result = RunResult::new(source.name());

        let raw = match source.extract().await {
            Ok(raw) => raw,
            Err(e) => {
                error!(source = source.name(), error = %e, "Extraction failed, skipping source");
                result.extraction_error = Some(format!("{e:#}"));
                return self.record(result);
            }
        };
        result.extracted = raw.len();

        let batch = self.harmonizer.transform_batch(&raw, source.source_hint());
        let mut records = batch.records;
        result.harmonized = records.len();
        result.failures = batch.failures;
        if records.is_empty() {
            warn!(source = source.name(), extracted = raw.len(), "Nothing harmonized, skipping load");
            return self.record(result);
        }

        if self.options.validate {
            let mut summary = ValidationSummary::default();
            for record in &mut records {
                if self.harmonizer.validate_record(record).is_valid() {
                    summary.valid += 1;
                } else {
                    summary.invalid += 1;
                }
            }
            info!(source = source.name(), valid = summary.valid, invalid = summary.invalid, "Validated");
            result.validation = Some(summary);
        }

        result.sinks = self.load(source.name(), &records).await;
        self.record(result)
    }

    async fn load(&mut self, label: &str, records: &[UnifiedIncidentRecord]) -> Vec<SinkOutcome> {
        let mut outcomes = Vec::new();

        if let Some(export) = &self.json {
            outcomes.push(match export.write(label, records).await {
                Ok(path) => SinkOutcome {
                    location: Some(path.display().to_string()),
                    ..SinkOutcome::written(SinkKind::Json, records.len() as u64)
                },
                Err(e) => {
                    warn!(source = label, error = %e, "JSON export failed");
                    SinkOutcome::failed(SinkKind::Json, e)
                }
            });
        }

        if let Some(loader) = self.graph.as_mut() {
            let errors_before = loader.stats().errors;
            let loaded = loader.load_batch(records, self.options.batch_size).await as u64;
            let failed = loader.stats().errors - errors_before;
            let mut outcome = SinkOutcome {
                backend: Some(loader.backend()),
                failed,
                ..SinkOutcome::written(SinkKind::Graph, loaded)
            };
            if loaded == 0 && failed > 0 {
                outcome.error = Some(format!("all {failed} records failed to load"));
            }
            outcomes.push(outcome);
        }

        if let Some(sink) = &self.relational {
            outcomes.push(match sink.insert(records).await {
                Ok(written) => SinkOutcome::written(SinkKind::Relational, written),
                Err(e) => {
                    warn!(source = label, error = %e, "Relational insert failed");
                    SinkOutcome::failed(SinkKind::Relational, e)
                }
            });
        }

        for (kind, reason) in &self.unavailable {
            outcomes.push(SinkOutcome::failed(*kind, format!("unavailable: {reason}")));
        }
        outcomes
    }

    fn record(&mut self, result: RunResult) -> &RunResult {
        info!(
            source = result.source.as_str(),
            extracted = result.extracted,
            harmonized = result.harmonized,
            failed = result.failures.len(),
            "Source finished"
        );
        let index = self.runs.len();
        self.runs.push(result);
        &self.runs[index]
    }

    /// Release every connection and return the aggregate report.
    pub async fn finish(self) -> RunReport {
        let (graph, graph_contents) = match self.graph {
            Some(loader) => {
                let stats = loader.stats();
                let contents = match loader.graph_stats().await {
                    Ok(contents) => Some(contents),
                    Err(e) => {
                        warn!(error = %e, "Failed to read graph totals");
                        None
                    }
                };
                if let Err(e) = loader.close().await {
                    warn!(error = %e, "Failed to close graph store");
                }
                (Some(stats), contents)
            }
            None => (None, None),
        };
        if let Some(sink) = &self.relational {
            sink.close().await;
        }

        RunReport {
            started_at: self.started_at,
            finished_at: Utc::now(),
            runs: self.runs,
            harmonization: self.harmonizer.stats().clone(),
            graph,
            graph_contents,
        }
    }
}

async fn open_relational(config: &Config) -> Result<RelationalSink, SafetyGraphError> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| SafetyGraphError::SinkUnavailable("DATABASE_URL is not set".into()))?;
    let sink = RelationalSink::connect(url, config.pg_batch_size).await?;
    if let Err(e) = sink.ensure_table().await {
        sink.close().await;
        return Err(e);
    }
    info!("Relational sink ready");
    Ok(sink)
}
