use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use safetygraph_common::{record_json_schema, Config};
use safetygraph_pipeline::{OutputTarget, Pipeline, PipelineOptions, KNOWN_SOURCES};

#[derive(Parser)]
#[command(name = "safetygraph")]
#[command(about = "Harmonize workplace-injury records and load them into file, graph and relational sinks")]
#[command(version)]
struct Cli {
    /// Source name (osha, esaw, cnesst) or path to a .json/.jsonl file
    #[arg(short, long, required_unless_present_any = ["all", "schema"])]
    source: Option<String>,

    /// Where harmonized records go
    #[arg(short, long, value_enum, default_value_t = OutputTarget::Json)]
    output: OutputTarget,

    /// Validate records before loading
    #[arg(short, long)]
    validate: bool,

    /// Process every known source in turn
    #[arg(short, long, conflicts_with = "source")]
    all: bool,

    /// Use the in-memory graph store even when Neo4j is configured
    #[arg(long)]
    mock: bool,

    /// Records per graph batch
    #[arg(long, default_value_t = 1000)]
    batch_size: usize,

    /// Print the unified record JSON Schema and exit
    #[arg(long)]
    schema: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

/// Returns whether any sink accepted data.
async fn run() -> Result<bool> {
    let cli = Cli::parse();

    if cli.schema {
        println!("{}", serde_json::to_string_pretty(&record_json_schema())?);
        return Ok(true);
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("safetygraph=info".parse()?))
        .init();

    info!("SafetyGraph harmonization pipeline starting...");

    let config = Config::from_env()?;
    config.log_redacted();

    let options = PipelineOptions {
        output: cli.output,
        validate: cli.validate,
        batch_size: cli.batch_size,
        mock_graph: cli.mock,
    };
    let mut pipeline = Pipeline::open(config, options).await?;

    if cli.all {
        pipeline.run_all(KNOWN_SOURCES).await;
    } else if let Some(source) = &cli.source {
        pipeline.run(source).await;
    }

    let report = pipeline.finish().await;
    println!("{report}");

    if !report.any_sink_succeeded() {
        eprintln!("Error: every sink write failed");
        return Ok(false);
    }
    Ok(true)
}
