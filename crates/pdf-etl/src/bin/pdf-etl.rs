//! pdf-etl command-line tool
//!
//! Run with: cargo run -p pdf-etl --bin pdf-etl -- ingest report.pdf

use anyhow::Context;
use clap::{Parser, Subcommand};
use console::style;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use pdf_etl::{doc_id_for_path, Actions, EtlConfig, IngestReport, PdfExtractor, Pipeline};

#[derive(Parser)]
#[command(name = "pdf-etl")]
#[command(about = "Extract paragraphs, tables and images from PDFs into a search index")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file (ELASTIC_* variables still override it)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Destination index name
    #[arg(short, long, global = true)]
    index: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest PDF files, one after another (each run rebuilds the index)
    Ingest {
        /// Files to ingest; the file name without extension is the document id
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print reports as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Ingest every PDF in a directory, in file name order
    IngestDir {
        /// Directory to scan
        #[arg(default_value = ".")]
        dir: PathBuf,

        /// Print reports as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Print the indexing actions for a PDF as NDJSON without writing them
    Actions {
        /// PDF file
        file: PathBuf,

        /// Document id (default: file name without extension)
        #[arg(long)]
        doc_id: Option<String>,
    },

    /// Connect to the backend and print cluster information
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    pdf_etl::logging::init("pdf_etl=info");

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Ingest { files, json } => {
            let pipeline = connect(&config).await?;
            let documents: Vec<(String, PathBuf)> = files
                .into_iter()
                .map(|path| (doc_id_for_path(&path), path))
                .collect();
            let reports = pipeline.ingest_many(&documents).await;
            print_reports(&reports, json)
        }
        Commands::IngestDir { dir, json } => {
            let pipeline = connect(&config).await?;
            let reports = pipeline
                .ingest_dir(&dir)
                .await
                .with_context(|| format!("cannot scan {}", dir.display()))?;
            if reports.is_empty() {
                eprintln!("No PDF files in {}", dir.display());
            }
            print_reports(&reports, json)
        }
        Commands::Actions { file, doc_id } => {
            let doc_id = doc_id.unwrap_or_else(|| doc_id_for_path(&file));
            let extractor = PdfExtractor::open(&file)?;
            let mut actions = Actions::new(extractor, doc_id, config.index.name.clone());

            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let mut buf = Vec::new();
            for action in actions.by_ref() {
                buf.clear();
                action.write_ndjson(&mut buf)?;
                out.write_all(&buf)?;
            }
            out.flush()?;

            let warnings = actions.warnings();
            if !warnings.is_empty() {
                eprintln!("{} {} units skipped", style("warning:").yellow(), warnings.len());
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check => {
            let pipeline = Pipeline::from_config(&config)?;
            let backend = pipeline.backend();
            let info = backend
                .info()
                .await
                .with_context(|| format!("cannot reach {}", config.backend.url))?;
            println!(
                "{} {} (cluster {}, version {})",
                style("connected:").green(),
                info.name,
                info.cluster_name,
                info.version
            );
            if backend.index_exists(pipeline.index()).await? {
                let count = backend.count(pipeline.index()).await?;
                println!("index '{}': {} records", pipeline.index(), count);
            } else {
                println!("index '{}' does not exist yet", pipeline.index());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<EtlConfig> {
    let mut config = match &cli.config {
        Some(path) => EtlConfig::from_toml_file(path)
            .with_context(|| format!("cannot load {}", path.display()))?,
        None => EtlConfig::from_env(),
    };
    if let Some(index) = &cli.index {
        config.index.name = index.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Build the pipeline and make sure the engine answers before ingesting
async fn connect(config: &EtlConfig) -> anyhow::Result<Pipeline> {
    let pipeline = Pipeline::from_config(config)?;
    let info = pipeline
        .backend()
        .info()
        .await
        .with_context(|| format!("cannot reach {}", config.backend.url))?;
    tracing::info!(
        "Connected to {} (cluster {}, version {})",
        info.name,
        info.cluster_name,
        info.version
    );
    Ok(pipeline)
}

fn print_reports(reports: &[IngestReport], json: bool) -> anyhow::Result<ExitCode> {
    for report in reports {
        if json {
            println!("{}", serde_json::to_string(report)?);
            continue;
        }

        if report.is_success() {
            println!(
                "{} {}: {} indexed, {} rejected, {} skipped ({}ms)",
                style("done").green(),
                report.doc_id,
                report.indexed,
                report.item_failures.len(),
                report.warnings.len(),
                report.elapsed_ms
            );
        } else {
            println!(
                "{} {}: {}",
                style("failed").red(),
                report.doc_id,
                report.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
