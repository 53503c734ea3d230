use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use metacat::detector::EXTENSION_TABLE;
use metacat::{
    render, CatalogStorage, DataSource, ExtractionConfig, ExtractionRouter, FileReport,
    FileStorage, ProcessingStatus,
};

#[derive(Parser)]
#[command(name = "metacat")]
#[command(about = "Extract catalog metadata from JSON, CSV, Excel, XML and RDF files")]
struct Args {
    /// Files to extract metadata from
    #[arg(required_unless_present = "show_formats")]
    inputs: Vec<String>,

    /// Path to extraction config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Write JSON results to this file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Also store each file as a data-source record in this catalog directory
    #[arg(long)]
    catalog_dir: Option<String>,

    /// Emit compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    /// Show the supported extensions and exit
    #[arg(long)]
    show_formats: bool,

    /// Exit non-zero when any extraction fails
    #[arg(long)]
    fail_on_error: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Args::parse()) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    if args.show_formats {
        show_formats();
        return Ok(ExitCode::SUCCESS);
    }

    let config = ExtractionConfig::load_with_fallback(args.config.as_deref());
    match &args.config {
        Some(path) => tracing::info!(path = %path, "Loaded config"),
        None => tracing::debug!("Using default config"),
    }
    let router = ExtractionRouter::from_config(&config)?;

    let storage = match &args.catalog_dir {
        Some(dir) => Some(FileStorage::new(dir)?),
        None => None,
    };

    let mut reports = Vec::with_capacity(args.inputs.len());
    let mut unreadable = 0usize;

    for input in &args.inputs {
        let content = match std::fs::read(input) {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(file = %input, error = %e, "Cannot read input");
                unreadable += 1;
                continue;
            }
        };
        let file_name = Path::new(input)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(input.as_str());

        let result = router.extract(file_name, &content);

        if let Some(storage) = &storage {
            let mut record = DataSource::new(file_name, file_name);
            record.apply(&result, &content);
            storage.store(&record)?;
            tracing::info!(id = %record.id, file = %file_name, "Stored data source");
        }

        reports.push(FileReport::new(input.as_str(), &result));
    }

    let failed = reports
        .iter()
        .filter(|r| r.status == ProcessingStatus::Failed)
        .count();

    if !reports.is_empty() {
        let rendered = render(&reports, args.compact)?;
        match &args.output {
            Some(path) => {
                std::fs::write(path, rendered + "\n")
                    .with_context(|| format!("Failed to write {}", path))?;
                tracing::info!(path = %path, files = reports.len(), "Results saved");
            }
            None => println!("{}", rendered),
        }
    }

    if unreadable > 0 {
        return Ok(ExitCode::FAILURE);
    }
    if args.fail_on_error && failed > 0 {
        tracing::warn!(failed, "Some extractions failed");
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

fn show_formats() {
    println!("Supported extensions:");
    for (extension, tag) in EXTENSION_TABLE {
        println!("  .{:<8} {}", extension, tag);
    }
    println!("\nConfig file options (YAML):");
    println!("  detection.sniff_content   Guess the format from content when the extension is unknown");
    println!("  tabular.delimiter         Field delimiter for csv/txt (default ',')");
    println!("  markup.mode               first_occurrence (default) or all_occurrences");
    println!("\nUsage Examples:");
    println!("  metacat records.csv");
    println!("  metacat -c metacat.yaml catalog.ttl marc.xml -o results.json");
    println!("  metacat --catalog-dir ./catalog uploads/*");
}
