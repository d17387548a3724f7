use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

mod ingest;
mod models;
mod report;
mod source;
mod table;
mod worldwide;

use source::FileSource;

#[derive(Parser)]
#[command(name = "covid-tracker")]
#[command(about = "Aggregates JHU CSSE COVID-19 time-series CSVs into a per-region daily snapshot", long_about = None)]
struct Cli {
    /// Enable debug diagnostics (row skips, synthesized regions, timings)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Confirmed-cases time-series CSV
    #[arg(long)]
    confirmed: PathBuf,
    /// Deaths time-series CSV
    #[arg(long)]
    deaths: PathBuf,
    /// Recovered time-series CSV
    #[arg(long)]
    recovered: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full snapshot and write it as JSON
    Snapshot {
        #[command(flatten)]
        sources: SourceArgs,
        /// Output path; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown summary report
    Report {
        #[command(flatten)]
        sources: SourceArgs,
        /// Country to summarize; repeatable
        #[arg(long = "country")]
        countries: Vec<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    pretty_env_logger::formatted_builder()
        .filter_level(if cli.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    match cli.command {
        Commands::Snapshot { sources, out } => {
            let snapshot = run(sources).await?;
            let json =
                serde_json::to_string_pretty(&snapshot).context("serializing snapshot")?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Snapshot written to {}.", path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Report {
            sources,
            countries,
            out,
        } => {
            let snapshot = run(sources).await?;
            let report = report::build_report(&snapshot, &countries);
            std::fs::write(&out, report)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

/// Fetch all three tables (a join, not a pipeline), then run the sequential
/// build. Either one consistent snapshot comes back or the run fails whole.
async fn run(sources: SourceArgs) -> anyhow::Result<models::Snapshot> {
    let source = FileSource::new(sources.confirmed, sources.deaths, sources.recovered);
    let tables = source.fetch().await?;
    ingest::build_snapshot(&tables)
}
