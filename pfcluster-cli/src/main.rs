//! pfcluster command-line interface.
//!
//! Clusters calorimeter rechit events read from JSON lines and writes the
//! resulting clusters as CSV or JSON lines.
#![allow(
    clippy::uninlined_format_args,
    clippy::cast_precision_loss,
    clippy::too_many_lines,
    clippy::fn_params_excessive_bools
)]

use clap::{Parser, Subcommand};
use log::{info, warn};

use pfcluster_algorithms::{EventClusterer, EventClusters};
use pfcluster_core::{ClusteringStatistics, Layer, ReconstructionConfig, Subsystem};
use pfcluster_io::{load_options, ClusterWriter, EventReader};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    PfclusterIo(#[from] pfcluster_io::Error),
}

/// Topological clustering of calorimeter rechits.
#[derive(Parser)]
#[command(name = "pfcluster")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Cluster every event of a rechit file
    Process {
        /// Input events (JSON lines)
        input: PathBuf,

        /// Option file with a "clustering" section
        #[arg(long)]
        options: Option<PathBuf>,

        /// Output file; `.json`/`.jsonl` writes JSON lines, anything else CSV
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print every rechit with its seed status
        #[arg(long)]
        print_rechits: bool,

        /// Print every cluster
        #[arg(long)]
        print_clusters: bool,
    },

    /// Show information about a rechit file
    Info {
        /// Input events (JSON lines)
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Csv,
    Json,
}

impl OutputFormat {
    fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("json" | "jsonl") => OutputFormat::Json,
            Some("csv") => OutputFormat::Csv,
            other => {
                warn!("unknown output extension {:?}, writing CSV", other);
                OutputFormat::Csv
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Process {
            input,
            options,
            output,
            print_rechits,
            print_clusters,
        } => process(
            &input,
            options.as_deref(),
            output.as_deref(),
            print_rechits,
            print_clusters,
        ),
        Commands::Info { input } => show_info(&input),
    }
}

fn process(
    input: &Path,
    options: Option<&Path>,
    output: Option<&Path>,
    print_rechits: bool,
    print_clusters: bool,
) -> Result<()> {
    let config = match options {
        Some(path) => {
            info!("reading options from {}", path.display());
            load_options(path)?
        }
        None => ReconstructionConfig::default(),
    };
    if !config.clustering_on {
        warn!("clustering is switched off, no clusters will be produced");
    }
    let mut clusterer = EventClusterer::new(Arc::new(config));

    let mut writer = match output {
        Some(path) => {
            info!("writing clusters to {}", path.display());
            Some((ClusterWriter::create(path)?, OutputFormat::from_path(path)))
        }
        None => None,
    };

    let start = Instant::now();
    let mut events = 0u64;
    let mut totals = ClusteringStatistics::default();

    for (index, event) in EventReader::open(input)?.enumerate() {
        let event = event?;
        let number = event.event.unwrap_or(index as u64);
        let clusters = clusterer.process(&event);
        totals.merge(&clusterer.statistics());
        events += 1;

        if print_rechits {
            print_event_rechits(number, &clusterer);
        }
        if print_clusters {
            print_event_clusters(number, &clusters);
        }
        if let Some((writer, format)) = writer.as_mut() {
            match format {
                OutputFormat::Csv => writer.write_event_csv(number, &clusters)?,
                OutputFormat::Json => writer.write_event_json(number, &clusters)?,
            };
        }
    }

    if let Some((mut writer, _)) = writer {
        writer.flush()?;
    }

    let elapsed = start.elapsed();
    println!(
        "Processed {} events in {:.2}s",
        events,
        elapsed.as_secs_f64()
    );
    println!("Cells loaded: {}", totals.cells_loaded);
    println!("Seeds: {}", totals.seeds_found);
    println!(
        "Topo-clusters: {} ({} split, {} not converged)",
        totals.topo_clusters, totals.split_topo_clusters, totals.non_converged
    );
    println!("Clusters: {}", totals.clusters_found);
    if totals.duplicates_skipped > 0 || totals.neighbours_dropped > 0 {
        println!(
            "Skipped duplicate ids: {}, unresolved neighbours: {}",
            totals.duplicates_skipped, totals.neighbours_dropped
        );
    }
    Ok(())
}

fn print_event_rechits(number: u64, clusterer: &EventClusterer) {
    for subsystem in Subsystem::ALL {
        let engine = clusterer.engine(subsystem);
        println!(
            "event {} {} rechits: {}",
            number,
            subsystem,
            engine.registry().len()
        );
        for (index, cell) in engine.registry().cells().iter().enumerate() {
            let status = if engine.is_seed(index) { "SEED" } else { "    " };
            println!("{} {}", status, cell);
        }
    }
}

fn print_event_clusters(number: u64, clusters: &EventClusters) {
    for subsystem in Subsystem::ALL {
        let collection = clusters.collection(subsystem);
        println!(
            "event {} {} clusters: {}",
            number,
            subsystem,
            collection.len()
        );
        for cluster in collection {
            println!("{}", cluster);
        }
    }
}

fn show_info(input: &Path) -> Result<()> {
    let mut events = 0usize;
    let mut cells: BTreeMap<Layer, (usize, f64)> = BTreeMap::new();
    let mut largest = 0usize;

    for event in EventReader::open(input)? {
        let event = event?;
        events += 1;
        largest = largest.max(event.len());
        for subsystem in Subsystem::ALL {
            for record in event.records(subsystem) {
                let entry = cells.entry(record.layer).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += record.energy;
            }
        }
    }

    println!("File: {}", input.display());
    println!("Events: {}", events);
    println!("Largest event: {} rechits", largest);
    for (layer, (count, energy)) in &cells {
        println!(
            "{:<12} {:>8} rechits  mean E {:.4}",
            layer.to_string(),
            count,
            energy / *count as f64
        );
    }
    Ok(())
}
