//! tpcraster CLI
//!
//! Generates rasterized AT-TPC image datasets and inspects them.
#![allow(clippy::uninlined_format_args)]

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use thiserror::Error;
use tpcraster_core::{ClassNames, Projection};
use tpcraster_io::{
    read_dataset, run, DataType, Mode, PipelineConfig, RasterizedDataset, WriteOptions,
    DEFAULT_RUNS,
};

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    TpcrasterIo(#[from] tpcraster_io::Error),

    #[error("Summary error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Input data selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DataTypeArg {
    /// Detector runs (`run_<id>.h5`)
    Real,
    /// Proton and carbon simulations
    Sim,
}

impl From<DataTypeArg> for DataType {
    fn from(arg: DataTypeArg) -> Self {
        match arg {
            DataTypeArg::Real => DataType::Real,
            DataTypeArg::Sim => DataType::Sim,
        }
    }
}

/// Image plane selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProjectionArg {
    /// x horizontal, y vertical
    Xy,
    /// z (drift) horizontal, y vertical
    Zy,
}

impl From<ProjectionArg> for Projection {
    fn from(arg: ProjectionArg) -> Self {
        match arg {
            ProjectionArg::Xy => Projection::Xy,
            ProjectionArg::Zy => Projection::Zy,
        }
    }
}

/// Rasterize AT-TPC events into training images.
#[derive(Parser)]
#[command(name = "tpcraster")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log debug progress (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an image dataset from real or simulated events
    Generate {
        /// Data type
        #[arg(value_name = "TYPE", value_enum)]
        data_type: DataTypeArg,

        /// Projection
        #[arg(value_enum)]
        projection: ProjectionArg,

        /// Directory holding the input event files
        data_dir: PathBuf,

        /// Directory the images are saved to
        #[arg(long = "save_path", default_value = ".")]
        save_path: PathBuf,

        /// Prefix of the output file (and of the simulation inputs)
        #[arg(long, default_value = "")]
        prefix: String,

        /// Use labeled real data
        #[arg(long, action = ArgAction::Set, default_value_t = true)]
        labeled: bool,

        /// Add random noise to simulated data
        #[arg(long, action = ArgAction::Set, default_value_t = true)]
        noise: bool,

        /// Number of junk events added to simulated data
        #[arg(long = "num_events", default_value_t = 40000)]
        num_events: usize,

        /// Real runs to read
        #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_RUNS.map(String::from))]
        runs: Vec<String>,

        /// RNG seed for shuffling and noise (OS entropy if omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Deflate level for the image datasets
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=9))]
        compression: Option<u8>,

        /// Write the run summary as JSON to this path
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Show information about a generated image file
    Info {
        /// Image container
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = execute(cli.command) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Generate {
            data_type,
            projection,
            data_dir,
            save_path,
            prefix,
            labeled,
            noise,
            num_events,
            runs,
            seed,
            compression,
            summary,
        } => {
            let mode = Mode::new(data_type.into(), labeled, noise, num_events);

            let config = PipelineConfig::new(data_dir, projection.into(), mode)
                .with_save_path(save_path)
                .with_prefix(prefix)
                .with_runs(runs)
                .with_seed(seed)
                .with_write_options(WriteOptions::default().with_compression(compression));

            let report = run(&config)?;
            println!("{report}");

            if let Some(path) = summary {
                let json = serde_json::to_string_pretty(&report)?;
                std::fs::write(&path, json)?;
                log::info!("summary written to {}", path.display());
            }
        }

        Commands::Info { input } => {
            let dataset = read_dataset(&input)?;
            println!("File: {}", input.display());
            match &dataset {
                RasterizedDataset::Labeled { train, test, .. } => {
                    println!("Kind: labeled");
                    println!("Train images: {}", train.len());
                    println!("Test images: {}", test.len());
                    print_histogram(train.targets.iter().chain(&test.targets));
                }
                RasterizedDataset::Unlabeled { images, .. } => {
                    println!("Kind: unlabeled");
                    println!("Images: {}", images.dim().0);
                }
            }
            println!("Max charge: {:.6}", dataset.max_charge());
        }
    }

    Ok(())
}

fn print_histogram<'a>(targets: impl Iterator<Item = &'a u8>) {
    let names = ClassNames::default();
    let mut counts = vec![0usize; names.len()];
    let mut other = 0usize;
    for &t in targets {
        match counts.get_mut(usize::from(t)) {
            Some(count) => *count += 1,
            None => other += 1,
        }
    }

    println!("{:<10} {:>8}", "Class", "Count");
    println!("{:-<19}", "");
    for (i, count) in counts.iter().enumerate() {
        if let Some(name) = names.get(i) {
            println!("{:<10} {:>8}", name, count);
        }
    }
    if other > 0 {
        println!("{:<10} {:>8}", "other", other);
    }
}
