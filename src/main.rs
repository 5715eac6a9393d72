//! Product dataset preparation CLI
//!
//! Entry point for fetching the product-image dataset, building the
//! filtered stratified split, and exporting it as class folders.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use product_prep::dataset::{ClassDistribution, CopyMode, SampleBatches, TRAIN_DIR, VAL_DIR};
use product_prep::fetch::{DatasetSource, KaggleCliSource, LocalDirSource};
use product_prep::utils::logging::{init_logging, LogConfig, LogLevel};
use product_prep::{Pipeline, PipelineConfig};

/// Product image dataset preparation
///
/// Filters a product metadata table against the images on disk, encodes
/// categories, and writes reproducible stratified train/val class folders.
#[derive(Parser, Debug)]
#[command(name = "product_prep")]
#[command(version)]
#[command(about = "Prepare product-image classification datasets", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, default_value = "false", conflicts_with = "verbose")]
    quiet: bool,

    /// Explicit log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Overrides shared by commands that run the pipeline
#[derive(clap::Args, Debug)]
struct PipelineArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Metadata file (overrides config)
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Image directory (overrides config)
    #[arg(long)]
    images_dir: Option<PathBuf>,

    /// Output root for train/ and val/ (overrides config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Validation fraction per class (overrides config)
    #[arg(long)]
    val_fraction: Option<f64>,

    /// Random seed for reproducibility (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Minimum samples per class (overrides config)
    #[arg(long)]
    min_samples: Option<usize>,

    /// Keep files already present in the output tree
    #[arg(long, default_value = "false")]
    skip_existing: bool,
}

impl PipelineArgs {
    fn resolve(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::load(path)
                .with_context(|| format!("Failed to load config {:?}", path))?,
            None => PipelineConfig::default(),
        };

        if let Some(path) = &self.metadata {
            config.source.metadata_path = path.clone();
        }
        if let Some(dir) = &self.images_dir {
            config.source.images_dir = dir.clone();
        }
        if let Some(root) = &self.output {
            config.output.root = root.clone();
        }
        if let Some(fraction) = self.val_fraction {
            config.split.val_fraction = fraction;
        }
        if let Some(seed) = self.seed {
            config.split.seed = seed;
        }
        if let Some(min) = self.min_samples {
            config.split.min_samples_per_class = min;
        }
        if self.skip_existing {
            config.output.copy_mode = CopyMode::SkipExisting;
        }

        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Download the dataset, or point at an existing local copy
    Fetch {
        /// Kaggle dataset slug (owner/name)
        #[arg(short, long, default_value = "paramaggarwal/fashion-product-images-small")]
        dataset: String,

        /// Destination directory
        #[arg(short, long, default_value = "data/raw")]
        output_dir: PathBuf,

        /// Use an already extracted local directory instead of downloading
        #[arg(long)]
        local: Option<PathBuf>,
    },

    /// Run the full pipeline and export class folders
    Prepare {
        #[command(flatten)]
        args: PipelineArgs,
    },

    /// Iterate the training split in memory without writing files
    Batches {
        #[command(flatten)]
        args: PipelineArgs,

        /// Batch size
        #[arg(short, long, default_value = "32")]
        batch_size: usize,

        /// Shuffle with the pipeline seed
        #[arg(long, default_value = "false")]
        shuffle: bool,
    },

    /// Show per-class statistics of a prepared dataset
    Stats {
        /// Root containing train/ and val/
        #[arg(short, long, default_value = "data/prepared")]
        data_dir: PathBuf,
    },

    /// Write a configuration file with default values
    InitConfig {
        /// Output TOML path
        #[arg(short, long, default_value = "prep.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_flags(cli.verbose, cli.quiet, cli.log_level);

    let _ = init_logging(&log_config);

    print_banner();

    match cli.command {
        Commands::Fetch {
            dataset,
            output_dir,
            local,
        } => cmd_fetch(&dataset, &output_dir, local)?,

        Commands::Prepare { args } => cmd_prepare(&args)?,

        Commands::Batches {
            args,
            batch_size,
            shuffle,
        } => cmd_batches(&args, batch_size, shuffle)?,

        Commands::Stats { data_dir } => cmd_stats(&data_dir)?,

        Commands::InitConfig { output } => {
            PipelineConfig::default().save(&output)?;
            println!("{} {}", "Config written to".green(), output.display());
        }
    }

    Ok(())
}

fn print_banner() {
    println!("{}", "product_prep".cyan().bold());
    println!("{}", format!("v{}", product_prep::VERSION).dimmed());
    println!();
}

fn cmd_fetch(dataset: &str, output_dir: &Path, local: Option<PathBuf>) -> Result<()> {
    let root = match local {
        Some(path) => LocalDirSource::new(path).fetch(output_dir)?,
        None => KaggleCliSource::new(dataset)
            .fetch(output_dir)
            .context("Download failed; pass --local to use an extracted copy")?,
    };

    println!("{} {}", "Dataset available at".green(), root.display());
    println!();
    println!("{}", "Expected structure:".yellow());
    println!("  {}/", root.display());
    println!("  ├── styles.csv");
    println!("  └── images/");
    println!("      ├── 1163.jpg");
    println!("      └── ...");

    Ok(())
}

fn cmd_prepare(args: &PipelineArgs) -> Result<()> {
    let config = args.resolve()?;
    info!("Output root: {:?}", config.output.root);

    let pipeline = Pipeline::new(config)?;
    let (prepared, outputs) = pipeline.run_and_export()?;

    println!();
    println!("{}", prepared.report);
    println!(
        "  Copied: {} train, {} val (skipped {})",
        outputs.train.copied,
        outputs.val.copied,
        outputs.train.skipped + outputs.val.skipped
    );
    println!();
    println!(
        "{} {}",
        "Dataset prepared at".green().bold(),
        pipeline.config().output.root.display()
    );

    Ok(())
}

fn cmd_batches(args: &PipelineArgs, batch_size: usize, shuffle: bool) -> Result<()> {
    let config = args.resolve()?;
    let seed = config.split.seed;
    let prepared = Pipeline::new(config)?.run()?;

    let mut batches = SampleBatches::new(&prepared.split.train, batch_size)?;
    if shuffle {
        batches = batches.shuffled(seed);
    }

    let num_batches = batches.num_batches();
    let items = batches.len_items();
    let mut seen = 0;
    for batch in batches {
        seen += batch.len();
    }

    println!("{}", "Training batches:".cyan().bold());
    println!("  Classes: {}", prepared.registry.len());
    println!("  Samples: {}", items);
    println!("  Batches of {}: {}", batch_size, num_batches);
    println!("  Iterated samples: {}", seen);

    Ok(())
}

fn cmd_stats(data_dir: &Path) -> Result<()> {
    for split in [TRAIN_DIR, VAL_DIR] {
        let dir = data_dir.join(split);
        match ClassDistribution::from_directory(&dir) {
            Ok(dist) => {
                println!("{}", format!("{} split:", split).cyan().bold());
                print!("{}", dist);
                println!("  Imbalance ratio: {:.1}:1", dist.imbalance_ratio());
                println!();
            }
            Err(e) => {
                println!("{} {}", "Error:".red(), e);
                println!("Run `product_prep prepare` first.");
            }
        }
    }

    Ok(())
}
