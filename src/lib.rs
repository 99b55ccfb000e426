//! citypersons2voc: CityPersons pedestrian annotations to a PASCAL VOC devkit.
//!
//! CityPersons annotates Cityscapes images with pedestrian boxes, a visible
//! sub-box per instance, and ignore regions. This crate filters those boxes
//! by size and visibility, maps class labels to VOC names, and writes the
//! `Annotations/`, `ImageSets/Main/` and `JPEGImages/` tree that VOC-style
//! training and evaluation code expects.
//!
//! # Modules
//!
//! - [`ir`]: Annotation types, source readers and the VOC XML codec
//! - [`filter`]: Range filter and per-image processing
//! - [`config`]: Run configuration (YAML + CLI overrides)
//! - [`assemble`]: Devkit assembly and the run report
//! - [`error`]: Error types for citypersons2voc operations

pub mod assemble;
pub mod config;
pub mod error;
pub mod filter;
pub mod ir;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};

pub use error::CityPersonsError;

use config::{ConvertConfig, DestinationPolicy, SourceFormat};
use filter::RangeFilter;

/// The citypersons2voc CLI application.
#[derive(Parser)]
#[command(name = "citypersons2voc")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert CityPersons annotations into a VOC devkit.
    Convert(ConvertArgs),
    /// Print the default configuration as YAML.
    PrintConfig,
}

/// Output format for the run report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// A range given on the command line: `lo:hi`, or `none` to disable it.
#[derive(Clone, Copy, Debug, PartialEq)]
enum RangeOverride {
    Clear,
    Set(RangeFilter),
}

impl FromStr for RangeOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("none") {
            Ok(RangeOverride::Clear)
        } else {
            s.parse().map(RangeOverride::Set)
        }
    }
}

impl RangeOverride {
    fn into_option(self) -> Option<RangeFilter> {
        match self {
            RangeOverride::Clear => None,
            RangeOverride::Set(range) => Some(range),
        }
    }
}

/// Arguments for the convert subcommand.
///
/// Flags override the matching field of `--config` (or of the defaults).
#[derive(clap::Args)]
struct ConvertArgs {
    /// YAML configuration file.
    #[arg(long, env = "CITYPERSONS2VOC_CONFIG")]
    config: Option<PathBuf>,

    /// Train annotation source.
    #[arg(long)]
    train_annotations: Option<PathBuf>,

    /// Val annotation source.
    #[arg(long)]
    val_annotations: Option<PathBuf>,

    /// Annotation source format.
    #[arg(long, value_enum)]
    format: Option<SourceFormat>,

    /// Cityscapes leftImg8bit directory (with train/ and val/ inside).
    #[arg(long)]
    image_root: Option<PathBuf>,

    /// Devkit output directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Width range 'lo:hi' (exclusive lo, inclusive hi), or 'none'.
    #[arg(long, allow_hyphen_values = true)]
    width_range: Option<RangeOverride>,

    /// Height range 'lo:hi', or 'none'.
    #[arg(long, allow_hyphen_values = true)]
    height_range: Option<RangeOverride>,

    /// Visible-area ratio range 'lo:hi', or 'none'.
    #[arg(long, allow_hyphen_values = true)]
    vis_range: Option<RangeOverride>,

    /// Do not filter the train split.
    #[arg(long)]
    no_train_filter: bool,

    /// Filter the val split as well.
    #[arg(long)]
    val_filter: bool,

    /// Treat ignore regions like any other class during filtering.
    #[arg(long)]
    no_handle_ignore: bool,

    /// Copy processed images into JPEGImages/.
    #[arg(long)]
    copy_images: bool,

    /// What to do when the output directory exists.
    #[arg(long, value_enum)]
    on_existing: Option<DestinationPolicy>,

    /// Precomputed val ordering to install as val.txt.
    #[arg(long)]
    val_order: Option<PathBuf>,

    /// Output format for the run report.
    #[arg(long, value_enum, default_value = "text")]
    report: ReportFormat,
}

impl ConvertArgs {
    /// Builds the effective configuration: file (or defaults), then flags.
    fn into_config(self) -> Result<(ConvertConfig, ReportFormat), CityPersonsError> {
        let mut config = match &self.config {
            Some(path) => ConvertConfig::from_yaml_path(path)?,
            None => ConvertConfig::default(),
        };

        if let Some(path) = self.train_annotations {
            config.annotations.train = path;
        }
        if let Some(path) = self.val_annotations {
            config.annotations.val = path;
        }
        if let Some(format) = self.format {
            config.annotations.format = format;
        }
        if let Some(path) = self.image_root {
            config.image_root = path;
        }
        if let Some(path) = self.output {
            config.output_dir = path;
        }
        if let Some(range) = self.width_range {
            config.filter.width_range = range.into_option();
        }
        if let Some(range) = self.height_range {
            config.filter.height_range = range.into_option();
        }
        if let Some(range) = self.vis_range {
            config.filter.visibility_range = range.into_option();
        }
        if self.no_train_filter {
            config.filter.enable_train = false;
        }
        if self.val_filter {
            config.filter.enable_val = true;
        }
        if self.no_handle_ignore {
            config.filter.handle_ignore = false;
        }
        if self.copy_images {
            config.copy_images = true;
        }
        if let Some(policy) = self.on_existing {
            config.on_existing = policy;
        }
        if let Some(path) = self.val_order {
            config.val_order_file = Some(path);
        }

        Ok((config, self.report))
    }
}

/// Run the citypersons2voc CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CityPersonsError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::PrintConfig) => {
            print!("{}", ConvertConfig::default().to_yaml_string()?);
            Ok(())
        }
        None => {
            println!("citypersons2voc {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Convert CityPersons annotations into a PASCAL VOC devkit.");
            println!();
            println!("Run 'citypersons2voc --help' for usage information.");
            Ok(())
        }
    }
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs) -> Result<(), CityPersonsError> {
    let (config, format) = args.into_config()?;
    let report = assemble::convert(&config)?;

    match format {
        ReportFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).map_err(CityPersonsError::ReportWrite)?;
            println!("{json}");
        }
        ReportFormat::Text => print!("{report}"),
    }

    Ok(())
}
