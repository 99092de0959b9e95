use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;

use enrollment_roster::clock::SystemClock;
use enrollment_roster::config::Config;
use enrollment_roster::error::Result;
use enrollment_roster::logging;
use enrollment_roster::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "enrollment_roster")]
#[command(about = "Reconciles Primus enrollment exports against the citizen registry")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the three Primus exports with the registry and write the
    /// roster and rejects datasets
    Run {
        /// Path to the TOML config file
        #[arg(long, default_value = "roster.toml")]
        config: PathBuf,
        /// Output formats, comma-separated (csv, json); overrides config
        #[arg(long)]
        formats: Option<String>,
        /// Output directory; overrides config
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Placement export path; overrides config
        #[arg(long)]
        placement: Option<PathBuf>,
        /// Department export path; overrides config
        #[arg(long)]
        department: Option<PathBuf>,
        /// Unit export path; overrides config
        #[arg(long)]
        unit: Option<PathBuf>,
        /// Registry CSV path; overrides config
        #[arg(long)]
        registry: Option<PathBuf>,
    },
}

fn main() {
    logging::init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            formats,
            output_dir,
            placement,
            department,
            unit,
            registry,
        } => run(
            config, formats, output_dir, placement, department, unit, registry,
        ),
    };

    if let Err(e) = result {
        error!("Pipeline failed: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(
    config_path: PathBuf,
    formats: Option<String>,
    output_dir: Option<PathBuf>,
    placement: Option<PathBuf>,
    department: Option<PathBuf>,
    unit: Option<PathBuf>,
    registry: Option<PathBuf>,
) -> Result<()> {
    let mut config = Config::load(&config_path)?;
    if let Some(formats) = formats {
        config.output.formats = formats.split(',').map(|s| s.trim().to_string()).collect();
    }
    if let Some(dir) = output_dir {
        config.output.directory = dir;
    }
    if let Some(path) = placement {
        config.sources.placement = path;
    }
    if let Some(path) = department {
        config.sources.department = path;
    }
    if let Some(path) = unit {
        config.sources.unit = path;
    }
    if let Some(path) = registry {
        config.sources.registry = path;
    }

    let clock = SystemClock;
    let summary = Pipeline::new(&config, &clock).run()?;

    println!("\n📊 Reconciliation results:");
    println!("   Total placement records: {}", summary.total_records);
    println!("   Matched: {}", summary.matched);
    println!("   Unmatched: {}", summary.unmatched);
    for path in &summary.written {
        println!("   Output file: {}", path.display());
    }
    Ok(())
}
