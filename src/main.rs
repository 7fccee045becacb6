use std::fs::read_to_string;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use staff_assign::{Objective, Problem};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Yaml,
}

/// Assign employees to targets, minimising travel and honouring who should
/// and should not work together.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Problem file (YAML)
    input: PathBuf,

    /// min-distance, balanced or social; overrides the file
    #[arg(long)]
    objective: Option<Objective>,

    /// Reward per preferred pair placed together
    #[arg(long)]
    reward: Option<f64>,

    /// Solver time limit in seconds
    #[arg(long)]
    time_limit: Option<f64>,

    /// Ignore employee/target pairs farther apart than this (km)
    #[arg(long)]
    max_distance: Option<f64>,

    /// Fail on names in dislike/friend lists that match nobody
    #[arg(long)]
    strict: bool,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Log model details
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let buf = read_to_string(&args.input)?;
    let mut problem = Problem::from_yaml(&buf)?;

    let settings = &mut problem.settings;
    if let Some(objective) = args.objective {
        settings.objective = objective;
    }
    if let Some(reward) = args.reward {
        settings.reward = reward;
    }
    if let Some(seconds) = args.time_limit {
        settings.time_limit = Some(seconds);
    }
    if let Some(radius) = args.max_distance {
        settings.max_distance = Some(radius);
    }
    settings.strict_references |= args.strict;

    let report = problem.solve()?;

    match args.format {
        Format::Text => println!("{report}"),
        Format::Yaml => println!("{}", report.to_yaml()?),
    }
    Ok(())
}
