use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shift_planner::config::PlannerConfig;
use shift_planner::display::{print_schedule, write_schedule_to_file};
use shift_planner::parser::{load_desiderata_csv, load_request};
use shift_planner::schedule::{Period, Planner, PlanningRequest};
use shift_planner::web;

#[derive(Parser)]
#[command(name = "shift-planner")]
#[command(about = "Monthly on-call shift planning from physician desiderata")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Planner settings file (TOML)
    #[arg(long, short, env = "PLANNER_CONFIG")]
    config: Option<PathBuf>,

    /// Random seed for the local search
    #[arg(long, env = "PLANNER_SEED")]
    seed: Option<u64>,

    /// Local search rounds
    #[arg(long, env = "PLANNER_MAX_ITERATIONS")]
    max_iterations: Option<usize>,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a schedule and print it.
    Generate {
        /// JSON planning request (period, roster, preferences)
        #[arg(long, conflicts_with = "desiderata")]
        request: Option<PathBuf>,
        /// Desiderata sheet (CSV), used with --start, --end and --roster
        #[arg(long, requires_all = ["start", "end", "roster"])]
        desiderata: Option<PathBuf>,
        /// First day of the period (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day of the period (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
        /// Physician ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        roster: Vec<String>,
        /// Write the assignment as JSON
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Write the schedule as text, one line per date and slot
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Serve the planning API over HTTP.
    Serve {
        #[arg(short, long, env = "PORT", default_value = "8080")]
        port: u16,
    },
}

fn load_config(cli: &Cli) -> Result<PlannerConfig> {
    let mut config = match &cli.config {
        Some(path) => PlannerConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => PlannerConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if let Some(max_iterations) = cli.max_iterations {
        config = config.with_max_iterations(max_iterations);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Serve { port } => {
            println!("Access the API at http://localhost:{}/api", port);
            web::start_server(port, config).await?;
        }

        Commands::Generate {
            request,
            desiderata,
            start,
            end,
            roster,
            out,
            report,
        } => {
            let request = match (request, desiderata) {
                (Some(path), _) => load_request(&path)
                    .with_context(|| format!("failed to read request {}", path.display()))?,
                (None, Some(path)) => {
                    let preferences = load_desiderata_csv(&path)
                        .with_context(|| format!("failed to read desiderata {}", path.display()))?;
                    let period = match (start, end) {
                        (Some(start), Some(end)) => Some(Period::new(start, end)?),
                        _ => None,
                    };
                    PlanningRequest {
                        period,
                        roster,
                        preferences,
                    }
                }
                (None, None) => bail!("pass either --request or --desiderata"),
            };

            info!(preferences = request.preferences.len(), "loaded planning request");
            let planner = Planner::from_request(request, config)?;
            let run = planner.run_seeded()?;

            print_schedule(&run, planner.catalog());

            if let Some(path) = out {
                let json = serde_json::to_string_pretty(&run.assignment)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("\nAssignment saved to {}", path.display());
            }
            if let Some(path) = report {
                write_schedule_to_file(&run.assignment, &path)?;
                println!("Schedule saved to {}", path.display());
            }
        }
    }

    Ok(())
}
