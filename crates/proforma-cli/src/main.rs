mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::proforma::{ComputeArgs, ScenariosArgs, SensitivityArgs};

/// Real-estate development feasibility analysis
#[derive(Parser)]
#[command(
    name = "proforma",
    version,
    about = "Real-estate development feasibility analysis",
    long_about = "Computes full development pro-formas for land parcels: \
                  cash-flow projections, capital structure, return metrics \
                  (IRR, ROE, yield on cost), deal scoring with risk flags, \
                  and sale-price × construction-cost sensitivity grids."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full pro-forma for a parcel request
    Compute(ComputeArgs),
    /// Run only the sale-price × construction-cost IRR grid
    Sensitivity(SensitivityArgs),
    /// Run a named batch of override scenarios against one base request
    Scenarios(ScenariosArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Compute(args) => commands::proforma::run_compute(args),
        Commands::Sensitivity(args) => commands::proforma::run_sensitivity_grid(args),
        Commands::Scenarios(args) => commands::proforma::run_scenario_batch(args),
        Commands::Version => {
            println!("proforma {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
