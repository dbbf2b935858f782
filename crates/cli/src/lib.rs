pub mod commands;
pub mod render;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "sourcing",
    about = "AI-powered sourcing agent for automated supplier discovery and evaluation",
    long_about = "Run supplier sourcing analyses, manage the supplier database, and launch the dashboard front end.",
    after_help = "Examples:\n  sourcing analyze \"industrial sensors\" --budget \"$20,000-$100,000\" --location Asia\n  sourcing doctor --json\n  sourcing setup"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run the four-stage sourcing analysis for a product category")]
    Analyze {
        #[arg(help = "Product category to source (e.g. 'electronic components')")]
        product: String,
        #[arg(long, short = 'b', default_value = "$10,000-$50,000", help = "Budget range")]
        budget: String,
        #[arg(long, short = 'l', default_value = "Global", help = "Location preference")]
        location: String,
        #[arg(long, short = 's', help = "Include sustainability requirements")]
        sustainability: bool,
        #[arg(long, short = 'q', help = "Quality standards (comma-separated)")]
        quality: Option<String>,
    },
    #[command(about = "Launch the configured dashboard front end as a subprocess")]
    Dashboard,
    #[command(about = "Scaffold data directories and a template credentials file")]
    Setup,
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Validate config, model/search credential readiness, and DB connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Analyze { product, budget, location, sustainability, quality } => {
            commands::analyze::run(commands::analyze::AnalyzeArgs {
                product,
                budget,
                location,
                sustainability,
                quality,
            })
        }
        Command::Dashboard => commands::dashboard::run(),
        Command::Setup => commands::setup::run(),
        Command::Migrate => commands::migrate::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
