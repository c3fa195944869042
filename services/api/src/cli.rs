use crate::commands::{run_calculate, run_plan, run_rules, CalculateArgs, PlanArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use lien_ledger::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "lien-ledger",
    about = "Lien deadline and invoice ledger backend for construction subcontractors",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the lien rule table from the configured database
    Rules,
    /// Offline deadline calculations against the rule table
    Deadline {
        #[command(subcommand)]
        command: DeadlineCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DeadlineCommand {
    /// Compute one statutory deadline from a trigger date
    Calculate(CalculateArgs),
    /// Show the deadlines a project's work window would generate
    Plan(PlanArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Rules => run_rules(),
        Command::Deadline {
            command: DeadlineCommand::Calculate(args),
        } => run_calculate(args),
        Command::Deadline {
            command: DeadlineCommand::Plan(args),
        } => run_plan(args),
    }
}
